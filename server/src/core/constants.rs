// =============================================================================
// Application Identity
// =============================================================================

/// Application name in title case (for display and database naming)
pub const APP_NAME: &str = "SafariBugTracker";

/// Unix-style dotfile folder name
pub const APP_DOT_FOLDER: &str = ".safari";

// =============================================================================
// Configuration Files
// =============================================================================

/// Config file name
pub const CONFIG_FILE_NAME: &str = "safari.json";

/// Environment variable for config file path
pub const ENV_CONFIG: &str = "SAFARI_CONFIG";

// =============================================================================
// Environment Variables - Server
// =============================================================================

/// Environment variable for server host
pub const ENV_HOST: &str = "SAFARI_HOST";

/// Environment variable for server port
pub const ENV_PORT: &str = "SAFARI_PORT";

/// Environment variable for log level/filter
pub const ENV_LOG: &str = "SAFARI_LOG";

// =============================================================================
// Server Defaults
// =============================================================================

/// Default server host
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default server port
pub const DEFAULT_PORT: u16 = 5080;

/// Default request body limit (covers issues with embedded screenshots)
pub const DEFAULT_BODY_LIMIT: usize = 16 * 1024 * 1024;

/// Graceful shutdown timeout for background tasks
pub const SHUTDOWN_TIMEOUT_SECS: u64 = 10;

// =============================================================================
// Environment Variables - Auth
// =============================================================================

/// Environment variable for the Issue API shared secret
pub const ENV_AUTH_KEY: &str = "SAFARI_AUTH_KEY";

/// Environment variable for the Logger API submit code
pub const ENV_LOG_AUTH_CODE: &str = "SAFARI_LOG_AUTH_CODE";

// =============================================================================
// Environment Variables - Database
// =============================================================================

/// Environment variable for the MongoDB connection string
pub const ENV_MONGO_URL: &str = "SAFARI_MONGO_URL";

/// Environment variable for the MongoDB database name
pub const ENV_MONGO_DATABASE: &str = "SAFARI_MONGO_DATABASE";

// =============================================================================
// Database Defaults
// =============================================================================

/// Default MongoDB connection string
pub const DEFAULT_MONGO_URL: &str = "mongodb://localhost:27017";

/// Default database name
pub const DEFAULT_MONGO_DATABASE: &str = APP_NAME;

/// Default issue collection name
pub const DEFAULT_ISSUE_COLLECTION: &str = "Issues";

/// Server selection timeout for the MongoDB client
pub const MONGO_SERVER_SELECTION_TIMEOUT_SECS: u64 = 5;

// =============================================================================
// Environment Variables - Logs
// =============================================================================

/// Environment variable for the log directory template
pub const ENV_LOG_DIRECTORY: &str = "SAFARI_LOG_DIRECTORY";

/// Environment variable for the log file name
pub const ENV_LOG_FILE_NAME: &str = "SAFARI_LOG_FILE_NAME";

// =============================================================================
// Log Defaults
// =============================================================================

/// Default directory template. `SOURCE`, `DATE` and `LEVEL` are substituted per event.
pub const DEFAULT_LOG_DIRECTORY: &str = "logs/SOURCE/DATE/LEVEL";

/// Default log file name (extension selects the format)
pub const DEFAULT_LOG_FILE_NAME: &str = "log.json";

/// Placeholder replaced by the event's application name
pub const LOG_PLACEHOLDER_SOURCE: &str = "SOURCE";

/// Placeholder replaced by the ingestion date
pub const LOG_PLACEHOLDER_DATE: &str = "DATE";

/// Placeholder replaced by the event level
pub const LOG_PLACEHOLDER_LEVEL: &str = "LEVEL";

/// Date format used for log records and directory names
pub const LOG_DATE_FORMAT: &str = "%d-%m-%Y";

/// Source used when an event carries no application property
pub const LOG_UNKNOWN_SOURCE: &str = "Unknown";

/// Pending writes per file writer
pub const LOG_WRITER_CHANNEL_CAPACITY: usize = 1024;

/// Seconds a file writer may sit with an empty queue before it closes the file
pub const LOG_WRITER_IDLE_SECS: u64 = 60;

// =============================================================================
// Issue API
// =============================================================================

/// Issues returned by the monthly metrics window
pub const METRICS_MONTHLY_DAYS: i64 = 30;

/// Label format for monthly metrics
pub const METRICS_LABEL_FORMAT: &str = "%m-%d";

/// Label for issues without a resolve status
pub const METRICS_STATUS_NOT_SET: &str = "Not Set";

/// Resolve status of newly submitted issues
pub const STATUS_NEW: &str = "New";

/// Resolve status of closed issues
pub const STATUS_CLOSED: &str = "Closed";
