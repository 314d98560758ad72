use clap::Parser;

use std::path::PathBuf;

use super::constants::{
    ENV_AUTH_KEY, ENV_CONFIG, ENV_HOST, ENV_LOG_AUTH_CODE, ENV_LOG_DIRECTORY, ENV_LOG_FILE_NAME,
    ENV_MONGO_DATABASE, ENV_MONGO_URL, ENV_PORT,
};

#[derive(Parser)]
#[command(name = "safari")]
#[command(version, about = "SafariBugTracker Issue and Logger API", long_about = None)]
pub struct Cli {
    /// Server host address
    #[arg(long, short = 'H', env = ENV_HOST)]
    pub host: Option<String>,

    /// Server port
    #[arg(long, short = 'p', env = ENV_PORT)]
    pub port: Option<u16>,

    /// Path to config file
    #[arg(long, short = 'c', env = ENV_CONFIG)]
    pub config: Option<PathBuf>,

    /// Shared secret expected in the Authorization header of Issue API requests
    #[arg(long, env = ENV_AUTH_KEY, hide_env_values = true)]
    pub auth_key: Option<String>,

    /// MongoDB connection string
    #[arg(long, env = ENV_MONGO_URL, hide_env_values = true)]
    pub mongo_url: Option<String>,

    /// MongoDB database name
    #[arg(long, env = ENV_MONGO_DATABASE)]
    pub mongo_database: Option<String>,

    /// Log directory template (SOURCE, DATE and LEVEL are substituted)
    #[arg(long, env = ENV_LOG_DIRECTORY)]
    pub log_directory: Option<String>,

    /// Log file name; the extension selects txt, json or binary output
    #[arg(long, env = ENV_LOG_FILE_NAME)]
    pub log_file_name: Option<String>,

    /// Code required by the log submit endpoint
    #[arg(long, env = ENV_LOG_AUTH_CODE, hide_env_values = true)]
    pub log_auth_code: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub config: Option<PathBuf>,
    pub auth_key: Option<String>,
    pub mongo_url: Option<String>,
    pub mongo_database: Option<String>,
    pub log_directory: Option<String>,
    pub log_file_name: Option<String>,
    pub log_auth_code: Option<String>,
}

pub fn parse() -> CliConfig {
    let cli = Cli::parse();
    CliConfig {
        host: cli.host,
        port: cli.port,
        config: cli.config,
        auth_key: cli.auth_key,
        mongo_url: cli.mongo_url,
        mongo_database: cli.mongo_database,
        log_directory: cli.log_directory,
        log_file_name: cli.log_file_name,
        log_auth_code: cli.log_auth_code,
    }
}
