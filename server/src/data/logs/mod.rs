//! File-backed log sink for the Logger API
//!
//! Submitted batches are split into records, routed to a file chosen by the
//! directory template (`SOURCE`, `DATE` and `LEVEL` placeholders) and
//! appended by that file's writer task. Reads walk the fixed prefix of the
//! template and decode every file carrying the configured file name.

pub mod error;
pub mod format;
pub mod record;
mod writer;

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use chrono::Utc;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::sync::mpsc::error::SendError;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::core::config::LogsConfig;
use crate::core::constants::{
    LOG_DATE_FORMAT, LOG_PLACEHOLDER_DATE, LOG_PLACEHOLDER_LEVEL, LOG_PLACEHOLDER_SOURCE,
    LOG_WRITER_CHANNEL_CAPACITY, LOG_WRITER_IDLE_SECS,
};
use crate::utils::crypto::secret_matches;
use crate::utils::string::sanitize_path_segment;

pub use error::LogError;
pub use format::LogFormat;
pub use record::{FieldValue, LogEvent, LogField, LogRecord, RawPayload};

use writer::WriteRequest;

const PLACEHOLDERS: [&str; 3] = [
    LOG_PLACEHOLDER_SOURCE,
    LOG_PLACEHOLDER_DATE,
    LOG_PLACEHOLDER_LEVEL,
];

const PROBE_FILE_NAME: &str = ".write-probe";

/// Fixed leading part of a directory template, before any placeholder.
///
/// `logs/SOURCE/DATE/LEVEL` gives `logs`; a template that starts with a
/// placeholder gives the current directory.
pub fn template_root(template: &str) -> PathBuf {
    let mut root = PathBuf::new();
    for component in Path::new(template).components() {
        if let Component::Normal(segment) = component
            && PLACEHOLDERS
                .iter()
                .any(|p| segment.to_string_lossy().contains(p))
        {
            break;
        }
        root.push(component);
    }
    if root.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        root
    }
}

/// Replace every placeholder in one segment, left to right in a single pass
fn substitute(segment: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(segment.len());
    let mut rest = segment;
    loop {
        let next = values
            .iter()
            .filter_map(|(placeholder, value)| rest.find(placeholder).map(|i| (i, *placeholder, *value)))
            .min_by_key(|(i, _, _)| *i);
        match next {
            Some((i, placeholder, value)) => {
                out.push_str(&rest[..i]);
                out.push_str(value);
                rest = &rest[i + placeholder.len()..];
            }
            None => {
                out.push_str(rest);
                return out;
            }
        }
    }
}

/// Fill the directory template for one record.
///
/// Values are sanitized so each stays a single path segment.
pub fn resolve_directory(template: &str, source: &str, date: &str, level: &str) -> PathBuf {
    let source = sanitize_path_segment(source);
    let date = sanitize_path_segment(date);
    let level = sanitize_path_segment(level);
    let values = [
        (LOG_PLACEHOLDER_SOURCE, source.as_str()),
        (LOG_PLACEHOLDER_DATE, date.as_str()),
        (LOG_PLACEHOLDER_LEVEL, level.as_str()),
    ];

    let mut dir = PathBuf::new();
    for component in Path::new(template).components() {
        match component {
            Component::Normal(segment) => {
                dir.push(substitute(&segment.to_string_lossy(), &values));
            }
            other => dir.push(other),
        }
    }
    dir
}

/// Where and how the Logger API stores records
#[derive(Debug, Clone)]
pub struct LogSettings {
    pub directory: String,
    pub file_name: String,
    pub auth_code: Option<String>,
    /// How long a file stays open without writes
    pub writer_idle: Duration,
}

impl LogSettings {
    pub fn new(directory: String, file_name: &str) -> Self {
        Self {
            directory,
            file_name: file_name.to_string(),
            auth_code: None,
            writer_idle: Duration::from_secs(LOG_WRITER_IDLE_SECS),
        }
    }

    pub fn with_auth_code(mut self, auth_code: impl Into<String>) -> Self {
        self.auth_code = Some(auth_code.into());
        self
    }

    pub fn with_writer_idle(mut self, idle: Duration) -> Self {
        self.writer_idle = idle;
        self
    }
}

impl From<&LogsConfig> for LogSettings {
    fn from(config: &LogsConfig) -> Self {
        Self {
            directory: config.directory.clone(),
            file_name: config.file_name.clone(),
            auth_code: config.auth_code.clone(),
            writer_idle: Duration::from_secs(LOG_WRITER_IDLE_SECS),
        }
    }
}

/// Live writer for one file. `id` tells a retiring writer's entry apart
/// from its replacement.
struct Writer {
    id: u64,
    tx: mpsc::Sender<WriteRequest>,
    task: JoinHandle<()>,
}

type WriterRegistry = DashMap<PathBuf, Writer>;

/// Log ingestion and readback
pub struct LogService {
    settings: LogSettings,
    writers: Arc<WriterRegistry>,
    next_writer_id: AtomicU64,
    closed: AtomicBool,
}

impl LogService {
    pub fn new(settings: LogSettings) -> Self {
        tracing::debug!(
            directory = %settings.directory,
            file_name = %settings.file_name,
            "Log service initialized"
        );
        Self {
            settings,
            writers: Arc::new(DashMap::new()),
            next_writer_id: AtomicU64::new(0),
            closed: AtomicBool::new(false),
        }
    }

    pub fn settings(&self) -> &LogSettings {
        &self.settings
    }

    /// Directory that holds every file this service writes
    pub fn root(&self) -> PathBuf {
        template_root(&self.settings.directory)
    }

    /// Check the `authcode` presented by a submitter
    pub fn authorize(&self, auth_code: Option<&str>) -> bool {
        secret_matches(auth_code, self.settings.auth_code.as_deref())
    }

    /// Target file for a record
    pub fn path_for(&self, record: &LogRecord) -> PathBuf {
        resolve_directory(
            &self.settings.directory,
            record.source(),
            record.date(),
            record.level(),
        )
        .join(&self.settings.file_name)
    }

    /// Store a submitted body and return the number of records written
    pub async fn ingest(&self, body: &[u8], content_type: Option<&str>) -> Result<usize, LogError> {
        let date = Utc::now().format(LOG_DATE_FORMAT).to_string();
        let records = record::records_from_body(body, content_type, &date);
        let count = records.len();

        // Group by target file, keeping submission order within each file
        let mut batches: Vec<(PathBuf, Vec<LogRecord>)> = Vec::new();
        for record in records {
            let path = self.path_for(&record);
            match batches.iter_mut().find(|(p, _)| *p == path) {
                Some((_, batch)) => batch.push(record),
                None => batches.push((path, vec![record])),
            }
        }

        for (path, batch) in batches {
            self.write(path, batch).await?;
        }
        tracing::debug!(count, "Log records stored");
        Ok(count)
    }

    /// Number of files currently held open by writer tasks
    pub fn open_writers(&self) -> usize {
        self.writers.len()
    }

    fn spawn_writer(&self, path: &Path) -> Writer {
        let id = self.next_writer_id.fetch_add(1, Ordering::Relaxed);
        let registry = Arc::clone(&self.writers);
        let key = path.to_path_buf();
        let (tx, task) = writer::spawn(
            path.to_path_buf(),
            LOG_WRITER_CHANNEL_CAPACITY,
            self.settings.writer_idle,
            move || {
                registry.remove_if(&key, |_, writer| writer.id == id);
            },
        );
        Writer { id, tx, task }
    }

    fn sender_for(&self, path: &Path) -> Result<(u64, mpsc::Sender<WriteRequest>), LogError> {
        let writer = match self.writers.entry(path.to_path_buf()) {
            Entry::Occupied(entry) => entry.into_ref(),
            Entry::Vacant(entry) => {
                // Checked under the shard lock so shutdown sees every writer
                if self.closed.load(Ordering::SeqCst) {
                    return Err(LogError::ShutDown);
                }
                entry.insert(self.spawn_writer(path))
            }
        };
        Ok((writer.id, writer.tx.clone()))
    }

    async fn write(&self, path: PathBuf, records: Vec<LogRecord>) -> Result<(), LogError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(LogError::ShutDown);
        }

        let closed = || LogError::WriterClosed(path.display().to_string());
        let (ack, result) = oneshot::channel();
        let mut request = WriteRequest { records, ack };
        let mut retried = false;
        loop {
            let (id, sender) = self.sender_for(&path)?;
            match sender.send(request).await {
                Ok(()) => break,
                Err(SendError(returned)) if !retried => {
                    // Writer retired between lookup and send
                    self.writers.remove_if(&path, |_, writer| writer.id == id);
                    request = returned;
                    retried = true;
                }
                Err(_) => return Err(closed()),
            }
        }
        result.await.map_err(|_| closed())?
    }

    /// Every record found under the log root
    pub async fn list(&self) -> Result<Vec<LogRecord>, LogError> {
        let mut records = Vec::new();
        for path in self.files().await? {
            let bytes = match tokio::fs::read(&path).await {
                Ok(bytes) => bytes,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };
            records.extend(LogFormat::from_path(&path).decode_all(&bytes));
        }
        Ok(records)
    }

    pub async fn get(&self, id: &str) -> Result<Option<LogRecord>, LogError> {
        Ok(self.list().await?.into_iter().find(|r| r.id() == id))
    }

    /// Log files under the root, sorted by path
    async fn files(&self) -> Result<Vec<PathBuf>, LogError> {
        let root = self.root();
        let mut files = Vec::new();
        let mut pending = vec![root];
        while let Some(dir) = pending.pop() {
            let mut entries = match tokio::fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };
            while let Some(entry) = entries.next_entry().await? {
                let file_type = entry.file_type().await?;
                let path = entry.path();
                if file_type.is_dir() {
                    pending.push(path);
                } else if file_type.is_file()
                    && path.file_name().is_some_and(|n| n == self.settings.file_name.as_str())
                {
                    files.push(path);
                }
            }
        }
        files.sort();
        Ok(files)
    }

    /// Create the log root if needed and prove a file can be written there
    pub async fn check_writable(&self) -> Result<PathBuf, LogError> {
        let root = self.root();
        tokio::fs::create_dir_all(&root).await?;
        let probe = root.join(PROBE_FILE_NAME);
        tokio::fs::write(&probe, b"ok").await?;
        tokio::fs::remove_file(&probe).await?;
        Ok(root)
    }

    /// Stop accepting records and wait for every writer to drain
    pub async fn shutdown(&self) {
        self.closed.store(true, Ordering::SeqCst);
        let paths: Vec<PathBuf> = self.writers.iter().map(|e| e.key().clone()).collect();
        // Dropping each registry sender lets its writer drain and exit
        let tasks: Vec<JoinHandle<()>> = paths
            .iter()
            .filter_map(|path| self.writers.remove(path))
            .map(|(_, writer)| writer.task)
            .collect();
        tracing::debug!(count = tasks.len(), "Waiting for log writers to drain");
        for task in tasks {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "Log writer task failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BATCH: &str = r#"{"events":[
        {"Level":"Error","RenderedMessage":"a","Properties":{"Application":"Web"}},
        {"Level":"Information","RenderedMessage":"b","Properties":{"Application":"Web"}},
        {"Level":"Error","RenderedMessage":"c","Properties":{"Application":"Worker"}}
    ]}"#;

    fn service(dir: &Path, file_name: &str) -> LogService {
        let template = dir.join("SOURCE/DATE/LEVEL").to_string_lossy().to_string();
        LogService::new(LogSettings::new(template, file_name).with_auth_code("secret"))
    }

    #[test]
    fn test_template_root() {
        assert_eq!(template_root("logs/SOURCE/DATE/LEVEL"), PathBuf::from("logs"));
        assert_eq!(template_root("/var/log/app-SOURCE"), PathBuf::from("/var/log"));
        assert_eq!(template_root("SOURCE/LEVEL"), PathBuf::from("."));
        assert_eq!(template_root("plain/dir"), PathBuf::from("plain/dir"));
    }

    #[test]
    fn test_resolve_directory() {
        assert_eq!(
            resolve_directory("logs/SOURCE/DATE/LEVEL", "Web", "01-02-2024", "Error"),
            PathBuf::from("logs/Web/01-02-2024/Error")
        );
        assert_eq!(
            resolve_directory("logs/SOURCE-LEVEL", "Web", "d", "Warning"),
            PathBuf::from("logs/Web-Warning")
        );
    }

    #[test]
    fn test_resolve_directory_contains_hostile_source() {
        let dir = resolve_directory("logs/SOURCE/LEVEL", "../../etc", "d", "Error");
        assert_eq!(dir.components().count(), 3);
        assert!(dir.starts_with("logs"));
        assert!(!dir.components().any(|c| c == Component::ParentDir));
    }

    #[test]
    fn test_substitution_is_single_pass() {
        let dir = resolve_directory("SOURCE/LEVEL", "LEVEL", "d", "Error");
        assert_eq!(dir, PathBuf::from("LEVEL/Error"));
    }

    #[test]
    fn test_authorize() {
        let dir = tempfile::tempdir().unwrap();
        let logs = service(dir.path(), "log.json");
        assert!(logs.authorize(Some("secret")));
        assert!(!logs.authorize(Some("wrong")));
        assert!(!logs.authorize(None));

        let open = LogService::new(LogSettings::new("logs".to_string(), "log.json"));
        assert!(!open.authorize(Some("")));
    }

    #[tokio::test]
    async fn test_ingest_routes_by_source_and_level() {
        let dir = tempfile::tempdir().unwrap();
        let logs = service(dir.path(), "log.json");

        assert_eq!(logs.ingest(BATCH.as_bytes(), Some("application/json")).await.unwrap(), 3);

        let date = Utc::now().format(LOG_DATE_FORMAT).to_string();
        let web_errors = dir.path().join("Web").join(&date).join("Error/log.json");
        let bytes = tokio::fs::read(&web_errors).await.unwrap();
        assert_eq!(LogFormat::Json.decode_all(&bytes).len(), 1);
        assert!(dir.path().join("Worker").join(&date).join("Error/log.json").exists());

        logs.shutdown().await;
    }

    #[tokio::test]
    async fn test_records_read_back_in_every_format() {
        for file_name in ["log.txt", "log.json", "log.bin"] {
            let dir = tempfile::tempdir().unwrap();
            let logs = service(dir.path(), file_name);

            logs.ingest(BATCH.as_bytes(), None).await.unwrap();
            logs.ingest(b"not a batch", Some("text/plain")).await.unwrap();

            let records = logs.list().await.unwrap();
            assert_eq!(records.len(), 4, "{file_name}");
            let raw = records
                .iter()
                .find(|r| matches!(r, LogRecord::Raw(_)))
                .unwrap();
            assert_eq!(
                logs.get(raw.id()).await.unwrap().as_ref(),
                Some(raw),
                "{file_name}"
            );
            logs.shutdown().await;
        }
    }

    #[tokio::test]
    async fn test_get_unknown_id() {
        let dir = tempfile::tempdir().unwrap();
        let logs = service(dir.path(), "log.json");
        assert!(logs.get("missing").await.unwrap().is_none());
        assert!(logs.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_ingest_after_shutdown_fails() {
        let dir = tempfile::tempdir().unwrap();
        let logs = service(dir.path(), "log.json");
        logs.shutdown().await;
        assert!(matches!(
            logs.ingest(BATCH.as_bytes(), None).await,
            Err(LogError::ShutDown)
        ));
    }

    #[tokio::test]
    async fn test_check_writable_creates_root() {
        let dir = tempfile::tempdir().unwrap();
        let logs = service(&dir.path().join("nested"), "log.json");
        let root = logs.check_writable().await.unwrap();
        assert!(root.is_dir());
        assert!(!root.join(PROBE_FILE_NAME).exists());
    }

    fn batch_from(application: &str) -> String {
        format!(
            r#"{{"events":[{{"Level":"Error","RenderedMessage":"m","Properties":{{"Application":"{application}"}}}}]}}"#
        )
    }

    async fn wait_for_idle_writers(logs: &LogService) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while logs.open_writers() > 0 {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_idle_writers_are_released() {
        let dir = tempfile::tempdir().unwrap();
        let template = dir.path().join("SOURCE/DATE/LEVEL").to_string_lossy().to_string();
        let logs = LogService::new(
            LogSettings::new(template, "log.json").with_writer_idle(Duration::from_millis(20)),
        );

        for i in 0..50 {
            logs.ingest(batch_from(&format!("App{i}")).as_bytes(), None)
                .await
                .unwrap();
        }
        wait_for_idle_writers(&logs).await;

        // A retired file gets a fresh writer that appends to it
        logs.ingest(batch_from("App0").as_bytes(), None).await.unwrap();
        assert_eq!(logs.list().await.unwrap().len(), 51);
        logs.shutdown().await;
    }

    #[tokio::test]
    async fn test_write_retries_past_a_retired_writer() {
        let dir = tempfile::tempdir().unwrap();
        let logs = service(dir.path(), "log.json");
        let record = record::records_from_body(batch_from("Web").as_bytes(), None, "01-01-2024")
            .remove(0);
        let path = logs.path_for(&record);

        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        logs.writers.insert(
            path.clone(),
            Writer {
                id: u64::MAX,
                tx,
                task: tokio::spawn(async {}),
            },
        );

        logs.write(path.clone(), vec![record]).await.unwrap();
        assert_ne!(logs.writers.get(&path).unwrap().id, u64::MAX);
        logs.shutdown().await;
        assert_eq!(logs.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_shutdown_joins_every_writer() {
        let dir = tempfile::tempdir().unwrap();
        let logs = service(dir.path(), "log.json");
        logs.ingest(BATCH.as_bytes(), None).await.unwrap();
        assert_eq!(logs.open_writers(), 3);

        logs.shutdown().await;
        assert_eq!(logs.open_writers(), 0);
        assert!(matches!(
            logs.ingest(batch_from("Late").as_bytes(), None).await,
            Err(LogError::ShutDown)
        ));
        assert_eq!(logs.open_writers(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_ingest_keeps_every_record() {
        let dir = tempfile::tempdir().unwrap();
        let logs = std::sync::Arc::new(service(dir.path(), "log.bin"));

        let tasks: Vec<_> = (0..10)
            .map(|_| {
                let logs = logs.clone();
                tokio::spawn(async move { logs.ingest(BATCH.as_bytes(), None).await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        assert_eq!(logs.list().await.unwrap().len(), 30);
        logs.shutdown().await;
    }
}
