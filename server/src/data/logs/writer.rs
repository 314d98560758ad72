//! Per-file writer task
//!
//! Each target file is owned by one task. Callers send batches through an
//! mpsc channel and wait on a oneshot for the write result. The task exits
//! once every sender is dropped, or after sitting idle for too long, and in
//! both cases drains what is already queued first.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use super::error::LogError;
use super::format::LogFormat;
use super::record::LogRecord;

/// A batch to append, plus the channel the result is reported on
pub struct WriteRequest {
    pub records: Vec<LogRecord>,
    pub ack: oneshot::Sender<Result<(), LogError>>,
}

/// Spawn the writer task for `path`.
///
/// `on_exit` runs after the file is closed, whatever ended the task.
pub fn spawn<F>(
    path: PathBuf,
    capacity: usize,
    idle: Duration,
    on_exit: F,
) -> (mpsc::Sender<WriteRequest>, JoinHandle<()>)
where
    F: FnOnce() + Send + 'static,
{
    let (tx, rx) = mpsc::channel(capacity);
    let handle = tokio::spawn(async move {
        run(path, rx, idle).await;
        on_exit();
    });
    (tx, handle)
}

async fn run(path: PathBuf, mut rx: mpsc::Receiver<WriteRequest>, idle: Duration) {
    let format = LogFormat::from_path(&path);
    let mut file: Option<File> = None;
    tracing::debug!(path = %path.display(), ?format, "Log writer started");

    loop {
        let request = match tokio::time::timeout(idle, rx.recv()).await {
            Ok(Some(request)) => request,
            Ok(None) => break,
            Err(_) => {
                // New sends fail from here on; buffered ones still drain
                rx.close();
                tracing::debug!(path = %path.display(), "Log writer idle, retiring");
                continue;
            }
        };
        let result = append(&path, format, &mut file, &request.records).await;
        if let Err(e) = &result {
            tracing::error!(path = %path.display(), error = %e, "Failed to write log records");
            // Reopen on the next batch
            file = None;
        }
        // Caller may have gone away; the records are on disk either way
        let _ = request.ack.send(result);
    }

    if let Some(mut f) = file
        && let Err(e) = f.flush().await
    {
        tracing::warn!(path = %path.display(), error = %e, "Failed to flush log file");
    }
    tracing::debug!(path = %path.display(), "Log writer stopped");
}

async fn open(path: &Path) -> Result<File, LogError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).await?;
    }
    Ok(OpenOptions::new().create(true).append(true).open(path).await?)
}

async fn append(
    path: &Path,
    format: LogFormat,
    file: &mut Option<File>,
    records: &[LogRecord],
) -> Result<(), LogError> {
    let mut buf = Vec::new();
    for record in records {
        buf.extend(format.encode(record)?);
    }

    let f = match file {
        Some(f) => f,
        None => file.insert(open(path).await?),
    };
    f.write_all(&buf).await?;
    f.flush().await?;
    Ok(())
}
