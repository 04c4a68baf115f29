//! Tails the client log: waits for filesystem notifications on its
//! directory, lets a burst of writes settle, then reads what was appended.

use std::io::{ErrorKind, SeekFrom};
use std::path::{Path, PathBuf};

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use thiserror::Error;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio::sync::mpsc;
use tokio::time::{Duration, sleep};

#[derive(Debug, Error)]
pub enum WatchError {
    #[error("log directory {0} does not exist")]
    MissingPath(PathBuf),

    #[error("file watcher: {0}")]
    Notify(#[from] notify::Error),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Bytes read in one pass. `truncated` is set when the file had shrunk
/// below the stored offset and was read again from the start.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct LogChunk {
    pub bytes: Vec<u8>,
    pub truncated: bool,
}

pub struct LogWatcher {
    path: PathBuf,
    offset: u64,
    debounce: Duration,
    events: mpsc::UnboundedReceiver<notify::Result<Event>>,
    // Dropping the watcher stops notifications.
    _watcher: RecommendedWatcher,
}

impl LogWatcher {
    /// Watch `path`. The file itself may not exist yet but its directory must.
    pub fn new(path: impl Into<PathBuf>, debounce: Duration) -> Result<Self, WatchError> {
        let path = path.into();
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        if !dir.is_dir() {
            return Err(WatchError::MissingPath(dir));
        }

        let (sender, events) = mpsc::unbounded_channel();
        let mut watcher = notify::recommended_watcher(move |result| {
            if sender.send(result).is_err() {
                tracing::debug!("log watcher receiver dropped");
            }
        })?;
        watcher.watch(&dir, RecursiveMode::NonRecursive)?;
        tracing::info!(path = %path.display(), "watching log");

        Ok(Self {
            path,
            offset: 0,
            debounce,
            events,
            _watcher: watcher,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Skip whatever the log already holds.
    pub async fn start_at_end(&mut self) -> Result<(), WatchError> {
        self.offset = match tokio::fs::metadata(&self.path).await {
            Ok(meta) => meta.len(),
            Err(err) if err.kind() == ErrorKind::NotFound => 0,
            Err(err) => return Err(self.io_error(err)),
        };
        Ok(())
    }

    pub fn start_at_beginning(&mut self) {
        self.offset = 0;
    }

    /// Wait for the log to grow and return the new bytes. `None` once the
    /// watcher has shut down.
    pub async fn next_chunk(&mut self) -> Option<Result<LogChunk, WatchError>> {
        loop {
            let first = self.events.recv().await?;
            let mut relevant = self.is_relevant(first);

            sleep(self.debounce).await;
            while let Ok(event) = self.events.try_recv() {
                relevant |= self.is_relevant(event);
            }
            if !relevant {
                continue;
            }

            match self.read_appended().await {
                Ok(chunk) if chunk.bytes.is_empty() && !chunk.truncated => continue,
                result => return Some(result),
            }
        }
    }

    fn is_relevant(&self, result: notify::Result<Event>) -> bool {
        match result {
            Ok(event) => {
                matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_))
                    && event
                        .paths
                        .iter()
                        .any(|p| p.file_name() == self.path.file_name())
            }
            Err(err) => {
                tracing::warn!(error = %err, "log watcher error");
                false
            }
        }
    }

    /// Read everything past the stored offset. A file shorter than the
    /// offset was truncated or replaced and is read from the start.
    pub async fn read_appended(&mut self) -> Result<LogChunk, WatchError> {
        let mut file = match File::open(&self.path).await {
            Ok(file) => file,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(LogChunk::default()),
            Err(err) => return Err(self.io_error(err)),
        };

        let length = match file.metadata().await {
            Ok(meta) => meta.len(),
            Err(err) => return Err(self.io_error(err)),
        };
        let truncated = length < self.offset;
        if truncated {
            tracing::info!(path = %self.path.display(), "log truncated, reading from start");
            self.offset = 0;
        }

        let mut bytes = Vec::with_capacity((length - self.offset) as usize);
        let read = async {
            file.seek(SeekFrom::Start(self.offset)).await?;
            file.read_to_end(&mut bytes).await
        }
        .await;
        if let Err(err) = read {
            return Err(self.io_error(err));
        }

        self.offset += bytes.len() as u64;
        Ok(LogChunk { bytes, truncated })
    }

    fn io_error(&self, source: std::io::Error) -> WatchError {
        WatchError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Write;

    fn watcher_for(dir: &tempfile::TempDir) -> LogWatcher {
        LogWatcher::new(dir.path().join("Power.log"), Duration::from_millis(10)).unwrap()
    }

    #[tokio::test]
    async fn missing_directory_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let result = LogWatcher::new(dir.path().join("nope").join("Power.log"), Duration::ZERO);
        assert!(matches!(result, Err(WatchError::MissingPath(_))));
    }

    #[tokio::test]
    async fn reads_only_appended_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let mut watcher = watcher_for(&dir);
        let path = watcher.path().to_path_buf();

        assert!(watcher.read_appended().await.unwrap().bytes.is_empty());

        fs::write(&path, "first\n").unwrap();
        let chunk = watcher.read_appended().await.unwrap();
        assert_eq!(chunk.bytes, b"first\n");
        assert!(!chunk.truncated);

        let mut file = fs::OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(b"second\n").unwrap();
        assert_eq!(watcher.read_appended().await.unwrap().bytes, b"second\n");
        assert_eq!(watcher.offset(), 13);
        assert!(watcher.read_appended().await.unwrap().bytes.is_empty());
    }

    #[tokio::test]
    async fn truncation_restarts_from_zero() {
        let dir = tempfile::tempdir().unwrap();
        let mut watcher = watcher_for(&dir);
        let path = watcher.path().to_path_buf();

        fs::write(&path, "a long first session\n").unwrap();
        watcher.read_appended().await.unwrap();

        fs::write(&path, "new\n").unwrap();
        let chunk = watcher.read_appended().await.unwrap();
        assert_eq!(chunk.bytes, b"new\n");
        assert!(chunk.truncated);
        assert_eq!(watcher.offset(), 4);
    }

    #[tokio::test]
    async fn start_at_end_skips_history() {
        let dir = tempfile::tempdir().unwrap();
        let mut watcher = watcher_for(&dir);
        let path = watcher.path().to_path_buf();

        watcher.start_at_end().await.unwrap();
        assert_eq!(watcher.offset(), 0);

        fs::write(&path, "old game\n").unwrap();
        watcher.start_at_end().await.unwrap();
        assert!(watcher.read_appended().await.unwrap().bytes.is_empty());

        watcher.start_at_beginning();
        let chunk = watcher.read_appended().await.unwrap();
        assert_eq!(chunk.bytes, b"old game\n");
        assert!(!chunk.truncated);
    }
}
