//! Per-day append-only log files

use std::collections::HashMap;
use std::io::SeekFrom;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Local, NaiveDate};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::fs::OpenOptions;
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tokio::sync::Mutex;

use super::codec::{self, Decoded};
use crate::application::errors::LogError;
use crate::domain::traits::RecordSink;

pub const DEFAULT_IO_TIMEOUT: Duration = Duration::from_secs(2);

const CANONICAL_EXT: &str = "jsonl";
const LEGACY_EXT: &str = "json";

/// One line-delimited JSON file per calendar day, named
/// `<prefix>_YYYY-MM-DD.jsonl`.
///
/// Appends to the same file are serialized through a per-path mutex and
/// bounded by a timeout. Legacy `<prefix>_YYYY-MM-DD.json` files are read
/// before the canonical file of the same day.
pub struct DailyLogStore<R> {
    dir: PathBuf,
    prefix: String,
    io_timeout: Duration,
    locks: Arc<std::sync::Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>>,
    _record: PhantomData<fn() -> R>,
}

impl<R> DailyLogStore<R>
where
    R: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            prefix: prefix.into(),
            io_timeout: DEFAULT_IO_TIMEOUT,
            locks: Arc::new(std::sync::Mutex::new(HashMap::new())),
            _record: PhantomData,
        }
    }

    pub fn with_timeout(mut self, io_timeout: Duration) -> Self {
        self.io_timeout = io_timeout;
        self
    }

    /// Calendar day on the process-local clock
    pub fn today() -> NaiveDate {
        Local::now().date_naive()
    }

    pub fn path_for(&self, date: NaiveDate) -> PathBuf {
        self.file_for(date, CANONICAL_EXT)
    }

    pub fn legacy_path_for(&self, date: NaiveDate) -> PathBuf {
        self.file_for(date, LEGACY_EXT)
    }

    fn file_for(&self, date: NaiveDate, ext: &str) -> PathBuf {
        self.dir
            .join(format!("{}_{}.{}", self.prefix, date.format("%Y-%m-%d"), ext))
    }

    fn lock_for(&self, path: &Path) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        Arc::clone(locks.entry(path.to_path_buf()).or_default())
    }

    /// Append `record` to the file of `date`. Waiting for other writers
    /// counts against the I/O timeout.
    pub async fn append_on(&self, date: NaiveDate, record: &R) -> Result<(), LogError> {
        let line = codec::encode_line(record)?;
        let path = self.path_for(date);
        let lock = self.lock_for(&path);

        let write = async {
            let _guard = lock.lock().await;
            write_line(&path, &line).await
        };
        tokio::time::timeout(self.io_timeout, write)
            .await
            .map_err(|_| LogError::Timeout(self.io_timeout))?
    }

    /// Every recoverable record of `date`, legacy file first. Unreadable
    /// files count as empty.
    pub async fn read_day(&self, date: NaiveDate) -> Vec<R> {
        let mut records = self.read_file(&self.legacy_path_for(date)).await;
        records.extend(self.read_file(&self.path_for(date)).await);
        records
    }

    async fn read_file(&self, path: &Path) -> Vec<R> {
        match self.load(path).await {
            Ok(decoded) => decoded.records,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Unreadable log file, treating as empty");
                Vec::new()
            }
        }
    }

    /// Bounded read and decode of one file; a missing file is empty
    async fn load(&self, path: &Path) -> Result<Decoded<R>, LogError> {
        let bytes = match tokio::time::timeout(self.io_timeout, tokio::fs::read(path)).await {
            Ok(Ok(bytes)) => bytes,
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Ok(Err(e)) => return Err(e.into()),
            Err(_) => return Err(LogError::Timeout(self.io_timeout)),
        };
        Ok(codec::decode(&String::from_utf8_lossy(&bytes)))
    }

    /// Days that have a legacy `.json` file in this store's directory
    pub async fn legacy_days(&self) -> Result<Vec<NaiveDate>, LogError> {
        let mut days = Vec::new();
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(days),
            Err(e) => return Err(e.into()),
        };

        let head = format!("{}_", self.prefix);
        let tail = format!(".{}", LEGACY_EXT);
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            let Some(date) = name
                .strip_prefix(&head)
                .and_then(|rest| rest.strip_suffix(&tail))
                .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
            else {
                continue;
            };
            days.push(date);
        }
        days.sort();
        Ok(days)
    }

    /// Rewrite every legacy day file into its canonical `.jsonl` file.
    /// Returns the number of days migrated.
    ///
    /// A source that decoded cleanly is removed. One with damaged content is
    /// kept next to the result as `<name>.bak` so nothing is destroyed.
    pub async fn migrate_legacy(&self) -> Result<usize, LogError> {
        let days = self.legacy_days().await?;
        for date in &days {
            let path = self.path_for(*date);
            let legacy = self.legacy_path_for(*date);
            let lock = self.lock_for(&path);
            let _guard = lock.lock().await;

            let old = self.load(&legacy).await?;
            let current = self.load(&path).await?;

            let mut content = String::new();
            for record in old.records.iter().chain(&current.records) {
                content.push_str(&codec::encode_line(record)?);
            }

            if !current.is_complete() {
                let backup = backup_path(&path);
                tokio::fs::copy(&path, &backup).await?;
                tracing::warn!(file = %path.display(), backup = %backup.display(), skipped = current.skipped, "Damaged log kept as backup");
            }

            let staging = path.with_extension("jsonl.tmp");
            tokio::fs::write(&staging, content).await?;
            tokio::fs::rename(&staging, &path).await?;

            if old.is_complete() {
                tokio::fs::remove_file(&legacy).await?;
            } else {
                let backup = backup_path(&legacy);
                tokio::fs::rename(&legacy, &backup).await?;
                tracing::warn!(file = %legacy.display(), backup = %backup.display(), skipped = old.skipped, "Damaged legacy log kept as backup");
            }

            tracing::info!(
                file = %legacy.display(),
                records = old.records.len() + current.records.len(),
                "Migrated legacy log"
            );
        }
        Ok(days.len())
    }
}

fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".bak");
    PathBuf::from(name)
}

/// Append one encoded line. A missing trailing newline in the existing file
/// is repaired first so the new record always starts on its own line.
async fn write_line(path: &Path, line: &str) -> Result<(), LogError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let mut file = OpenOptions::new()
        .create(true)
        .read(true)
        .append(true)
        .open(path)
        .await?;

    let mut buf = Vec::with_capacity(line.len() + 1);
    if file.metadata().await?.len() > 0 {
        let mut last = [0u8; 1];
        file.seek(SeekFrom::End(-1)).await?;
        file.read_exact(&mut last).await?;
        if last[0] != b'\n' {
            buf.push(b'\n');
        }
    }
    buf.extend_from_slice(line.as_bytes());

    file.write_all(&buf).await?;
    file.flush().await?;
    Ok(())
}

#[async_trait]
impl<R> RecordSink<R> for DailyLogStore<R>
where
    R: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    async fn append(&self, record: &R) -> Result<(), LogError> {
        self.append_on(Self::today(), record).await
    }
}
