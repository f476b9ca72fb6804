//! Ranged, read-only access over an immutable byte source.
//!
//! Every decoder stage reads through [`ByteSource`]: a randomly-readable
//! source of known total size. Implementations must support being invoked
//! many times without holding the whole source in memory; the decoder reads
//! in bounded chunks precisely so large files never need a full in-memory
//! copy.

use crate::{Result, TelemetryError};
use std::path::{Path, PathBuf};
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio::sync::Mutex;

/// Randomly-readable, immutable byte source of known size.
///
/// The two required operations mirror the file-access collaborator boundary:
/// `size()` and `read_range(offset, length)`. A read past the end of the
/// source fails with [`TelemetryError::OutOfRange`]; a failed read is
/// terminal for the decode that issued it.
#[async_trait::async_trait]
pub trait ByteSource: Send + Sync {
    /// Total size of the source in bytes.
    fn size(&self) -> u64;

    /// Read exactly `length` bytes starting at `offset`.
    async fn read_range(&self, offset: u64, length: u64) -> Result<Vec<u8>>;
}

fn check_range(offset: u64, length: u64, size: u64) -> Result<()> {
    let end = offset.checked_add(length).ok_or(TelemetryError::OutOfRange {
        offset,
        length,
        size,
    })?;
    if end > size {
        return Err(TelemetryError::OutOfRange { offset, length, size });
    }
    Ok(())
}

/// In-memory byte source over an owned buffer.
///
/// Used by tests and by hosts that already hold the file bytes (for example
/// after an upload).
#[derive(Debug, Clone)]
pub struct MemorySource {
    data: Vec<u8>,
}

impl MemorySource {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }
}

#[async_trait::async_trait]
impl ByteSource for MemorySource {
    fn size(&self) -> u64 {
        self.data.len() as u64
    }

    async fn read_range(&self, offset: u64, length: u64) -> Result<Vec<u8>> {
        check_range(offset, length, self.size())?;
        let start = offset as usize;
        let end = start + length as usize;
        Ok(self.data[start..end].to_vec())
    }
}

/// File-backed byte source using positioned reads.
///
/// The file handle is seeked per read under a lock; the file contents are
/// never loaded wholesale.
pub struct FileSource {
    file: Mutex<tokio::fs::File>,
    path: PathBuf,
    size: u64,
}

impl FileSource {
    /// Open a telemetry file for ranged reading.
    pub async fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = tokio::fs::File::open(&path)
            .await
            .map_err(|e| TelemetryError::file_error(path.clone(), e))?;
        let metadata =
            file.metadata().await.map_err(|e| TelemetryError::file_error(path.clone(), e))?;
        Ok(Self { file: Mutex::new(file), path, size: metadata.len() })
    }

    /// Path the source was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait::async_trait]
impl ByteSource for FileSource {
    fn size(&self) -> u64 {
        self.size
    }

    async fn read_range(&self, offset: u64, length: u64) -> Result<Vec<u8>> {
        check_range(offset, length, self.size)?;
        let mut buf = vec![0u8; length as usize];
        let mut file = self.file.lock().await;
        file.seek(std::io::SeekFrom::Start(offset))
            .await
            .map_err(|e| TelemetryError::file_error(self.path.clone(), e))?;
        file.read_exact(&mut buf)
            .await
            .map_err(|e| TelemetryError::file_error(self.path.clone(), e))?;
        Ok(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_source_reads_exact_range() {
        let source = MemorySource::new((0u8..=9).collect());
        assert_eq!(source.size(), 10);

        let bytes = source.read_range(3, 4).await.unwrap();
        assert_eq!(bytes, vec![3, 4, 5, 6]);

        let all = source.read_range(0, 10).await.unwrap();
        assert_eq!(all.len(), 10);
    }

    #[tokio::test]
    async fn memory_source_rejects_out_of_range() {
        let source = MemorySource::new(vec![0u8; 16]);

        let err = source.read_range(10, 7).await.unwrap_err();
        assert!(matches!(err, TelemetryError::OutOfRange { offset: 10, length: 7, size: 16 }));

        // Offset exactly at the end with zero length is still in range
        assert!(source.read_range(16, 0).await.is_ok());
    }

    #[tokio::test]
    async fn memory_source_rejects_overflowing_range() {
        let source = MemorySource::new(vec![0u8; 4]);
        let err = source.read_range(u64::MAX, 2).await.unwrap_err();
        assert!(matches!(err, TelemetryError::OutOfRange { .. }));
    }
}
