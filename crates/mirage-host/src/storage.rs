//! Persisted codec benchmark record (§6 "Persisted state").
//!
//! The only disk-persistent state the core owns: the result of the codec
//! micro-benchmark run during a quality probe (§4.8), cached so a later
//! probe can skip re-measuring an unchanged host. Written atomically
//! (write-to-temp, then rename) to the platform cache directory.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{HostError, Result};

/// On-disk record of the last codec micro-benchmark run on this host.
///
/// `host_encode_ms`/`client_decode_ms` are `None` until both halves of the
/// micro-benchmark (§4.8 step 2) have reported in at least once.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CodecBenchmarkRecord {
    /// Record format version, bumped if the schema changes.
    pub version: u32,
    /// Synthetic clip width the benchmark ran at.
    pub width: u32,
    /// Synthetic clip height the benchmark ran at.
    pub height: u32,
    /// Synthetic clip frame rate the benchmark ran at.
    pub frame_rate: u32,
    /// Host encode time, milliseconds, averaged over the benchmark clip.
    pub host_encode_ms: Option<f32>,
    /// Client decode time, milliseconds, averaged over the benchmark clip.
    pub client_decode_ms: Option<f32>,
    /// Unix epoch milliseconds when this record was measured.
    pub measured_at: u64,
}

/// Current on-disk schema version.
pub const RECORD_VERSION: u32 = 1;

/// Cache subdirectory name under the platform cache directory.
const CACHE_SUBDIR: &str = "mirage";

/// File name of the persisted record within [`CACHE_SUBDIR`].
const RECORD_FILE_NAME: &str = "codec_benchmark.cbor";

/// Resolve the path the record is read from and written to:
/// `<platform cache dir>/mirage/codec_benchmark.cbor`.
///
/// Returns `None` if the platform has no well-known cache directory
/// (headless/CI environments), in which case the caller should simply skip
/// persistence for the session.
#[must_use]
pub fn default_record_path() -> Option<PathBuf> {
    dirs::cache_dir().map(|dir| dir.join(CACHE_SUBDIR).join(RECORD_FILE_NAME))
}

impl CodecBenchmarkRecord {
    /// Load the record at `path`, if one exists.
    ///
    /// A missing file is not an error: it returns `Ok(None)`, the normal
    /// first-run state. A present but undecodable file is reported as
    /// [`HostError::CorruptBenchmarkRecord`] rather than silently discarded,
    /// since a corrupt cache usually means a concurrent writer stomped on
    /// a partial write from a prior crash before the atomic rename, which
    /// is worth surfacing.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(HostError::Storage(err)),
        };
        ciborium::from_reader(bytes.as_slice())
            .map(Some)
            .map_err(|err| HostError::CorruptBenchmarkRecord(err.to_string()))
    }

    /// Atomically persist this record to `path`: encode to a sibling temp
    /// file, then rename over the destination. A reader never observes a
    /// partially written file, and a crash mid-write leaves only the stray
    /// temp file rather than a corrupt record.
    pub fn save(&self, path: &Path) -> Result<()> {
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(dir).map_err(HostError::Storage)?;

        let mut body = Vec::new();
        ciborium::into_writer(self, &mut body)
            .map_err(|err| HostError::CorruptBenchmarkRecord(err.to_string()))?;

        let tmp_path = dir.join(format!("{RECORD_FILE_NAME}.tmp"));
        std::fs::write(&tmp_path, &body).map_err(HostError::Storage)?;
        std::fs::rename(&tmp_path, path).map_err(HostError::Storage)?;

        exclude_from_backups(path);
        Ok(())
    }
}

/// Best-effort hint that `path` should be excluded from platform backup
/// systems (Time Machine's `com.apple.metadata:com_apple_backup_excludeItem`
/// extended attribute on macOS). The benchmark record is cheap to
/// regenerate and carries no user data, so it shouldn't consume backup
/// storage; failure to set the attribute (non-macOS platforms, or a
/// filesystem without xattr support) is not an error.
fn exclude_from_backups(_path: &Path) {
    #[cfg(target_os = "macos")]
    {
        let _ = xattr::set(
            _path,
            "com.apple.metadata:com_apple_backup_excludeItem",
            b"com.apple.backupd",
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> CodecBenchmarkRecord {
        CodecBenchmarkRecord {
            version: RECORD_VERSION,
            width: 1920,
            height: 1080,
            frame_rate: 60,
            host_encode_ms: Some(6.4),
            client_decode_ms: Some(3.1),
            measured_at: 1_700_000_000_000,
        }
    }

    #[test]
    fn missing_file_loads_as_none() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nope").join(RECORD_FILE_NAME);
        assert_eq!(CodecBenchmarkRecord::load(&path).expect("load"), None);
    }

    #[test]
    fn round_trips_through_atomic_save() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(RECORD_FILE_NAME);
        let record = sample();

        record.save(&path).expect("save");
        let loaded = CodecBenchmarkRecord::load(&path).expect("load").expect("present");
        assert_eq!(loaded, record);
    }

    #[test]
    fn save_overwrites_without_leaving_temp_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(RECORD_FILE_NAME);

        sample().save(&path).expect("first save");
        let mut second = sample();
        second.measured_at += 1000;
        second.save(&path).expect("second save");

        let loaded = CodecBenchmarkRecord::load(&path).expect("load").expect("present");
        assert_eq!(loaded, second);
        assert!(!dir.path().join(format!("{RECORD_FILE_NAME}.tmp")).exists());
    }

    #[test]
    fn corrupt_file_is_reported_not_discarded() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(RECORD_FILE_NAME);
        std::fs::write(&path, b"not cbor").expect("write garbage");

        let err = CodecBenchmarkRecord::load(&path).expect_err("should fail to decode");
        assert!(matches!(err, HostError::CorruptBenchmarkRecord(_)));
    }
}
