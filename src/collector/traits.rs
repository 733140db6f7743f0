//! Abstractions for filesystem access to enable testing and mocking.
//!
//! The `FileSystem` trait lets the stats provider read the real `/proc`
//! filesystem on Linux or a mock implementation in tests and on platforms
//! without one.

use std::io;
use std::path::Path;

/// Abstraction for filesystem operations.
pub trait FileSystem: Send + Sync {
    /// Reads the entire contents of a file as a string.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;
}

/// Real filesystem implementation that delegates to `std::fs`.
///
/// Use this in production to read from the actual `/proc` filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct RealFs;

impl RealFs {
    /// Creates a new `RealFs` instance.
    pub fn new() -> Self {
        Self
    }
}

impl FileSystem for RealFs {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_real_fs_read_to_string() {
        let fs = RealFs::new();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "MemTotal: 1024 kB\n").unwrap();
        let content = fs.read_to_string(file.path()).unwrap();
        assert_eq!(content, "MemTotal: 1024 kB\n");
    }

    #[test]
    fn test_real_fs_missing_file_is_an_error() {
        let fs = RealFs::new();
        let err = fs
            .read_to_string(Path::new("/nonexistent/path/12345"))
            .unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
    }
}
