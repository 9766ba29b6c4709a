//! File I/O Module
//!
//! Streams program files line by line so large programs never need to be
//! held in memory.

use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::time::Instant;

use reliefkit_core::ProgramReadError;

/// Buffer size for reading large files (256 KB)
const READ_BUFFER_SIZE: usize = 256 * 1024;

/// File read statistics
#[derive(Debug, Clone, PartialEq)]
pub struct FileReadStats {
    /// Total lines read
    pub lines_read: usize,
    /// Time taken to read (milliseconds)
    pub read_time_ms: u64,
}

/// G-code file reader with streaming support
#[derive(Debug, Clone)]
pub struct GcodeFileReader {
    path: PathBuf,
    file_size: u64,
}

impl GcodeFileReader {
    /// Create a new G-code file reader
    ///
    /// # Errors
    /// Returns error if file does not exist or cannot be accessed
    pub fn new(path: impl AsRef<Path>) -> Result<Self, ProgramReadError> {
        let path = path.as_ref().to_path_buf();

        if !path.is_file() {
            return Err(ProgramReadError::NotFound { path });
        }

        let metadata = fs::metadata(&path).map_err(|e| ProgramReadError::Io {
            path: path.clone(),
            line_number: 0,
            reason: e.to_string(),
        })?;

        Ok(Self {
            path,
            file_size: metadata.len(),
        })
    }

    /// Get file size in bytes
    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    /// Get file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read file with line-by-line streaming callback
    ///
    /// The callback receives the 1-based line number and the line without
    /// its terminator.
    ///
    /// # Errors
    /// Returns error if the file cannot be opened or a line cannot be
    /// decoded; `line_number` is the last line read successfully.
    pub fn read_lines<F>(&self, mut callback: F) -> Result<FileReadStats, ProgramReadError>
    where
        F: FnMut(usize, &str),
    {
        let start_time = Instant::now();
        let io_error = |line_number: usize, e: std::io::Error| ProgramReadError::Io {
            path: self.path.clone(),
            line_number,
            reason: e.to_string(),
        };

        let file = File::open(&self.path).map_err(|e| io_error(0, e))?;
        let reader = BufReader::with_capacity(READ_BUFFER_SIZE, file);

        let mut lines_read = 0usize;

        for line_result in reader.lines() {
            let line = line_result.map_err(|e| io_error(lines_read, e))?;
            lines_read += 1;
            callback(lines_read, &line);
        }

        Ok(FileReadStats {
            lines_read,
            read_time_ms: start_time.elapsed().as_millis() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_file() {
        let result = GcodeFileReader::new("/no/such/program.gcode");
        assert!(matches!(result, Err(ProgramReadError::NotFound { .. })));
    }

    #[test]
    fn test_directory_is_not_a_program() {
        let dir = tempfile::tempdir().unwrap();
        assert!(GcodeFileReader::new(dir.path()).is_err());
    }

    #[test]
    fn test_read_lines_numbers_from_one() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "G21").unwrap();
        writeln!(file, "; comment").unwrap();
        writeln!(file, "G0 Z5").unwrap();

        let reader = GcodeFileReader::new(file.path()).unwrap();
        let mut seen = Vec::new();
        let stats = reader
            .read_lines(|n, line| seen.push((n, line.to_string())))
            .unwrap();

        assert_eq!(stats.lines_read, 3);
        assert_eq!(seen[0], (1, "G21".to_string()));
        assert_eq!(seen[2], (3, "G0 Z5".to_string()));
        assert_eq!(reader.file_size(), 20);
    }

    #[test]
    fn test_crlf_lines_are_trimmed() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"G21\r\nG0 Z5\r\n").unwrap();

        let reader = GcodeFileReader::new(file.path()).unwrap();
        let mut seen = Vec::new();
        let stats = reader.read_lines(|_, line| seen.push(line.to_string())).unwrap();
        assert_eq!(stats.lines_read, 2);
        assert_eq!(seen, vec!["G21".to_string(), "G0 Z5".to_string()]);
    }

    #[test]
    fn test_invalid_utf8_reports_line() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"G21\nG0 X\xff\xfe\n").unwrap();

        let reader = GcodeFileReader::new(file.path()).unwrap();
        let result = reader.read_lines(|_, _| {});
        assert!(matches!(
            result,
            Err(ProgramReadError::Io { line_number: 1, .. })
        ));
    }
}
