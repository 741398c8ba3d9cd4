use crate::error::LogTagError;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

/// One line of a log file, without its line terminator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    pub file: PathBuf,
    pub text: String,
}

impl LogLine {
    pub fn new(file: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            text: text.into(),
        }
    }
}

/// Expand glob patterns into concrete files, keeping pattern order.
///
/// Patterns that match nothing are skipped; only an invalid pattern is an error.
pub fn expand_patterns<S: AsRef<str>>(patterns: &[S]) -> Result<Vec<PathBuf>, LogTagError> {
    let mut files = Vec::new();

    for pattern in patterns {
        let pattern = pattern.as_ref();
        let paths = glob::glob(pattern).map_err(|e| LogTagError::Glob {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;

        let before = files.len();
        for entry in paths {
            match entry {
                Ok(path) if path.is_file() => files.push(path),
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(pattern, error = %e, "skipping unreadable path");
                }
            }
        }
        if files.len() == before {
            tracing::warn!(pattern, "pattern matched no files");
        }
    }

    Ok(files)
}

/// Read a file as UTF-8 text, one `LogLine` per line.
pub fn read_log_file(path: &Path) -> Result<Vec<LogLine>, LogTagError> {
    let read_err = |source| LogTagError::Read {
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).map_err(read_err)?;
    let reader = BufReader::new(file);
    let mut lines = Vec::new();

    for line in reader.lines() {
        let line = line.map_err(read_err)?;
        lines.push(LogLine::new(path, line));
    }

    Ok(lines)
}

/// Read every file in order, concatenating their lines.
pub fn read_log_files(files: &[PathBuf]) -> Result<Vec<LogLine>, LogTagError> {
    let mut all = Vec::new();
    for file in files {
        let mut lines = read_log_file(file)?;
        tracing::debug!(file = %file.display(), lines = lines.len(), "read log file");
        all.append(&mut lines);
    }
    Ok(all)
}

/// Order lines by their text. Lines with equal text keep their file order.
pub fn sort_lines(lines: &mut [LogLine]) {
    lines.sort_by(|a, b| a.text.cmp(&b.text));
}
