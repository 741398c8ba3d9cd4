use crate::error::LogTagError;
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Destination for a rendered report
pub trait ReportWriter {
    fn write_report(&mut self, text: &str) -> io::Result<()>;
}

/// Writes the report to standard output
pub struct ConsoleWriter;

impl ReportWriter for ConsoleWriter {
    fn write_report(&mut self, text: &str) -> io::Result<()> {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        writeln!(handle, "{text}")
    }
}

/// Writes the report to a file, followed by a newline
pub struct FileWriter {
    path: PathBuf,
    file: File,
}

impl FileWriter {
    /// Creates (or truncates) the output file
    pub fn new(path: &Path) -> Result<Self, LogTagError> {
        let file = File::create(path).map_err(|source| LogTagError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ReportWriter for FileWriter {
    fn write_report(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.file, "{text}")?;
        self.file.flush()
    }
}

/// Write to the console. A reader that closed the pipe early is not an error.
fn print_report(writer: &mut impl ReportWriter, text: &str) -> Result<(), LogTagError> {
    match writer.write_report(text) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {
            tracing::debug!(error = %e, "stdout closed");
            Ok(())
        }
        Err(source) => Err(LogTagError::Write {
            path: PathBuf::from("<stdout>"),
            source,
        }),
    }
}

/// Print unless `hidden`, and copy to `out` when given.
pub fn emit_report(text: &str, hidden: bool, out: Option<&Path>) -> Result<(), LogTagError> {
    if !hidden {
        print_report(&mut ConsoleWriter, text)?;
    }

    if let Some(path) = out {
        let mut writer = FileWriter::new(path)?;
        writer
            .write_report(text)
            .map_err(|source| LogTagError::Write {
                path: writer.path().to_path_buf(),
                source,
            })?;
        tracing::info!(path = %path.display(), "wrote report");
    }

    Ok(())
}
