//! Reader error log: skipped rows, grouped per source file.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error_handling::LoadError;

/// Destination for skipped-row messages during one load.
///
/// Opening truncates the file; each source file with errors then appends a
/// `==<path>==` header followed by one line per error.
pub(crate) struct ReaderErrorLog {
    target: Option<(PathBuf, BufWriter<File>)>,
}

impl ReaderErrorLog {
    pub(crate) fn open(path: Option<&Path>) -> Result<Self, LoadError> {
        let target = match path {
            Some(path) => {
                let file = File::create(path).map_err(|source| LoadError::Io {
                    path: path.to_path_buf(),
                    source,
                })?;
                Some((path.to_path_buf(), BufWriter::new(file)))
            }
            None => None,
        };
        Ok(Self { target })
    }

    pub(crate) fn append(&mut self, source_file: &Path, errors: &[String]) -> Result<(), LoadError> {
        let Some((path, writer)) = self.target.as_mut() else {
            return Ok(());
        };
        if errors.is_empty() {
            return Ok(());
        }

        let io_error = |source| LoadError::Io {
            path: path.clone(),
            source,
        };
        writeln!(writer, "=={}==", source_file.display()).map_err(io_error)?;
        for error in errors {
            writeln!(writer, "{}", error).map_err(io_error)?;
        }
        writer.flush().map_err(io_error)
    }
}
