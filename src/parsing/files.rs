use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;

use super::ParseError;
use crate::utils::validation::is_gzipped;

/// Opens files by identifier
pub trait FileStore {
    /// Open `file_id` for reading, decompressed
    ///
    /// # Errors
    ///
    /// Returns `ParseError::Io` if the file cannot be opened.
    fn open(&self, file_id: &str) -> Result<Box<dyn Read>, ParseError>;

    /// Read `file_id` fully into a string
    ///
    /// # Errors
    ///
    /// Returns `ParseError::Io` if the file cannot be read or is not UTF-8.
    fn read_to_string(&self, file_id: &str) -> Result<String, ParseError> {
        let mut content = String::new();
        self.open(file_id)?.read_to_string(&mut content)?;
        Ok(content)
    }
}

/// File identifiers are paths, optionally relative to a root directory
#[derive(Debug, Clone, Default)]
pub struct LocalFileStore {
    root: Option<PathBuf>,
}

impl LocalFileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve relative identifiers against `root`
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    fn resolve(&self, file_id: &str) -> PathBuf {
        let path = Path::new(file_id);
        match &self.root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        }
    }
}

impl FileStore for LocalFileStore {
    fn open(&self, file_id: &str) -> Result<Box<dyn Read>, ParseError> {
        let path = self.resolve(file_id);
        let file = File::open(&path)?;
        if is_gzipped(&path) {
            Ok(Box::new(BufReader::new(GzDecoder::new(file))))
        } else {
            Ok(Box::new(BufReader::new(file)))
        }
    }
}
