use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentErrorCode {
    ReadFile,
    XmlMalformed,
    InvalidRoot,
    UnknownElement,
    UnknownAttribute,
    MissingAttribute,
    MissingElement,
    DuplicateElement,
    InvalidValue,
    JsonMalformed,
    InvalidImageRef,
    InvalidLayout,
}

#[derive(Debug, Clone)]
pub struct ContentLoadError {
    pub code: ContentErrorCode,
    pub message: String,
    pub file_path: PathBuf,
    pub location: Option<SourceLocation>,
}

impl ContentLoadError {
    pub(crate) fn new(code: ContentErrorCode, message: String, file_path: &Path) -> Self {
        Self {
            code,
            message,
            file_path: file_path.to_path_buf(),
            location: None,
        }
    }

    pub(crate) fn read(file_path: &Path, source: std::io::Error) -> Self {
        Self::new(
            ContentErrorCode::ReadFile,
            format!("failed to read content file: {source}"),
            file_path,
        )
    }

    pub(crate) fn at(mut self, location: Option<SourceLocation>) -> Self {
        self.location = location;
        self
    }
}

impl fmt::Display for ContentLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.location {
            Some(loc) => write!(
                f,
                "{:?}: {} (file={}, line={}, column={})",
                self.code,
                self.message,
                self.file_path.display(),
                loc.line,
                loc.column
            ),
            None => write!(
                f,
                "{:?}: {} (file={})",
                self.code,
                self.message,
                self.file_path.display()
            ),
        }
    }
}

impl std::error::Error for ContentLoadError {}
