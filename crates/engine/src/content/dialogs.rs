use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use super::error::{ContentErrorCode, ContentLoadError};
use super::image_ref::validate_image_ref;
use super::layout::MarkerId;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DialogContent {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default, rename = "image")]
    pub image_ref: String,
}

impl DialogContent {
    pub fn is_empty(&self) -> bool {
        self.title.is_empty() && self.body.is_empty() && self.image_ref.is_empty()
    }
}

/// Static marker id -> dialog content table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DialogTable {
    entries: HashMap<MarkerId, DialogContent>,
}

impl DialogTable {
    pub fn from_entries(entries: impl IntoIterator<Item = (MarkerId, DialogContent)>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    pub fn lookup(&self, id: &MarkerId) -> Option<&DialogContent> {
        self.entries.get(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub fn load_dialog_table(path: &Path) -> Result<DialogTable, ContentLoadError> {
    let raw = fs::read_to_string(path).map_err(|source| ContentLoadError::read(path, source))?;
    parse_dialog_table(path, &raw)
}

pub fn parse_dialog_table(file_path: &Path, raw: &str) -> Result<DialogTable, ContentLoadError> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    let parsed: HashMap<String, DialogContent> =
        serde_path_to_error::deserialize(&mut deserializer).map_err(|error| {
            let path = error.path().to_string();
            let source = error.into_inner();
            let message = if path.is_empty() || path == "." {
                format!("parse dialog json: {source}")
            } else {
                format!("parse dialog json at {path}: {source}")
            };
            ContentLoadError::new(ContentErrorCode::JsonMalformed, message, file_path)
        })?;

    let mut entries = HashMap::with_capacity(parsed.len());
    for (id, content) in parsed {
        validate_image_ref(&content.image_ref).map_err(|error| {
            ContentLoadError::new(
                ContentErrorCode::InvalidImageRef,
                format!("dialog '{id}' image '{}': {error}", content.image_ref),
                file_path,
            )
        })?;
        entries.insert(MarkerId::new(id), content);
    }
    Ok(DialogTable { entries })
}
