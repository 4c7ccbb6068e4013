//! Document identity and point-in-time reads.

use serde::de::DeserializeOwned;
use std::fmt;

use crate::value::{fields_to_json, get_field, Fields, Value};
use crate::PathError;

/// Maximum size of a document path in bytes.
pub const MAX_PATH_BYTES: usize = 1500;

/// Length of generated document ids.
const AUTO_ID_LEN: usize = 20;

const AUTO_ID_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Generate a random 20-character alphanumeric document id.
pub fn new_document_id() -> String {
    // Largest multiple of the alphabet size that fits in a byte, so the
    // modulo below stays uniform.
    let cutoff = (256 / AUTO_ID_ALPHABET.len() * AUTO_ID_ALPHABET.len()) as u8;
    let mut id = String::with_capacity(AUTO_ID_LEN);
    let mut buf = [0u8; 32];
    while id.len() < AUTO_ID_LEN {
        getrandom::getrandom(&mut buf).expect("getrandom failed");
        for &b in buf.iter().filter(|&&b| b < cutoff) {
            if id.len() == AUTO_ID_LEN {
                break;
            }
            id.push(AUTO_ID_ALPHABET[b as usize % AUTO_ID_ALPHABET.len()] as char);
        }
    }
    id
}

fn validate_segments(path: &str) -> Result<usize, PathError> {
    if path.is_empty() {
        return Err(PathError::Empty);
    }
    if path.len() > MAX_PATH_BYTES {
        return Err(PathError::TooLong(path.len()));
    }
    let mut count = 0;
    for segment in path.split('/') {
        let reserved = segment.len() >= 4 && segment.starts_with("__") && segment.ends_with("__");
        if segment.is_empty() || segment == "." || segment == ".." || reserved {
            return Err(PathError::InvalidSegment(segment.to_string()));
        }
        count += 1;
    }
    Ok(count)
}

/// Check that `path` names a collection (odd number of segments).
pub fn validate_collection_path(path: &str) -> Result<(), PathError> {
    let segments = validate_segments(path)?;
    if segments % 2 == 0 {
        return Err(PathError::NotACollection(path.to_string()));
    }
    Ok(())
}

/// Reference to a single document, e.g. `users/alice` or `users/alice/posts/p1`.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentRef {
    path: String,
}

impl DocumentRef {
    /// Parse a slash-separated document path.
    pub fn parse(path: &str) -> Result<Self, PathError> {
        let path = path.trim_matches('/');
        let segments = validate_segments(path)?;
        if segments % 2 != 0 {
            return Err(PathError::NotADocument(path.to_string()));
        }
        Ok(Self {
            path: path.to_string(),
        })
    }

    /// Build a reference from a collection path and a document id.
    pub fn new(collection: &str, id: &str) -> Result<Self, PathError> {
        validate_collection_path(collection)?;
        if id.contains('/') {
            return Err(PathError::InvalidSegment(id.to_string()));
        }
        Self::parse(&format!("{}/{}", collection, id))
    }

    /// The full relative path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The document id (last path segment).
    pub fn id(&self) -> &str {
        self.path
            .rsplit_once('/')
            .map(|(_, id)| id)
            .unwrap_or(&self.path)
    }

    /// Path of the collection holding this document.
    pub fn collection_path(&self) -> &str {
        self.path
            .rsplit_once('/')
            .map(|(collection, _)| collection)
            .unwrap_or("")
    }
}

impl fmt::Display for DocumentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}

impl fmt::Debug for DocumentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DocumentRef({})", self.path)
    }
}

/// A point-in-time read of a document.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentSnapshot {
    /// Which document this is.
    pub reference: DocumentRef,
    /// Field values at read time.
    pub fields: Fields,
    /// When the document was created (RFC 3339), if the store reported it.
    pub create_time: Option<String>,
    /// When the document was last written (RFC 3339), if the store reported it.
    pub update_time: Option<String>,
}

impl DocumentSnapshot {
    /// Create a snapshot without timestamps.
    pub fn new(reference: DocumentRef, fields: Fields) -> Self {
        Self {
            reference,
            fields,
            create_time: None,
            update_time: None,
        }
    }

    /// The document id.
    pub fn id(&self) -> &str {
        self.reference.id()
    }

    /// Look up a field by dotted path.
    pub fn get(&self, path: &str) -> Option<&Value> {
        get_field(&self.fields, path)
    }

    /// Fields rendered as a plain JSON object.
    pub fn to_json(&self) -> serde_json::Value {
        fields_to_json(&self.fields)
    }

    /// Deserialize the fields into a caller type via their JSON form.
    pub fn data_to<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.to_json())
    }
}
