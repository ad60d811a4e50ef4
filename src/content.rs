/*!
 * Content catalog model and field specifications.
 *
 * Content items are arbitrary-shaped JSON objects; a `FieldSpec` declares
 * which of their fields carry translatable text. Anything not listed in a
 * spec (ids, code bodies, numbers) passes through a translation run
 * untouched.
 */

use serde_json::Value;
use sha2::{Digest, Sha256};
use std::io::Read;
use std::path::Path;

use crate::errors::CatalogError;

/// How a single field of a content item is shaped
#[derive(Debug, Clone)]
pub enum FieldKind {
    /// A single translatable string
    Scalar,
    /// A list of translatable strings
    ScalarList,
    /// A nested object with its own field spec
    Record(FieldSpec),
    /// A list of nested objects sharing one field spec
    RecordList(FieldSpec),
}

/// Declarative description of the translatable fields of one object shape.
///
/// Field order is declaration order; the walker relies on it for
/// deterministic traversal.
#[derive(Debug, Clone, Default)]
pub struct FieldSpec {
    fields: Vec<(String, FieldKind)>,
}

impl FieldSpec {
    /// Create an empty field spec
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// Declare a scalar translatable field
    pub fn scalar(mut self, name: impl Into<String>) -> Self {
        self.fields.push((name.into(), FieldKind::Scalar));
        self
    }

    /// Declare a list-of-strings field
    pub fn scalar_list(mut self, name: impl Into<String>) -> Self {
        self.fields.push((name.into(), FieldKind::ScalarList));
        self
    }

    /// Declare a nested record field with its own spec
    pub fn record(mut self, name: impl Into<String>, spec: FieldSpec) -> Self {
        self.fields.push((name.into(), FieldKind::Record(spec)));
        self
    }

    /// Declare a list-of-records field with a shared per-record spec
    pub fn record_list(mut self, name: impl Into<String>, spec: FieldSpec) -> Self {
        self.fields.push((name.into(), FieldKind::RecordList(spec)));
        self
    }

    /// All declared fields in declaration order
    pub fn fields(&self) -> &[(String, FieldKind)] {
        &self.fields
    }
}

/// The field spec for course topics, matching the catalog shape:
/// scalar title/description, a nested content record with overview,
/// string lists, and use-case / code-example record lists. Code bodies
/// are deliberately not declared and therefore never translated.
pub fn course_topic_spec() -> FieldSpec {
    let use_case = FieldSpec::new()
        .scalar("title")
        .scalar("description")
        .scalar("example");

    let code_example = FieldSpec::new().scalar("title").scalar("explanation");

    let content = FieldSpec::new()
        .scalar("overview")
        .scalar_list("keyPoints")
        .scalar_list("dos")
        .scalar_list("donts")
        .scalar_list("bestPractices")
        .record_list("useCases", use_case)
        .record_list("codeExamples", code_example);

    FieldSpec::new()
        .scalar("title")
        .scalar("description")
        .record("content", content)
}

/// One unit of source content: a stable id plus its full JSON object
#[derive(Debug, Clone)]
pub struct ContentItem {
    /// Stable identifier, unique within the catalog
    pub id: String,
    /// The complete item object, including untranslatable fields
    pub value: Value,
}

/// An ordered collection of content items, read-only input to the pipeline
#[derive(Debug, Clone)]
pub struct Catalog {
    items: Vec<ContentItem>,
}

impl Catalog {
    /// Build a catalog from a parsed JSON value (must be an array of
    /// objects, each with a string `id`)
    pub fn from_value(value: Value) -> Result<Self, CatalogError> {
        let array = match value {
            Value::Array(array) => array,
            other => {
                return Err(CatalogError::BadShape(format!(
                    "expected a JSON array of items, got {}",
                    json_type_name(&other)
                )));
            }
        };

        let mut items = Vec::with_capacity(array.len());
        for (index, entry) in array.into_iter().enumerate() {
            if !entry.is_object() {
                return Err(CatalogError::BadShape(format!(
                    "item at index {} is not an object",
                    index
                )));
            }

            let id = entry
                .get("id")
                .and_then(Value::as_str)
                .map(|s| s.to_string())
                .ok_or(CatalogError::MissingId { index })?;

            items.push(ContentItem { id, value: entry });
        }

        Ok(Self { items })
    }

    /// Load a catalog from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| CatalogError::ReadFailed(format!("{}: {}", path.display(), e)))?;

        let value: Value = serde_json::from_str(&content)
            .map_err(|e| CatalogError::BadShape(format!("{}: {}", path.display(), e)))?;

        Self::from_value(value)
    }

    /// Items in their original collection order
    pub fn items(&self) -> &[ContentItem] {
        &self.items
    }

    /// Number of items in the catalog
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the catalog has no items
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Compute the SHA-256 fingerprint of the catalog file, used to detect
/// that the source catalog changed since a checkpoint was written
pub fn catalog_fingerprint(path: impl AsRef<Path>) -> std::io::Result<String> {
    let mut file = std::fs::File::open(path.as_ref())?;
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];

    loop {
        let bytes_read = file.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_fromValue_withValidItems_shouldPreserveOrder() {
        let catalog = Catalog::from_value(json!([
            {"id": "t2", "title": "Second"},
            {"id": "t1", "title": "First"},
        ]))
        .unwrap();

        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.items()[0].id, "t2");
        assert_eq!(catalog.items()[1].id, "t1");
    }

    #[test]
    fn test_fromValue_withMissingId_shouldFail() {
        let result = Catalog::from_value(json!([{"title": "No id"}]));
        assert!(matches!(result, Err(CatalogError::MissingId { index: 0 })));
    }

    #[test]
    fn test_fromValue_withNonArray_shouldFail() {
        let result = Catalog::from_value(json!({"id": "t1"}));
        assert!(matches!(result, Err(CatalogError::BadShape(_))));
    }

    #[test]
    fn test_load_withMalformedJson_shouldFail() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"{not json").unwrap();
        file.flush().unwrap();

        assert!(matches!(
            Catalog::load(file.path()),
            Err(CatalogError::BadShape(_))
        ));
    }

    #[test]
    fn test_courseTopicSpec_shouldDeclareExpectedFields() {
        let spec = course_topic_spec();
        let names: Vec<&str> = spec.fields().iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["title", "description", "content"]);

        let (_, content_kind) = &spec.fields()[2];
        let FieldKind::Record(content) = content_kind else {
            panic!("content should be a nested record");
        };
        let content_names: Vec<&str> =
            content.fields().iter().map(|(n, _)| n.as_str()).collect();
        assert!(content_names.contains(&"keyPoints"));
        assert!(content_names.contains(&"codeExamples"));
        // code bodies are never declared
        assert!(!content_names.contains(&"code"));
    }

    #[test]
    fn test_catalogFingerprint_shouldChangeWithContent() {
        let mut file_a = NamedTempFile::new().unwrap();
        file_a.write_all(b"[]").unwrap();
        file_a.flush().unwrap();

        let mut file_b = NamedTempFile::new().unwrap();
        file_b.write_all(b"[{}]").unwrap();
        file_b.flush().unwrap();

        let hash_a = catalog_fingerprint(file_a.path()).unwrap();
        let hash_b = catalog_fingerprint(file_b.path()).unwrap();
        assert_ne!(hash_a, hash_b);
        assert_eq!(hash_a, catalog_fingerprint(file_a.path()).unwrap());
    }
}
