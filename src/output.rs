/*!
 * Final output assembly and atomic write.
 *
 * The output file is a JSON array with exactly one entry per catalog
 * item, in catalog order. It is written once, at the end of a successful
 * run, through a temp-then-rename: readers of the output path never see
 * a partially written file.
 */

use log::warn;
use serde_json::Value;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

use crate::content::Catalog;
use crate::errors::OutputError;

/// Writes the merged translation result as a single atomic file
pub struct OutputWriter;

impl OutputWriter {
    /// Assemble the output array: one entry per catalog item in catalog
    /// order, taking the translated value from `completed` and falling
    /// back to the source item for anything missing.
    pub fn assemble(catalog: &Catalog, completed: &BTreeMap<String, Value>) -> Vec<Value> {
        catalog
            .items()
            .iter()
            .map(|item| match completed.get(&item.id) {
                Some(translated) => translated.clone(),
                None => {
                    warn!("Item '{}' has no translated entry, emitting source", item.id);
                    item.value.clone()
                }
            })
            .collect()
    }

    /// Write the assembled array to `path` atomically
    pub fn write(path: impl AsRef<Path>, items: &[Value]) -> Result<(), OutputError> {
        let path = path.as_ref();
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        if !dir.exists() {
            std::fs::create_dir_all(dir)?;
        }

        let json = serde_json::to_string_pretty(&Value::Array(items.to_vec()))
            .map_err(|e| OutputError::WriteFailed(format!("Failed to serialize output: {}", e)))?;

        let mut temp = NamedTempFile::new_in(dir)?;
        temp.write_all(json.as_bytes())?;
        temp.write_all(b"\n")?;
        temp.as_file().sync_all()?;
        temp.persist(path)
            .map_err(|e| OutputError::WriteFailed(format!("Failed to finalize output file: {}", e)))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn catalog() -> Catalog {
        Catalog::from_value(json!([
            {"id": "t1", "title": "First"},
            {"id": "t2", "title": "Second"},
        ]))
        .unwrap()
    }

    #[test]
    fn test_assemble_shouldFollowCatalogOrder() {
        let mut completed = BTreeMap::new();
        // Insertion into a BTreeMap sorts by key; output must follow the
        // catalog instead
        completed.insert("t2".to_string(), json!({"id": "t2", "title": "DUSRA"}));
        completed.insert("t1".to_string(), json!({"id": "t1", "title": "PAHILA"}));

        let items = OutputWriter::assemble(&catalog(), &completed);
        assert_eq!(items[0]["id"], "t1");
        assert_eq!(items[0]["title"], "PAHILA");
        assert_eq!(items[1]["id"], "t2");
    }

    #[test]
    fn test_assemble_withMissingItem_shouldEmitSource() {
        let mut completed = BTreeMap::new();
        completed.insert("t1".to_string(), json!({"id": "t1", "title": "PAHILA"}));

        let items = OutputWriter::assemble(&catalog(), &completed);
        assert_eq!(items.len(), 2);
        assert_eq!(items[1]["title"], "Second");
    }

    #[test]
    fn test_write_shouldProduceParsableArrayAndNoTempFiles() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.json");

        let items = vec![json!({"id": "t1"}), json!({"id": "t2"})];
        OutputWriter::write(&path, &items).unwrap();

        let written: Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written.as_array().unwrap().len(), 2);

        let entries: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("out.json")]);
    }

    #[test]
    fn test_write_shouldCreateMissingParentDirectory() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("out.json");

        OutputWriter::write(&path, &[json!({"id": "t1"})]).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_write_withFileAsParent_shouldFail() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "x").unwrap();

        let result = OutputWriter::write(blocker.join("out.json"), &[json!({"id": "t1"})]);
        assert!(matches!(result, Err(OutputError::Io(_))));
    }

    #[test]
    fn test_write_shouldReplaceExistingFile() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.json");
        std::fs::write(&path, "stale").unwrap();

        OutputWriter::write(&path, &[json!({"id": "t1"})]).unwrap();
        let written: Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written[0]["id"], "t1");
    }
}
