/*!
 * Structure-preserving traversal of content items.
 *
 * The walker applies the translation client to every translatable string
 * a `FieldSpec` declares, recursing through nested records and record
 * lists. Output always has exactly the shape of the input: same fields,
 * same list lengths, same order. Values that are not non-empty strings
 * pass through untouched, as do strings the skip heuristics reject
 * (code fences, URLs, import lines).
 */

use futures::future::BoxFuture;
use log::debug;
use serde_json::{Map, Value};

use crate::content::{FieldKind, FieldSpec};

use super::client::TranslationClient;

/// Returns false for strings that must never be sent to the service:
/// code blocks, URLs, and import statements survive translation badly
/// and are kept verbatim.
pub fn is_machine_translatable(text: &str) -> bool {
    let trimmed = text.trim();
    !trimmed.is_empty()
        && !trimmed.contains("```")
        && !trimmed.contains("http")
        && !trimmed.starts_with("import ")
}

/// Walks a content item's declared fields and translates each string
/// through the client, preserving structure exactly.
pub struct ContentWalker<'a> {
    /// Client used for every string
    client: &'a TranslationClient,
    /// Source language code
    source_language: &'a str,
    /// Target language code
    target_language: &'a str,
    /// Advisory per-field progress callback
    on_section: Option<Box<dyn Fn(&str) + Send + Sync + 'a>>,
}

impl<'a> ContentWalker<'a> {
    /// Create a walker for one language pair
    pub fn new(
        client: &'a TranslationClient,
        source_language: &'a str,
        target_language: &'a str,
    ) -> Self {
        Self {
            client,
            source_language,
            target_language,
            on_section: None,
        }
    }

    /// Register an advisory callback invoked with each completed field path
    pub fn with_progress(mut self, on_section: impl Fn(&str) + Send + Sync + 'a) -> Self {
        self.on_section = Some(Box::new(on_section));
        self
    }

    /// Translate one content item according to its field spec.
    ///
    /// Never fails: translation failures are absorbed by the client's
    /// fallback policy, so the result is always structurally valid.
    pub async fn translate_item(&self, item: &Value, spec: &FieldSpec) -> Value {
        match item {
            Value::Object(object) => Value::Object(self.translate_object(object, spec, "").await),
            // A malformed item is passed through rather than rejected;
            // translating, not validating, is the job here
            other => other.clone(),
        }
    }

    fn translate_object<'b>(
        &'b self,
        object: &'b Map<String, Value>,
        spec: &'b FieldSpec,
        path: &'b str,
    ) -> BoxFuture<'b, Map<String, Value>> {
        Box::pin(async move {
            // Start from a full clone so undeclared fields (ids, code
            // bodies, numbers) carry over untouched
            let mut output = object.clone();

            // Scalars first, in declared order
            for (name, kind) in spec.fields() {
                if matches!(kind, FieldKind::Scalar) {
                    if let Some(Value::String(text)) = object.get(name) {
                        if is_machine_translatable(text) {
                            let outcome = self
                                .client
                                .translate(text, self.source_language, self.target_language)
                                .await;
                            output.insert(name.clone(), Value::String(outcome.into_text()));
                        } else {
                            debug!("Skipping untranslatable scalar {}", field_path(path, name));
                        }
                    }
                    self.emit(&field_path(path, name));
                }
            }

            // Then scalar lists, in declared order
            for (name, kind) in spec.fields() {
                if matches!(kind, FieldKind::ScalarList) {
                    if let Some(Value::Array(entries)) = object.get(name) {
                        let mut translated = Vec::with_capacity(entries.len());
                        for entry in entries {
                            translated.push(self.translate_scalar_entry(entry).await);
                        }
                        output.insert(name.clone(), Value::Array(translated));
                    }
                    self.emit(&field_path(path, name));
                }
            }

            // Finally nested records and record lists, in declared order
            for (name, kind) in spec.fields() {
                match kind {
                    FieldKind::Record(record_spec) => {
                        if let Some(Value::Object(record)) = object.get(name) {
                            let translated = self
                                .translate_object(record, record_spec, &field_path(path, name))
                                .await;
                            output.insert(name.clone(), Value::Object(translated));
                        }
                        self.emit(&field_path(path, name));
                    }
                    FieldKind::RecordList(record_spec) => {
                        if let Some(Value::Array(entries)) = object.get(name) {
                            let mut translated = Vec::with_capacity(entries.len());
                            for entry in entries {
                                match entry {
                                    Value::Object(record) => {
                                        let record = self
                                            .translate_object(
                                                record,
                                                record_spec,
                                                &field_path(path, name),
                                            )
                                            .await;
                                        translated.push(Value::Object(record));
                                    }
                                    other => translated.push(other.clone()),
                                }
                            }
                            output.insert(name.clone(), Value::Array(translated));
                        }
                        self.emit(&field_path(path, name));
                    }
                    FieldKind::Scalar | FieldKind::ScalarList => {}
                }
            }

            output
        })
    }

    async fn translate_scalar_entry(&self, entry: &Value) -> Value {
        match entry {
            Value::String(text) if is_machine_translatable(text) => {
                let outcome = self
                    .client
                    .translate(text, self.source_language, self.target_language)
                    .await;
                Value::String(outcome.into_text())
            }
            other => other.clone(),
        }
    }

    fn emit(&self, section: &str) {
        if let Some(on_section) = &self.on_section {
            on_section(section);
        }
    }
}

fn field_path(path: &str, name: &str) -> String {
    if path.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", path, name)
    }
}
