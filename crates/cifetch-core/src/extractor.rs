//! File reference extraction from response documents
//!
//! Responses carry produced files as annotations nested under
//! `output[].content[].annotations[]`, but the exact shape drifts between
//! service versions, so the walk does not rely on that path. Any object with a
//! `file_id` field is treated as a reference, wherever it sits.

use crate::types::FileReference;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashSet;

/// Collect file references from a response document.
///
/// References are returned in depth-first discovery order, deduplicated by
/// `file_id` with the first occurrence kept.
pub fn collect_file_references(document: &Value) -> Vec<FileReference> {
    let mut collector = Collector::default();
    collector.walk(document);
    collector.references
}

/// Collect file references from any serializable object.
///
/// The object is walked through its serialized field set. An object that
/// cannot be serialized yields no references.
pub fn collect_from<T: Serialize + ?Sized>(object: &T) -> Vec<FileReference> {
    match serde_json::to_value(object) {
        Ok(document) => collect_file_references(&document),
        Err(e) => {
            tracing::debug!("Skipping unserializable object: {}", e);
            Vec::new()
        }
    }
}

#[derive(Default)]
struct Collector {
    references: Vec<FileReference>,
    seen: HashSet<String>,
}

impl Collector {
    fn walk(&mut self, node: &Value) {
        match node {
            Value::Object(map) => {
                if map.contains_key("file_id") {
                    self.record(map);
                }
                for value in map.values() {
                    self.walk(value);
                }
            }
            Value::Array(items) => {
                for item in items {
                    self.walk(item);
                }
            }
            _ => {}
        }
    }

    fn record(&mut self, map: &Map<String, Value>) {
        let Some(file_id) = non_empty_str(map, "file_id") else {
            return;
        };
        if !self.seen.insert(file_id.to_string()) {
            return;
        }

        let filename = non_empty_str(map, "filename").or_else(|| non_empty_str(map, "path"));
        self.references.push(FileReference::new(
            file_id,
            non_empty_str(map, "container_id").map(str::to_string),
            filename.map(str::to_string),
        ));
    }
}

fn non_empty_str<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    map.get(key)
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
}
