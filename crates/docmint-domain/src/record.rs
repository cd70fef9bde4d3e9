//! Record module - validated model output ready for persistence

use crate::document::Segment;
use crate::task::TaskType;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Source written for segments whose document matched no known project
pub const UNLABELED_SOURCE: &str = "unknown";

/// A task-shaped record plus its provenance
///
/// The task-specific payload is flattened next to `reference` (the segment
/// text the record came from) and `source` (the segment's label). Both
/// provenance fields are typed, so a record cannot be built without them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionRecord {
    /// Task-specific fields produced by the model
    #[serde(flatten)]
    pub fields: Map<String, Value>,

    /// Original segment text
    pub reference: String,

    /// Segment source label
    pub source: String,
}

impl ExtractionRecord {
    /// Build a record from model fields and the segment they came from
    ///
    /// Any `reference`/`source` keys supplied by the model are replaced.
    pub fn new(mut fields: Map<String, Value>, segment: &Segment) -> Self {
        fields.remove("reference");
        fields.remove("source");

        let source = if segment.source_label.is_empty() {
            UNLABELED_SOURCE.to_string()
        } else {
            segment.source_label.clone()
        };

        Self {
            fields,
            reference: segment.text.clone(),
            source,
        }
    }

    /// Build a null-valued record standing in for an exhausted segment
    pub fn placeholder(task: TaskType, segment: &Segment) -> Self {
        let fields = task
            .record_fields()
            .iter()
            .map(|name| (name.to_string(), Value::Null))
            .collect();
        Self::new(fields, segment)
    }

    /// Get a payload field
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Whether the provenance fields are populated
    pub fn has_provenance(&self) -> bool {
        !self.reference.is_empty() && !self.source.is_empty()
    }
}
