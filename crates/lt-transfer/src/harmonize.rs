//! Map transferred labels onto a coarser category vocabulary.
//!
//! The category dictionary is produced elsewhere (for example by a service
//! that reconciles two label sets); this module only applies it.

use std::collections::HashMap;
use serde_json::Value;

use lt_core::{Label, Result, TransferError};

/// Category assigned to labels that no category claims.
pub const UNKNOWN_CATEGORY: &str = "unknown";

/// Reverse index from label to category.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryMap {
    label_to_category: HashMap<Label, Label>,
}

/// Scalar member of a category. Numbers and booleans use their JSON text.
fn member_label(category: &str, value: &Value) -> Result<Label> {
    match value {
        Value::String(s) => Ok(Label::from(s.as_str())),
        Value::Number(n) => Ok(Label::from(n.to_string())),
        Value::Bool(b) => Ok(Label::from(b.to_string())),
        Value::Null | Value::Array(_) | Value::Object(_) => Err(TransferError::Config(format!(
            "category {category:?} has a member that is not a scalar label: {value}"
        ))),
    }
}

impl CategoryMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a `{ "category": label | [label, ...], ... }` object.
    ///
    /// Categories are applied in document order; a label listed under several
    /// categories ends up in the last one. Null and nested objects are
    /// rejected as members.
    pub fn from_json_value(value: Value) -> Result<Self> {
        let raw: serde_json::Map<String, Value> = serde_json::from_value(value)?;
        let mut map = Self::new();
        for (category, members) in &raw {
            let cat = Label::from(category.as_str());
            match members {
                Value::Array(items) => {
                    for item in items {
                        map.insert(cat.clone(), member_label(category, item)?);
                    }
                }
                single => map.insert(cat, member_label(category, single)?),
            }
        }
        tracing::debug!(labels = map.len(), "loaded category map");
        Ok(map)
    }

    pub fn from_json_str(s: &str) -> Result<Self> {
        Self::from_json_value(serde_json::from_str(s)?)
    }

    pub fn insert(&mut self, category: Label, label: Label) {
        self.label_to_category.insert(label, category);
    }

    pub fn len(&self) -> usize {
        self.label_to_category.len()
    }

    pub fn is_empty(&self) -> bool {
        self.label_to_category.is_empty()
    }

    pub fn category_of(&self, label: &Label) -> Option<&Label> {
        self.label_to_category.get(label)
    }

    /// Category for each label, `UNKNOWN_CATEGORY` where none matches.
    pub fn map_labels(&self, labels: &[Label]) -> Vec<Label> {
        labels
            .iter()
            .map(|l| self.category_of(l).cloned().unwrap_or_else(|| Label::from(UNKNOWN_CATEGORY)))
            .collect()
    }
}
