//! Form Schema Model
//!
//! Typed representation of the form definitions served by the bundle endpoint
//! and cached on disk. These types are pure data: validation lives in
//! `client::validation`, loading and caching in `client::bundle`.
//!
//! # Wire Format
//!
//! ```json
//! {
//!   "version": "2024.06.1",
//!   "lastUpdated": "2024-06-01T08:00:00Z",
//!   "form_order": ["cases", "deaths"],
//!   "forms": {
//!     "cases": {
//!       "meta": { "name": "Case Report", "description": "...", "icon": "cases" },
//!       "sections": [
//!         { "title": "Patient", "layout": "grid", "columns": 2, "fields": [ ... ] }
//!       ]
//!     }
//!   }
//! }
//! ```
//!
//! Older bundles send `""` for unset string rules and `0` for unset lengths;
//! both deserialize as unset. Numeric `min`/`max` are only unset when absent
//! or `null`, so a bound of `0` is honoured.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Kind of input a field collects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    #[default]
    Text,
    Number,
    Multiline,
    Select,
    Date,
    Boolean,
    /// Any type string this build does not know; validated like text.
    #[serde(other)]
    Other,
}

/// Declarative rule set attached to a field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Validation {
    #[serde(default)]
    pub required: bool,
    #[serde(default, deserialize_with = "zero_as_none", skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    #[serde(default, deserialize_with = "zero_as_none", skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, deserialize_with = "empty_as_none", skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none", skip_serializing_if = "Option::is_none")]
    pub min_date: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none", skip_serializing_if = "Option::is_none")]
    pub max_date: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none", skip_serializing_if = "Option::is_none")]
    pub greater_than_field: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none", skip_serializing_if = "Option::is_none")]
    pub less_than_field: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none", skip_serializing_if = "Option::is_none")]
    pub before_field: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none", skip_serializing_if = "Option::is_none")]
    pub after_field: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none", skip_serializing_if = "Option::is_none")]
    pub equal_to_field: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none", skip_serializing_if = "Option::is_none")]
    pub not_equal_to_field: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none", skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none", skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

/// A single input of a form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormField {
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(rename = "type", default)]
    pub field_type: FieldType,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    #[serde(default)]
    pub validation: Validation,
}

impl FormField {
    /// Label used in messages, falling back to the id when the label is blank.
    pub fn display_name(&self) -> &str {
        if self.label.is_empty() {
            &self.id
        } else {
            &self.label
        }
    }
}

/// How a section arranges its fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    #[default]
    Stack,
    Grid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub layout: Layout,
    /// Column count, only meaningful for [`Layout::Grid`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub columns: Option<u32>,
    #[serde(default)]
    pub fields: Vec<FormField>,
}

/// Display metadata for a form card.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormMeta {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Either a built-in icon name or an http(s) URL.
    #[serde(default)]
    pub icon: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormDefinition {
    #[serde(default)]
    pub meta: FormMeta,
    #[serde(default)]
    pub sections: Vec<Section>,
}

impl FormDefinition {
    /// All fields across sections, in document order.
    pub fn fields(&self) -> impl Iterator<Item = &FormField> {
        self.sections.iter().flat_map(|section| section.fields.iter())
    }

    /// Owned copy of [`fields`](Self::fields), as the validation engine expects.
    pub fn field_list(&self) -> Vec<FormField> {
        self.fields().cloned().collect()
    }

    pub fn field(&self, id: &str) -> Option<&FormField> {
        self.fields().find(|field| field.id == id)
    }
}

/// Versioned collection of every form definition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormBundle {
    /// Opaque version string, compared for equality only.
    #[serde(default)]
    pub version: String,
    #[serde(rename = "lastUpdated", default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
    #[serde(default)]
    pub forms: BTreeMap<String, FormDefinition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form_order: Option<Vec<String>>,
}

impl FormBundle {
    pub fn get(&self, key: &str) -> Option<&FormDefinition> {
        self.forms.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.forms.is_empty()
    }

    /// Form keys in display order.
    ///
    /// Keys named by `form_order` come first (unknown and repeated names are
    /// dropped), then every remaining key in sorted order.
    pub fn ordered_keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = Vec::with_capacity(self.forms.len());
        if let Some(order) = &self.form_order {
            for key in order {
                if self.forms.contains_key(key) && !keys.contains(&key.as_str()) {
                    keys.push(key);
                }
            }
        }
        for key in self.forms.keys() {
            if !keys.contains(&key.as_str()) {
                keys.push(key);
            }
        }
        keys
    }
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}

fn zero_as_none<'de, D>(deserializer: D) -> Result<Option<usize>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<usize>::deserialize(deserializer)?;
    Ok(value.filter(|n| *n > 0))
}
