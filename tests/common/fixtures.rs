//! Form and value fixtures

use formsync::shared::{FormBundle, FormDefinition, FormValues};

pub fn values(pairs: &[(&str, &str)]) -> FormValues {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// A small form touching the common rule kinds.
pub fn visit_form() -> FormDefinition {
    serde_json::from_value(serde_json::json!({
        "meta": {"name": "Household Visit", "description": "", "icon": "home"},
        "sections": [{
            "title": "Visit",
            "layout": "grid",
            "columns": 2,
            "fields": [
                {"id": "household", "label": "Household", "type": "text",
                 "validation": {"required": true}},
                {"id": "members", "label": "Members", "type": "number",
                 "validation": {"required": true, "min": 1, "max": 40}},
                {"id": "visited", "label": "Visit date", "type": "date",
                 "validation": {"required": true}},
                {"id": "consent", "label": "Consent", "type": "boolean",
                 "validation": {"required": true}},
                {"id": "notes", "label": "Notes", "type": "multiline"}
            ]
        }]
    }))
    .expect("fixture form is valid")
}

pub fn valid_visit() -> FormValues {
    values(&[
        ("household", "H-114"),
        ("members", "5"),
        ("visited", "2024-06-03"),
        ("consent", "true"),
    ])
}

pub fn bundle(version: &str) -> FormBundle {
    let mut bundle = FormBundle {
        version: version.to_string(),
        ..FormBundle::default()
    };
    bundle.forms.insert("visit".to_string(), visit_form());
    bundle
}
