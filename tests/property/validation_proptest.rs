//! Property-based tests for the validation engine
//!
//! Uses proptest to generate entries and verify the rule contracts

use chrono::NaiveDate;
use formsync::client::offline::complete_values;
use formsync::client::validation::{validate, validate_form};
use formsync::shared::{FieldType, FormField, FormValues};
use proptest::prelude::*;

use crate::common::*;

fn number_field(min: f64, max: f64) -> Vec<FormField> {
    serde_json::from_value(serde_json::json!([
        {"id": "n", "label": "N", "type": "number", "validation": {"min": min, "max": max}}
    ]))
    .unwrap()
}

fn formula_fields() -> Vec<FormField> {
    serde_json::from_value(serde_json::json!([
        {"id": "A", "type": "number"},
        {"id": "B", "type": "number"},
        {"id": "C", "type": "number", "validation": {"formula": "A + B == C"}}
    ]))
    .unwrap()
}

fn visit_entry() -> impl Strategy<Value = FormValues> {
    (
        "[A-Za-z0-9 -]{1,30}",
        1u32..=40,
        0i64..3650,
        proptest::option::of("[a-z ]{0,80}"),
    )
        .prop_map(|(household, members, day, notes)| {
            let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
            let visited = start + chrono::Duration::days(day);
            let mut entry = values(&[
                ("household", household.as_str()),
                ("consent", "true"),
            ]);
            entry.insert("members".to_string(), members.to_string());
            entry.insert("visited".to_string(), visited.format("%Y-%m-%d").to_string());
            if let Some(notes) = notes {
                entry.insert("notes".to_string(), notes);
            }
            entry
        })
}

proptest! {
    #[test]
    fn test_valid_entries_pass(entry in visit_entry()) {
        prop_assert!(validate_form(&visit_form(), &entry).is_ok());
    }

    #[test]
    fn test_missing_required_field_is_one_error(entry in visit_entry(), pick in 0usize..4) {
        let form = visit_form();
        let required: Vec<&FormField> = form
            .fields()
            .filter(|f| f.validation.required)
            .collect();
        let field = required[pick % required.len()];

        let mut entry = entry;
        if field.field_type == FieldType::Boolean {
            entry.insert(field.id.clone(), "false".to_string());
        } else {
            entry.remove(&field.id);
        }

        let errors = validate_form(&form, &entry).unwrap_err();
        prop_assert_eq!(errors.len(), 1);
        prop_assert!(errors.contains(&field.id));
    }

    #[test]
    fn test_absent_field_fails_once_completed(entry in visit_entry(), pick in 0usize..4) {
        let form = visit_form();
        let required: Vec<&FormField> = form
            .fields()
            .filter(|f| f.validation.required)
            .collect();
        let field = required[pick % required.len()];

        let mut entry = entry;
        entry.remove(&field.id);

        let errors = validate_form(&form, &complete_values(&form, &entry)).unwrap_err();
        prop_assert_eq!(errors.len(), 1);
        prop_assert!(errors.contains(&field.id));
    }

    #[test]
    fn test_numeric_bounds(value in -1000i64..1000) {
        let fields = number_field(10.0, 20.0);
        let result = validate(&fields, &values(&[("n", &value.to_string())]));
        prop_assert_eq!(result.is_ok(), (10..=20).contains(&value));
    }

    #[test]
    fn test_non_numeric_text_is_reported_as_such(text in "[a-z]{1,12}") {
        // Words that parse as floats are not "non-numeric".
        prop_assume!(text.parse::<f64>().is_err());
        let fields = number_field(10.0, 20.0);
        let errors = validate(&fields, &values(&[("n", &text)])).unwrap_err();
        prop_assert_eq!(errors.get("n"), Some("'N' must be numeric"));
    }

    #[test]
    fn test_formula_sum(a in -500i64..500, b in -500i64..500, delta in -3i64..3) {
        let fields = formula_fields();
        let c = a + b + delta;
        let entry = values(&[
            ("A", &a.to_string()),
            ("B", &b.to_string()),
            ("C", &c.to_string()),
        ]);
        let result = validate(&fields, &entry);
        if delta == 0 {
            prop_assert!(result.is_ok());
        } else {
            let errors = result.unwrap_err();
            prop_assert_eq!(errors.get("C"), Some("Formula validation failed for 'C'"));
        }
    }

    #[test]
    fn test_validation_is_pure(entry in visit_entry()) {
        let form = visit_form();
        let mut broken = entry;
        broken.insert("members".to_string(), "many".to_string());
        prop_assert_eq!(validate_form(&form, &broken), validate_form(&form, &broken));
    }
}
