//! # Validation Engine
//!
//! Checks a form's values against the declarative rules of its fields.
//!
//! `validate` is a pure function of the field list and the value map: it
//! keeps no state between calls and produces the same messages for the same
//! input. Every offending field gets exactly one message; when several rules
//! of the same field fail, the last one in evaluation order wins.
//!
//! ## Evaluation Order
//!
//! 1. `required`
//! 2. `minLength` / `maxLength`
//! 3. `min` / `max` (number fields)
//! 4. `pattern`
//! 5. `minDate` / `maxDate` (date fields)
//! 6. cross-field relations
//! 7. `formula`
//!
//! Malformed patterns and unparsable cross-field operands are skipped rather
//! than reported; format problems are already reported by the field's own
//! checks.

pub mod formula;
pub mod value;

use chrono::NaiveDate;
use regex::Regex;

use crate::shared::draft::FormValues;
use crate::shared::error::ValidationErrors;
use crate::shared::schema::{FieldType, FormDefinition, FormField};
use formula::Formula;
use value::{parse_date, parse_number, Parameters};

/// Validate `values` against every field in `fields`.
pub fn validate(fields: &[FormField], values: &FormValues) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    let mut parameters: Option<Parameters> = None;

    for field in fields {
        let raw = values.get(&field.id).map(String::as_str).unwrap_or("");
        let mut check = FieldCheck {
            field,
            value: raw,
            values,
            error: None,
        };

        check.required();
        check.length();
        check.numeric_range();
        check.pattern();
        check.date_range();
        check.cross_field();
        if let Some(source) = &field.validation.formula {
            let params = parameters.get_or_insert_with(|| value::parameters(fields, values));
            check.formula(source, params);
        }

        if let Some(message) = check.error {
            errors.set(field.id.clone(), message);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate against all fields of a form definition.
pub fn validate_form(form: &FormDefinition, values: &FormValues) -> Result<(), ValidationErrors> {
    validate(&form.field_list(), values)
}

struct FieldCheck<'a> {
    field: &'a FormField,
    value: &'a str,
    values: &'a FormValues,
    error: Option<String>,
}

impl<'a> FieldCheck<'a> {
    fn fail(&mut self, message: String) {
        self.error = Some(message);
    }

    fn name(&self) -> &'a str {
        self.field.display_name()
    }

    /// Non-empty value of another field.
    fn other(&self, id: &'a Option<String>) -> Option<(&'a str, &'a str)> {
        let id = id.as_deref()?;
        let other = self.values.get(id).map(String::as_str)?;
        if self.value.is_empty() || other.is_empty() {
            return None;
        }
        Some((id, other))
    }

    fn required(&mut self) {
        if !self.field.validation.required {
            return;
        }
        match self.field.field_type {
            FieldType::Boolean if self.value == "false" => {
                self.fail(format!("'{}' must be checked to proceed", self.name()));
            }
            FieldType::Boolean => {}
            _ if self.value.is_empty() => {
                self.fail(format!("'{}' is required", self.name()));
            }
            _ => {}
        }
    }

    fn length(&mut self) {
        let rules = &self.field.validation;
        let length = self.value.chars().count();
        if let Some(min) = rules.min_length {
            if length < min {
                self.fail(format!("'{}' must be at least {} characters", self.name(), min));
            }
        }
        if let Some(max) = rules.max_length {
            if length > max {
                self.fail(format!("'{}' must be no more than {} characters", self.name(), max));
            }
        }
    }

    fn numeric_range(&mut self) {
        if self.field.field_type != FieldType::Number || self.value.is_empty() {
            return;
        }
        let Some(number) = parse_number(self.value) else {
            self.fail(format!("'{}' must be numeric", self.name()));
            return;
        };
        let rules = &self.field.validation;
        if let Some(min) = rules.min {
            if number < min {
                self.fail(format!("'{}' must be ≥ {:.2}", self.name(), min));
            }
        }
        if let Some(max) = rules.max {
            if number > max {
                self.fail(format!("'{}' must be ≤ {:.2}", self.name(), max));
            }
        }
    }

    fn pattern(&mut self) {
        let Some(pattern) = &self.field.validation.pattern else {
            return;
        };
        if self.value.is_empty() {
            return;
        }
        // An invalid pattern is a schema bug, not a user error.
        if let Ok(re) = Regex::new(pattern) {
            if !re.is_match(self.value) {
                self.fail(format!("'{}' does not match expected format", self.name()));
            }
        }
    }

    fn date_range(&mut self) {
        if self.field.field_type != FieldType::Date || self.value.is_empty() {
            return;
        }
        let Some(date) = parse_date(self.value) else {
            self.fail(format!("'{}' is not a valid date", self.name()));
            return;
        };
        let rules = &self.field.validation;
        if let Some((bound, min)) = bound_date(&rules.min_date) {
            if date < min {
                self.fail(format!("'{}' must be on or after {}", self.name(), bound));
            }
        }
        if let Some((bound, max)) = bound_date(&rules.max_date) {
            if date > max {
                self.fail(format!("'{}' must be on or before {}", self.name(), bound));
            }
        }
    }

    fn cross_field(&mut self) {
        let field: &'a FormField = self.field;
        let rules = &field.validation;
        let name = self.name();

        if let Some((id, other)) = self.other(&rules.greater_than_field) {
            match self.field.field_type {
                FieldType::Number => {
                    if let (Some(a), Some(b)) = (parse_number(self.value), parse_number(other)) {
                        if a <= b {
                            self.fail(format!("'{}' must be greater than '{}'", name, id));
                        }
                    }
                }
                FieldType::Date => {
                    if let (Some(a), Some(b)) = (parse_date(self.value), parse_date(other)) {
                        if a <= b {
                            self.fail(format!("'{}' must be after '{}'", name, id));
                        }
                    }
                }
                _ => {}
            }
        }

        if let Some((id, other)) = self.other(&rules.less_than_field) {
            match self.field.field_type {
                FieldType::Number => {
                    if let (Some(a), Some(b)) = (parse_number(self.value), parse_number(other)) {
                        if a >= b {
                            self.fail(format!("'{}' must be less than '{}'", name, id));
                        }
                    }
                }
                FieldType::Date => {
                    if let (Some(a), Some(b)) = (parse_date(self.value), parse_date(other)) {
                        if a >= b {
                            self.fail(format!("'{}' must be before '{}'", name, id));
                        }
                    }
                }
                _ => {}
            }
        }

        if let Some((id, other)) = self.other(&rules.before_field) {
            if let (Some(a), Some(b)) = (parse_date(self.value), parse_date(other)) {
                if a >= b {
                    self.fail(format!("'{}' must be before '{}'", name, id));
                }
            }
        }

        if let Some((id, other)) = self.other(&rules.after_field) {
            if let (Some(a), Some(b)) = (parse_date(self.value), parse_date(other)) {
                if a <= b {
                    self.fail(format!("'{}' must be after '{}'", name, id));
                }
            }
        }

        if let Some((id, other)) = self.other(&rules.equal_to_field) {
            if self.value != other {
                self.fail(format!("'{}' must equal '{}'", name, id));
            }
        }

        if let Some((id, other)) = self.other(&rules.not_equal_to_field) {
            if self.value == other {
                self.fail(format!("'{}' must not equal '{}'", name, id));
            }
        }
    }

    fn formula(&mut self, source: &str, params: &Parameters) {
        let custom = self.field.validation.error_message.clone();
        match Formula::parse(source).and_then(|formula| formula.holds(params)) {
            Ok(true) => {}
            Ok(false) => self.fail(custom.unwrap_or_else(|| {
                format!("Formula validation failed for '{}'", self.name())
            })),
            Err(err) => self.fail(custom.unwrap_or_else(|| {
                format!("Invalid formula for '{}': {}", self.name(), err)
            })),
        }
    }
}

fn bound_date(bound: &Option<String>) -> Option<(&str, NaiveDate)> {
    let text = bound.as_deref()?;
    parse_date(text).map(|date| (text, date))
}
