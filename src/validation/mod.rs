//! Constraint checking applied before values are written into an entity.
//!
//! Failures are returned as human-readable messages, never as errors. The
//! wording comes from a [`Translator`] so callers can localize it.

use std::collections::BTreeMap;

use crate::core::{Constraints, Value};

/// Failed properties mapped to their messages. Empty means every value passed.
pub type ValidationErrors = BTreeMap<String, Vec<String>>;

/// A constraint a value failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    Required,
    MaxLength(usize),
    NonEmpty,
}

/// Turns a failed [`Rule`] into a message.
pub trait Translator {
    fn translate(&self, rule: &Rule) -> String;
}

/// English messages.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultTranslator;

impl Translator for DefaultTranslator {
    fn translate(&self, rule: &Rule) -> String {
        match rule {
            Rule::Required => "This value is required.".to_string(),
            Rule::MaxLength(max) => format!("This value may not be longer than {} characters.", max),
            Rule::NonEmpty => "This value may not be empty.".to_string(),
        }
    }
}

/// Checks a single candidate value against its column constraints.
pub trait Validator {
    fn validate(&self, value: &Value, constraints: &Constraints, translator: &dyn Translator) -> Vec<String>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultValidator;

impl DefaultValidator {
    fn failed_rules(value: &Value, constraints: &Constraints) -> Vec<Rule> {
        if value.is_blank() {
            // Nothing else can be said about a missing value.
            return if constraints.required {
                vec![Rule::Required]
            } else if constraints.non_empty && !value.is_null() {
                vec![Rule::NonEmpty]
            } else {
                Vec::new()
            };
        }

        let mut failed = Vec::new();
        if constraints.non_empty && value.is_empty() {
            failed.push(Rule::NonEmpty);
        }
        if let Some(max) = constraints.max_length {
            if value.text_length() > max {
                failed.push(Rule::MaxLength(max));
            }
        }
        failed
    }
}

impl Validator for DefaultValidator {
    fn validate(&self, value: &Value, constraints: &Constraints, translator: &dyn Translator) -> Vec<String> {
        Self::failed_rules(value, constraints)
            .iter()
            .map(|rule| translator.translate(rule))
            .collect()
    }
}
