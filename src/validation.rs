use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::error::ClientError;

static EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^[A-Z0-9_'+\-.]*[A-Z0-9_+\-]@([A-Z0-9][A-Z0-9\-]*\.)+[A-Z]{2,}$").unwrap()
});
static DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+$").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    MinLength(usize),
    MaxLength(usize),
    Email,
    DigitsOnly,
}

impl Rule {
    fn check(&self, value: &str) -> bool {
        match self {
            Rule::MinLength(min) => value.chars().count() >= *min,
            Rule::MaxLength(max) => value.chars().count() <= *max,
            Rule::Email => is_email(value),
            Rule::DigitsOnly => DIGITS.is_match(value),
        }
    }
}

fn is_email(value: &str) -> bool {
    !value.starts_with('.') && !value.contains("..") && EMAIL.is_match(value)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub field: &'static str,
    pub message: &'static str,
}

#[derive(Debug, Clone)]
struct FieldRules {
    name: &'static str,
    rules: Vec<(Rule, &'static str)>,
}

#[derive(Debug, Clone, Default)]
pub struct Schema {
    fields: Vec<FieldRules>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rule(mut self, field: &'static str, rule: Rule, message: &'static str) -> Self {
        match self.fields.iter_mut().find(|f| f.name == field) {
            Some(existing) => existing.rules.push((rule, message)),
            None => self.fields.push(FieldRules {
                name: field,
                rules: vec![(rule, message)],
            }),
        }
        self
    }

    pub fn validate(&self, input: &[(&str, &str)]) -> Vec<Violation> {
        let mut violations = Vec::new();
        for field in &self.fields {
            let value = input
                .iter()
                .find(|(name, _)| *name == field.name)
                .map(|(_, v)| *v)
                .unwrap_or("");
            for &(rule, message) in &field.rules {
                if !rule.check(value) {
                    violations.push(Violation {
                        field: field.name,
                        message,
                    });
                }
            }
        }
        violations
    }

    pub fn check(&self, input: &[(&str, &str)]) -> Result<(), ClientError> {
        let violations = self.validate(input);
        if violations.is_empty() {
            return Ok(());
        }
        for v in &violations {
            debug!(field = v.field, "{}", v.message);
        }
        Err(ClientError::Validation(
            violations.into_iter().map(|v| v.message.to_string()).collect(),
        ))
    }
}

const INVALID_EMAIL: &str = "Invalid email address";
const SHORT_PASSWORD: &str = "Password must be at least 6 characters long";

pub fn login_schema() -> Schema {
    Schema::new()
        .rule("email", Rule::Email, INVALID_EMAIL)
        .rule("password", Rule::MinLength(6), SHORT_PASSWORD)
}

pub fn register_schema() -> Schema {
    Schema::new()
        .rule("name", Rule::MinLength(1), "Name is required")
        .rule("email", Rule::Email, INVALID_EMAIL)
        .rule(
            "phone",
            Rule::DigitsOnly,
            "Phone number must contain only digits",
        )
        .rule(
            "phone",
            Rule::MinLength(9),
            "Phone number must be at least 9 digits",
        )
        .rule(
            "phone",
            Rule::MaxLength(12),
            "Phone number must not exceed 12 digits",
        )
        .rule("password", Rule::MinLength(6), SHORT_PASSWORD)
}

pub fn validate_login(email: &str, password: &str) -> Result<(), ClientError> {
    login_schema().check(&[("email", email), ("password", password)])
}

pub fn validate_register(
    name: &str,
    email: &str,
    phone: &str,
    password: &str,
) -> Result<(), ClientError> {
    register_schema().check(&[
        ("name", name),
        ("email", email),
        ("phone", phone),
        ("password", password),
    ])
}
