use std::fmt;

use chrono::NaiveDate;
use thiserror::Error;

use crate::fmt::parse_amount;
use crate::models::{is_canonical_date, TransactionFields, TransactionInput};

pub const MAX_TAG_LENGTH: usize = 15;
pub const MAX_DESCRIPTION_LENGTH: usize = 100;
pub const MAX_AMOUNT: f64 = 999_999.99;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Date,
    Amount,
    Tag,
    Description,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Field::Date => "date",
            Field::Amount => "amount",
            Field::Tag => "tag",
            Field::Description => "description",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("date '{0}' is not a valid YYYY-MM-DD date")]
    InvalidDate(String),

    #[error("amount '{0}' is not a number")]
    InvalidAmount(String),

    #[error("amount {0:.2} is outside ±999999.99")]
    AmountOutOfRange(f64),

    #[error("tag must not be empty")]
    EmptyTag,

    #[error("{field} is {actual} characters, the limit is {max}")]
    TooLong { field: Field, max: usize, actual: usize },
}

impl ValidationError {
    pub fn field(&self) -> Field {
        match self {
            ValidationError::InvalidDate(_) => Field::Date,
            ValidationError::InvalidAmount(_) | ValidationError::AmountOutOfRange(_) => {
                Field::Amount
            }
            ValidationError::EmptyTag => Field::Tag,
            ValidationError::TooLong { field, .. } => *field,
        }
    }
}

/// Every problem found in one form submission, in field order.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{}", join_messages(.0))]
pub struct ValidationErrors(pub Vec<ValidationError>);

impl ValidationErrors {
    pub fn for_field(&self, field: Field) -> Option<&ValidationError> {
        self.0.iter().find(|e| e.field() == field)
    }
}

fn join_messages(errors: &[ValidationError]) -> String {
    errors.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("; ")
}

/// Check a form submission and convert it into storable field values.
pub fn validate(input: &TransactionInput) -> Result<TransactionFields, ValidationErrors> {
    let mut errors = Vec::new();

    let date = input.date.trim();
    let date_ok = is_canonical_date(date) && NaiveDate::parse_from_str(date, "%Y-%m-%d").is_ok();
    if !date_ok {
        errors.push(ValidationError::InvalidDate(date.to_string()));
    }

    let amount = match parse_amount(&input.amount) {
        Some(a) if a.abs() > MAX_AMOUNT => {
            errors.push(ValidationError::AmountOutOfRange(a));
            None
        }
        Some(a) => Some(a),
        None => {
            errors.push(ValidationError::InvalidAmount(input.amount.trim().to_string()));
            None
        }
    };

    let tag = input.tag.trim();
    if tag.is_empty() {
        errors.push(ValidationError::EmptyTag);
    }
    check_length(&mut errors, Field::Tag, tag, MAX_TAG_LENGTH);

    let description = input.description.trim();
    check_length(&mut errors, Field::Description, description, MAX_DESCRIPTION_LENGTH);

    match amount {
        Some(amount) if errors.is_empty() => Ok(TransactionFields {
            date: date.to_string(),
            amount,
            tag: tag.to_string(),
            description: description.to_string(),
        }),
        _ => Err(ValidationErrors(errors)),
    }
}

fn check_length(errors: &mut Vec<ValidationError>, field: Field, value: &str, max: usize) {
    let actual = value.chars().count();
    if actual > max {
        errors.push(ValidationError::TooLong { field, max, actual });
    }
}
