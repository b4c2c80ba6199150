use crate::error::PaymentError;
use serde::{Deserialize, Serialize};

const MAX_NAME_LEN: usize = 100;
const MIN_AMOUNT: u64 = 100;
const MAX_AMOUNT: u64 = 10_000_000;

/// Payment amount in whole FCFA.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Amount(u64);

impl Amount {
    pub fn new(value: u64) -> Result<Self, PaymentError> {
        if value < MIN_AMOUNT {
            Err(PaymentError::Validation(format!(
                "amount must be at least {MIN_AMOUNT} FCFA"
            )))
        } else if value > MAX_AMOUNT {
            Err(PaymentError::Validation(format!(
                "amount must not exceed {MAX_AMOUNT} FCFA"
            )))
        } else {
            Ok(Self(value))
        }
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl TryFrom<u64> for Amount {
    type Error = PaymentError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Customer identity attached to a payment attempt, immutable after
/// creation. Construction validates and canonicalizes every field.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
pub struct Customer {
    pub firstname: String,
    pub lastname: String,
    /// Digits only, national prefix included: `226XXXXXXXX`.
    pub phone: String,
}

impl Customer {
    pub fn new(firstname: &str, lastname: &str, phone: &str) -> Result<Self, PaymentError> {
        Ok(Self {
            firstname: validate_name("firstname", firstname)?,
            lastname: validate_name("lastname", lastname)?,
            phone: validate_phone(phone)?,
        })
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.firstname, self.lastname)
    }
}

/// Trims, title-cases and checks the alphabet: letters, spaces and
/// hyphens only.
fn validate_name(field: &str, value: &str) -> Result<String, PaymentError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(PaymentError::Validation(format!("{field} is required")));
    }
    if trimmed.chars().count() > MAX_NAME_LEN {
        return Err(PaymentError::Validation(format!(
            "{field} must not exceed {MAX_NAME_LEN} characters"
        )));
    }
    if !trimmed
        .chars()
        .all(|c| c.is_alphabetic() || c == ' ' || c == '-')
    {
        return Err(PaymentError::Validation(format!(
            "{field} must contain only letters, spaces and hyphens"
        )));
    }
    Ok(title_case(trimmed))
}

fn title_case(value: &str) -> String {
    value
        .split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Accepts `+226` followed by 8 digits, spaces allowed between pairs, and
/// normalizes to the digits-only form the gateway expects.
fn validate_phone(value: &str) -> Result<String, PaymentError> {
    let compact: String = value.chars().filter(|c| !c.is_whitespace()).collect();
    let digits = compact.strip_prefix("+226").ok_or_else(|| {
        PaymentError::Validation("phone must start with +226".to_string())
    })?;
    if digits.len() != 8 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(PaymentError::Validation(
            "phone must have 8 digits after +226".to_string(),
        ));
    }
    Ok(format!("226{digits}"))
}
