//! Form-style input validation.
//!
//! Mutations validate their whole input before touching persistence
//! and report every failing field at once, keyed by field name, so the
//! client can render all messages in a single round trip.

use atelier_core::Email;

use crate::error::{ApiError, FieldErrors};

const PASSWORD_MIN_LENGTH: usize = 8;
const PASSWORD_SPECIALS: &str = "@$!%*?&";

/// Accumulates field errors across a mutation's input.
#[derive(Debug, Default)]
pub struct Validator {
    errors: FieldErrors,
}

impl Validator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn fail(&mut self, field: &str, message: String) {
        // First failure per field wins.
        self.errors
            .entry(field.to_owned())
            .or_insert(message);
    }

    /// Require a non-empty text field.
    pub fn require(&mut self, field: &str, value: &str) -> &mut Self {
        if value.trim().is_empty() {
            self.fail(field, format!("Please insert {field}."));
        }
        self
    }

    /// Require a non-empty selection list (colors, sizes).
    pub fn require_choice<T>(&mut self, field: &str, values: &[T]) -> &mut Self {
        if values.is_empty() {
            self.fail(field, format!("Please choose {field}."));
        }
        self
    }

    /// Require at least one uploaded file.
    pub fn require_upload<T>(&mut self, field: &str, values: &[T]) -> &mut Self {
        if values.is_empty() {
            self.fail(field, format!("Please upload {field}."));
        }
        self
    }

    /// Require a well-formed email address.
    pub fn require_email(&mut self, field: &str, value: &str) -> &mut Self {
        if value.trim().is_empty() {
            self.fail(field, format!("Please insert {field}."));
        } else if !is_valid_email(value) {
            self.fail(field, "Please insert email in correct format.".to_owned());
        }
        self
    }

    /// Require a password meeting the account password policy.
    pub fn require_password(&mut self, field: &str, value: &str) -> &mut Self {
        if value.is_empty() {
            self.fail(field, format!("Please insert {field}."));
        } else if !is_valid_password(value) {
            self.fail(
                field,
                "Please insert password in correct format. Minimum 8 characters, \
                 at least 1 uppercase, 1 lowercase, 1 number and 1 special character."
                    .to_owned(),
            );
        }
        self
    }

    /// Require a strictly positive numeric field.
    pub fn require_positive(&mut self, field: &str, value: impl Into<f64>) -> &mut Self {
        if value.into() <= 0.0 {
            self.fail(field, format!("Please insert valid {field}."));
        }
        self
    }

    /// Require a strictly positive monetary amount.
    pub fn require_positive_amount(
        &mut self,
        field: &str,
        value: rust_decimal::Decimal,
    ) -> &mut Self {
        if value <= rust_decimal::Decimal::ZERO {
            self.fail(field, format!("Please insert valid {field}."));
        }
        self
    }

    /// Require a star rating within 1..=5.
    pub fn require_rating(&mut self, field: &str, value: u8) -> &mut Self {
        if !(1..=5).contains(&value) {
            self.fail(field, format!("Please insert valid {field}."));
        }
        self
    }

    /// Finish validation.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] carrying every collected field
    /// error when any check failed.
    pub fn finish(self) -> Result<(), ApiError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(self.errors))
        }
    }
}

/// Structurally valid email: parseable and with a dot in the domain.
fn is_valid_email(value: &str) -> bool {
    match Email::parse(value) {
        Ok(email) => email.domain().contains('.'),
        Err(_) => false,
    }
}

/// Password policy: minimum 8 characters, at least one uppercase
/// letter, one lowercase letter, one digit and one special character,
/// drawn only from letters, digits and the allowed specials.
fn is_valid_password(value: &str) -> bool {
    let allowed = |c: char| c.is_ascii_alphanumeric() || PASSWORD_SPECIALS.contains(c);
    value.len() >= PASSWORD_MIN_LENGTH
        && value.chars().all(allowed)
        && value.chars().any(|c| c.is_ascii_uppercase())
        && value.chars().any(|c| c.is_ascii_lowercase())
        && value.chars().any(|c| c.is_ascii_digit())
        && value.chars().any(|c| PASSWORD_SPECIALS.contains(c))
}
