//! # Validation Module
//!
//! Input validation utilities for Rubia POS.
//!
//! Validation runs at the edge, before business logic and before any write;
//! the database adds its own NOT NULL / UNIQUE / FK layer underneath.

use crate::error::ValidationError;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a product code (the QR payload).
///
/// ## Rules
/// - Exactly 8 ASCII digits
///
/// ## Example
/// ```rust
/// use rubia_core::validation::validate_product_code;
///
/// assert!(validate_product_code("48201937").is_ok());
/// assert!(validate_product_code("1234").is_err());
/// assert!(validate_product_code("4820193a").is_err());
/// ```
pub fn validate_product_code(code: &str) -> ValidationResult<()> {
    let code = code.trim();

    if code.is_empty() {
        return Err(ValidationError::Required {
            field: "code".to_string(),
        });
    }

    if code.len() != 8 || !code.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::InvalidFormat {
            field: "code".to_string(),
            reason: "must be exactly 8 digits".to_string(),
        });
    }

    Ok(())
}

/// Validates a name-like field (client name, supplier name, product
/// description).
pub fn validate_name(field: &str, value: &str) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.len() > 200 {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: 200,
        });
    }

    Ok(())
}

/// Validates a tax id (CPF/CNPJ).
///
/// ## Rules
/// - Must not be empty
/// - Digits only after stripping the usual ./- punctuation
///
/// Returns the normalized digit string.
pub fn validate_tax_id(tax_id: &str) -> ValidationResult<String> {
    let digits: String = tax_id
        .chars()
        .filter(|c| !matches!(c, '.' | '-' | '/' | ' '))
        .collect();

    if digits.is_empty() {
        return Err(ValidationError::Required {
            field: "tax_id".to_string(),
        });
    }

    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::InvalidFormat {
            field: "tax_id".to_string(),
            reason: "must contain only digits".to_string(),
        });
    }

    Ok(digits)
}

/// Validates a destination phone for the WhatsApp relay.
///
/// ## Rules
/// - E.164 digits without the leading '+' (CallMeBot format)
/// - 8 to 15 digits
pub fn validate_phone(phone: &str) -> ValidationResult<()> {
    let phone = phone.trim();

    if phone.is_empty() {
        return Err(ValidationError::Required {
            field: "phone".to_string(),
        });
    }

    if phone.len() < 8 || phone.len() > 15 || !phone.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::InvalidFormat {
            field: "phone".to_string(),
            reason: "must be 8-15 digits without '+'".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a quantity value (cart line, stock adjustment).
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > crate::MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: crate::MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a price in cents. Zero is allowed (giveaway items).
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates a UUID string.
pub fn validate_uuid(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: "id".to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_product_code() {
        assert!(validate_product_code("48201937").is_ok());
        assert!(validate_product_code(" 48201937 ").is_ok());

        assert!(validate_product_code("").is_err());
        assert!(validate_product_code("1234567").is_err());
        assert!(validate_product_code("123456789").is_err());
        assert!(validate_product_code("4820193a").is_err());
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("name", "Maria Silva").is_ok());
        assert!(validate_name("name", "").is_err());
        assert!(validate_name("name", &"A".repeat(300)).is_err());
    }

    #[test]
    fn test_validate_tax_id() {
        assert_eq!(validate_tax_id("123.456.789-09").unwrap(), "12345678909");
        assert_eq!(validate_tax_id("12345678909").unwrap(), "12345678909");

        assert!(validate_tax_id("").is_err());
        assert!(validate_tax_id("12a45").is_err());
    }

    #[test]
    fn test_validate_phone() {
        assert!(validate_phone("5511999998888").is_ok());
        assert!(validate_phone("+5511999998888").is_err());
        assert!(validate_phone("123").is_err());
        assert!(validate_phone("").is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(999).is_ok());

        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(1000).is_err());
    }

    #[test]
    fn test_validate_price_cents() {
        assert!(validate_price_cents(0).is_ok());
        assert!(validate_price_cents(4990).is_ok());
        assert!(validate_price_cents(-100).is_err());
    }

    #[test]
    fn test_validate_uuid() {
        assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(validate_uuid("").is_err());
        assert!(validate_uuid("not-a-uuid").is_err());
    }
}
