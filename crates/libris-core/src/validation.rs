//! # Validation Module
//!
//! Input validation for catalog and membership data.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: API surface                                                  │
//! │  └── Type validation (deserialization)                                 │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  └── Field rules (ISBN shape, copy counts, email shape)                │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── UNIQUE constraints (isbn, email, membership_number)               │
//! │  └── CHECK (0 <= available_copies <= total_copies)                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::types::{NewBook, NewMember};
use crate::MAX_COPIES_PER_TITLE;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a required free-text field (title, author, name, ...).
///
/// ## Rules
/// - Must not be blank
/// - At most `max` characters after trimming
pub fn validate_text(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

/// Validates an ISBN.
///
/// ## Rules
/// - Hyphens and spaces are ignored
/// - ISBN-13: 13 digits
/// - ISBN-10: 9 digits followed by a digit or `X`
///
/// Check digits are not verified.
///
/// ## Example
/// ```rust
/// use libris_core::validation::validate_isbn;
///
/// assert!(validate_isbn("978-0-441-01359-3").is_ok());
/// assert!(validate_isbn("0-306-40615-X").is_ok());
/// assert!(validate_isbn("12345").is_err());
/// ```
pub fn validate_isbn(isbn: &str) -> ValidationResult<()> {
    let compact: Vec<char> = normalize_isbn(isbn).chars().collect();

    if compact.is_empty() {
        return Err(ValidationError::Required {
            field: "isbn".to_string(),
        });
    }

    let valid = match compact.len() {
        13 => compact.iter().all(|c| c.is_ascii_digit()),
        10 => {
            compact[..9].iter().all(|c| c.is_ascii_digit())
                && (compact[9].is_ascii_digit() || compact[9] == 'X')
        }
        _ => false,
    };

    if !valid {
        return Err(ValidationError::InvalidFormat {
            field: "isbn".to_string(),
            reason: "must be 10 or 13 digits (ISBN-10 may end in X)".to_string(),
        });
    }

    Ok(())
}

/// Canonical stored form of an ISBN: hyphens and whitespace removed,
/// a trailing ISBN-10 `x` upper-cased.
///
/// ```rust
/// use libris_core::validation::normalize_isbn;
///
/// assert_eq!(normalize_isbn(" 978-0-441-01359-3 "), "9780441013593");
/// assert_eq!(normalize_isbn("0-306-40615-x"), "030640615X");
/// ```
pub fn normalize_isbn(isbn: &str) -> String {
    isbn.chars()
        .filter(|c| *c != '-' && !c.is_whitespace())
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// Validates an email address.
///
/// ## Rules
/// - Exactly one `@`, with text on both sides
/// - Domain part contains a `.` that is not at either end
/// - No whitespace
pub fn validate_email(email: &str) -> ValidationResult<()> {
    let email = email.trim();

    if email.is_empty() {
        return Err(ValidationError::Required {
            field: "email".to_string(),
        });
    }

    let invalid = |reason: &str| ValidationError::InvalidFormat {
        field: "email".to_string(),
        reason: reason.to_string(),
    };

    if email.chars().any(char::is_whitespace) {
        return Err(invalid("must not contain spaces"));
    }

    let mut parts = email.split('@');
    let (local, domain) = match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => (local, domain),
        _ => return Err(invalid("must contain exactly one '@'")),
    };

    if local.is_empty() || domain.is_empty() {
        return Err(invalid("must have text before and after '@'"));
    }

    if !domain.contains('.') || domain.starts_with('.') || domain.ends_with('.') {
        return Err(invalid("domain must contain a '.'"));
    }

    Ok(())
}

/// Validates a membership (library card) number.
///
/// ## Rules
/// - 1 to 32 characters
/// - Letters, digits and hyphens only
pub fn validate_membership_number(number: &str) -> ValidationResult<()> {
    validate_text("membership_number", number, 32)?;

    if !number
        .trim()
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-')
    {
        return Err(ValidationError::InvalidFormat {
            field: "membership_number".to_string(),
            reason: "must contain only letters, numbers, and hyphens".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates the copy count of a new title.
///
/// ## Rules
/// - At least 1
/// - At most [`MAX_COPIES_PER_TITLE`]
pub fn validate_total_copies(total: i64) -> ValidationResult<()> {
    if !(1..=MAX_COPIES_PER_TITLE).contains(&total) {
        return Err(ValidationError::OutOfRange {
            field: "total_copies".to_string(),
            min: 1,
            max: MAX_COPIES_PER_TITLE,
        });
    }

    Ok(())
}

// =============================================================================
// Entity Validators
// =============================================================================

/// Validates every field of a new title.
pub fn validate_new_book(book: &NewBook) -> ValidationResult<()> {
    validate_text("title", &book.title, 300)?;
    validate_text("author", &book.author, 200)?;
    validate_isbn(&book.isbn)?;
    validate_text("category", &book.category, 100)?;
    validate_total_copies(book.total_copies)?;
    Ok(())
}

/// Validates every field of a new member.
pub fn validate_new_member(member: &NewMember) -> ValidationResult<()> {
    validate_text("name", &member.name, 200)?;
    validate_email(&member.email)?;
    validate_membership_number(&member.membership_number)?;
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn new_book() -> NewBook {
        NewBook {
            title: "The Left Hand of Darkness".to_string(),
            author: "Ursula K. Le Guin".to_string(),
            isbn: "978-0-441-47812-5".to_string(),
            category: "Science Fiction".to_string(),
            total_copies: 2,
        }
    }

    #[test]
    fn test_validate_isbn() {
        assert!(validate_isbn("9780441478125").is_ok());
        assert!(validate_isbn("978 0 441 47812 5").is_ok());
        assert!(validate_isbn("0306406152").is_ok());
        assert!(validate_isbn("030640615x").is_ok());

        assert!(matches!(
            validate_isbn(""),
            Err(ValidationError::Required { .. })
        ));
        assert!(validate_isbn("97804414781").is_err());
        assert!(validate_isbn("X306406152").is_err());
        assert!(validate_isbn("978044147812Z").is_err());
    }

    #[test]
    fn test_normalize_isbn_collapses_spellings() {
        assert_eq!(normalize_isbn("978-0-441-01359-3"), normalize_isbn("9780441013593"));
        assert_eq!(normalize_isbn("978 0 441 01359 3"), "9780441013593");
        assert_eq!(normalize_isbn("030640615x"), "030640615X");
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("ada@example.org").is_ok());
        assert!(validate_email("  ada@lib.example.org ").is_ok());

        assert!(validate_email("").is_err());
        assert!(validate_email("ada.example.org").is_err());
        assert!(validate_email("ada@@example.org").is_err());
        assert!(validate_email("@example.org").is_err());
        assert!(validate_email("ada@example").is_err());
        assert!(validate_email("ada@example.").is_err());
        assert!(validate_email("a da@example.org").is_err());
    }

    #[test]
    fn test_validate_membership_number() {
        assert!(validate_membership_number("LIB-000123").is_ok());
        assert!(validate_membership_number("").is_err());
        assert!(validate_membership_number("LIB 123").is_err());
        assert!(validate_membership_number(&"9".repeat(33)).is_err());
    }

    #[test]
    fn test_validate_total_copies() {
        assert!(validate_total_copies(1).is_ok());
        assert!(validate_total_copies(MAX_COPIES_PER_TITLE).is_ok());
        assert!(validate_total_copies(0).is_err());
        assert!(validate_total_copies(-3).is_err());
        assert!(validate_total_copies(MAX_COPIES_PER_TITLE + 1).is_err());
    }

    #[test]
    fn test_validate_new_book() {
        assert!(validate_new_book(&new_book()).is_ok());

        let blank_title = NewBook {
            title: "   ".to_string(),
            ..new_book()
        };
        let err = validate_new_book(&blank_title).unwrap_err();
        assert_eq!(err.to_string(), "title is required");

        let no_copies = NewBook {
            total_copies: 0,
            ..new_book()
        };
        assert!(validate_new_book(&no_copies).is_err());
    }

    #[test]
    fn test_validate_new_member() {
        let member = NewMember {
            name: "Ada Lovelace".to_string(),
            email: "ada@example.org".to_string(),
            membership_number: "LIB-0001".to_string(),
        };
        assert!(validate_new_member(&member).is_ok());

        let bad_email = NewMember {
            email: "ada".to_string(),
            ..member
        };
        assert!(validate_new_member(&bad_email).is_err());
    }
}
