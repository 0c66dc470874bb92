use thiserror::Error;

use crate::contract::Role;
use crate::error::ServiceError;

pub const MIN_NAME_LENGTH: usize = 2;
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// First failing field rule. Messages are stable because callers surface them
/// verbatim in 400 responses.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("name is required")]
    NameRequired,

    #[error("name must be at least 2 characters long")]
    NameTooShort,

    #[error("invalid email format")]
    InvalidEmail,

    #[error("password must be at least 6 characters long")]
    PasswordTooShort,

    #[error("password must contain at least one lowercase letter")]
    PasswordMissingLowercase,

    #[error("password must contain at least one uppercase letter")]
    PasswordMissingUppercase,

    #[error("password must contain at least one number")]
    PasswordMissingDigit,

    #[error("invalid role; must be either 'mentor' or 'mentee'")]
    InvalidRole,

    #[error("key is required")]
    MissingKey,
}

impl From<FieldError> for ServiceError {
    fn from(error: FieldError) -> Self {
        ServiceError::Validation(error.to_string())
    }
}

/// Checks name, email, password and role in that order and reports the first
/// rule that fails.
pub fn validate_fields(
    name: &str,
    email: &str,
    password: &str,
    role: &str,
) -> Result<Role, FieldError> {
    validate_name(name)?;
    validate_email(email)?;
    validate_password(password)?;
    validate_role(role)
}

pub fn validate_name(name: &str) -> Result<(), FieldError> {
    let length = name.chars().count();
    if length == 0 {
        return Err(FieldError::NameRequired);
    }
    if length < MIN_NAME_LENGTH {
        return Err(FieldError::NameTooShort);
    }
    Ok(())
}

/// Accepts `local@domain.tld` where the local part uses letters, digits and
/// `._%+-`, the domain uses letters, digits, `.` and `-`, and the final label
/// is at least two letters.
pub fn validate_email(email: &str) -> Result<(), FieldError> {
    if is_valid_email(email) {
        Ok(())
    } else {
        Err(FieldError::InvalidEmail)
    }
}

fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    if local.is_empty()
        || !local
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '%' | '+' | '-'))
    {
        return false;
    }

    if !domain
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-'))
    {
        return false;
    }

    let Some((host, tld)) = domain.rsplit_once('.') else {
        return false;
    };

    !host.is_empty() && tld.len() >= 2 && tld.chars().all(|c| c.is_ascii_alphabetic())
}

pub fn validate_password(password: &str) -> Result<(), FieldError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(FieldError::PasswordTooShort);
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        return Err(FieldError::PasswordMissingLowercase);
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(FieldError::PasswordMissingUppercase);
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(FieldError::PasswordMissingDigit);
    }
    Ok(())
}

pub fn validate_role(role: &str) -> Result<Role, FieldError> {
    Role::parse(role).ok_or(FieldError::InvalidRole)
}

pub fn validate_key(key: &str) -> Result<(), FieldError> {
    if key.trim().is_empty() {
        return Err(FieldError::MissingKey);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_minimal_valid_registration() {
        let role = validate_fields("Jo", "jo@example.com", "Abcde1", "mentor")
            .expect("fields should pass");
        assert_eq!(role, Role::Mentor);
    }

    #[test]
    fn password_boundary_is_six_characters() {
        assert_eq!(validate_password("Abcde1"), Ok(()));
        assert_eq!(
            validate_password("Abcd1"),
            Err(FieldError::PasswordTooShort)
        );
    }

    #[test]
    fn password_requires_each_character_class() {
        assert_eq!(
            validate_password("ABCDE1"),
            Err(FieldError::PasswordMissingLowercase)
        );
        assert_eq!(
            validate_password("abcde1"),
            Err(FieldError::PasswordMissingUppercase)
        );
        assert_eq!(
            validate_password("Abcdef"),
            Err(FieldError::PasswordMissingDigit)
        );
    }

    #[test]
    fn rejects_unknown_role() {
        assert_eq!(validate_role("admin"), Err(FieldError::InvalidRole));
        assert_eq!(validate_role("Mentor"), Err(FieldError::InvalidRole));
        assert_eq!(validate_role("mentee"), Ok(Role::Mentee));
    }

    #[test]
    fn email_shapes() {
        for valid in [
            "jo@example.com",
            "first.last+tag@mail.example.co",
            "a_b%c-d@sub-domain.example.org",
        ] {
            assert_eq!(validate_email(valid), Ok(()), "{valid} should pass");
        }

        for invalid in [
            "joexample.com",
            "@example.com",
            "jo@",
            "jo@example",
            "jo@example.c",
            "jo@.com",
            "jo@example.c0m",
            "jo@@example.com",
            "jo smith@example.com",
            "jo@exa_mple.com",
        ] {
            assert_eq!(
                validate_email(invalid),
                Err(FieldError::InvalidEmail),
                "{invalid} should fail"
            );
        }
    }

    #[test]
    fn name_rules() {
        assert_eq!(validate_name(""), Err(FieldError::NameRequired));
        assert_eq!(validate_name("J"), Err(FieldError::NameTooShort));
        assert_eq!(validate_name("Jo"), Ok(()));
    }

    #[test]
    fn reports_first_failure_in_fixed_order() {
        let error = validate_fields("J", "not-an-email", "short", "admin")
            .expect_err("every field is invalid");
        assert_eq!(error, FieldError::NameTooShort);

        let error = validate_fields("Jo", "not-an-email", "short", "admin")
            .expect_err("email onwards is invalid");
        assert_eq!(error, FieldError::InvalidEmail);

        let error = validate_fields("Jo", "jo@example.com", "short", "admin")
            .expect_err("password onwards is invalid");
        assert_eq!(error, FieldError::PasswordTooShort);

        let error = validate_fields("Jo", "jo@example.com", "Abcdef1", "admin")
            .expect_err("role is invalid");
        assert_eq!(error, FieldError::InvalidRole);
    }

    #[test]
    fn field_errors_become_validation_errors() {
        let error: ServiceError = FieldError::MissingKey.into();
        assert_eq!(error.status_code(), 400);
        assert_eq!(error.public_message(), "key is required");
    }

    #[test]
    fn blank_key_is_rejected() {
        assert_eq!(validate_key(""), Err(FieldError::MissingKey));
        assert_eq!(validate_key("   "), Err(FieldError::MissingKey));
        assert_eq!(validate_key("docs/a.txt"), Ok(()));
    }
}
