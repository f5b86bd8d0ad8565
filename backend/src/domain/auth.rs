//! Authentication payloads: login and signup credentials.
//!
//! Keep inbound payload parsing outside the domain by exposing constructors
//! that validate string inputs before a handler talks to the identity
//! provider. Passwords are wrapped in [`Zeroizing`] so they are wiped from
//! memory on drop.

use std::fmt;

use zeroize::Zeroizing;

use super::user::{DisplayName, EmailAddress, UserValidationError};

/// Minimum password length accepted at signup.
pub const PASSWORD_MIN: usize = 8;

/// A single password-complexity rule. Signup reports every unmet rule at
/// once rather than the first failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordRule {
    /// At least [`PASSWORD_MIN`] characters.
    MinLength,
    /// At least one uppercase letter.
    Uppercase,
    /// At least one lowercase letter.
    Lowercase,
    /// At least one decimal digit.
    Digit,
    /// At least one non-alphanumeric character.
    Special,
}

impl PasswordRule {
    /// Stable code used in error details.
    pub fn code(self) -> &'static str {
        match self {
            Self::MinLength => "min_length",
            Self::Uppercase => "uppercase",
            Self::Lowercase => "lowercase",
            Self::Digit => "digit",
            Self::Special => "special",
        }
    }

    fn satisfied_by(self, password: &str) -> bool {
        match self {
            Self::MinLength => password.chars().count() >= PASSWORD_MIN,
            Self::Uppercase => password.chars().any(|c| c.is_ascii_uppercase()),
            Self::Lowercase => password.chars().any(|c| c.is_ascii_lowercase()),
            Self::Digit => password.chars().any(|c| c.is_ascii_digit()),
            Self::Special => password.chars().any(|c| !c.is_ascii_alphanumeric()),
        }
    }

    const ALL: [Self; 5] = [
        Self::MinLength,
        Self::Uppercase,
        Self::Lowercase,
        Self::Digit,
        Self::Special,
    ];

    /// Every rule the given password fails to satisfy.
    pub fn unmet_for(password: &str) -> Vec<Self> {
        Self::ALL
            .into_iter()
            .filter(|rule| !rule.satisfied_by(password))
            .collect()
    }
}

impl fmt::Display for PasswordRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MinLength => {
                write!(f, "password must be at least {PASSWORD_MIN} characters long")
            }
            Self::Uppercase => write!(f, "password must contain at least one uppercase letter"),
            Self::Lowercase => write!(f, "password must contain at least one lowercase letter"),
            Self::Digit => write!(f, "password must contain at least one digit"),
            Self::Special => write!(f, "password must contain at least one special character"),
        }
    }
}

/// Validation errors for [`LoginCredentials`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginValidationError {
    /// Email address was malformed.
    InvalidEmail,
    /// Password was blank.
    EmptyPassword,
}

impl fmt::Display for LoginValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidEmail => write!(f, "email address is not valid"),
            Self::EmptyPassword => write!(f, "password is required"),
        }
    }
}

impl std::error::Error for LoginValidationError {}

/// Validated login credentials forwarded to the identity provider.
///
/// ## Invariants
/// - `email` passes the [`EmailAddress`] shape check.
/// - `password` is non-empty but otherwise untouched; trimming a password
///   would silently change the credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    email: EmailAddress,
    password: Zeroizing<String>,
}

impl LoginCredentials {
    /// Construct credentials from raw email/password inputs.
    pub fn try_from_parts(email: &str, password: &str) -> Result<Self, LoginValidationError> {
        let email =
            EmailAddress::new(email.trim()).map_err(|_| LoginValidationError::InvalidEmail)?;
        if password.is_empty() {
            return Err(LoginValidationError::EmptyPassword);
        }
        Ok(Self {
            email,
            password: Zeroizing::new(password.to_owned()),
        })
    }

    /// Email used for the provider lookup.
    pub fn email(&self) -> &EmailAddress {
        &self.email
    }

    /// Password exactly as provided by the caller.
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

/// Validation errors for [`SignupCredentials`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignupValidationError {
    /// Username failed display-name validation.
    InvalidUsername(UserValidationError),
    /// Email address was malformed.
    InvalidEmail,
    /// Password failed one or more complexity rules.
    WeakPassword(Vec<PasswordRule>),
    /// `confirmPassword` did not match `password`.
    PasswordMismatch,
}

impl fmt::Display for SignupValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidUsername(inner) => inner.fmt(f),
            Self::InvalidEmail => write!(f, "email address is not valid"),
            Self::WeakPassword(rules) => {
                write!(f, "password does not meet the complexity requirements: ")?;
                for (index, rule) in rules.iter().enumerate() {
                    if index > 0 {
                        write!(f, "; ")?;
                    }
                    rule.fmt(f)?;
                }
                Ok(())
            }
            Self::PasswordMismatch => write!(f, "passwords don't match"),
        }
    }
}

impl std::error::Error for SignupValidationError {}

/// Validated signup payload forwarded to the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignupCredentials {
    username: DisplayName,
    email: EmailAddress,
    password: Zeroizing<String>,
}

impl SignupCredentials {
    /// Construct signup credentials from raw form inputs.
    ///
    /// Every field is validated before any store or provider interaction;
    /// an unmet password listing covers all failed rules at once.
    pub fn try_from_parts(
        username: &str,
        email: &str,
        password: &str,
        confirm_password: &str,
    ) -> Result<Self, SignupValidationError> {
        let username =
            DisplayName::new(username.trim()).map_err(SignupValidationError::InvalidUsername)?;
        let email =
            EmailAddress::new(email.trim()).map_err(|_| SignupValidationError::InvalidEmail)?;

        let unmet = PasswordRule::unmet_for(password);
        if !unmet.is_empty() {
            return Err(SignupValidationError::WeakPassword(unmet));
        }
        if password != confirm_password {
            return Err(SignupValidationError::PasswordMismatch);
        }

        Ok(Self {
            username,
            email,
            password: Zeroizing::new(password.to_owned()),
        })
    }

    /// Display name for the new profile.
    pub fn username(&self) -> &DisplayName {
        &self.username
    }

    /// Email registered with the identity provider.
    pub fn email(&self) -> &EmailAddress {
        &self.email
    }

    /// Password exactly as provided by the caller.
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}
