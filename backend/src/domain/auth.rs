//! Authentication primitives exchanged with the identity provider.
//!
//! Inbound payloads are validated here before any provider call so handlers
//! can reject malformed requests without a network round trip.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use super::AuthenticatedUser;

/// Minimum password length accepted for sign-up and password changes.
pub const PASSWORD_MIN_CHARS: usize = 6;

/// Domain error returned when credential payload values are invalid.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CredentialsValidationError {
    /// E-mail was missing or blank once trimmed.
    #[error("email must not be empty")]
    EmptyEmail,
    /// E-mail lacks a local part or domain.
    #[error("email must look like name@domain")]
    InvalidEmail,
    /// Password was blank.
    #[error("password must not be empty")]
    EmptyPassword,
    /// Password shorter than [`PASSWORD_MIN_CHARS`].
    #[error("password must be at least {min} characters")]
    PasswordTooShort {
        /// Required minimum.
        min: usize,
    },
}

/// A normalised e-mail address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Trim and minimally validate an address.
    ///
    /// # Examples
    /// ```
    /// use emoji_backend::domain::EmailAddress;
    ///
    /// let email = EmailAddress::parse(" ada@example.com ").expect("valid");
    /// assert_eq!(email.as_str(), "ada@example.com");
    /// assert!(EmailAddress::parse("ada").is_err());
    /// ```
    pub fn parse(raw: &str) -> Result<Self, CredentialsValidationError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(CredentialsValidationError::EmptyEmail);
        }
        match trimmed.split_once('@') {
            Some((local, domain)) if !local.is_empty() && !domain.is_empty() => {
                Ok(Self(trimmed.to_owned()))
            }
            _ => Err(CredentialsValidationError::InvalidEmail),
        }
    }

    /// Address as entered, without surrounding whitespace.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// A password held in memory that is wiped on drop.
#[derive(Clone, PartialEq, Eq)]
pub struct Password(Zeroizing<String>);

impl Password {
    /// Accept any non-empty password, e.g. for sign-in.
    pub fn existing(raw: &str) -> Result<Self, CredentialsValidationError> {
        if raw.is_empty() {
            return Err(CredentialsValidationError::EmptyPassword);
        }
        Ok(Self(Zeroizing::new(raw.to_owned())))
    }

    /// Accept a password being set, enforcing [`PASSWORD_MIN_CHARS`].
    pub fn new_secret(raw: &str) -> Result<Self, CredentialsValidationError> {
        let password = Self::existing(raw)?;
        if raw.chars().count() < PASSWORD_MIN_CHARS {
            return Err(CredentialsValidationError::PasswordTooShort {
                min: PASSWORD_MIN_CHARS,
            });
        }
        Ok(password)
    }

    /// Expose the secret for a provider call.
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(***)")
    }
}

/// Validated e-mail and password pair.
///
/// ## Invariants
/// - `email` is trimmed and contains a local part and a domain.
/// - `password` is non-empty and keeps caller-provided whitespace.
///
/// # Examples
/// ```
/// use emoji_backend::domain::Credentials;
///
/// let creds = Credentials::for_sign_in("ada@example.com", "hunter2").expect("valid");
/// assert_eq!(creds.email().as_str(), "ada@example.com");
/// assert_eq!(creds.password().expose(), "hunter2");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    email: EmailAddress,
    password: Password,
}

impl Credentials {
    /// Credentials for signing in to an existing account.
    pub fn for_sign_in(email: &str, password: &str) -> Result<Self, CredentialsValidationError> {
        Ok(Self {
            email: EmailAddress::parse(email)?,
            password: Password::existing(password)?,
        })
    }

    /// Credentials for creating an account.
    pub fn for_sign_up(email: &str, password: &str) -> Result<Self, CredentialsValidationError> {
        Ok(Self {
            email: EmailAddress::parse(email)?,
            password: Password::new_secret(password)?,
        })
    }

    /// The account e-mail.
    pub fn email(&self) -> &EmailAddress {
        &self.email
    }

    /// The account password.
    pub fn password(&self) -> &Password {
        &self.password
    }
}

/// Provider access and refresh tokens kept in the encrypted session cookie.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionTokens {
    /// Short-lived bearer token.
    pub access_token: String,
    /// Long-lived token used to mint a new access token.
    pub refresh_token: String,
}

impl SessionTokens {
    /// Bundle a token pair.
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
        }
    }
}

impl fmt::Debug for SessionTokens {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionTokens")
            .field("access_token", &"***")
            .field("refresh_token", &"***")
            .finish()
    }
}

/// A signed-in provider session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSession {
    /// The signed-in user.
    pub user: AuthenticatedUser,
    /// Tokens to persist in the session cookie.
    pub tokens: SessionTokens,
}

/// Result of a sign-up request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignUpOutcome {
    /// The provider sent a confirmation e-mail; no session yet.
    ConfirmationRequired,
    /// The provider signed the user in immediately.
    SignedIn(AuthSession),
}

/// Authorisation code returned to the callback route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeExchange {
    /// One-time code from the provider redirect.
    pub code: String,
    /// PKCE verifier stored when the flow started, if any.
    pub code_verifier: Option<String>,
}

/// One-time-password flavours accepted by the confirm route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OtpKind {
    /// Sign-up confirmation.
    Signup,
    /// Invitation acceptance.
    Invite,
    /// Magic-link login.
    Magiclink,
    /// Password recovery.
    Recovery,
    /// E-mail change confirmation.
    EmailChange,
    /// Generic e-mail OTP.
    Email,
}

/// Raised when the `type` query value is not a known OTP kind.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown one-time password type '{0}'")]
pub struct OtpKindParseError(pub String);

impl OtpKind {
    /// Provider wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Signup => "signup",
            Self::Invite => "invite",
            Self::Magiclink => "magiclink",
            Self::Recovery => "recovery",
            Self::EmailChange => "email_change",
            Self::Email => "email",
        }
    }
}

impl FromStr for OtpKind {
    type Err = OtpKindParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "signup" => Ok(Self::Signup),
            "invite" => Ok(Self::Invite),
            "magiclink" => Ok(Self::Magiclink),
            "recovery" => Ok(Self::Recovery),
            "email_change" => Ok(Self::EmailChange),
            "email" => Ok(Self::Email),
            other => Err(OtpKindParseError(other.to_owned())),
        }
    }
}

/// Token-hash verification request from an e-mail link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtpVerification {
    /// Hashed token from the link.
    pub token_hash: String,
    /// Which flow issued the link.
    pub kind: OtpKind,
}

#[cfg(test)]
mod tests {
    //! Validation coverage for credential primitives.
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("", "password", CredentialsValidationError::EmptyEmail)]
    #[case("   ", "password", CredentialsValidationError::EmptyEmail)]
    #[case("ada", "password", CredentialsValidationError::InvalidEmail)]
    #[case("@example.com", "password", CredentialsValidationError::InvalidEmail)]
    #[case("ada@", "password", CredentialsValidationError::InvalidEmail)]
    #[case("ada@example.com", "", CredentialsValidationError::EmptyPassword)]
    fn sign_in_rejects_invalid_parts(
        #[case] email: &str,
        #[case] password: &str,
        #[case] expected: CredentialsValidationError,
    ) {
        assert_eq!(Credentials::for_sign_in(email, password), Err(expected));
    }

    #[rstest]
    fn sign_up_enforces_minimum_length() {
        assert_eq!(
            Credentials::for_sign_up("ada@example.com", "12345"),
            Err(CredentialsValidationError::PasswordTooShort {
                min: PASSWORD_MIN_CHARS
            })
        );
        assert!(Credentials::for_sign_up("ada@example.com", "123456").is_ok());
    }

    #[rstest]
    fn sign_in_preserves_password_whitespace() {
        let creds = Credentials::for_sign_in("ada@example.com", " pw ").expect("valid");
        assert_eq!(creds.password().expose(), " pw ");
    }

    #[rstest]
    fn debug_output_hides_secrets() {
        let tokens = SessionTokens::new("access-secret", "refresh-secret");
        let rendered = format!("{tokens:?}");
        assert!(!rendered.contains("secret"));
        let password = Password::existing("hunter2").expect("valid");
        assert!(!format!("{password:?}").contains("hunter2"));
    }

    #[rstest]
    #[case("signup", OtpKind::Signup)]
    #[case("recovery", OtpKind::Recovery)]
    #[case("email_change", OtpKind::EmailChange)]
    #[case("magiclink", OtpKind::Magiclink)]
    fn otp_kind_parses_wire_names(#[case] raw: &str, #[case] expected: OtpKind) {
        assert_eq!(raw.parse::<OtpKind>(), Ok(expected));
        assert_eq!(expected.as_str(), raw);
    }

    #[rstest]
    fn otp_kind_rejects_unknown() {
        assert!("sms".parse::<OtpKind>().is_err());
    }
}
