//! Bearer credential handling
//!
//! The client only forwards the credential as an opaque `Authorization`
//! header. Reading the email claim is a convenience for the membership
//! workflow; the token signature is never verified here.

use crate::error::AppError;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde_json::Value;

const BEARER_SCHEME: &str = "Bearer";

/// An `Authorization` header value of the form `Bearer <token>`
#[derive(Clone)]
pub struct BearerCredential {
    token: String,
}

impl BearerCredential {
    /// Parse a header value as pasted by the user
    ///
    /// Surrounding whitespace is ignored and the scheme is matched
    /// case-insensitively.
    pub fn from_header(header: &str) -> Result<Self, AppError> {
        let header = header.trim();
        if header.is_empty() {
            return Err(AppError::InvalidCredential(
                "authorization header is empty".to_string(),
            ));
        }

        let (scheme, token) = header.split_once(char::is_whitespace).ok_or_else(|| {
            AppError::InvalidCredential(
                "expected 'Bearer <token>'; ensure 'Bearer ' precedes the token".to_string(),
            )
        })?;

        if !scheme.eq_ignore_ascii_case(BEARER_SCHEME) {
            return Err(AppError::InvalidCredential(format!(
                "unsupported authorization scheme '{}'",
                scheme
            )));
        }

        let token = token.trim();
        if token.is_empty() {
            return Err(AppError::InvalidCredential("token is empty".to_string()));
        }

        Ok(Self {
            token: token.to_string(),
        })
    }

    /// Wrap a raw token without a scheme prefix
    pub fn from_token(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    /// Value to send in the `Authorization` header
    pub fn header_value(&self) -> String {
        format!("{} {}", BEARER_SCHEME, self.token)
    }

    /// Read the `email` claim from the token payload
    ///
    /// Claim names are compared case-insensitively. Returns `Ok(None)` when the
    /// token is a well-formed JWT without an email claim.
    pub fn email_claim(&self) -> Result<Option<String>, AppError> {
        let payload = self.token.split('.').nth(1).ok_or_else(|| {
            AppError::InvalidCredential("token is not a JWT (missing payload segment)".to_string())
        })?;

        let bytes = URL_SAFE_NO_PAD
            .decode(payload.trim_end_matches('='))
            .map_err(|e| AppError::InvalidCredential(format!("token payload is not base64url: {}", e)))?;

        let claims: Value = serde_json::from_slice(&bytes).map_err(|e| {
            AppError::InvalidCredential(format!("token payload is not JSON: {}", e))
        })?;

        let email = claims.as_object().and_then(|obj| {
            obj.iter()
                .find(|(name, _)| name.eq_ignore_ascii_case("email"))
                .and_then(|(_, value)| value.as_str())
                .map(str::to_string)
        });

        Ok(email)
    }
}

// Keep the token out of logs.
impl std::fmt::Debug for BearerCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BearerCredential")
            .field("token", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jwt_with_claims(claims: &str) -> String {
        let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"none","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(claims);
        format!("{}.{}.signature", header, payload)
    }

    #[test]
    fn test_from_header_accepts_bearer() {
        let cred = BearerCredential::from_header("  Bearer abc.def.ghi ").unwrap();
        assert_eq!(cred.header_value(), "Bearer abc.def.ghi");

        let cred = BearerCredential::from_header("bearer xyz").unwrap();
        assert_eq!(cred.header_value(), "Bearer xyz");
    }

    #[test]
    fn test_from_header_rejects_bad_input() {
        assert!(BearerCredential::from_header("").is_err());
        assert!(BearerCredential::from_header("abc.def.ghi").is_err());
        assert!(BearerCredential::from_header("Basic dXNlcjpwYXNz").is_err());
        let err = BearerCredential::from_header("Bearer   ").unwrap_err();
        assert!(matches!(err, AppError::InvalidCredential(_)));
    }

    #[test]
    fn test_email_claim_case_insensitive() {
        let token = jwt_with_claims(r#"{"sub":"123","Email":"jane.doe@example.com"}"#);
        let cred = BearerCredential::from_token(token);
        assert_eq!(
            cred.email_claim().unwrap().as_deref(),
            Some("jane.doe@example.com")
        );
    }

    #[test]
    fn test_email_claim_absent() {
        let cred = BearerCredential::from_token(jwt_with_claims(r#"{"sub":"123"}"#));
        assert_eq!(cred.email_claim().unwrap(), None);
    }

    #[test]
    fn test_email_claim_rejects_opaque_token() {
        let cred = BearerCredential::from_token("opaque-token");
        assert!(cred.email_claim().is_err());
    }

    #[test]
    fn test_debug_redacts_token() {
        let cred = BearerCredential::from_token("secret-token");
        assert!(!format!("{:?}", cred).contains("secret-token"));
    }
}
