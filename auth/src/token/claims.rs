use std::collections::HashMap;
use std::fmt;

use serde::Deserialize;
use serde::Serialize;

/// What a token may be used for.
///
/// Every token carries its purpose so that a token minted for one flow can
/// never be replayed into another.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenPurpose {
    Access,
    PasswordReset,
}

impl TokenPurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenPurpose::Access => "access",
            TokenPurpose::PasswordReset => "password-reset",
        }
    }
}

impl fmt::Display for TokenPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Token claims.
///
/// Standard RFC 7519 claims plus a `purpose` tag and custom fields via the
/// flattened `extra` map. `iat` and `exp` are stamped by the codec at issue
/// time; anything set on them beforehand is overwritten.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Claims {
    /// Subject (user identifier)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,

    /// Purpose tag, see [`TokenPurpose`]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,

    /// Issued at (Unix timestamp)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,

    /// Expiration time (Unix timestamp)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,

    /// Additional custom fields (flattened into token)
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl Claims {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims for a token of the given purpose.
    pub fn for_purpose(purpose: TokenPurpose) -> Self {
        Self::new().with_purpose(purpose)
    }

    pub fn with_subject(mut self, sub: impl ToString) -> Self {
        self.sub = Some(sub.to_string());
        self
    }

    pub fn with_purpose(mut self, purpose: TokenPurpose) -> Self {
        self.purpose = Some(purpose.as_str().to_string());
        self
    }

    pub fn with_issued_at(mut self, iat: i64) -> Self {
        self.iat = Some(iat);
        self
    }

    pub fn with_expiration(mut self, exp: i64) -> Self {
        self.exp = Some(exp);
        self
    }

    /// Add a custom field.
    pub fn with_extra(mut self, key: impl ToString, value: impl Serialize) -> Self {
        if let Ok(json_value) = serde_json::to_value(value) {
            self.extra.insert(key.to_string(), json_value);
        }
        self
    }

    /// Read a custom string field.
    pub fn extra_str(&self, key: &str) -> Option<&str> {
        self.extra.get(key).and_then(|v| v.as_str())
    }

    /// Whether the token carries exactly the given purpose.
    pub fn has_purpose(&self, purpose: TokenPurpose) -> bool {
        self.purpose.as_deref() == Some(purpose.as_str())
    }

    /// Check if token is expired. A token is still valid at its `exp` second.
    pub fn is_expired(&self, current_timestamp: i64) -> bool {
        self.exp.map_or(false, |exp| exp < current_timestamp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_pattern() {
        let claims = Claims::for_purpose(TokenPurpose::PasswordReset)
            .with_extra("email", "a@b.com")
            .with_issued_at(1234567800)
            .with_expiration(1234567890);

        assert!(claims.has_purpose(TokenPurpose::PasswordReset));
        assert!(!claims.has_purpose(TokenPurpose::Access));
        assert_eq!(claims.extra_str("email"), Some("a@b.com"));
        assert_eq!(claims.iat, Some(1234567800));
        assert_eq!(claims.exp, Some(1234567890));
        assert!(claims.sub.is_none());
    }

    #[test]
    fn test_serialized_shape() {
        let claims = Claims::for_purpose(TokenPurpose::Access)
            .with_subject("42")
            .with_issued_at(100)
            .with_expiration(200);

        let json = serde_json::to_value(&claims).expect("serializable");
        assert_eq!(
            json,
            serde_json::json!({"sub": "42", "purpose": "access", "iat": 100, "exp": 200})
        );
    }

    #[test]
    fn test_unknown_fields_land_in_extra() {
        let claims: Claims = serde_json::from_value(serde_json::json!({
            "purpose": "password-reset",
            "email": "a@b.com",
            "exp": 10
        }))
        .expect("deserializable");

        assert_eq!(claims.extra_str("email"), Some("a@b.com"));
        assert_eq!(claims.exp, Some(10));
        assert!(claims.iat.is_none());
    }

    #[test]
    fn test_is_expired() {
        let claims = Claims::new().with_expiration(1000);

        assert!(!claims.is_expired(999));
        assert!(!claims.is_expired(1000)); // Exactly at expiration
        assert!(claims.is_expired(1001));
    }
}
