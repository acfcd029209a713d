//! Password hashing
//!
//! Adaptive bcrypt hashes. Plaintext passwords are only ever held long enough
//! to hash or verify them; they are never stored or logged.

use std::fmt;
use std::str::FromStr;

/// Work factor used when `PASSWORD_HASH_COST` is not set
pub const DEFAULT_COST: u32 = bcrypt::DEFAULT_COST;

/// Cheapest work factor bcrypt accepts
pub const MIN_COST: u32 = 4;

/// Most expensive work factor bcrypt accepts
pub const MAX_COST: u32 = 31;

/// A stored bcrypt hash in modular crypt format (`$2b$<cost>$<salt+digest>`).
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordHash(String);

/// Errors raised while hashing or parsing a persisted hash
#[derive(Debug, thiserror::Error)]
pub enum PasswordHashError {
    #[error("Malformed password hash")]
    Malformed,

    #[error("Password hashing failed: {0}")]
    Hashing(#[from] bcrypt::BcryptError),
}

impl PasswordHash {
    /// Hash a plaintext password with a fresh salt at the given work factor.
    pub fn with_cost(password: &str, cost: u32) -> Result<Self, PasswordHashError> {
        Ok(Self(bcrypt::hash(password, cost)?))
    }

    /// Check a plaintext password against this hash.
    pub fn verify(&self, password: &str) -> bool {
        bcrypt::verify(password, &self.0).unwrap_or(false)
    }

    /// Work factor the hash was produced with
    pub fn cost(&self) -> Option<u32> {
        self.0
            .parse::<bcrypt::HashParts>()
            .ok()
            .map(|parts| parts.get_cost())
    }

    /// Persisted representation
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for PasswordHash {
    type Err = PasswordHashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<bcrypt::HashParts>()
            .map_err(|_| PasswordHashError::Malformed)?;
        Ok(Self(s.to_string()))
    }
}

impl fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordHash([REDACTED])")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hash(password: &str) -> PasswordHash {
        PasswordHash::with_cost(password, MIN_COST).unwrap()
    }

    #[test]
    fn test_verify_accepts_original_password() {
        let hash = hash("password");
        assert!(hash.verify("password"));
        assert!(!hash.verify("Password"));
        assert!(!hash.verify(""));
    }

    #[test]
    fn test_same_password_gets_different_salts() {
        assert_ne!(hash("password"), hash("password"));
    }

    #[test]
    fn test_hash_does_not_contain_plaintext() {
        let hash = hash("hunter22");
        assert!(!hash.as_str().contains("hunter22"));
        assert!(hash.as_str().starts_with("$2b$04$"));
        assert_eq!(format!("{:?}", hash), "PasswordHash([REDACTED])");
    }

    #[test]
    fn test_cost_is_recorded_in_hash() {
        assert_eq!(hash("secret").cost(), Some(MIN_COST));
    }

    #[test]
    fn test_cost_out_of_range_rejected() {
        assert!(matches!(
            PasswordHash::with_cost("secret", MIN_COST - 1),
            Err(PasswordHashError::Hashing(_))
        ));
        assert!(PasswordHash::with_cost("secret", MAX_COST + 1).is_err());
    }

    #[test]
    fn test_parse_persisted_hash() {
        let hash = hash("secret");
        let parsed: PasswordHash = hash.as_str().parse().unwrap();
        assert!(parsed.verify("secret"));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!("plaintext".parse::<PasswordHash>().is_err());
        assert!("$2b$04$tooshort".parse::<PasswordHash>().is_err());
        assert!("sha256$00$00".parse::<PasswordHash>().is_err());
    }

    #[test]
    fn test_unparseable_hash_never_verifies() {
        let hash = PasswordHash("plaintext".to_string());
        assert!(!hash.verify("plaintext"));
    }
}
