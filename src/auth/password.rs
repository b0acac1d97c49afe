//! Password hashing with bcrypt.

use super::AuthError;

/// Hashes and verifies passwords at a fixed bcrypt cost.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self {
            cost: bcrypt::DEFAULT_COST,
        }
    }
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        Ok(bcrypt::hash(password, self.cost)?)
    }

    /// A malformed stored hash never verifies.
    pub fn verify_password(&self, password: &str, hash: &str) -> bool {
        bcrypt::verify(password, hash).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hasher = PasswordHasher::new(4);
        let hash = hasher.hash_password("demo_password").unwrap();
        assert_ne!(hash, "demo_password");
        assert!(hasher.verify_password("demo_password", &hash));
        assert!(!hasher.verify_password("wrong", &hash));
    }

    #[test]
    fn test_malformed_hash_is_rejected() {
        let hasher = PasswordHasher::new(4);
        assert!(!hasher.verify_password("anything", "not-a-bcrypt-hash"));
    }
}
