//! Password hashing

use todo_core::exception::{Error, Result};

/// Password hasher trait
///
/// # Examples
///
/// ```
/// use todo_auth::{Argon2Hasher, PasswordHasher};
///
/// let hasher = Argon2Hasher::new();
/// let hash = hasher.hash("correct horse").unwrap();
///
/// assert!(hasher.verify("correct horse", &hash).unwrap());
/// assert!(!hasher.verify("battery staple", &hash).unwrap());
/// ```
pub trait PasswordHasher: Send + Sync {
	/// Hashes a password into its storable PHC string form
	fn hash(&self, password: &str) -> Result<String>;

	/// Verifies a password against a stored hash
	///
	/// Returns `Ok(false)` on mismatch and an error only when `hash` is not a
	/// hash this hasher understands.
	fn verify(&self, password: &str, hash: &str) -> Result<bool>;
}

/// Argon2id password hasher
#[derive(Debug, Clone, Copy, Default)]
pub struct Argon2Hasher;

impl Argon2Hasher {
	pub fn new() -> Self {
		Self
	}
}

impl PasswordHasher for Argon2Hasher {
	fn hash(&self, password: &str) -> Result<String> {
		use argon2::{
			Argon2,
			password_hash::{PasswordHasher as _, SaltString},
		};
		use rand::RngCore;

		let mut salt_bytes = [0u8; 16];
		rand::rng().fill_bytes(&mut salt_bytes);
		let salt = SaltString::encode_b64(&salt_bytes)
			.map_err(|e| Error::AuthenticationFailed(e.to_string()))?;

		Argon2::default()
			.hash_password(password.as_bytes(), &salt)
			.map(|hash| hash.to_string())
			.map_err(|e| Error::AuthenticationFailed(e.to_string()))
	}

	fn verify(&self, password: &str, hash: &str) -> Result<bool> {
		use argon2::{
			Argon2,
			password_hash::{PasswordHash, PasswordVerifier},
		};

		let parsed_hash =
			PasswordHash::new(hash).map_err(|e| Error::AuthenticationFailed(e.to_string()))?;

		Ok(Argon2::default()
			.verify_password(password.as_bytes(), &parsed_hash)
			.is_ok())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_hashes_are_salted() {
		let hasher = Argon2Hasher::new();

		let first = hasher.hash("secret").unwrap();
		let second = hasher.hash("secret").unwrap();

		assert_ne!(first, second);
		assert!(first.starts_with("$argon2id$"));
		assert!(hasher.verify("secret", &second).unwrap());
	}

	#[rstest]
	fn test_verify_rejects_garbage_hash() {
		let hasher = Argon2Hasher::new();
		assert!(hasher.verify("secret", "not-a-hash").is_err());
	}
}
