use crate::error::AppError;
use bcrypt::{hash, verify, DEFAULT_COST};

pub fn hash_password(password: &str) -> Result<String, AppError> {
    Ok(hash(password, DEFAULT_COST)?)
}

pub fn verify_password(password: &str, hashed_password: &str) -> Result<bool, AppError> {
    Ok(verify(password, hashed_password)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hashing_and_verification() {
        let password = "correct horse battery";
        let hashed = hash_password(password).unwrap();

        assert_ne!(hashed, password);
        assert!(verify_password(password, &hashed).unwrap());
        assert!(!verify_password("wrong password", &hashed).unwrap());
    }

    #[test]
    fn test_verify_with_invalid_hash() {
        match verify_password("whatever", "not-a-bcrypt-hash") {
            Err(AppError::Internal(_)) => {}
            Ok(false) => {
                // bcrypt may also report a malformed hash as a plain mismatch.
            }
            Ok(true) => panic!("verification must not succeed for a malformed hash"),
            Err(e) => panic!("unexpected error: {:?}", e),
        }
    }
}
