//! Authentication utilities

mod credential_error;
mod jwt;
mod password;

pub use credential_error::CredentialError;
pub use jwt::{Claims, JwtService, TokenType};
pub use password::{
    hash_password, validate_password_strength, verify_password, PasswordService,
};
