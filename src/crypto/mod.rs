//! Cryptographic helpers

pub mod aes;
pub mod password;

pub use aes::{decrypt, encrypt, EncryptionError, EncryptionKey};
pub use password::{hash_password, verify_password};
