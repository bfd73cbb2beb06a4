use std::collections::HashMap;
use std::sync::RwLock;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountRole {
    User,
    Owner,
}

/// A registered account. Holds the argon2 hash, never the raw password,
/// so this struct is deliberately not Serialize.
#[derive(Debug, Clone)]
pub struct Account {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: AccountRole,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

struct Registry {
    by_id: HashMap<Uuid, Account>,
    by_email: HashMap<String, Uuid>,
}

/// In-memory account registry keyed by id and by normalized email.
pub struct AccountStore {
    registry: RwLock<Registry>,
}

impl AccountStore {
    pub fn new() -> Self {
        Self {
            registry: RwLock::new(Registry {
                by_id: HashMap::new(),
                by_email: HashMap::new(),
            }),
        }
    }

    /// Register a new account. Emails are unique case-insensitively, and a
    /// repeat registration is rejected rather than treated as a login.
    pub fn register(
        &self,
        name: String,
        email: String,
        phone: Option<String>,
        role: AccountRole,
        password: &str,
    ) -> Result<Account, AccountError> {
        let normalized = normalize_email(&email);
        let password_hash = hash_password(password)?;

        let mut registry = self.registry.write().unwrap();
        if registry.by_email.contains_key(&normalized) {
            return Err(AccountError::AlreadyExists(normalized));
        }

        let account = Account {
            id: Uuid::new_v4(),
            name,
            email: normalized.clone(),
            phone,
            role,
            password_hash,
            created_at: Utc::now(),
        };
        registry.by_email.insert(normalized, account.id);
        registry.by_id.insert(account.id, account.clone());

        tracing::info!("Registered account {} ({:?})", account.id, account.role);
        Ok(account)
    }

    /// Check credentials and return the account. Unknown email and wrong
    /// password both come back as `InvalidCredentials`.
    pub fn verify_login(&self, email: &str, password: &str) -> Result<Account, AccountError> {
        let normalized = normalize_email(email);
        let registry = self.registry.read().unwrap();

        let account = registry
            .by_email
            .get(&normalized)
            .and_then(|id| registry.by_id.get(id))
            .ok_or(AccountError::InvalidCredentials)?;

        if !verify_password(password, &account.password_hash)? {
            return Err(AccountError::InvalidCredentials);
        }
        Ok(account.clone())
    }

    pub fn get(&self, id: &Uuid) -> Option<Account> {
        self.registry.read().unwrap().by_id.get(id).cloned()
    }
}

impl Default for AccountStore {
    fn default() -> Self {
        Self::new()
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn hash_password(password: &str) -> Result<String, AccountError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AccountError::Hashing(e.to_string()))?;
    Ok(hash.to_string())
}

fn verify_password(password: &str, hash: &str) -> Result<bool, AccountError> {
    let parsed = PasswordHash::new(hash).map_err(|e| AccountError::Hashing(e.to_string()))?;
    // Verification always uses params from the hash
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error("Account already exists: {0}")]
    AlreadyExists(String),

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Account not found: {0}")]
    NotFound(Uuid),

    #[error("Password hashing failed: {0}")]
    Hashing(String),
}
