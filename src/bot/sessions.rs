//! Per-chat roles, granted by password and kept in memory only

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use sha2::{Digest, Sha256};

use crate::config::BotConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Admin,
}

/// Lowercase SHA-256 hex of the trimmed input
pub fn hash_password(text: &str) -> String {
    format!("{:x}", Sha256::digest(text.trim().as_bytes()))
}

/// Configured password hashes
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub user_hash: Option<String>,
    pub admin_hash: Option<String>,
}

impl Credentials {
    pub fn from_config(config: &BotConfig) -> Self {
        Self {
            user_hash: config.user_hash.clone(),
            admin_hash: config.admin_hash.clone(),
        }
    }

    /// Role granted by a password attempt; the user hash is checked first
    pub fn check(&self, attempt: &str) -> Option<Role> {
        let hash = hash_password(attempt);
        if self.user_hash.as_deref() == Some(hash.as_str()) {
            Some(Role::User)
        } else if self.admin_hash.as_deref() == Some(hash.as_str()) {
            Some(Role::Admin)
        } else {
            None
        }
    }
}

/// Chat id to role, shared by the poll loop and the backup broadcaster
#[derive(Debug, Clone, Default)]
pub struct Sessions {
    inner: Arc<Mutex<HashMap<i64, Role>>>,
}

impl Sessions {
    pub fn role(&self, chat_id: i64) -> Option<Role> {
        self.inner.lock().ok()?.get(&chat_id).copied()
    }

    pub fn grant(&self, chat_id: i64, role: Role) {
        if let Ok(mut map) = self.inner.lock() {
            map.insert(chat_id, role);
        }
    }

    /// Returns the role that was dropped, if any
    pub fn forget(&self, chat_id: i64) -> Option<Role> {
        self.inner.lock().ok()?.remove(&chat_id)
    }

    /// Admin chat ids, ascending
    pub fn admins(&self) -> Vec<i64> {
        let Ok(map) = self.inner.lock() else {
            return Vec::new();
        };
        let mut ids: Vec<i64> = map
            .iter()
            .filter(|(_, role)| **role == Role::Admin)
            .map(|(id, _)| *id)
            .collect();
        ids.sort_unstable();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_trimmed_sha256_hex() {
        assert_eq!(
            hash_password("  abc\n"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_credentials() {
        let creds = Credentials {
            user_hash: Some(hash_password("user-pw")),
            admin_hash: Some(hash_password("admin-pw")),
        };
        assert_eq!(creds.check("user-pw"), Some(Role::User));
        assert_eq!(creds.check(" admin-pw "), Some(Role::Admin));
        assert_eq!(creds.check("guess"), None);

        // Nothing configured: nothing matches, not even the empty string
        assert_eq!(Credentials::default().check(""), None);
    }

    #[test]
    fn test_sessions() {
        let sessions = Sessions::default();
        sessions.grant(5, Role::Admin);
        sessions.grant(2, Role::User);
        sessions.grant(1, Role::Admin);

        assert_eq!(sessions.role(2), Some(Role::User));
        assert_eq!(sessions.admins(), vec![1, 5]);
        assert_eq!(sessions.forget(5), Some(Role::Admin));
        assert_eq!(sessions.forget(5), None);
        assert_eq!(sessions.admins(), vec![1]);
    }
}
