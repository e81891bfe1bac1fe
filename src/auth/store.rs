// Allow dead code: store accessors are exercised unevenly across builds
#![allow(dead_code)]

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::warn;

use crate::models::User;

/// File name for the access token slot.
const AUTH_TOKEN_FILE: &str = "auth_token";

/// File name for the refresh token slot.
const REFRESH_TOKEN_FILE: &str = "refresh_token";

/// File name for the cached user record (JSON).
const USER_FILE: &str = "user.json";

/// Persisted key-value sink for the three credential slots.
///
/// Each slot is an independent file under the store directory; writes are
/// per-slot and not transactionally linked, so a token can exist without a
/// user record. Readers must tolerate any partial combination.
///
/// Clone is cheap and all clones observe the same directory.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    dir: PathBuf,
}

impl CredentialStore {
    pub fn new(dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create credential directory {}", dir.display()))?;
        Ok(Self { dir })
    }

    fn slot_path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    fn read_slot(&self, name: &str) -> Option<String> {
        let path = self.slot_path(name);
        match std::fs::read_to_string(&path) {
            Ok(contents) if !contents.is_empty() => Some(contents),
            Ok(_) => None,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                warn!(slot = name, error = %e, "Failed to read credential slot");
                None
            }
        }
    }

    fn write_slot(&self, name: &str, value: &str) -> Result<()> {
        std::fs::write(self.slot_path(name), value)
            .with_context(|| format!("Failed to write credential slot: {}", name))
    }

    fn clear_slot(&self, name: &str) {
        let path = self.slot_path(name);
        if let Err(e) = std::fs::remove_file(&path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(slot = name, error = %e, "Failed to clear credential slot");
            }
        }
    }

    // ===== Access token =====

    pub fn auth_token(&self) -> Option<String> {
        self.read_slot(AUTH_TOKEN_FILE)
    }

    pub fn set_auth_token(&self, token: &str) -> Result<()> {
        self.write_slot(AUTH_TOKEN_FILE, token)
    }

    // ===== Refresh token =====

    pub fn refresh_token(&self) -> Option<String> {
        self.read_slot(REFRESH_TOKEN_FILE)
    }

    pub fn set_refresh_token(&self, token: &str) -> Result<()> {
        self.write_slot(REFRESH_TOKEN_FILE, token)
    }

    // ===== User record =====

    /// Parse the cached user record. An unreadable or malformed record is
    /// treated as absent.
    pub fn user(&self) -> Option<User> {
        let raw = self.read_slot(USER_FILE)?;
        match serde_json::from_str(&raw) {
            Ok(user) => Some(user),
            Err(e) => {
                warn!(error = %e, "Malformed user record in credential store");
                None
            }
        }
    }

    pub fn set_user(&self, user: &User) -> Result<()> {
        let raw = serde_json::to_string(user).context("Failed to serialize user record")?;
        self.write_slot(USER_FILE, &raw)
    }

    /// Clear all three slots. Missing slots are not an error; individual
    /// removal failures are logged and skipped so a clear never fails.
    pub fn clear(&self) {
        self.clear_slot(AUTH_TOKEN_FILE);
        self.clear_slot(REFRESH_TOKEN_FILE);
        self.clear_slot(USER_FILE);
    }

    /// True when every slot is empty.
    pub fn is_empty(&self) -> bool {
        self.auth_token().is_none()
            && self.refresh_token().is_none()
            && self.read_slot(USER_FILE).is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, CredentialStore) {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let store = CredentialStore::new(dir.path().to_path_buf()).expect("failed to open store");
        (dir, store)
    }

    #[test]
    fn slots_roundtrip_independently() {
        let (_dir, store) = store();
        assert!(store.is_empty());

        store.set_auth_token("t1").unwrap();
        assert_eq!(store.auth_token().as_deref(), Some("t1"));
        assert!(store.refresh_token().is_none());
        assert!(store.user().is_none());

        store.set_refresh_token("r1").unwrap();
        store
            .set_user(&User {
                id: "1".to_string(),
                email: "a@b.com".to_string(),
            })
            .unwrap();
        assert_eq!(store.refresh_token().as_deref(), Some("r1"));
        assert_eq!(store.user().map(|u| u.email), Some("a@b.com".to_string()));
    }

    #[test]
    fn clear_empties_every_slot() {
        let (_dir, store) = store();
        store.set_auth_token("t1").unwrap();
        store.set_refresh_token("r1").unwrap();
        store
            .set_user(&User {
                id: "1".to_string(),
                email: "a@b.com".to_string(),
            })
            .unwrap();

        store.clear();
        assert!(store.is_empty());

        // Clearing an already-empty store is a no-op
        store.clear();
        assert!(store.is_empty());
    }

    #[test]
    fn malformed_user_record_reads_as_absent() {
        let (dir, store) = store();
        std::fs::write(dir.path().join("user.json"), "{not json").unwrap();
        assert!(store.user().is_none());
    }

    #[test]
    fn clones_share_the_same_slots() {
        let (_dir, store) = store();
        let other = store.clone();
        store.set_auth_token("shared").unwrap();
        assert_eq!(other.auth_token().as_deref(), Some("shared"));
    }
}
