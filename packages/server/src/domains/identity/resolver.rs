//! Identity resolution over the encrypted phone column.
//!
//! There is no plaintext index by design, so resolution is a linear
//! decrypt-and-compare scan over all accounts. Acceptable while
//! account volume stays in the low thousands; at scale a keyed-hash
//! secondary index becomes the lookup path and the decrypt becomes a
//! defense-in-depth check.

use std::sync::Arc;

use crate::common::{normalize_phone, AuthError};
use crate::domains::identity::cipher::CipherStore;
use crate::domains::identity::models::Account;
use crate::kernel::BaseIdentityStore;

pub struct IdentityResolver {
    store: Arc<dyn BaseIdentityStore>,
    cipher: Arc<CipherStore>,
}

impl IdentityResolver {
    pub fn new(store: Arc<dyn BaseIdentityStore>, cipher: Arc<CipherStore>) -> Self {
        Self { store, cipher }
    }

    /// Find the account whose decrypted identity equals the normalized
    /// input. A record that fails to decrypt is skipped, never fatal:
    /// one corrupt or foreign-key row must not abort the search.
    pub async fn find_by_identity(&self, plaintext_phone: &str) -> Result<Account, AuthError> {
        let normalized = normalize_phone(plaintext_phone);

        for account in self.store.list_accounts().await? {
            match self.cipher.decrypt(&account.encrypted_identity) {
                Ok(decrypted) if decrypted == normalized => return Ok(account),
                Ok(_) => continue,
                Err(_) => {
                    tracing::debug!(account_id = %account.id, "skipping undecryptable identity");
                    continue;
                }
            }
        }

        Err(AuthError::NotFound)
    }

    /// The duplicate check run before signup insert: same scan,
    /// inverted result.
    pub async fn assert_identity_available(&self, plaintext_phone: &str) -> Result<(), AuthError> {
        match self.find_by_identity(plaintext_phone).await {
            Ok(_) => Err(AuthError::DuplicateIdentity),
            Err(AuthError::NotFound) => Ok(()),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::identity::models::NewAccount;
    use crate::kernel::test_dependencies::MemoryIdentityStore;
    use chrono::Utc;
    use uuid::Uuid;

    fn cipher() -> Arc<CipherStore> {
        Arc::new(CipherStore::from_hex(&"11".repeat(32)).unwrap())
    }

    async fn seed_account(
        store: &MemoryIdentityStore,
        cipher: &CipherStore,
        phone: &str,
        slug: &str,
    ) -> Account {
        store
            .create_account(NewAccount {
                first_name: "Ada".to_string(),
                last_name: "Lovelace".to_string(),
                email: None,
                encrypted_identity: cipher.encrypt(phone).unwrap(),
                tenant_slug: slug.to_string(),
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_finds_account_by_normalized_phone() {
        let store = Arc::new(MemoryIdentityStore::new());
        let cipher = cipher();
        let resolver = IdentityResolver::new(store.clone(), cipher.clone());

        let account = seed_account(&store, &cipher, "+15550102030", "acme").await;

        let found = resolver
            .find_by_identity("+1 (555) 010-2030")
            .await
            .unwrap();
        assert_eq!(found.id, account.id);
    }

    #[tokio::test]
    async fn test_not_found_for_unknown_phone() {
        let store = Arc::new(MemoryIdentityStore::new());
        let cipher = cipher();
        let resolver = IdentityResolver::new(store.clone(), cipher.clone());

        seed_account(&store, &cipher, "+15550102030", "acme").await;

        let result = resolver.find_by_identity("+19990000000").await;
        assert!(matches!(result, Err(AuthError::NotFound)));
    }

    #[tokio::test]
    async fn test_corrupt_rows_are_skipped() {
        let store = Arc::new(MemoryIdentityStore::new());
        let cipher = cipher();
        let resolver = IdentityResolver::new(store.clone(), cipher.clone());

        // Garbage that is not even base64, and a row encrypted under a
        // different key. Both must be skipped silently.
        store.insert_account_raw(Account {
            id: Uuid::new_v4(),
            first_name: "X".to_string(),
            last_name: "Y".to_string(),
            email: None,
            encrypted_identity: "!!not-ciphertext!!".to_string(),
            tenant_slug: "corrupt".to_string(),
            is_active: true,
            created_at: Utc::now(),
        });
        let other_key = CipherStore::from_hex(&"22".repeat(32)).unwrap();
        store.insert_account_raw(Account {
            id: Uuid::new_v4(),
            first_name: "X".to_string(),
            last_name: "Y".to_string(),
            email: None,
            encrypted_identity: other_key.encrypt("+15550102030").unwrap(),
            tenant_slug: "foreign".to_string(),
            is_active: true,
            created_at: Utc::now(),
        });

        let account = seed_account(&store, &cipher, "+15550102030", "acme").await;

        let found = resolver.find_by_identity("+15550102030").await.unwrap();
        assert_eq!(found.id, account.id);

        // And a lookup that matches nothing still returns NotFound
        // rather than erroring on the corrupt rows.
        let result = resolver.find_by_identity("+10000000000").await;
        assert!(matches!(result, Err(AuthError::NotFound)));
    }

    #[tokio::test]
    async fn test_duplicate_check() {
        let store = Arc::new(MemoryIdentityStore::new());
        let cipher = cipher();
        let resolver = IdentityResolver::new(store.clone(), cipher.clone());

        seed_account(&store, &cipher, "+15550102030", "acme").await;

        let result = resolver.assert_identity_available("+1-555-010-2030").await;
        assert!(matches!(result, Err(AuthError::DuplicateIdentity)));

        assert!(resolver
            .assert_identity_available("+19990000000")
            .await
            .is_ok());
    }
}
