use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::domain::Account;
use super::errors::AuthError;

/// Repository abstraction for account persistence.
#[async_trait]
pub trait AccountRepository: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<Account>, AuthError>;
    async fn upsert(&self, account: Account) -> Result<(), AuthError>;
}

/// Accounts kept in process memory, keyed by username.
#[derive(Default)]
pub struct InMemoryAccountRepository {
    accounts: RwLock<HashMap<String, Account>>,
}

#[async_trait]
impl AccountRepository for InMemoryAccountRepository {
    async fn find_by_username(&self, username: &str) -> Result<Option<Account>, AuthError> {
        Ok(self.accounts.read().await.get(username).cloned())
    }

    async fn upsert(&self, account: Account) -> Result<(), AuthError> {
        self.accounts.write().await.insert(account.username.clone(), account);
        Ok(())
    }
}
