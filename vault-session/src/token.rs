//! Static-token session strategy

use crate::{build_client, Result, SessionProvider};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::OnceCell;
use vaultrs::client::VaultClient;

/// Static-token strategy. The client is constructed once, on first use,
/// and reused for the process lifetime. The token is never renewed.
pub struct TokenSession {
    address: String,
    token: String,
    client: OnceCell<Arc<VaultClient>>,
}

impl TokenSession {
    pub fn new(address: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            token: token.into(),
            client: OnceCell::new(),
        }
    }
}

#[async_trait]
impl SessionProvider for TokenSession {
    async fn session(&self) -> Result<Arc<VaultClient>> {
        // OnceCell guarantees a single construction even under
        // concurrent first use.
        let client = self
            .client
            .get_or_try_init(|| async { build_client(&self.address, &self.token).map(Arc::new) })
            .await?;

        Ok(Arc::clone(client))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn constructs_the_client_once_and_reuses_it() {
        let sessions = TokenSession::new("http://127.0.0.1:8200", "s.XXXXXXXX");

        let first = sessions.session().await.unwrap();
        let second = sessions.session().await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
    }
}
