//! Identity and credential resolution.
//!
//! The proximity engine never inspects credentials itself. It asks an
//! [`IdentityResolver`] whether an identity exists and whether the presented
//! secret matches, and turns either failure into the same opaque
//! `Unauthorized` error.

use crate::error::{GeoError, GeoResult};
use crate::types::UserRecord;
use async_trait::async_trait;
use dashmap::DashMap;
use tracing::debug;

/// Lookup of user records and credential checks.
#[async_trait]
pub trait IdentityResolver: Send + Sync + std::fmt::Debug {
    /// Fails with `NotFound` for an unknown identity.
    async fn resolve(&self, identity: &str) -> GeoResult<UserRecord>;

    /// True when `credential` is the secret on record for `identity`.
    async fn verify(&self, identity: &str, credential: &str) -> bool;
}

#[derive(Debug, Clone)]
struct Account {
    record: UserRecord,
    credential: String,
}

/// Resolver over a fixed set of accounts, usually seeded from config.
#[derive(Debug, Default)]
pub struct MemoryIdentityResolver {
    accounts: DashMap<String, Account>,
}

impl MemoryIdentityResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers or replaces an account.
    pub fn add_user(
        &self,
        identity: impl Into<String>,
        display_name: impl Into<String>,
        credential: impl Into<String>,
    ) {
        let identity = identity.into();
        let account = Account {
            record: UserRecord {
                identity: identity.clone(),
                display_name: display_name.into(),
            },
            credential: credential.into(),
        };
        debug!("👤 Registered identity '{}'", identity);
        self.accounts.insert(identity, account);
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

#[async_trait]
impl IdentityResolver for MemoryIdentityResolver {
    async fn resolve(&self, identity: &str) -> GeoResult<UserRecord> {
        self.accounts
            .get(identity)
            .map(|account| account.record.clone())
            .ok_or_else(|| GeoError::NotFound {
                entity: "identity",
                id: identity.to_string(),
            })
    }

    async fn verify(&self, identity: &str, credential: &str) -> bool {
        self.accounts
            .get(identity)
            .map(|account| account.credential == credential)
            .unwrap_or(false)
    }
}
