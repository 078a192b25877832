//! Identity resolution against the external user directory.
//!
//! The directory owns user records; this module only projects them into
//! [`Identity`] values per request and never persists them.

pub mod clerk;

use crate::domain::Identity;
use crate::error::{ServiceError, ServiceResult};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;

pub use clerk::ClerkDirectory;

/// Upper bound for directory listings.
pub const MAX_LIST_LIMIT: usize = 100;

/// Raw user record as returned by the directory
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DirectoryUser {
    pub id: String,
    pub username: Option<String>,
    pub first_name: Option<String>,
    #[serde(default)]
    pub image_url: String,
}

impl DirectoryUser {
    /// Project into the public identity shape: username, else first name, else "Unknown".
    pub fn into_identity(self) -> Identity {
        let username = self
            .username
            .filter(|name| !name.is_empty())
            .or(self.first_name.filter(|name| !name.is_empty()))
            .unwrap_or_else(|| "Unknown".to_string());

        Identity {
            id: self.id,
            username,
            profile_picture_url: self.image_url,
        }
    }
}

/// External identity directory. Implementations must not retry internally.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityDirectory: Send + Sync {
    /// Look up users by id; unknown ids are simply absent from the result
    async fn lookup_by_ids(&self, ids: &[String]) -> ServiceResult<Vec<DirectoryUser>>;

    /// Look up users by username; unknown names are absent from the result
    async fn lookup_by_usernames(&self, names: &[String]) -> ServiceResult<Vec<DirectoryUser>>;

    /// List up to `limit` users
    async fn list_users(&self, limit: usize) -> ServiceResult<Vec<DirectoryUser>>;
}

/// Resolves identity ids and usernames through an injected directory.
#[derive(Clone)]
pub struct IdentityResolver {
    directory: Arc<dyn IdentityDirectory>,
}

impl IdentityResolver {
    pub fn new(directory: Arc<dyn IdentityDirectory>) -> Self {
        Self { directory }
    }

    /// Resolve a set of ids with a single directory call.
    ///
    /// Only identities actually found are returned; missing ids are not padded.
    /// An empty set resolves to an empty map without contacting the directory.
    pub async fn resolve_batch(
        &self,
        ids: &BTreeSet<String>,
    ) -> ServiceResult<HashMap<String, Identity>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let request: Vec<String> = ids.iter().cloned().collect();
        let users = self.directory.lookup_by_ids(&request).await?;
        debug!(
            requested = request.len(),
            found = users.len(),
            "resolved identity batch"
        );

        Ok(users
            .into_iter()
            .filter(|user| ids.contains(&user.id))
            .map(|user| (user.id.clone(), user.into_identity()))
            .collect())
    }

    /// Resolve a single username; fails with `NotFound` if the directory has no match.
    ///
    /// The directory normalizes usernames, so matching ignores ASCII case.
    pub async fn resolve_by_username(&self, name: &str) -> ServiceResult<Identity> {
        let users = self
            .directory
            .lookup_by_usernames(&[name.to_string()])
            .await?;

        users
            .into_iter()
            .find(|user| {
                user.username
                    .as_deref()
                    .map(|username| username.eq_ignore_ascii_case(name))
                    .unwrap_or(false)
            })
            .map(DirectoryUser::into_identity)
            .ok_or_else(|| ServiceError::NotFound(format!("user {}", name)))
    }

    /// Resolve several usernames. Order is unspecified; duplicates are collapsed.
    pub async fn resolve_many_by_usernames(&self, names: &[String]) -> ServiceResult<Vec<Identity>> {
        let unique: BTreeSet<String> = names.iter().cloned().collect();
        if unique.is_empty() {
            return Ok(Vec::new());
        }

        let request: Vec<String> = unique.into_iter().collect();
        let users = self.directory.lookup_by_usernames(&request).await?;

        let mut seen = HashSet::new();
        Ok(users
            .into_iter()
            .filter(|user| seen.insert(user.id.clone()))
            .map(DirectoryUser::into_identity)
            .collect())
    }

    /// List directory identities, capped at [`MAX_LIST_LIMIT`].
    pub async fn list_identities(&self, limit: usize) -> ServiceResult<Vec<Identity>> {
        let limit = limit.clamp(1, MAX_LIST_LIMIT);
        let users = self.directory.list_users(limit).await?;
        Ok(users.into_iter().map(DirectoryUser::into_identity).collect())
    }
}
