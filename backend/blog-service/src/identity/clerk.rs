//! Clerk backend API client for user lookups
//!
//! Calls `GET {base_url}/v1/users` with repeated `user_id` / `username`
//! query parameters. Requests are sent once; failures surface as
//! `ServiceError::Directory`.

use super::{DirectoryUser, IdentityDirectory};
use crate::config::IdentityConfig;
use crate::error::{ServiceError, ServiceResult};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, error};

#[derive(Clone)]
pub struct ClerkDirectory {
    client: Client,
    /// API root (e.g., "https://api.clerk.com")
    base_url: String,
    /// Backend secret key
    api_key: String,
}

impl ClerkDirectory {
    pub fn new(config: &IdentityConfig) -> ServiceResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    async fn fetch_users(&self, query: &[(&str, String)]) -> ServiceResult<Vec<DirectoryUser>> {
        let url = format!("{}/v1/users", self.base_url);

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.api_key)
            .query(query)
            .send()
            .await
            .map_err(|e| {
                error!("Identity directory request failed: {}", e);
                ServiceError::Directory(format!("request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            error!(%status, body = %body, "Identity directory returned error");
            return Err(ServiceError::Directory(format!(
                "directory returned {}: {}",
                status, body
            )));
        }

        let users: Vec<DirectoryUser> = response.json().await?;
        debug!(count = users.len(), "Identity directory lookup completed");
        Ok(users)
    }
}

fn repeated(name: &'static str, values: &[String]) -> Vec<(&'static str, String)> {
    let mut query: Vec<(&str, String)> =
        values.iter().map(|value| (name, value.clone())).collect();
    query.push(("limit", values.len().to_string()));
    query
}

#[async_trait]
impl IdentityDirectory for ClerkDirectory {
    async fn lookup_by_ids(&self, ids: &[String]) -> ServiceResult<Vec<DirectoryUser>> {
        self.fetch_users(&repeated("user_id", ids)).await
    }

    async fn lookup_by_usernames(&self, names: &[String]) -> ServiceResult<Vec<DirectoryUser>> {
        self.fetch_users(&repeated("username", names)).await
    }

    async fn list_users(&self, limit: usize) -> ServiceResult<Vec<DirectoryUser>> {
        self.fetch_users(&[("limit", limit.to_string())]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeated_query_params() {
        let query = repeated("user_id", &["a".to_string(), "b".to_string()]);
        assert_eq!(
            query,
            vec![
                ("user_id", "a".to_string()),
                ("user_id", "b".to_string()),
                ("limit", "2".to_string()),
            ]
        );
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let directory = ClerkDirectory::new(&IdentityConfig {
            base_url: "https://api.clerk.com/".to_string(),
            api_key: "sk_test".to_string(),
            timeout_ms: 1000,
        })
        .unwrap();
        assert_eq!(directory.base_url, "https://api.clerk.com");
    }

    #[test]
    fn test_directory_user_deserializes_clerk_shape() {
        let raw = r#"[{"id":"user_1","username":null,"first_name":"Ada","image_url":"https://img/1"}]"#;
        let users: Vec<DirectoryUser> = serde_json::from_str(raw).unwrap();
        assert_eq!(users[0].clone().into_identity().username, "Ada");
    }
}
