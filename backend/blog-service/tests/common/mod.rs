//! Fake identity directory and state builder for integration tests.
//!
//! The fake keeps an in-process user table, counts batch lookups so tests can
//! check that compositions issue a single directory call, and can be switched
//! into an unavailable mode to simulate upstream failure.
#![allow(dead_code)]

use async_trait::async_trait;
use blog_service::config::{RateLimitConfig, SocialConfig};
use blog_service::domain::NewPost;
use blog_service::error::{ServiceError, ServiceResult};
use blog_service::identity::{DirectoryUser, IdentityDirectory};
use blog_service::rate_limit::InMemoryRateLimitStore;
use blog_service::{AppState, Stores};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Clone, Default)]
pub struct FakeDirectory {
    users: Arc<Mutex<HashMap<String, DirectoryUser>>>,
    batch_call_count: Arc<AtomicUsize>,
    unavailable: Arc<AtomicBool>,
}

impl FakeDirectory {
    pub fn with_users(ids: &[&str]) -> Self {
        let directory = Self::default();
        for id in ids {
            directory.add_user(id);
        }
        directory
    }

    pub fn add_user(&self, id: &str) {
        self.users.lock().unwrap().insert(
            id.to_string(),
            DirectoryUser {
                id: id.to_string(),
                username: Some(format!("{}_name", id)),
                first_name: None,
                image_url: format!("https://img.example.com/{}.png", id),
            },
        );
    }

    pub fn remove_user(&self, id: &str) {
        self.users.lock().unwrap().remove(id);
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of `lookup_by_ids` calls so far
    pub fn batch_call_count(&self) -> usize {
        self.batch_call_count.load(Ordering::SeqCst)
    }

    fn check_available(&self) -> ServiceResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(ServiceError::Directory(
                "directory returned 503 Service Unavailable".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl IdentityDirectory for FakeDirectory {
    async fn lookup_by_ids(&self, ids: &[String]) -> ServiceResult<Vec<DirectoryUser>> {
        self.batch_call_count.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;

        let users = self.users.lock().unwrap();
        Ok(ids.iter().filter_map(|id| users.get(id).cloned()).collect())
    }

    async fn lookup_by_usernames(&self, names: &[String]) -> ServiceResult<Vec<DirectoryUser>> {
        self.check_available()?;

        let users = self.users.lock().unwrap();
        Ok(users
            .values()
            .filter(|u| {
                u.username
                    .as_ref()
                    .map(|name| names.contains(name))
                    .unwrap_or(false)
            })
            .cloned()
            .collect())
    }

    async fn list_users(&self, limit: usize) -> ServiceResult<Vec<DirectoryUser>> {
        self.check_available()?;

        let users = self.users.lock().unwrap();
        let mut all: Vec<DirectoryUser> = users.values().cloned().collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        all.truncate(limit);
        Ok(all)
    }
}

/// In-memory stores, the given directory and the default post limit (3 per 60s)
pub fn build_state(directory: &FakeDirectory) -> AppState {
    build_state_with(directory, false)
}

pub fn build_state_with(directory: &FakeDirectory, verify_followee: bool) -> AppState {
    AppState::new(
        Stores::in_memory(),
        Arc::new(directory.clone()),
        Arc::new(InMemoryRateLimitStore::new()),
        RateLimitConfig::default(),
        &SocialConfig { verify_followee },
    )
}

pub fn new_post(author_id: &str, title: &str) -> NewPost {
    NewPost {
        author_id: author_id.to_string(),
        author_name: format!("{}_name", author_id),
        title: title.to_string(),
        subtitle: Some("A subtitle".to_string()),
        content: "Short body text.".to_string(),
        thumbnail_url: None,
    }
}
