//! Engagement ledger - claps and saved posts

use super::{distinct_ids, join_authors, ContentStore, JoinPolicy, MAX_LIST_LIMIT};
use crate::domain::{ClapDelta, Identity, Post, SaveToggle};
use crate::error::ServiceResult;
use crate::identity::IdentityResolver;
use crate::repository::SavedPostRepository;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

#[derive(Clone)]
pub struct EngagementLedger {
    content: ContentStore,
    saved: Arc<dyn SavedPostRepository>,
    identities: IdentityResolver,
}

impl EngagementLedger {
    pub fn new(
        content: ContentStore,
        saved: Arc<dyn SavedPostRepository>,
        identities: IdentityResolver,
    ) -> Self {
        Self {
            content,
            saved,
            identities,
        }
    }

    /// Clap (`true`) or take a clap back (`false`); returns the new total
    pub async fn clap(&self, post_id: Uuid, increment: bool) -> ServiceResult<i64> {
        self.content
            .increment_claps(post_id, ClapDelta::from(increment))
            .await
    }

    /// Flip the (user, post) saved marker in one conditional write
    pub async fn toggle_save(&self, user_id: &str, post_id: Uuid) -> ServiceResult<SaveToggle> {
        self.content.get_by_id(post_id).await?;

        let saved = self.saved.toggle_saved(user_id, post_id).await?;
        info!(user_id = %user_id, %post_id, saved, "save toggled");
        Ok(SaveToggle { saved })
    }

    /// Idempotent save
    pub async fn save(&self, user_id: &str, post_id: Uuid) -> ServiceResult<SaveToggle> {
        self.content.get_by_id(post_id).await?;

        if self.saved.insert_saved(user_id, post_id).await? {
            info!(user_id = %user_id, %post_id, "post saved");
        }
        Ok(SaveToggle { saved: true })
    }

    /// Idempotent unsave
    pub async fn unsave(&self, user_id: &str, post_id: Uuid) -> ServiceResult<SaveToggle> {
        if self.saved.delete_saved(user_id, post_id).await? {
            info!(user_id = %user_id, %post_id, "post unsaved");
        }
        Ok(SaveToggle { saved: false })
    }

    pub async fn is_saved(&self, user_id: &str, post_id: Uuid) -> ServiceResult<bool> {
        self.saved.saved_exists(user_id, post_id).await
    }

    /// Saved posts with their authors, most recently saved first.
    ///
    /// Authors are resolved in one batch; `policy` decides whether an
    /// unresolved author fails the listing or drops the post.
    pub async fn list_saved_by_user(
        &self,
        user_id: &str,
        policy: JoinPolicy,
    ) -> ServiceResult<Vec<(Post, Identity)>> {
        let saved = self.saved.list_saved(user_id, MAX_LIST_LIMIT).await?;
        if saved.is_empty() {
            return Ok(Vec::new());
        }

        let post_ids: Vec<Uuid> = saved.iter().map(|s| s.post_id).collect();
        let mut by_id: HashMap<Uuid, Post> = self
            .content
            .find_many(&post_ids)
            .await?
            .into_iter()
            .map(|post| (post.id, post))
            .collect();
        let posts: Vec<Post> = post_ids.iter().filter_map(|id| by_id.remove(id)).collect();

        let author_ids = distinct_ids(posts.iter().map(|p| p.author_id.as_str()));
        let resolved = self.identities.resolve_batch(&author_ids).await?;

        join_authors(posts, |p| p.author_id.as_str(), &resolved, policy)
    }
}
