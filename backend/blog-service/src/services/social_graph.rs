//! Social graph ledger - follow edges and their aggregate counts

use super::{distinct_ids, MAX_LIST_LIMIT};
use crate::domain::{FollowStats, FollowToggle, Identity};
use crate::error::{ServiceError, ServiceResult};
use crate::identity::IdentityResolver;
use crate::repository::FollowRepository;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Clone)]
pub struct SocialGraphLedger {
    follows: Arc<dyn FollowRepository>,
    identities: IdentityResolver,
    verify_followee: bool,
}

impl SocialGraphLedger {
    pub fn new(follows: Arc<dyn FollowRepository>, identities: IdentityResolver) -> Self {
        Self {
            follows,
            identities,
            verify_followee: false,
        }
    }

    /// Require the followee to exist in the directory before an edge is written
    pub fn with_followee_verification(mut self, verify: bool) -> Self {
        self.verify_followee = verify;
        self
    }

    /// Flip the follow edge in one conditional write
    pub async fn toggle_follow(
        &self,
        follower_id: &str,
        followee_id: &str,
    ) -> ServiceResult<FollowToggle> {
        self.check_edge(follower_id, followee_id).await?;

        let followed = self.follows.toggle_follow(follower_id, followee_id).await?;
        info!(follower_id = %follower_id, followee_id = %followee_id, followed, "follow toggled");
        Ok(FollowToggle { followed })
    }

    /// Idempotent follow
    pub async fn follow(&self, follower_id: &str, followee_id: &str) -> ServiceResult<FollowToggle> {
        self.check_edge(follower_id, followee_id).await?;

        if self.follows.insert_follow(follower_id, followee_id).await? {
            info!(follower_id = %follower_id, followee_id = %followee_id, "follow created");
        }
        Ok(FollowToggle { followed: true })
    }

    /// Idempotent unfollow
    pub async fn unfollow(
        &self,
        follower_id: &str,
        followee_id: &str,
    ) -> ServiceResult<FollowToggle> {
        if self.follows.delete_follow(follower_id, followee_id).await? {
            info!(follower_id = %follower_id, followee_id = %followee_id, "follow removed");
        }
        Ok(FollowToggle { followed: false })
    }

    pub async fn is_following(&self, follower_id: &str, followee_id: &str) -> ServiceResult<bool> {
        self.follows.follow_exists(follower_id, followee_id).await
    }

    pub async fn get_follow_stats(&self, user_id: &str) -> ServiceResult<FollowStats> {
        let (followers, following) = tokio::try_join!(
            self.follows.count_followers(user_id),
            self.follows.count_following(user_id),
        )?;

        Ok(FollowStats {
            followers,
            following,
        })
    }

    /// Identities the user follows, most recent edge first.
    ///
    /// Followees the directory no longer knows are left out.
    pub async fn get_following(&self, user_id: &str) -> ServiceResult<Vec<Identity>> {
        let edges = self.follows.list_following(user_id, MAX_LIST_LIMIT).await?;
        let ids = distinct_ids(edges.iter().map(|e| e.followee_id.as_str()));
        let mut resolved = self.identities.resolve_batch(&ids).await?;

        Ok(edges
            .iter()
            .filter_map(|edge| {
                let identity = resolved.remove(&edge.followee_id);
                if identity.is_none() {
                    warn!(
                        follower_id = %user_id,
                        followee_id = %edge.followee_id,
                        "followee not found in directory"
                    );
                }
                identity
            })
            .collect())
    }

    async fn check_edge(&self, follower_id: &str, followee_id: &str) -> ServiceResult<()> {
        if follower_id == followee_id {
            return Err(ServiceError::InvalidInput(
                "You can't follow yourself".to_string(),
            ));
        }

        if self.verify_followee {
            let ids: BTreeSet<String> = [followee_id.to_string()].into_iter().collect();
            if !self.identities.resolve_batch(&ids).await?.contains_key(followee_id) {
                return Err(ServiceError::NotFound(format!("user {}", followee_id)));
            }
        }

        Ok(())
    }
}
