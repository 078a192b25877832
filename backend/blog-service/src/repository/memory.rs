//! In-process store implementing every repository trait.
//!
//! Membership flips go through `DashMap::entry`, which holds the shard lock
//! for the key, so each toggle is one atomic check-and-flip just like the
//! conditional SQL statements.

use super::{CommentRepository, FollowRepository, PostRepository, SavedPostRepository};
use crate::domain::{Comment, FollowEdge, NewComment, NewPost, Post, SavedPost};
use crate::error::ServiceResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

/// Value tagged with its insertion sequence; breaks `created_at` ties.
#[derive(Debug, Clone)]
struct Sequenced<T> {
    seq: u64,
    record: T,
}

#[derive(Default)]
pub struct InMemoryStore {
    seq: AtomicU64,
    posts: DashMap<Uuid, Sequenced<Post>>,
    comments: DashMap<Uuid, Vec<Sequenced<Comment>>>,
    saved: DashMap<(String, Uuid), Sequenced<SavedPost>>,
    follows: DashMap<(String, String), Sequenced<FollowEdge>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_seq(&self) -> u64 {
        self.seq.fetch_add(1, Ordering::SeqCst)
    }
}

/// Sort newest first by timestamp, then by insertion order, and apply `limit`.
fn newest_first<T: Clone>(
    mut items: Vec<Sequenced<T>>,
    created_at: impl Fn(&T) -> DateTime<Utc>,
    limit: Option<i64>,
) -> Vec<T> {
    items.sort_by(|a, b| {
        created_at(&b.record)
            .cmp(&created_at(&a.record))
            .then(b.seq.cmp(&a.seq))
    });

    let take = limit
        .map(|l| usize::try_from(l.max(0)).unwrap_or(usize::MAX))
        .unwrap_or(usize::MAX);
    items.into_iter().take(take).map(|item| item.record).collect()
}

#[async_trait]
impl PostRepository for InMemoryStore {
    async fn insert_post(&self, post: &NewPost) -> ServiceResult<Post> {
        let now = Utc::now();
        let created = Post {
            id: Uuid::new_v4(),
            author_id: post.author_id.clone(),
            author_name: post.author_name.clone(),
            title: post.title.clone(),
            subtitle: post.subtitle.clone(),
            content: post.content.clone(),
            thumbnail_url: post.thumbnail_url.clone(),
            created_at: now,
            published_at: now,
            claps: 0,
            read_time_min: post.read_time_min(),
        };

        self.posts.insert(
            created.id,
            Sequenced {
                seq: self.next_seq(),
                record: created.clone(),
            },
        );
        Ok(created)
    }

    async fn find_post(&self, post_id: Uuid) -> ServiceResult<Option<Post>> {
        Ok(self.posts.get(&post_id).map(|entry| entry.record.clone()))
    }

    async fn find_posts(&self, post_ids: &[Uuid]) -> ServiceResult<Vec<Post>> {
        Ok(post_ids
            .iter()
            .filter_map(|id| self.posts.get(id).map(|entry| entry.record.clone()))
            .collect())
    }

    async fn list_recent_posts(&self, limit: i64) -> ServiceResult<Vec<Post>> {
        let all: Vec<_> = self.posts.iter().map(|entry| entry.value().clone()).collect();
        Ok(newest_first(all, |p| p.created_at, Some(limit)))
    }

    async fn list_posts_by_author(&self, author_id: &str, limit: i64) -> ServiceResult<Vec<Post>> {
        let by_author: Vec<_> = self
            .posts
            .iter()
            .filter(|entry| entry.record.author_id == author_id)
            .map(|entry| entry.value().clone())
            .collect();
        Ok(newest_first(by_author, |p| p.created_at, Some(limit)))
    }

    async fn add_claps(&self, post_id: Uuid, delta: i64) -> ServiceResult<Option<i64>> {
        Ok(self.posts.get_mut(&post_id).map(|mut entry| {
            let post = &mut entry.record;
            post.claps = (post.claps + delta).max(0);
            post.claps
        }))
    }
}

#[async_trait]
impl CommentRepository for InMemoryStore {
    async fn insert_comment(&self, comment: &NewComment) -> ServiceResult<Option<Comment>> {
        if !self.posts.contains_key(&comment.post_id) {
            return Ok(None);
        }

        let created = Comment {
            id: Uuid::new_v4(),
            post_id: comment.post_id,
            author_id: comment.author_id.clone(),
            author_name: comment.author_name.clone(),
            content: comment.content.clone(),
            created_at: Utc::now(),
        };

        self.comments
            .entry(comment.post_id)
            .or_default()
            .push(Sequenced {
                seq: self.next_seq(),
                record: created.clone(),
            });
        Ok(Some(created))
    }

    async fn list_comments_by_post(&self, post_id: Uuid) -> ServiceResult<Vec<Comment>> {
        let comments = self
            .comments
            .get(&post_id)
            .map(|entry| entry.value().clone())
            .unwrap_or_default();
        Ok(newest_first(comments, |c| c.created_at, None))
    }
}

#[async_trait]
impl SavedPostRepository for InMemoryStore {
    async fn toggle_saved(&self, user_id: &str, post_id: Uuid) -> ServiceResult<bool> {
        match self.saved.entry((user_id.to_string(), post_id)) {
            Entry::Occupied(entry) => {
                entry.remove();
                Ok(false)
            }
            Entry::Vacant(entry) => {
                entry.insert(Sequenced {
                    seq: self.next_seq(),
                    record: SavedPost {
                        user_id: user_id.to_string(),
                        post_id,
                        saved_at: Utc::now(),
                    },
                });
                Ok(true)
            }
        }
    }

    async fn insert_saved(&self, user_id: &str, post_id: Uuid) -> ServiceResult<bool> {
        match self.saved.entry((user_id.to_string(), post_id)) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(entry) => {
                entry.insert(Sequenced {
                    seq: self.next_seq(),
                    record: SavedPost {
                        user_id: user_id.to_string(),
                        post_id,
                        saved_at: Utc::now(),
                    },
                });
                Ok(true)
            }
        }
    }

    async fn delete_saved(&self, user_id: &str, post_id: Uuid) -> ServiceResult<bool> {
        Ok(self.saved.remove(&(user_id.to_string(), post_id)).is_some())
    }

    async fn saved_exists(&self, user_id: &str, post_id: Uuid) -> ServiceResult<bool> {
        Ok(self.saved.contains_key(&(user_id.to_string(), post_id)))
    }

    async fn list_saved(&self, user_id: &str, limit: i64) -> ServiceResult<Vec<SavedPost>> {
        let saved: Vec<_> = self
            .saved
            .iter()
            .filter(|entry| entry.key().0 == user_id)
            .map(|entry| entry.value().clone())
            .collect();
        Ok(newest_first(saved, |s| s.saved_at, Some(limit)))
    }
}

#[async_trait]
impl FollowRepository for InMemoryStore {
    async fn toggle_follow(&self, follower_id: &str, followee_id: &str) -> ServiceResult<bool> {
        match self
            .follows
            .entry((follower_id.to_string(), followee_id.to_string()))
        {
            Entry::Occupied(entry) => {
                entry.remove();
                Ok(false)
            }
            Entry::Vacant(entry) => {
                entry.insert(Sequenced {
                    seq: self.next_seq(),
                    record: FollowEdge {
                        follower_id: follower_id.to_string(),
                        followee_id: followee_id.to_string(),
                        created_at: Utc::now(),
                    },
                });
                Ok(true)
            }
        }
    }

    async fn insert_follow(&self, follower_id: &str, followee_id: &str) -> ServiceResult<bool> {
        match self
            .follows
            .entry((follower_id.to_string(), followee_id.to_string()))
        {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(entry) => {
                entry.insert(Sequenced {
                    seq: self.next_seq(),
                    record: FollowEdge {
                        follower_id: follower_id.to_string(),
                        followee_id: followee_id.to_string(),
                        created_at: Utc::now(),
                    },
                });
                Ok(true)
            }
        }
    }

    async fn delete_follow(&self, follower_id: &str, followee_id: &str) -> ServiceResult<bool> {
        Ok(self
            .follows
            .remove(&(follower_id.to_string(), followee_id.to_string()))
            .is_some())
    }

    async fn follow_exists(&self, follower_id: &str, followee_id: &str) -> ServiceResult<bool> {
        Ok(self
            .follows
            .contains_key(&(follower_id.to_string(), followee_id.to_string())))
    }

    async fn count_followers(&self, user_id: &str) -> ServiceResult<i64> {
        let count = self
            .follows
            .iter()
            .filter(|entry| entry.key().1 == user_id)
            .count();
        Ok(count as i64)
    }

    async fn count_following(&self, user_id: &str) -> ServiceResult<i64> {
        let count = self
            .follows
            .iter()
            .filter(|entry| entry.key().0 == user_id)
            .count();
        Ok(count as i64)
    }

    async fn list_following(&self, follower_id: &str, limit: i64) -> ServiceResult<Vec<FollowEdge>> {
        let edges: Vec<_> = self
            .follows
            .iter()
            .filter(|entry| entry.key().0 == follower_id)
            .map(|entry| entry.value().clone())
            .collect();
        Ok(newest_first(edges, |e| e.created_at, Some(limit)))
    }
}
