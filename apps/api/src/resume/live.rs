//! Live collection subscriptions.
//!
//! A caller acquires a [`Subscription`] for one user's collection, receives a
//! full snapshot of that collection after every write, and releases it by
//! dropping the handle. The feed lives in `AppState`; there is no global.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::models::resume::Resume;
use crate::resume::store::ResumeStore;

/// The state of a user's collection at one point in time.
#[derive(Debug, Clone, Serialize)]
pub struct CollectionSnapshot {
    pub user_id: Uuid,
    pub resumes: Vec<Resume>,
}

impl CollectionSnapshot {
    pub fn find(&self, id: Uuid) -> Option<&Resume> {
        self.resumes.iter().find(|r| r.id == Some(id))
    }
}

type Channels = HashMap<Uuid, broadcast::Sender<Arc<CollectionSnapshot>>>;

#[derive(Clone)]
pub struct ResumeFeed {
    channels: Arc<Mutex<Channels>>,
    capacity: usize,
}

impl ResumeFeed {
    pub fn new(capacity: usize) -> Self {
        Self {
            channels: Arc::new(Mutex::new(HashMap::new())),
            capacity: capacity.max(1),
        }
    }

    fn channels(&self) -> MutexGuard<'_, Channels> {
        self.channels.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn subscribe(&self, user_id: Uuid) -> Subscription {
        let rx = self
            .channels()
            .entry(user_id)
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe();
        debug!("Subscription acquired for user {user_id}");
        Subscription {
            user_id,
            rx,
            feed: self.clone(),
        }
    }

    pub fn subscriber_count(&self, user_id: Uuid) -> usize {
        self.channels()
            .get(&user_id)
            .map(|tx| tx.receiver_count())
            .unwrap_or(0)
    }

    /// Sends `resumes` to every live subscription of `user_id`.
    /// Returns the number of subscriptions reached.
    pub fn publish(&self, user_id: Uuid, resumes: Vec<Resume>) -> usize {
        let channels = self.channels();
        let Some(tx) = channels.get(&user_id) else {
            return 0;
        };
        tx.send(Arc::new(CollectionSnapshot { user_id, resumes }))
            .unwrap_or(0)
    }

    fn release(&self, user_id: Uuid) {
        let mut channels = self.channels();
        // The releasing receiver is still alive while this runs.
        if channels
            .get(&user_id)
            .is_some_and(|tx| tx.receiver_count() <= 1)
        {
            channels.remove(&user_id);
        }
        debug!("Subscription released for user {user_id}");
    }
}

/// Re-reads a user's collection and publishes it, if anyone is listening.
/// A failed read is logged and skipped; the write that triggered it stands.
pub async fn refresh(feed: &ResumeFeed, store: &dyn ResumeStore, user_id: Uuid) {
    if feed.subscriber_count(user_id) == 0 {
        return;
    }
    match store.list(user_id).await {
        Ok(resumes) => {
            let reached = feed.publish(user_id, resumes);
            debug!("Published collection snapshot for user {user_id} to {reached} subscribers");
        }
        Err(e) => warn!("Failed to refresh live collection for user {user_id}: {e}"),
    }
}

/// A scoped handle on one user's collection updates.
pub struct Subscription {
    user_id: Uuid,
    rx: broadcast::Receiver<Arc<CollectionSnapshot>>,
    feed: ResumeFeed,
}

impl Subscription {
    /// Waits for the next snapshot. Snapshots are whole-collection, so if the
    /// receiver falls behind the skipped ones are dropped and the newest kept.
    pub async fn next(&mut self) -> Option<Arc<CollectionSnapshot>> {
        loop {
            match self.rx.recv().await {
                Ok(snapshot) => return Some(snapshot),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(
                        "Subscription for user {} skipped {skipped} snapshots",
                        self.user_id
                    );
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.feed.release(self.user_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resume::lifecycle::new_resume_template;
    use crate::resume::store::MemoryResumeStore;

    #[tokio::test]
    async fn test_subscriber_receives_published_snapshot() {
        let feed = ResumeFeed::new(4);
        let user = Uuid::new_v4();
        let mut sub = feed.subscribe(user);
        assert_eq!(feed.publish(user, vec![new_resume_template()]), 1);
        let snapshot = sub.next().await.unwrap();
        assert_eq!(snapshot.user_id, user);
        assert_eq!(snapshot.resumes.len(), 1);
    }

    #[tokio::test]
    async fn test_other_users_are_isolated() {
        let feed = ResumeFeed::new(4);
        let alice = Uuid::new_v4();
        let _sub = feed.subscribe(alice);
        assert_eq!(feed.publish(Uuid::new_v4(), vec![]), 0);
        assert_eq!(feed.subscriber_count(alice), 1);
    }

    #[test]
    fn test_drop_releases_channel() {
        let feed = ResumeFeed::new(4);
        let user = Uuid::new_v4();
        let first = feed.subscribe(user);
        let second = feed.subscribe(user);
        assert_eq!(feed.subscriber_count(user), 2);
        drop(first);
        assert_eq!(feed.subscriber_count(user), 1);
        drop(second);
        assert_eq!(feed.subscriber_count(user), 0);
        assert!(feed.channels().is_empty());
    }

    #[tokio::test]
    async fn test_lagging_subscriber_gets_newest() {
        let feed = ResumeFeed::new(1);
        let user = Uuid::new_v4();
        let mut sub = feed.subscribe(user);
        feed.publish(user, vec![]);
        feed.publish(user, vec![new_resume_template()]);
        let snapshot = sub.next().await.unwrap();
        assert_eq!(snapshot.resumes.len(), 1);
    }

    #[tokio::test]
    async fn test_refresh_publishes_store_contents() {
        let feed = ResumeFeed::new(4);
        let store = MemoryResumeStore::new();
        let user = Uuid::new_v4();
        let mut sub = feed.subscribe(user);
        let saved = store.create(user, &new_resume_template()).await.unwrap();
        refresh(&feed, &store, user).await;
        let snapshot = sub.next().await.unwrap();
        assert_eq!(snapshot.find(saved.id.unwrap()), Some(&saved));
    }
}
