use std::collections::HashMap;

use rocket::tokio::sync::RwLock;

use crate::error::{Error, Result};
use crate::model::poll::{Poll, PollId};

use super::{PollStore, Version};

/// In-memory poll storage, used by the test suite and for development.
///
/// The version field behind the lock is the optimistic-concurrency "column":
/// `replace` checks it under the write lock, which makes the swap atomic.
#[derive(Debug, Default)]
pub struct MemoryStore {
    polls: RwLock<HashMap<PollId, (Poll, Version)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[rocket::async_trait]
impl PollStore for MemoryStore {
    async fn get(&self, id: PollId) -> Result<Option<(Poll, Version)>> {
        Ok(self.polls.read().await.get(&id).cloned())
    }

    async fn insert(&self, poll: &Poll) -> Result<()> {
        let mut polls = self.polls.write().await;
        if polls.contains_key(&poll.id) {
            return Err(Error::Conflict(format!("Poll {} already exists", poll.id)));
        }
        polls.insert(poll.id, (poll.clone(), 0));
        Ok(())
    }

    async fn replace(&self, expected: Version, poll: &Poll) -> Result<()> {
        let mut polls = self.polls.write().await;
        let (stored, version) = polls
            .get_mut(&poll.id)
            .ok_or_else(|| Error::not_found(format!("Poll with ID '{}'", poll.id)))?;
        if *version != expected {
            return Err(Error::Conflict(format!(
                "Poll {} was modified concurrently",
                poll.id
            )));
        }
        *stored = poll.clone();
        *version += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use crate::model::poll::{PollSpec, SlotSpec};

    use super::*;

    fn example_poll() -> Poll {
        let spec = PollSpec {
            title: "Climbing session".to_string(),
            candidate_slots: vec![SlotSpec {
                time: Utc.with_ymd_and_hms(2026, 9, 20, 10, 0, 0).unwrap(),
                label: None,
            }],
        };
        spec.into_poll(PollId::random()).unwrap()
    }

    #[rocket::async_test]
    async fn insert_then_get_round_trips_at_version_zero() {
        let store = MemoryStore::new();
        let poll = example_poll();

        store.insert(&poll).await.unwrap();
        let (fetched, version) = store.get(poll.id).await.unwrap().unwrap();
        assert_eq!(fetched, poll);
        assert_eq!(version, 0);
    }

    #[rocket::async_test]
    async fn get_unknown_id_is_none() {
        let store = MemoryStore::new();
        assert!(store.get(PollId::random()).await.unwrap().is_none());
    }

    #[rocket::async_test]
    async fn duplicate_insert_conflicts() {
        let store = MemoryStore::new();
        let poll = example_poll();
        store.insert(&poll).await.unwrap();
        assert!(matches!(
            store.insert(&poll).await,
            Err(Error::Conflict(_))
        ));
    }

    #[rocket::async_test]
    async fn replace_bumps_the_version() {
        let store = MemoryStore::new();
        let mut poll = example_poll();
        store.insert(&poll).await.unwrap();

        poll.close(Utc::now());
        store.replace(0, &poll).await.unwrap();

        let (fetched, version) = store.get(poll.id).await.unwrap().unwrap();
        assert!(!fetched.is_open());
        assert_eq!(version, 1);
    }

    #[rocket::async_test]
    async fn stale_replace_conflicts_and_writes_nothing() {
        let store = MemoryStore::new();
        let mut poll = example_poll();
        store.insert(&poll).await.unwrap();
        store.replace(0, &poll).await.unwrap();

        let fresh = store.get(poll.id).await.unwrap().unwrap().0;
        poll.close(Utc::now());
        // Version 0 is stale now.
        assert!(matches!(
            store.replace(0, &poll).await,
            Err(Error::Conflict(_))
        ));
        assert_eq!(store.get(poll.id).await.unwrap().unwrap().0, fresh);
    }

    #[rocket::async_test]
    async fn replace_of_missing_poll_is_not_found() {
        let store = MemoryStore::new();
        let poll = example_poll();
        assert!(matches!(
            store.replace(0, &poll).await,
            Err(Error::NotFound(_))
        ));
    }
}
