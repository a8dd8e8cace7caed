use std::sync::Arc;

use chrono::Utc;

use crate::error::{Error, Result};
use crate::model::poll::{AggregateView, Poll, PollId, PollSpec, ResponseSpec};
use crate::store::{PollStore, Version};

/// The façade the gateway talks to; the only code path that mutates polls.
///
/// Reads go straight to the store. Mutations run a bounded
/// compare-and-swap loop: read `(poll, version)`, apply the mutation to the
/// copy, and conditionally replace. A lost race is retried with fresh state
/// up to `max_write_attempts` times; at this scale conflicts resolve within
/// a retry or two, so there is no backoff. All other failures are terminal
/// for the request and surface as-is.
pub struct PollService {
    store: Arc<dyn PollStore>,
    max_write_attempts: u32,
}

impl PollService {
    pub fn new(store: Arc<dyn PollStore>, max_write_attempts: u32) -> Self {
        Self {
            store,
            max_write_attempts,
        }
    }

    /// Validate the spec and create a new open poll under a fresh ID.
    /// A random-ID collision shows up as a store `Conflict` and is retried
    /// with another ID within the same attempt bound.
    pub async fn create(&self, spec: PollSpec) -> Result<Poll> {
        for _ in 0..self.max_write_attempts {
            let poll = spec.clone().into_poll(PollId::random())?;
            match self.store.insert(&poll).await {
                Ok(()) => {
                    info!("Created poll {} ({} slots)", poll.id, poll.candidate_slots.len());
                    return Ok(poll);
                }
                Err(Error::Conflict(_)) => continue,
                Err(err) => return Err(err),
            }
        }
        Err(Error::Conflict(
            "Could not allocate a fresh poll ID".to_string(),
        ))
    }

    pub async fn get(&self, id: PollId) -> Result<Poll> {
        Ok(self.fetch(id).await?.0)
    }

    /// Merge a participant's answers into the poll under compare-and-swap.
    pub async fn submit_response(&self, id: PollId, response: &ResponseSpec) -> Result<Poll> {
        self.mutate(id, |poll| {
            poll.submit_response(&response.participant, &response.answers)
        })
        .await
    }

    /// Close the poll. Idempotent: re-closing returns the poll unchanged,
    /// with its original `closed_at`.
    pub async fn close(&self, id: PollId) -> Result<Poll> {
        // One timestamp for the whole request, however many CAS attempts.
        let now = Utc::now();
        let poll = self
            .mutate(id, |poll| {
                poll.close(now);
                Ok(())
            })
            .await?;
        info!("Poll {} closed as of {:?}", poll.id, poll.closed_at);
        Ok(poll)
    }

    /// Fetch the poll and compute its availability tallies.
    pub async fn aggregate(&self, id: PollId) -> Result<AggregateView> {
        Ok(AggregateView::from_poll(&self.get(id).await?))
    }

    async fn fetch(&self, id: PollId) -> Result<(Poll, Version)> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| Error::not_found(format!("Poll with ID '{id}'")))
    }

    /// The compare-and-swap loop shared by all mutations. `op` must be pure
    /// with respect to everything but its argument, since it reruns on
    /// every attempt; its failures are terminal and propagate untouched.
    async fn mutate(
        &self,
        id: PollId,
        mut op: impl FnMut(&mut Poll) -> Result<()> + Send,
    ) -> Result<Poll> {
        for attempt in 0..self.max_write_attempts {
            let (mut poll, version) = self.fetch(id).await?;
            op(&mut poll)?;
            match self.store.replace(version, &poll).await {
                Ok(()) => return Ok(poll),
                Err(Error::Conflict(_)) => {
                    debug!("Lost the race on poll {id} (attempt {}), retrying", attempt + 1);
                    continue;
                }
                Err(err) => return Err(err),
            }
        }
        warn!(
            "Giving up on poll {id} after {} conflicted write attempts",
            self.max_write_attempts
        );
        Err(Error::Conflict(format!(
            "Poll {id} is being modified concurrently; try again"
        )))
    }
}
