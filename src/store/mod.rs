mod memory;
mod mongo;

pub use memory::MemoryStore;
pub use mongo::MongoStore;

use crate::error::Result;
use crate::model::poll::{Poll, PollId};

/// Monotonically increasing per-poll version used for optimistic
/// concurrency. Storage metadata only; never serialized into API responses.
pub type Version = u64;

/// Durable poll storage. Every operation is atomic with respect to a single
/// poll ID; nothing spans multiple polls.
///
/// Mutation happens exclusively through `replace`, the compare-and-swap
/// primitive: the caller reads `(poll, version)` via `get`, computes the new
/// poll, and writes it back conditional on the version being unchanged.
#[rocket::async_trait]
pub trait PollStore: Send + Sync {
    /// Fetch a poll and its current version, or `None` if the ID is unknown.
    async fn get(&self, id: PollId) -> Result<Option<(Poll, Version)>>;

    /// Insert a brand-new poll at version 0.
    /// Fails with `Conflict` if the ID is already taken.
    async fn insert(&self, poll: &Poll) -> Result<()>;

    /// Replace the stored poll iff its version still equals `expected`,
    /// bumping the version by one. Fails with `Conflict` if the version
    /// moved, or `NotFound` if the poll no longer exists.
    async fn replace(&self, expected: Version, poll: &Poll) -> Result<()>;
}
