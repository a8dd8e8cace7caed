use mongodb::{
    bson::doc,
    error::{ErrorKind, WriteFailure},
    Collection, Database,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::poll::{Poll, PollId};

use super::{PollStore, Version};

/// A poll as stored in MongoDB, alongside its optimistic-concurrency
/// version. The document is keyed by the poll's string-form ID, so the
/// default unique `_id` index gives us duplicate detection for free.
#[derive(Debug, Serialize, Deserialize)]
struct PollDocument {
    #[serde(rename = "_id")]
    id: String,
    version: i64,
    poll: Poll,
}

/// MongoDB-backed poll storage. Compare-and-swap is a
/// `find_one_and_replace` filtered on both `_id` and `version`, which the
/// server executes atomically.
pub struct MongoStore {
    polls: Collection<PollDocument>,
}

impl MongoStore {
    const COLLECTION: &'static str = "polls";

    pub fn new(db: &Database) -> Self {
        Self {
            polls: db.collection(Self::COLLECTION),
        }
    }
}

#[rocket::async_trait]
impl PollStore for MongoStore {
    async fn get(&self, id: PollId) -> Result<Option<(Poll, Version)>> {
        let document = self
            .polls
            .find_one(doc! {"_id": id.to_string()}, None)
            .await?;
        Ok(document.map(|d| (d.poll, d.version as Version)))
    }

    async fn insert(&self, poll: &Poll) -> Result<()> {
        let document = PollDocument {
            id: poll.id.to_string(),
            version: 0,
            poll: poll.clone(),
        };
        self.polls.insert_one(document, None).await.map_err(|err| {
            if is_duplicate_key(&err) {
                Error::Conflict(format!("Poll {} already exists", poll.id))
            } else {
                err.into()
            }
        })?;
        Ok(())
    }

    async fn replace(&self, expected: Version, poll: &Poll) -> Result<()> {
        let filter = doc! {
            "_id": poll.id.to_string(),
            "version": expected as i64,
        };
        let replacement = PollDocument {
            id: poll.id.to_string(),
            version: expected as i64 + 1,
            poll: poll.clone(),
        };
        let previous = self
            .polls
            .find_one_and_replace(filter, replacement, None)
            .await?;
        if previous.is_some() {
            return Ok(());
        }

        // Nothing matched: distinguish a lost race from a vanished poll.
        if self.get(poll.id).await?.is_some() {
            Err(Error::Conflict(format!(
                "Poll {} was modified concurrently",
                poll.id
            )))
        } else {
            Err(Error::not_found(format!("Poll with ID '{}'", poll.id)))
        }
    }
}

/// MongoDB reports a violated unique index as write error code 11000.
fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        &*err.kind,
        ErrorKind::Write(WriteFailure::WriteError(write_err)) if write_err.code == 11000
    )
}
