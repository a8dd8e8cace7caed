use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

use super::id::{new_slot_id, PollId, SlotId};
use super::poll_core::{Availability, CandidateSlot, ParticipantId, Poll};

/// A poll that the owner wishes to create.
///
/// The original frontend never declared a schema for these shapes, so we
/// deliberately reject unknown fields instead of silently dropping them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PollSpec {
    pub title: String,
    pub candidate_slots: Vec<SlotSpec>,
}

/// One proposed slot within a [`PollSpec`]; the server assigns the ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SlotSpec {
    pub time: DateTime<Utc>,
    #[serde(default)]
    pub label: Option<String>,
}

/// A participant's submission of availability marks for an open poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ResponseSpec {
    pub participant: ParticipantId,
    pub answers: HashMap<SlotId, Availability>,
}

impl PollSpec {
    /// Validate the spec and realise it into a new open poll with fresh slot
    /// IDs. Fails with `Validation` if the title is blank, there are no
    /// slots, or two slots share the same `(time, label)` descriptor.
    pub fn into_poll(self, id: PollId) -> Result<Poll> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(Error::Validation("Poll title must not be empty".to_string()));
        }
        if self.candidate_slots.is_empty() {
            return Err(Error::Validation(
                "A poll needs at least one candidate slot".to_string(),
            ));
        }
        let mut descriptors = HashSet::new();
        for slot in &self.candidate_slots {
            if !descriptors.insert((slot.time, slot.label.clone())) {
                return Err(Error::Validation(format!(
                    "Duplicate candidate slot at {}",
                    slot.time
                )));
            }
        }

        // Slot IDs are short, so guard against the rare collision.
        let mut slot_ids = HashSet::new();
        let slots = self
            .candidate_slots
            .into_iter()
            .map(|slot| {
                let mut slot_id = new_slot_id();
                while !slot_ids.insert(slot_id.clone()) {
                    slot_id = new_slot_id();
                }
                CandidateSlot {
                    id: slot_id,
                    time: slot.time,
                    label: slot.label,
                }
            })
            .collect();

        Ok(Poll::new(id, title.to_string(), slots))
    }
}
