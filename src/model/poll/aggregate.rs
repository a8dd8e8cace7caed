use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{PollId, SlotId};
use super::poll_core::{Availability, CandidateSlot, ParticipantId, Poll, PollStatus};

/// Availability tally for one candidate slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotTally {
    pub slot: CandidateSlot,
    pub available_count: u32,
    pub unavailable_count: u32,
    pub maybe_count: u32,
    /// Sorted for deterministic output.
    pub available_participants: Vec<ParticipantId>,
}

/// Computed tallies alongside the poll's own fields, as returned by the
/// aggregate endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateView {
    pub id: PollId,
    pub title: String,
    pub status: PollStatus,
    pub created_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    pub participant_count: u32,
    /// One entry per candidate slot, in candidate slot order.
    pub tallies: Vec<SlotTally>,
    /// The winning slot under the tie-break rule, if the poll has any slots.
    pub best_slot: Option<SlotId>,
}

impl AggregateView {
    pub fn from_poll(poll: &Poll) -> Self {
        let tallies = tally(poll);
        let best_slot = best_slot(&tallies).map(|t| t.slot.id.clone());
        Self {
            id: poll.id,
            title: poll.title.clone(),
            status: poll.status,
            created_at: poll.created_at,
            closed_at: poll.closed_at,
            participant_count: poll.responses.len() as u32,
            tallies,
            best_slot,
        }
    }
}

/// Tally every candidate slot of the poll, preserving slot order.
///
/// Pure and recomputed on demand: polls are small, and recomputation is
/// easier to keep correct than incremental maintenance.
pub fn tally(poll: &Poll) -> Vec<SlotTally> {
    poll.candidate_slots
        .iter()
        .map(|slot| {
            let mut slot_tally = SlotTally {
                slot: slot.clone(),
                available_count: 0,
                unavailable_count: 0,
                maybe_count: 0,
                available_participants: Vec::new(),
            };
            for (participant, answers) in &poll.responses {
                match answers.get(&slot.id) {
                    Some(Availability::Available) => {
                        slot_tally.available_count += 1;
                        slot_tally.available_participants.push(participant.clone());
                    }
                    Some(Availability::Unavailable) => slot_tally.unavailable_count += 1,
                    Some(Availability::Maybe) => slot_tally.maybe_count += 1,
                    None => {}
                }
            }
            slot_tally.available_participants.sort();
            slot_tally
        })
        .collect()
}

/// Pick the best slot: highest available count, ties broken by earliest
/// position in candidate slot order.
pub fn best_slot(tallies: &[SlotTally]) -> Option<&SlotTally> {
    tallies.iter().fold(None, |best, candidate| match best {
        Some(current) if current.available_count >= candidate.available_count => Some(current),
        _ => Some(candidate),
    })
}
