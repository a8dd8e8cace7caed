use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

use super::id::{PollId, SlotId};

/// Participants identify themselves by a free-form display name; there is no
/// account system.
pub type ParticipantId = String;

/// States in the poll lifecycle. The only transition is `Open` -> `Closed`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PollStatus {
    /// Accepting responses.
    Open,
    /// Finalised by the owner. No further mutation of any kind.
    Closed,
}

/// A participant's availability mark for a single candidate slot.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Availability {
    Available,
    Unavailable,
    Maybe,
}

/// One proposed date/time option within a poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateSlot {
    /// Unique within the poll, assigned at creation.
    pub id: SlotId,
    pub time: DateTime<Utc>,
    pub label: Option<String>,
}

/// Core poll data, as stored in the database.
///
/// `candidate_slots` is immutable after creation and its order is
/// significant: it is the display order and the tally order. All lifecycle
/// rules are enforced by the methods below, which are the only mutation path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Poll {
    pub id: PollId,
    pub title: String,
    pub candidate_slots: Vec<CandidateSlot>,
    pub status: PollStatus,
    pub created_at: DateTime<Utc>,
    /// `Some` iff `status` is `Closed`; stamped once by the first close.
    pub closed_at: Option<DateTime<Utc>>,
    /// Per-participant, per-slot availability marks. Keys of the inner map
    /// are always a subset of the candidate slot IDs.
    pub responses: HashMap<ParticipantId, HashMap<SlotId, Availability>>,
}

impl Poll {
    /// Create a new open poll. Slot validation is [`PollSpec`]'s job.
    ///
    /// [`PollSpec`]: super::spec::PollSpec
    pub fn new(id: PollId, title: String, candidate_slots: Vec<CandidateSlot>) -> Self {
        Self {
            id,
            title,
            candidate_slots,
            status: PollStatus::Open,
            created_at: Utc::now(),
            closed_at: None,
            responses: HashMap::new(),
        }
    }

    pub fn is_open(&self) -> bool {
        self.status == PollStatus::Open
    }

    /// Look up a candidate slot by ID.
    pub fn slot(&self, slot_id: &str) -> Option<&CandidateSlot> {
        self.candidate_slots.iter().find(|slot| slot.id == slot_id)
    }

    /// Merge a participant's answers into their own response entry.
    ///
    /// Answers are merged per slot, so a later submission can refine earlier
    /// answers without resending all of them; the latest mark for a given
    /// slot wins. Fails with `InvalidState` on a closed poll and with
    /// `Validation` if any answer references an unknown slot; in both cases
    /// the poll is left untouched (all-or-nothing per call).
    pub fn submit_response(
        &mut self,
        participant: &str,
        answers: &HashMap<SlotId, Availability>,
    ) -> Result<()> {
        if !self.is_open() {
            return Err(Error::InvalidState(format!(
                "Poll {} is closed and no longer accepts responses",
                self.id
            )));
        }
        if participant.trim().is_empty() {
            return Err(Error::Validation(
                "Participant name must not be empty".to_string(),
            ));
        }
        for slot_id in answers.keys() {
            if self.slot(slot_id).is_none() {
                return Err(Error::Validation(format!(
                    "Poll {} has no candidate slot with ID '{slot_id}'",
                    self.id
                )));
            }
        }

        self.responses
            .entry(participant.to_string())
            .or_default()
            .extend(answers.iter().map(|(id, mark)| (id.clone(), *mark)));
        Ok(())
    }

    /// Transition `Open` -> `Closed`, stamping `closed_at`.
    ///
    /// Closing an already-closed poll is a no-op rather than an error, so
    /// retried close requests are safe and `closed_at` never moves.
    pub fn close(&mut self, now: DateTime<Utc>) {
        if self.is_open() {
            self.status = PollStatus::Closed;
            self.closed_at = Some(now);
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::super::id::new_slot_id;
    use super::*;

    fn two_slot_poll() -> Poll {
        let slots = vec![
            CandidateSlot {
                id: new_slot_id(),
                time: Utc.with_ymd_and_hms(2026, 9, 14, 18, 0, 0).unwrap(),
                label: Some("Monday evening".to_string()),
            },
            CandidateSlot {
                id: new_slot_id(),
                time: Utc.with_ymd_and_hms(2026, 9, 16, 18, 0, 0).unwrap(),
                label: None,
            },
        ];
        Poll::new(PollId::random(), "Team dinner".to_string(), slots)
    }

    #[test]
    fn new_polls_are_open_with_no_close_time() {
        let poll = two_slot_poll();
        assert_eq!(poll.status, PollStatus::Open);
        assert_eq!(poll.closed_at, None);
        assert!(poll.responses.is_empty());
    }

    #[test]
    fn close_is_idempotent() {
        let mut poll = two_slot_poll();
        let first = Utc::now();
        let second = first + Duration::minutes(5);

        poll.close(first);
        assert_eq!(poll.status, PollStatus::Closed);
        assert_eq!(poll.closed_at, Some(first));

        // Re-closing keeps the original timestamp.
        poll.close(second);
        assert_eq!(poll.closed_at, Some(first));
    }

    #[test]
    fn closed_polls_reject_responses_unchanged() {
        let mut poll = two_slot_poll();
        let slot = poll.candidate_slots[0].id.clone();
        poll.submit_response("ada", &HashMap::from([(slot.clone(), Availability::Available)]))
            .unwrap();
        poll.close(Utc::now());

        let before = poll.clone();
        let err = poll
            .submit_response("brian", &HashMap::from([(slot, Availability::Maybe)]))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidState(_)));
        assert_eq!(poll, before);
    }

    #[test]
    fn unknown_slot_is_rejected_with_no_partial_write() {
        let mut poll = two_slot_poll();
        let known = poll.candidate_slots[0].id.clone();
        let before = poll.clone();

        // One valid answer and one bogus one: nothing may be written.
        let answers = HashMap::from([
            (known, Availability::Available),
            ("deadbeef".to_string(), Availability::Maybe),
        ]);
        let err = poll.submit_response("ada", &answers).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(poll, before);
    }

    #[test]
    fn empty_participant_is_rejected() {
        let mut poll = two_slot_poll();
        let err = poll.submit_response("  ", &HashMap::new()).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn resubmission_merges_per_slot() {
        let mut poll = two_slot_poll();
        let first = poll.candidate_slots[0].id.clone();
        let second = poll.candidate_slots[1].id.clone();

        poll.submit_response(
            "ada",
            &HashMap::from([
                (first.clone(), Availability::Maybe),
                (second.clone(), Availability::Unavailable),
            ]),
        )
        .unwrap();
        // Refine just the first answer.
        poll.submit_response("ada", &HashMap::from([(first.clone(), Availability::Available)]))
            .unwrap();

        let answers = &poll.responses["ada"];
        assert_eq!(answers[&first], Availability::Available);
        assert_eq!(answers[&second], Availability::Unavailable);
        assert_eq!(poll.responses.len(), 1);
    }
}
