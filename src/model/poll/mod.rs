mod aggregate;
mod id;
mod poll_core;
mod spec;

pub use aggregate::{best_slot, tally, AggregateView, SlotTally};
pub use id::{ParseIdError, PollId, SlotId};
pub use poll_core::{Availability, CandidateSlot, ParticipantId, Poll, PollStatus};
pub use spec::{PollSpec, ResponseSpec, SlotSpec};
