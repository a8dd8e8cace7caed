use std::fmt::{Debug, Display, Formatter};
use std::str::FromStr;

use data_encoding::HEXLOWER;
use rocket::http::{
    impl_from_uri_param_identity,
    uri::fmt::{Path, UriDisplay},
};
use rocket::request::FromParam;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of random bytes in a poll ID.
const POLL_ID_BYTES: usize = 8;

/// Number of random bytes in a candidate slot ID.
const SLOT_ID_BYTES: usize = 4;

/// Candidate slot IDs are plain strings: they only need to be unique within
/// their poll, and they appear as JSON map keys in responses.
pub type SlotId = String;

/// Generate a fresh slot ID. Uniqueness within a poll is the caller's job.
pub(crate) fn new_slot_id() -> SlotId {
    HEXLOWER.encode(&rand::random::<[u8; SLOT_ID_BYTES]>())
}

/// An opaque poll identifier, rendered as lowercase hex.
/// Serializes to a string rather than a byte array so it is API-friendly,
/// both in JSON bodies and in URL path segments.
#[derive(Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct PollId([u8; POLL_ID_BYTES]);

impl PollId {
    /// Generate a fresh random ID.
    pub fn random() -> Self {
        Self(rand::random())
    }
}

/// Failed to parse a [`PollId`] from its string form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Expected {} lowercase hex characters", 2 * POLL_ID_BYTES)]
pub struct ParseIdError;

impl FromStr for PollId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = HEXLOWER.decode(s.as_bytes()).map_err(|_| ParseIdError)?;
        let bytes = <[u8; POLL_ID_BYTES]>::try_from(bytes).map_err(|_| ParseIdError)?;
        Ok(Self(bytes))
    }
}

impl Debug for PollId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "PollId({self})")
    }
}

impl Display for PollId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", HEXLOWER.encode(&self.0))
    }
}

impl From<PollId> for String {
    fn from(id: PollId) -> Self {
        id.to_string()
    }
}

impl TryFrom<String> for PollId {
    type Error = ParseIdError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl<'a> FromParam<'a> for PollId {
    type Error = ParseIdError;

    fn from_param(param: &'a str) -> Result<Self, Self::Error> {
        param.parse()
    }
}

impl UriDisplay<Path> for PollId {
    fn fmt(&self, formatter: &mut rocket::http::uri::fmt::Formatter<'_, Path>) -> std::fmt::Result {
        formatter.write_value(self.to_string())
    }
}

impl_from_uri_param_identity!([Path] PollId);
