use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Delivery wrapper for one change on the feed.
///
/// `sequence_number` is the feed position: strictly increasing across all commits of
/// one store, so a consumer can spot gaps or replays. Changes from the same atomic
/// commit share a `commit_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEnvelope<E> {
    event_id: Uuid,
    commit_id: Uuid,
    sequence_number: u64,
    payload: E,
}

impl<E> EventEnvelope<E> {
    pub fn new(commit_id: Uuid, sequence_number: u64, payload: E) -> Self {
        Self {
            event_id: Uuid::now_v7(),
            commit_id,
            sequence_number,
            payload,
        }
    }

    pub fn event_id(&self) -> Uuid {
        self.event_id
    }

    pub fn commit_id(&self) -> Uuid {
        self.commit_id
    }

    pub fn sequence_number(&self) -> u64 {
        self.sequence_number
    }

    pub fn payload(&self) -> &E {
        &self.payload
    }

    pub fn into_payload(self) -> E {
        self.payload
    }
}
