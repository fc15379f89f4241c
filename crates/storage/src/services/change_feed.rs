//! Row-level change notifications for `idea_scores` and `voting_criteria`.
//!
//! Delivery is best effort: a subscriber that cannot keep up is told it
//! lagged and must treat everything it derived as stale.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

const DEFAULT_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeTable {
    #[serde(rename = "idea_scores")]
    IdeaScores,
    #[serde(rename = "voting_criteria")]
    VotingCriteria,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub table: ChangeTable,
    pub kind: ChangeKind,
    #[serde(default)]
    pub idea_id: Option<Uuid>,
    #[serde(default)]
    pub hackathon_id: Option<Uuid>,
}

impl ChangeEvent {
    pub fn scores(kind: ChangeKind, idea_id: Uuid) -> Self {
        Self {
            table: ChangeTable::IdeaScores,
            kind,
            idea_id: Some(idea_id),
            hackathon_id: None,
        }
    }

    pub fn criteria(kind: ChangeKind, hackathon_id: Uuid) -> Self {
        Self {
            table: ChangeTable::VotingCriteria,
            kind,
            idea_id: None,
            hackathon_id: Some(hackathon_id),
        }
    }
}

/// Table plus foreign-key filter; unset fields match anything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChangeFilter {
    pub table: Option<ChangeTable>,
    pub idea_id: Option<Uuid>,
    pub hackathon_id: Option<Uuid>,
}

impl ChangeFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn table(table: ChangeTable) -> Self {
        Self {
            table: Some(table),
            ..Self::default()
        }
    }

    pub fn idea(mut self, idea_id: Uuid) -> Self {
        self.idea_id = Some(idea_id);
        self
    }

    pub fn hackathon(mut self, hackathon_id: Uuid) -> Self {
        self.hackathon_id = Some(hackathon_id);
        self
    }

    pub fn matches(&self, event: &ChangeEvent) -> bool {
        self.table.is_none_or(|t| t == event.table)
            && self.idea_id.is_none_or(|id| event.idea_id == Some(id))
            && self
                .hackathon_id
                .is_none_or(|id| event.hackathon_id == Some(id))
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum FeedError {
    #[error("subscriber lagged behind by {0} events")]
    Lagged(u64),
    #[error("change feed closed")]
    Closed,
}

#[derive(Debug, Clone)]
pub struct ChangeFeed {
    sender: broadcast::Sender<ChangeEvent>,
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl ChangeFeed {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Returns how many subscribers received the event.
    pub fn publish(&self, event: ChangeEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    pub fn subscribe(&self, filter: ChangeFilter) -> ChangeSubscription {
        ChangeSubscription {
            receiver: self.sender.subscribe(),
            filter,
        }
    }
}

pub struct ChangeSubscription {
    receiver: broadcast::Receiver<ChangeEvent>,
    filter: ChangeFilter,
}

impl ChangeSubscription {
    /// Wait for the next event matching this subscription's filter.
    pub async fn recv(&mut self) -> Result<ChangeEvent, FeedError> {
        loop {
            match self.receiver.recv().await {
                Ok(event) if self.filter.matches(&event) => return Ok(event),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    return Err(FeedError::Lagged(skipped));
                }
                Err(broadcast::error::RecvError::Closed) => return Err(FeedError::Closed),
            }
        }
    }
}
