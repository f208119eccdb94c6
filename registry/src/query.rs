//! Lazy, restartable query sequences over the action store.
//!
//! A [`Query`] pulls pages from [`ActionStore::scan`] on demand and filters
//! them in memory. Because the scan contract orders records by
//! `(created_at, id)` ascending and the cursor is exclusive, a sequence can
//! be restarted from scratch or resumed after a store error without skipping
//! or duplicating records.

use crate::error::RegistryError;
use acta_store::ActionStore;
use acta_types::{
    ActionDescriptor, ActionId, ActionRecord, ActionStatus, ParticipantId, Timestamp,
};
use std::collections::VecDeque;
use std::sync::Arc;

/// Conjunctive filter over action records. Unset fields match everything.
#[derive(Clone, Debug, Default)]
pub struct ActionFilter {
    pub status: Option<ActionStatus>,
    pub initiator: Option<ParticipantId>,
    pub descriptor: Option<ActionDescriptor>,
    pub domain: Option<String>,
    /// Matches records with `created_from <= created_at` when set.
    pub created_from: Option<Timestamp>,
    /// Matches records with `created_at < created_until` when set.
    pub created_until: Option<Timestamp>,
}

impl ActionFilter {
    pub fn matches(&self, record: &ActionRecord) -> bool {
        if let Some(status) = self.status {
            if record.status != status {
                return false;
            }
        }
        if let Some(initiator) = &self.initiator {
            if &record.request.initiator != initiator {
                return false;
            }
        }
        if let Some(descriptor) = &self.descriptor {
            if &record.request.descriptor != descriptor {
                return false;
            }
        }
        if let Some(domain) = &self.domain {
            if &record.request.metadata.domain != domain {
                return false;
            }
        }
        let created = record.request.metadata.created_at;
        if let Some(from) = self.created_from {
            if created < from {
                return false;
            }
        }
        if let Some(until) = self.created_until {
            if created >= until {
                return false;
            }
        }
        true
    }
}

/// A pull-based sequence of matching records, in `(created_at, id)`
/// ascending order.
pub struct Query {
    store: Arc<dyn ActionStore>,
    filter: ActionFilter,
    page_size: usize,
    cursor: Option<(Timestamp, ActionId)>,
    buffered: VecDeque<ActionRecord>,
    exhausted: bool,
}

impl Query {
    pub(crate) fn new(store: Arc<dyn ActionStore>, filter: ActionFilter, page_size: usize) -> Self {
        Self {
            store,
            filter,
            page_size: page_size.max(1),
            cursor: None,
            buffered: VecDeque::new(),
            exhausted: false,
        }
    }

    /// Rewind to the beginning of the sequence.
    pub fn restart(&mut self) {
        self.cursor = None;
        self.buffered.clear();
        self.exhausted = false;
    }

    fn fill(&mut self) -> Result<(), RegistryError> {
        while self.buffered.is_empty() && !self.exhausted {
            let page = self.store.scan(self.cursor.as_ref(), self.page_size)?;
            if page.len() < self.page_size {
                self.exhausted = true;
            }
            if let Some(last) = page.last() {
                self.cursor = Some((last.request.metadata.created_at, last.id()));
            }
            self.buffered
                .extend(page.into_iter().filter(|r| self.filter.matches(r)));
        }
        Ok(())
    }
}

impl Iterator for Query {
    type Item = Result<ActionRecord, RegistryError>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Err(err) = self.fill() {
            return Some(Err(err));
        }
        self.buffered.pop_front().map(Ok)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use acta_store::MemoryActionStore;
    use acta_types::{
        ActionMetadata, ActionRequest, ActorCategory, Priority, VerificationRequirement,
    };
    use std::collections::BTreeMap;

    fn record(initiator: &str, domain: &str, created_at: u64) -> ActionRecord {
        ActionRecord::pending(ActionRequest {
            id: ActionId::generate(),
            descriptor: ActionDescriptor::from("Create:Document"),
            initiator: ParticipantId::from(initiator),
            category: ActorCategory::Individual,
            description: String::new(),
            params: BTreeMap::new(),
            metadata: ActionMetadata {
                created_at: Timestamp::new(created_at),
                expires_at: None,
                priority: Priority::Normal,
                tags: vec![],
                domain: domain.to_string(),
            },
            requirement: VerificationRequirement::single(),
            artifacts: vec![],
        })
    }

    fn seeded(records: &[ActionRecord]) -> Arc<dyn ActionStore> {
        let store = MemoryActionStore::new();
        for r in records {
            store.insert(r).unwrap();
        }
        Arc::new(store)
    }

    #[test]
    fn pages_through_everything_in_order() {
        let records: Vec<_> = (0..10).map(|i| record("alice", "general", 100 + i)).collect();
        let store = seeded(&records);

        // Page size smaller than the result set forces multiple scans.
        let query = Query::new(store, ActionFilter::default(), 3);
        let seen: Vec<_> = query.map(|r| r.unwrap()).collect();
        assert_eq!(seen.len(), 10);
        let times: Vec<_> = seen
            .iter()
            .map(|r| r.request.metadata.created_at.as_secs())
            .collect();
        assert!(times.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn filter_is_conjunctive() {
        let store = seeded(&[
            record("alice", "financial", 100),
            record("alice", "general", 101),
            record("bob", "financial", 102),
        ]);

        let filter = ActionFilter {
            initiator: Some(ParticipantId::from("alice")),
            domain: Some("financial".to_string()),
            ..ActionFilter::default()
        };
        let seen: Vec<_> = Query::new(store, filter, 16).map(|r| r.unwrap()).collect();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].request.initiator, ParticipantId::from("alice"));
    }

    #[test]
    fn created_range_is_half_open() {
        let store = seeded(&[
            record("alice", "general", 100),
            record("alice", "general", 200),
            record("alice", "general", 300),
        ]);

        let filter = ActionFilter {
            created_from: Some(Timestamp::new(100)),
            created_until: Some(Timestamp::new(300)),
            ..ActionFilter::default()
        };
        let seen: Vec<_> = Query::new(store, filter, 16).map(|r| r.unwrap()).collect();
        let times: Vec<_> = seen
            .iter()
            .map(|r| r.request.metadata.created_at.as_secs())
            .collect();
        assert_eq!(times, vec![100, 200]);
    }

    #[test]
    fn restart_replays_from_the_beginning() {
        let store = seeded(&[
            record("alice", "general", 100),
            record("alice", "general", 200),
        ]);

        let mut query = Query::new(store, ActionFilter::default(), 1);
        assert!(query.next().is_some());
        assert!(query.next().is_some());
        assert!(query.next().is_none());

        query.restart();
        assert_eq!(query.by_ref().map(|r| r.unwrap()).count(), 2);
    }
}
