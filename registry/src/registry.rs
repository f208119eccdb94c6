//! Creation and lookup of action records.

use crate::error::RegistryError;
use crate::query::{ActionFilter, Query};
use acta_governance::{ParticipantDirectory, PolicyResolver, ResolvedPolicy, UsageCounters};
use acta_store::ActionStore;
use acta_types::{
    ActionDescriptor, ActionMetadata, ActionRecord, ActionRequest, ActorCategory, ActionId,
    ArtifactRef, ParamValue, ParticipantId, Priority, Timestamp,
};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Trailing window used for the monthly quota counter.
const MONTH_SECS: u64 = 30 * 24 * 3600;

/// Caller-supplied metadata overriding the defaults derived from policy.
#[derive(Clone, Debug, Default)]
pub struct MetadataOverrides {
    /// Explicit deadline; wins over the requirement's time constraint.
    pub expires_at: Option<Timestamp>,
    pub priority: Option<Priority>,
    pub tags: Vec<String>,
    /// Business domain; defaults to the descriptor's object, lowercased.
    pub domain: Option<String>,
    pub artifacts: Vec<ArtifactRef>,
}

/// Durable store of action requests and their accumulating state.
pub struct ActionRegistry {
    store: Arc<dyn ActionStore>,
    resolver: Arc<PolicyResolver>,
    directory: Arc<dyn ParticipantDirectory>,
    query_page_size: usize,
}

impl ActionRegistry {
    pub fn new(
        store: Arc<dyn ActionStore>,
        resolver: Arc<PolicyResolver>,
        directory: Arc<dyn ParticipantDirectory>,
        query_page_size: usize,
    ) -> Self {
        Self {
            store,
            resolver,
            directory,
            query_page_size,
        }
    }

    /// Create a new action: resolve policy, validate parameters, persist a
    /// pending record. Returns the immutable request.
    #[allow(clippy::too_many_arguments)]
    pub fn create(
        &self,
        category: ActorCategory,
        initiator: &ParticipantId,
        descriptor: ActionDescriptor,
        description: String,
        params: BTreeMap<String, ParamValue>,
        overrides: MetadataOverrides,
        now: Timestamp,
    ) -> Result<(ActionRequest, ResolvedPolicy), RegistryError> {
        if !self.directory.exists(initiator) {
            return Err(RegistryError::UnknownInitiator(initiator.to_string()));
        }
        if !self
            .resolver
            .can_act(initiator, category, &descriptor, self.directory.as_ref())
        {
            return Err(RegistryError::NotPermitted {
                actor: initiator.to_string(),
                category: category.to_string(),
                descriptor: descriptor.to_string(),
            });
        }

        let policy = self.resolver.resolve(category, &descriptor);

        let usage = UsageCounters {
            today: self
                .store
                .count_since(initiator, &descriptor, now.day_start())?,
            month: self.store.count_since(
                initiator,
                &descriptor,
                Timestamp::new(now.as_secs().saturating_sub(MONTH_SECS)),
            )?,
        };
        let violations =
            self.resolver
                .validate_parameters(&descriptor, &params, &policy.limits, usage);
        if !violations.is_empty() {
            return Err(RegistryError::InvalidParameters { violations });
        }

        let expires_at = overrides.expires_at.or_else(|| {
            policy
                .requirement
                .time_constraint_secs
                .map(|secs| now.plus(secs))
        });
        let domain = overrides.domain.unwrap_or_else(|| {
            descriptor
                .object()
                .map(|o| o.to_lowercase())
                .unwrap_or_else(|| "general".to_string())
        });

        let request = ActionRequest {
            id: ActionId::generate(),
            descriptor,
            initiator: initiator.clone(),
            category,
            description,
            params,
            metadata: ActionMetadata {
                created_at: now,
                expires_at,
                priority: overrides.priority.unwrap_or_default(),
                tags: overrides.tags,
                domain,
            },
            requirement: policy.requirement.clone(),
            artifacts: overrides.artifacts,
        };

        self.store.insert(&ActionRecord::pending(request.clone()))?;
        tracing::info!(
            id = %request.id,
            descriptor = %request.descriptor,
            initiator = %request.initiator,
            "action created"
        );
        Ok((request, policy))
    }

    pub fn get(&self, id: &ActionId) -> Result<ActionRecord, RegistryError> {
        self.store
            .get(id)?
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))
    }

    /// Lazy, restartable sequence over matching records, ordered by
    /// `(created_at, id)` ascending.
    pub fn query(&self, filter: ActionFilter) -> Query {
        Query::new(self.store.clone(), filter, self.query_page_size)
    }

    pub fn store(&self) -> &Arc<dyn ActionStore> {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use acta_store::MemoryActionStore;
    use acta_types::ActionStatus;
    use std::collections::BTreeSet;
    use std::sync::Mutex;

    struct TestDirectory {
        known: Mutex<BTreeSet<ParticipantId>>,
    }

    impl TestDirectory {
        fn with(ids: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                known: Mutex::new(ids.iter().map(|s| ParticipantId::from(*s)).collect()),
            })
        }
    }

    impl ParticipantDirectory for TestDirectory {
        fn exists(&self, id: &ParticipantId) -> bool {
            self.known.lock().unwrap().contains(id)
        }

        fn resolve_roles(&self, _id: &ParticipantId) -> BTreeSet<String> {
            BTreeSet::new()
        }
    }

    fn registry(directory: Arc<TestDirectory>) -> ActionRegistry {
        ActionRegistry::new(
            Arc::new(MemoryActionStore::new()),
            Arc::new(PolicyResolver::load().unwrap()),
            directory,
            16,
        )
    }

    fn p(s: &str) -> ParticipantId {
        ParticipantId::from(s)
    }

    #[test]
    fn create_persists_a_pending_record() {
        let reg = registry(TestDirectory::with(&["alice"]));
        let (request, _) = reg
            .create(
                ActorCategory::Individual,
                &p("alice"),
                ActionDescriptor::from("Create:Document"),
                "quarterly report".into(),
                BTreeMap::new(),
                MetadataOverrides::default(),
                Timestamp::new(1000),
            )
            .unwrap();

        let record = reg.get(&request.id).unwrap();
        assert_eq!(record.status, ActionStatus::Pending);
        assert_eq!(record.request.initiator, p("alice"));
    }

    #[test]
    fn metadata_defaults_are_derived() {
        let reg = registry(TestDirectory::with(&["alice"]));
        let (request, _) = reg
            .create(
                ActorCategory::Individual,
                &p("alice"),
                ActionDescriptor::from("Create:Document"),
                String::new(),
                BTreeMap::new(),
                MetadataOverrides::default(),
                Timestamp::new(1000),
            )
            .unwrap();

        assert_eq!(request.metadata.domain, "document");
        assert_eq!(request.metadata.priority, Priority::Normal);
        // Deadline derived from the Individual default requirement's
        // one-week time constraint.
        assert_eq!(
            request.metadata.expires_at,
            Some(Timestamp::new(1000 + 7 * 24 * 3600))
        );
    }

    #[test]
    fn unknown_initiator_is_refused() {
        let reg = registry(TestDirectory::with(&[]));
        let err = reg
            .create(
                ActorCategory::Individual,
                &p("ghost"),
                ActionDescriptor::from("Create:Document"),
                String::new(),
                BTreeMap::new(),
                MetadataOverrides::default(),
                Timestamp::new(1000),
            )
            .unwrap_err();
        assert!(matches!(err, RegistryError::UnknownInitiator(_)));
    }

    #[test]
    fn limit_violations_are_reported_in_full() {
        let reg = registry(TestDirectory::with(&["alice"]));
        let mut params = BTreeMap::new();
        // Individual Transfer:Funds caps amount at 10k.
        params.insert("amount".to_string(), ParamValue::Int(50_000));

        let err = reg
            .create(
                ActorCategory::Individual,
                &p("alice"),
                ActionDescriptor::from("Transfer:Funds"),
                String::new(),
                params,
                MetadataOverrides::default(),
                Timestamp::new(1000),
            )
            .unwrap_err();
        match err {
            RegistryError::InvalidParameters { violations } => {
                assert_eq!(violations.len(), 1);
                assert!(violations[0].contains("amount"));
            }
            other => panic!("expected InvalidParameters, got {other:?}"),
        }
    }

    #[test]
    fn daily_quota_is_enforced() {
        let reg = registry(TestDirectory::with(&["alice"]));
        let mut params = BTreeMap::new();
        params.insert("amount".to_string(), ParamValue::Int(10));

        // Individual Transfer:Funds allows 5 per day.
        for i in 0..5 {
            reg.create(
                ActorCategory::Individual,
                &p("alice"),
                ActionDescriptor::from("Transfer:Funds"),
                String::new(),
                params.clone(),
                MetadataOverrides::default(),
                Timestamp::new(100_000 + i),
            )
            .unwrap();
        }

        let err = reg
            .create(
                ActorCategory::Individual,
                &p("alice"),
                ActionDescriptor::from("Transfer:Funds"),
                String::new(),
                params,
                MetadataOverrides::default(),
                Timestamp::new(100_005),
            )
            .unwrap_err();
        assert!(matches!(err, RegistryError::InvalidParameters { .. }));
    }

    #[test]
    fn get_unknown_id_is_not_found() {
        let reg = registry(TestDirectory::with(&["alice"]));
        assert!(matches!(
            reg.get(&ActionId::generate()),
            Err(RegistryError::NotFound(_))
        ));
    }
}
