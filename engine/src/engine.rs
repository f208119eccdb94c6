//! The engine: wires registry, verification, and audit into one service.
//!
//! All state transitions for one action run under that action's lock (see
//! [`crate::locks`]); the store's compare-and-swap catches anything that
//! slips past. Side-effect dispatch (ledger write, notification, reward)
//! happens strictly after the transition is persisted, so a crashed side
//! effect can be retried without replaying the transition.

use crate::clock::Clock;
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::locks::ActionLocks;
use crate::notify::{Notifier, RewardHook};
use crate::shutdown::ShutdownController;
use acta_audit::{AuditRecorder, LedgerClient};
use acta_governance::{
    AuditLevel, AuditPolicy, ParticipantDirectory, PolicyDescription, PolicyResolver,
};
use acta_registry::{ActionFilter, ActionRegistry, MetadataOverrides, Query};
use acta_store::ActionStore;
use acta_types::{
    ActionDescriptor, ActionId, ActionRecord, ActionRequest, ActionStatus, ActorCategory,
    ParamValue, ParticipantId,
};
use acta_verification::{apply_expiry, submit as apply_submission, ActionEvent, VerificationError};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

pub struct Engine {
    pub(crate) config: EngineConfig,
    pub(crate) store: Arc<dyn ActionStore>,
    pub(crate) registry: ActionRegistry,
    resolver: Arc<PolicyResolver>,
    directory: Arc<dyn ParticipantDirectory>,
    pub(crate) recorder: AuditRecorder,
    pub(crate) notifier: Arc<dyn Notifier>,
    pub(crate) reward: Arc<dyn RewardHook>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) locks: ActionLocks,
    pub(crate) ledger_tx: mpsc::UnboundedSender<ActionId>,
    pub(crate) ledger_rx: Mutex<Option<mpsc::UnboundedReceiver<ActionId>>>,
    pub(crate) shutdown: ShutdownController,
}

impl Engine {
    pub fn new(
        config: EngineConfig,
        store: Arc<dyn ActionStore>,
        directory: Arc<dyn ParticipantDirectory>,
        ledger: Box<dyn LedgerClient>,
        notifier: Arc<dyn Notifier>,
        reward: Arc<dyn RewardHook>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, EngineError> {
        let resolver = Arc::new(PolicyResolver::load()?);
        let registry = ActionRegistry::new(
            store.clone(),
            resolver.clone(),
            directory.clone(),
            config.query_page_size,
        );
        let (ledger_tx, ledger_rx) = mpsc::unbounded_channel();
        Ok(Self {
            config,
            store,
            registry,
            resolver,
            directory,
            recorder: AuditRecorder::new(ledger),
            notifier,
            reward,
            clock,
            locks: ActionLocks::new(),
            ledger_tx,
            ledger_rx: Mutex::new(Some(ledger_rx)),
            shutdown: ShutdownController::new(),
        })
    }

    /// Trigger shutdown of all background tasks.
    pub fn shutdown(&self) {
        self.shutdown.shutdown();
    }

    /// Block until SIGINT/SIGTERM, then shut down.
    pub async fn wait_for_signal(&self) {
        self.shutdown.wait_for_signal().await;
    }

    /// Create a new action. Explicitly named verifiers are notified that
    /// their approval is awaited.
    pub async fn create(
        &self,
        category: ActorCategory,
        initiator: &ParticipantId,
        descriptor: ActionDescriptor,
        description: String,
        params: BTreeMap<String, ParamValue>,
        overrides: MetadataOverrides,
    ) -> Result<ActionRequest, EngineError> {
        let now = self.clock.now();
        let (request, _policy) = self.registry.create(
            category,
            initiator,
            descriptor,
            description,
            params,
            overrides,
            now,
        )?;

        let initiator_name = self
            .directory
            .lookup(initiator)
            .map(|p| p.display_name)
            .unwrap_or_else(|| initiator.to_string());
        for verifier in &request.requirement.required_participants {
            self.notifier.notify(
                verifier,
                "verification requested",
                &format!(
                    "action {} ({}) by {initiator_name} awaits your verification",
                    request.id, request.descriptor
                ),
            );
        }
        Ok(request)
    }

    /// Fetch an action, applying lazy expiry: a pending record past its
    /// deadline transitions to `Expired` before it is returned.
    pub async fn get(&self, id: &ActionId) -> Result<ActionRecord, EngineError> {
        let _guard = self.locks.acquire(*id).await;
        let mut record = self.registry.get(id)?;
        if apply_expiry(&mut record, self.clock.now()) {
            self.persist(&mut record)?;
            self.dispatch(&record, &[ActionEvent::Expired { id: record.id() }]);
        }
        Ok(record)
    }

    /// Apply one verification submission and dispatch the resulting events.
    /// Returns the updated record.
    pub async fn submit(
        &self,
        id: &ActionId,
        verifier: &ParticipantId,
        approved: bool,
        signature: Vec<u8>,
        notes: Option<String>,
    ) -> Result<ActionRecord, EngineError> {
        if !self.directory.exists(verifier) {
            return Err(EngineError::UnknownVerifier(verifier.to_string()));
        }

        let _guard = self.locks.acquire(*id).await;
        let mut record = self.registry.get(id)?;
        let now = self.clock.now();

        // A submission racing the deadline persists the expiry it observes.
        if apply_expiry(&mut record, now) {
            self.persist(&mut record)?;
            self.dispatch(&record, &[ActionEvent::Expired { id: record.id() }]);
            return Err(VerificationError::AlreadyFinalized {
                status: ActionStatus::Expired,
            }
            .into());
        }

        let roles = self.directory.resolve_roles(verifier);
        let policy = self
            .resolver
            .resolve(record.request.category, &record.request.descriptor);
        let ledger_required = self.ledger_eligible(&record, &policy.audit);

        let events = apply_submission(
            &mut record,
            verifier,
            &roles,
            approved,
            signature,
            notes,
            ledger_required,
            now,
        )?;
        self.persist(&mut record)?;
        self.dispatch(&record, &events);
        Ok(record)
    }

    /// Lazy query over the registry.
    pub fn query(&self, filter: ActionFilter) -> Query {
        self.registry.query(filter)
    }

    /// What verification a (category, descriptor) pair would require.
    pub fn describe_policy(
        &self,
        category: ActorCategory,
        descriptor: &ActionDescriptor,
    ) -> PolicyDescription {
        self.resolver.describe_policy(category, descriptor)
    }

    /// Whether a satisfied action must be recorded on the ledger before it
    /// can complete.
    fn ledger_eligible(&self, record: &ActionRecord, audit: &AuditPolicy) -> bool {
        let meta = &record.request.metadata;
        audit.level == AuditLevel::Full
            || meta.priority >= self.config.ledger_priority_threshold
            || self.config.ledger_domains.contains(&meta.domain)
            || meta.tags.iter().any(|t| self.config.ledger_tags.contains(t))
    }

    /// Persist a mutated record, bumping its version for the store's
    /// compare-and-swap.
    pub(crate) fn persist(&self, record: &mut ActionRecord) -> Result<(), EngineError> {
        let expected = record.version;
        record.version += 1;
        self.store.compare_and_swap(expected, record)?;
        Ok(())
    }

    pub(crate) fn dispatch(&self, record: &ActionRecord, events: &[ActionEvent]) {
        for event in events {
            match event {
                ActionEvent::Approved { .. } => {
                    self.notify_initiator(record, "action approved");
                }
                ActionEvent::Rejected { verifier, .. } => {
                    self.notify_initiator(
                        record,
                        &format!("action rejected by {verifier}"),
                    );
                }
                ActionEvent::Expired { .. } => {
                    self.notify_initiator(record, "action expired");
                }
                ActionEvent::LedgerPending { id } => {
                    // Receiver lives as long as the engine, but shutdown can
                    // drop it first; the reconcile sweep picks stragglers up.
                    if self.ledger_tx.send(*id).is_err() {
                        tracing::warn!(id = %id, "ledger queue closed, leaving for reconcile");
                    }
                }
                ActionEvent::Completed { .. } => {
                    self.on_completed(record);
                }
            }
        }
    }

    pub(crate) fn on_completed(&self, record: &ActionRecord) {
        self.notify_initiator(record, "action completed");
        if self.reward_eligible(record) {
            self.reward.reward(record);
        }
    }

    /// The "significant action" predicate for the reward hook: domain, tag,
    /// or amount threshold.
    fn reward_eligible(&self, record: &ActionRecord) -> bool {
        let meta = &record.request.metadata;
        if self.config.reward_domains.contains(&meta.domain) {
            return true;
        }
        if meta.tags.iter().any(|t| self.config.reward_tags.contains(t)) {
            return true;
        }
        match (
            self.config.reward_min_amount,
            record.request.params.get("amount").and_then(ParamValue::as_number),
        ) {
            (Some(min), Some(amount)) => amount >= min,
            _ => false,
        }
    }

    pub(crate) fn notify_initiator(&self, record: &ActionRecord, subject: &str) {
        self.notifier.notify(
            &record.request.initiator,
            subject,
            &format!("action {} ({})", record.id(), record.request.descriptor),
        );
    }
}
