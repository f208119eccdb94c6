//! End-to-end engine tests: creation, multi-party verification, ledger
//! recording, expiry, and recovery paths; all against nullable
//! infrastructure.

use acta_audit::{LedgerClient, LedgerError};
use acta_engine::{Engine, EngineConfig, EngineError, Notifier, RewardHook};
use acta_nullables::{NullClock, NullDirectory, NullLedger};
use acta_registry::{ActionFilter, MetadataOverrides, RegistryError};
use acta_store::MemoryActionStore;
use acta_types::{
    ActionDescriptor, ActionStatus, ActorCategory, AuditState, ContentDigest, LedgerReceipt,
    ParamValue, ParticipantId, Priority, Timestamp,
};
use acta_verification::VerificationError;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

struct RecordingNotifier {
    sent: Mutex<Vec<(ParticipantId, String)>>,
}

impl RecordingNotifier {
    fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
        }
    }

    fn subjects_for(&self, recipient: &str) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|(r, _)| r == &ParticipantId::from(recipient))
            .map(|(_, s)| s.clone())
            .collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, recipient: &ParticipantId, subject: &str, _body: &str) {
        self.sent
            .lock()
            .unwrap()
            .push((recipient.clone(), subject.to_string()));
    }
}

struct CountingReward {
    count: Mutex<u32>,
}

impl RewardHook for CountingReward {
    fn reward(&self, _record: &acta_types::ActionRecord) {
        *self.count.lock().unwrap() += 1;
    }
}

/// A ledger whose write blocks until the test releases it.
struct GatedLedger {
    entered: AtomicBool,
    release: AtomicBool,
}

impl GatedLedger {
    fn new() -> Self {
        Self {
            entered: AtomicBool::new(false),
            release: AtomicBool::new(false),
        }
    }
}

impl LedgerClient for GatedLedger {
    fn write(
        &self,
        id: &acta_types::ActionId,
        digest: &ContentDigest,
        _participants: &[ParticipantId],
    ) -> Result<LedgerReceipt, LedgerError> {
        self.entered.store(true, Ordering::SeqCst);
        while !self.release.load(Ordering::SeqCst) {
            std::thread::sleep(Duration::from_millis(1));
        }
        Ok(LedgerReceipt {
            action: *id,
            digest: *digest,
            reference: "gated/1".to_string(),
            recorded_at: Timestamp::new(0),
        })
    }
}

struct Ctx {
    engine: Arc<Engine>,
    ledger: Arc<NullLedger>,
    clock: Arc<NullClock>,
    notifier: Arc<RecordingNotifier>,
    rewards: Arc<CountingReward>,
}

fn setup(tweak: impl FnOnce(&mut EngineConfig)) -> Ctx {
    let mut config = EngineConfig {
        ledger_retry_base_ms: 1,
        ..EngineConfig::default()
    };
    tweak(&mut config);

    let directory = Arc::new(NullDirectory::with(&[
        ("mgr-ana", &["manager"]),
        ("emp-bob", &["employee"]),
        ("dept-head", &[]),
        ("finance-dir", &[]),
        ("fin-bea", &["finance"]),
        ("fin-carl", &["finance"]),
        ("alice", &[]),
        ("bob", &[]),
    ]));
    let ledger = Arc::new(NullLedger::new());
    let clock = Arc::new(NullClock::new(1_000_000));
    let notifier = Arc::new(RecordingNotifier::new());
    let rewards = Arc::new(CountingReward {
        count: Mutex::new(0),
    });

    let engine = Arc::new(
        Engine::new(
            config,
            Arc::new(MemoryActionStore::new()),
            directory,
            Box::new(ledger.clone()),
            notifier.clone(),
            rewards.clone(),
            clock.clone(),
        )
        .unwrap(),
    );
    Ctx {
        engine,
        ledger,
        clock,
        notifier,
        rewards,
    }
}

fn p(s: &str) -> ParticipantId {
    ParticipantId::from(s)
}

fn d(s: &str) -> ActionDescriptor {
    ActionDescriptor::from(s)
}

fn amount(n: i64) -> BTreeMap<String, ParamValue> {
    let mut params = BTreeMap::new();
    params.insert("amount".to_string(), ParamValue::Int(n));
    params
}

async fn create_transfer(ctx: &Ctx) -> acta_types::ActionId {
    ctx.engine
        .create(
            ActorCategory::Individual,
            &p("alice"),
            d("Transfer:Funds"),
            "pay invoice".into(),
            amount(500),
            MetadataOverrides::default(),
        )
        .await
        .unwrap()
        .id
}

#[tokio::test]
async fn sequential_budget_approval_end_to_end() {
    let ctx = setup(|_| {});

    let request = ctx
        .engine
        .create(
            ActorCategory::Enterprise,
            &p("mgr-ana"),
            d("Approve:Budget"),
            "Q3 marketing budget".into(),
            amount(250_000),
            MetadataOverrides::default(),
        )
        .await
        .unwrap();
    let id = request.id;

    // Both named approvers were told their verification is awaited.
    assert_eq!(ctx.notifier.subjects_for("dept-head").len(), 1);
    assert_eq!(ctx.notifier.subjects_for("finance-dir").len(), 1);

    // Finance director cannot jump the queue.
    let err = ctx
        .engine
        .submit(&id, &p("finance-dir"), true, b"sig".to_vec(), None)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Verification(VerificationError::OutOfSequence { .. })
    ));

    let record = ctx
        .engine
        .submit(&id, &p("dept-head"), true, b"sig".to_vec(), None)
        .await
        .unwrap();
    assert_eq!(record.status, ActionStatus::Pending);
    assert_eq!(record.verifications.len(), 1);

    // Second approval satisfies the requirement; audit level Full means the
    // action waits for its ledger write.
    let record = ctx
        .engine
        .submit(&id, &p("finance-dir"), true, b"sig".to_vec(), None)
        .await
        .unwrap();
    assert_eq!(record.status, ActionStatus::Approved);
    assert_eq!(record.audit_state, AuditState::Pending);

    ctx.engine.process_ledger_entry(&id).await.unwrap();
    let record = ctx.engine.get(&id).await.unwrap();
    assert_eq!(record.status, ActionStatus::Completed);
    assert_eq!(record.audit_state, AuditState::Recorded);
    assert!(record.ledger_receipt.is_some());
    assert!(record
        .result_payload
        .as_deref()
        .unwrap()
        .contains("ledger_reference"));
    assert_eq!(ctx.ledger.recorded(), 1);
}

#[tokio::test]
async fn single_approval_without_audit_completes_immediately() {
    let ctx = setup(|_| {});

    let request = ctx
        .engine
        .create(
            ActorCategory::Individual,
            &p("alice"),
            d("Create:Document"),
            "meeting notes".into(),
            BTreeMap::new(),
            MetadataOverrides::default(),
        )
        .await
        .unwrap();

    let record = ctx
        .engine
        .submit(&request.id, &p("bob"), true, b"sig".to_vec(), None)
        .await
        .unwrap();
    assert_eq!(record.status, ActionStatus::Completed);
    assert_eq!(record.audit_state, AuditState::NotRequired);
    assert_eq!(ctx.ledger.recorded(), 0);
    assert!(ctx
        .notifier
        .subjects_for("alice")
        .iter()
        .any(|s| s == "action completed"));
}

#[tokio::test]
async fn critical_priority_forces_ledger_recording() {
    let ctx = setup(|_| {});

    let request = ctx
        .engine
        .create(
            ActorCategory::Individual,
            &p("alice"),
            d("Create:Document"),
            "incident report".into(),
            BTreeMap::new(),
            MetadataOverrides {
                priority: Some(Priority::Critical),
                ..MetadataOverrides::default()
            },
        )
        .await
        .unwrap();

    let record = ctx
        .engine
        .submit(&request.id, &p("bob"), true, b"sig".to_vec(), None)
        .await
        .unwrap();
    assert_eq!(record.status, ActionStatus::Approved);
    assert_eq!(record.audit_state, AuditState::Pending);
}

#[tokio::test]
async fn rejection_is_final() {
    let ctx = setup(|_| {});
    let id = create_transfer(&ctx).await;

    let record = ctx
        .engine
        .submit(&id, &p("fin-bea"), false, b"sig".to_vec(), Some("no".into()))
        .await
        .unwrap();
    assert_eq!(record.status, ActionStatus::Rejected);
    assert_eq!(ctx.ledger.recorded(), 0);

    let err = ctx
        .engine
        .submit(&id, &p("fin-carl"), true, b"sig".to_vec(), None)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Verification(VerificationError::AlreadyFinalized {
            status: ActionStatus::Rejected
        })
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_submissions_reach_a_consistent_state() {
    let ctx = setup(|_| {});
    let id = create_transfer(&ctx).await;

    let a = {
        let engine = ctx.engine.clone();
        tokio::spawn(async move {
            engine
                .submit(&id, &p("fin-bea"), true, b"sig-a".to_vec(), None)
                .await
        })
    };
    let b = {
        let engine = ctx.engine.clone();
        tokio::spawn(async move {
            engine
                .submit(&id, &p("fin-carl"), true, b"sig-b".to_vec(), None)
            .await
        })
    };
    a.await.unwrap().unwrap();
    b.await.unwrap().unwrap();

    let record = ctx.engine.get(&id).await.unwrap();
    assert_eq!(record.verifications.len(), 2);
    assert_eq!(record.status, ActionStatus::Approved);
    assert_eq!(record.audit_state, AuditState::Pending);

    // Processing twice writes to the ledger exactly once.
    ctx.engine.process_ledger_entry(&id).await.unwrap();
    ctx.engine.process_ledger_entry(&id).await.unwrap();
    assert_eq!(ctx.ledger.attempts(), 1);
    assert_eq!(ctx.engine.get(&id).await.unwrap().status, ActionStatus::Completed);
}

#[tokio::test]
async fn duplicate_verifier_is_refused() {
    let ctx = setup(|_| {});
    let id = create_transfer(&ctx).await;

    ctx.engine
        .submit(&id, &p("fin-bea"), true, b"sig".to_vec(), None)
        .await
        .unwrap();
    let err = ctx
        .engine
        .submit(&id, &p("fin-bea"), true, b"sig".to_vec(), None)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Verification(VerificationError::DuplicateVerification(_))
    ));
}

#[tokio::test]
async fn transient_ledger_outage_is_retried() {
    let ctx = setup(|_| {});
    let id = create_transfer(&ctx).await;
    ctx.engine
        .submit(&id, &p("fin-bea"), true, b"sig".to_vec(), None)
        .await
        .unwrap();
    ctx.engine
        .submit(&id, &p("fin-carl"), true, b"sig".to_vec(), None)
        .await
        .unwrap();

    ctx.ledger.fail_next_transient(2);
    ctx.engine.process_ledger_entry(&id).await.unwrap();

    assert_eq!(ctx.ledger.attempts(), 3);
    let record = ctx.engine.get(&id).await.unwrap();
    assert_eq!(record.status, ActionStatus::Completed);
    assert_eq!(record.audit_state, AuditState::Recorded);
}

#[tokio::test]
async fn exhausted_retries_leave_the_approval_for_reconcile() {
    let ctx = setup(|c| c.ledger_max_retries = 1);
    let id = create_transfer(&ctx).await;
    ctx.engine
        .submit(&id, &p("fin-bea"), true, b"sig".to_vec(), None)
        .await
        .unwrap();
    ctx.engine
        .submit(&id, &p("fin-carl"), true, b"sig".to_vec(), None)
        .await
        .unwrap();

    ctx.ledger.fail_next_transient(10);
    assert!(ctx.engine.process_ledger_entry(&id).await.is_err());

    // The approval survives the outage.
    let record = ctx.engine.get(&id).await.unwrap();
    assert_eq!(record.status, ActionStatus::Approved);
    assert_eq!(record.audit_state, AuditState::Pending);

    // Once the ledger heals, the reconcile sweep finds the action and a
    // retry completes it.
    ctx.ledger.heal();
    assert_eq!(ctx.engine.run_reconcile_sweep().unwrap(), 1);
    ctx.engine.process_ledger_entry(&id).await.unwrap();
    assert_eq!(ctx.engine.get(&id).await.unwrap().status, ActionStatus::Completed);
}

#[tokio::test]
async fn permanent_ledger_failure_marks_audit_failed() {
    let ctx = setup(|_| {});
    let id = create_transfer(&ctx).await;
    ctx.engine
        .submit(&id, &p("fin-bea"), true, b"sig".to_vec(), None)
        .await
        .unwrap();
    ctx.engine
        .submit(&id, &p("fin-carl"), true, b"sig".to_vec(), None)
        .await
        .unwrap();

    ctx.ledger.fail_permanently();
    assert!(ctx.engine.process_ledger_entry(&id).await.is_err());

    let record = ctx.engine.get(&id).await.unwrap();
    assert_eq!(record.status, ActionStatus::Approved);
    assert!(matches!(record.audit_state, AuditState::Failed { .. }));
}

#[tokio::test]
async fn overdue_actions_expire_on_get_and_via_sweep() {
    let ctx = setup(|_| {});

    let fetched = ctx
        .engine
        .create(
            ActorCategory::Individual,
            &p("alice"),
            d("Create:Document"),
            String::new(),
            BTreeMap::new(),
            MetadataOverrides {
                expires_at: Some(Timestamp::new(1_000_060)),
                ..MetadataOverrides::default()
            },
        )
        .await
        .unwrap()
        .id;
    let swept = ctx
        .engine
        .create(
            ActorCategory::Individual,
            &p("alice"),
            d("Create:Document"),
            String::new(),
            BTreeMap::new(),
            MetadataOverrides {
                expires_at: Some(Timestamp::new(1_000_060)),
                ..MetadataOverrides::default()
            },
        )
        .await
        .unwrap()
        .id;

    ctx.clock.advance(61);

    assert_eq!(
        ctx.engine.get(&fetched).await.unwrap().status,
        ActionStatus::Expired
    );
    assert_eq!(ctx.engine.run_expiry_sweep().await.unwrap(), 1);
    assert_eq!(
        ctx.engine.get(&swept).await.unwrap().status,
        ActionStatus::Expired
    );

    // Both expiry paths notify the initiator, once per action.
    let expiries = ctx
        .notifier
        .subjects_for("alice")
        .into_iter()
        .filter(|s| s == "action expired")
        .count();
    assert_eq!(expiries, 2);

    let err = ctx
        .engine
        .submit(&swept, &p("bob"), true, b"sig".to_vec(), None)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Verification(VerificationError::AlreadyFinalized {
            status: ActionStatus::Expired
        })
    ));
}

#[tokio::test]
async fn daily_quota_blocks_the_sixth_transfer() {
    let ctx = setup(|_| {});

    for _ in 0..5 {
        create_transfer(&ctx).await;
    }
    let err = ctx
        .engine
        .create(
            ActorCategory::Individual,
            &p("alice"),
            d("Transfer:Funds"),
            String::new(),
            amount(500),
            MetadataOverrides::default(),
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Registry(RegistryError::InvalidParameters { .. })
    ));
}

#[tokio::test]
async fn enterprise_role_gates_initiation() {
    let ctx = setup(|_| {});

    let err = ctx
        .engine
        .create(
            ActorCategory::Enterprise,
            &p("emp-bob"),
            d("Approve:Budget"),
            String::new(),
            amount(1_000),
            MetadataOverrides::default(),
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Registry(RegistryError::NotPermitted { .. })
    ));
}

#[tokio::test]
async fn unknown_verifier_is_refused() {
    let ctx = setup(|_| {});
    let id = create_transfer(&ctx).await;

    let err = ctx
        .engine
        .submit(&id, &p("ghost"), true, b"sig".to_vec(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::UnknownVerifier(_)));
}

#[tokio::test]
async fn completed_actions_trigger_the_reward_hook() {
    let ctx = setup(|c| c.reward_domains = vec!["document".to_string()]);

    let request = ctx
        .engine
        .create(
            ActorCategory::Individual,
            &p("alice"),
            d("Create:Document"),
            String::new(),
            BTreeMap::new(),
            MetadataOverrides::default(),
        )
        .await
        .unwrap();
    ctx.engine
        .submit(&request.id, &p("bob"), true, b"sig".to_vec(), None)
        .await
        .unwrap();

    assert_eq!(*ctx.rewards.count.lock().unwrap(), 1);
}

#[tokio::test]
async fn reward_amount_threshold_applies() {
    let ctx = setup(|c| c.reward_min_amount = Some(100_000.0));

    // Enterprise budget approval over the threshold, completed via ledger.
    let id = ctx
        .engine
        .create(
            ActorCategory::Enterprise,
            &p("mgr-ana"),
            d("Approve:Budget"),
            String::new(),
            amount(250_000),
            MetadataOverrides::default(),
        )
        .await
        .unwrap()
        .id;
    ctx.engine
        .submit(&id, &p("dept-head"), true, b"sig".to_vec(), None)
        .await
        .unwrap();
    ctx.engine
        .submit(&id, &p("finance-dir"), true, b"sig".to_vec(), None)
        .await
        .unwrap();
    ctx.engine.process_ledger_entry(&id).await.unwrap();

    assert_eq!(*ctx.rewards.count.lock().unwrap(), 1);
}

#[tokio::test]
async fn query_filters_by_status_and_initiator() {
    let ctx = setup(|_| {});

    let transfer = create_transfer(&ctx).await;
    ctx.clock.advance(1);
    ctx.engine
        .create(
            ActorCategory::Individual,
            &p("bob"),
            d("Create:Document"),
            String::new(),
            BTreeMap::new(),
            MetadataOverrides::default(),
        )
        .await
        .unwrap();

    let mine: Vec<_> = ctx
        .engine
        .query(ActionFilter {
            initiator: Some(p("alice")),
            status: Some(ActionStatus::Pending),
            ..ActionFilter::default()
        })
        .map(|r| r.unwrap())
        .collect();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].id(), transfer);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn slow_ledger_write_does_not_block_reads() {
    let ledger = Arc::new(GatedLedger::new());
    let engine = Arc::new(
        Engine::new(
            EngineConfig::default(),
            Arc::new(MemoryActionStore::new()),
            Arc::new(NullDirectory::with(&[("alice", &[]), ("bob", &[])])),
            Box::new(ledger.clone()),
            Arc::new(RecordingNotifier::new()),
            Arc::new(CountingReward {
                count: Mutex::new(0),
            }),
            Arc::new(NullClock::new(1_000_000)),
        )
        .unwrap(),
    );

    let id = engine
        .create(
            ActorCategory::Individual,
            &p("alice"),
            d("Create:Document"),
            String::new(),
            BTreeMap::new(),
            MetadataOverrides {
                priority: Some(Priority::Critical),
                ..MetadataOverrides::default()
            },
        )
        .await
        .unwrap()
        .id;
    let record = engine
        .submit(&id, &p("bob"), true, b"sig".to_vec(), None)
        .await
        .unwrap();
    assert_eq!(record.status, ActionStatus::Approved);

    let worker = {
        let engine = engine.clone();
        tokio::spawn(async move { engine.process_ledger_entry(&id).await })
    };
    while !ledger.entered.load(Ordering::SeqCst) {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }

    // The in-flight ledger write must not hold the per-action lock.
    let fetched = tokio::time::timeout(Duration::from_secs(1), engine.get(&id))
        .await
        .expect("get blocked behind the ledger write")
        .unwrap();
    assert_eq!(fetched.status, ActionStatus::Approved);

    ledger.release.store(true, Ordering::SeqCst);
    worker.await.unwrap().unwrap();
    let done = engine.get(&id).await.unwrap();
    assert_eq!(done.status, ActionStatus::Completed);
    assert_eq!(done.audit_state, AuditState::Recorded);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn background_worker_completes_approved_actions() {
    let ctx = setup(|_| {});
    ctx.engine.start();

    let id = create_transfer(&ctx).await;
    ctx.engine
        .submit(&id, &p("fin-bea"), true, b"sig".to_vec(), None)
        .await
        .unwrap();
    ctx.engine
        .submit(&id, &p("fin-carl"), true, b"sig".to_vec(), None)
        .await
        .unwrap();

    let completed = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            if ctx.engine.get(&id).await.unwrap().status == ActionStatus::Completed {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await;
    assert!(completed.is_ok(), "ledger worker never completed the action");

    ctx.engine.shutdown();
}
