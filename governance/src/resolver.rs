//! Policy resolution: the read front door over the governance models.
//!
//! Models for all categories are constructed once at load time and memoized
//! in the resolver; construction is side-effect-free, so the only guard
//! needed is the one-time initialization itself. Lookups after load are
//! lock-free reads.

use crate::directory::ParticipantDirectory;
use crate::error::GovernanceError;
use crate::policy::{ActionLimits, ApprovalChain, AuditPolicy, GovernanceModel};
use acta_types::{
    ActionDescriptor, ActorCategory, ParamValue, ParticipantId, RequirementKind,
    VerificationRequirement,
};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// The policy bundle resolved for one (category, descriptor) pair.
#[derive(Clone, Debug)]
pub struct ResolvedPolicy {
    pub requirement: VerificationRequirement,
    pub chain: ApprovalChain,
    pub limits: ActionLimits,
    pub audit: AuditPolicy,
}

/// Prior-usage counters supplied by the caller for quota checks.
#[derive(Clone, Copy, Debug, Default)]
pub struct UsageCounters {
    /// Actions of this kind already created by the initiator today.
    pub today: u64,
    /// Actions of this kind already created in the trailing 30 days.
    pub month: u64,
}

/// Read-only projection of a policy for UI display; what verification will
/// be required before a caller commits to creating an action.
#[derive(Clone, Debug, Serialize)]
pub struct PolicyDescription {
    pub category: String,
    pub descriptor: String,
    pub requirement_kind: String,
    pub required_roles: Vec<String>,
    pub required_participants: Vec<String>,
    pub minimum_approvals: u32,
    pub time_constraint_secs: Option<u64>,
    pub chain: Vec<String>,
    pub audit_level: String,
    pub retention_days: u32,
}

/// Holds the memoized per-category models.
pub struct PolicyResolver {
    models: HashMap<ActorCategory, GovernanceModel>,
}

impl PolicyResolver {
    /// Build and validate models for every category. Any invalid table is a
    /// configuration error and fails the whole load; there is no partial
    /// resolver.
    pub fn load() -> Result<Self, GovernanceError> {
        let mut models = HashMap::with_capacity(ActorCategory::ALL.len());
        for category in ActorCategory::ALL {
            models.insert(category, GovernanceModel::for_category(category)?);
        }
        tracing::debug!(categories = models.len(), "governance models loaded");
        Ok(Self { models })
    }

    fn model(&self, category: ActorCategory) -> &GovernanceModel {
        // `load` populates every category of the closed enum.
        &self.models[&category]
    }

    /// Resolve the policy bundle: exact descriptor match in the category's
    /// tables, else the category's defaults.
    pub fn resolve(
        &self,
        category: ActorCategory,
        descriptor: &ActionDescriptor,
    ) -> ResolvedPolicy {
        let model = self.model(category);
        ResolvedPolicy {
            requirement: model
                .requirements
                .get(descriptor)
                .unwrap_or(&model.default_requirement)
                .clone(),
            chain: model.chains.get(descriptor).cloned().unwrap_or_default(),
            limits: model
                .limits
                .get(descriptor)
                .unwrap_or(&model.default_limits)
                .clone(),
            audit: model
                .audit
                .get(descriptor)
                .unwrap_or(&model.default_audit)
                .clone(),
        }
    }

    /// Check parameters against the limits. Violations are collected, not
    /// short-circuited; the caller sees the complete list in one pass.
    pub fn validate_parameters(
        &self,
        descriptor: &ActionDescriptor,
        params: &BTreeMap<String, ParamValue>,
        limits: &ActionLimits,
        usage: UsageCounters,
    ) -> Vec<String> {
        let mut violations = Vec::new();

        if let (Some(max), Some(amount)) = (
            limits.max_amount,
            params.get("amount").and_then(ParamValue::as_number),
        ) {
            if amount > max {
                violations.push(format!(
                    "amount {amount} exceeds limit {max} for {descriptor}"
                ));
            }
        }

        if let (Some(max), Some(size)) = (
            limits.max_size,
            params.get("size").and_then(ParamValue::as_number),
        ) {
            if size > max {
                violations.push(format!("size {size} exceeds limit {max} for {descriptor}"));
            }
        }

        if let Some(max) = limits.max_per_day {
            if usage.today >= u64::from(max) {
                violations.push(format!(
                    "daily limit of {max} {descriptor} actions reached"
                ));
            }
        }

        if let Some(max) = limits.max_per_month {
            if usage.month >= u64::from(max) {
                violations.push(format!(
                    "monthly limit of {max} {descriptor} actions reached"
                ));
            }
        }

        if let (Some(allowed), Some(kind)) = (
            &limits.allowed_types,
            params.get("type").and_then(ParamValue::as_text),
        ) {
            if !allowed.contains(kind) {
                violations.push(format!("type \"{kind}\" is not allowed for {descriptor}"));
            }
        }

        if let Some(category) = params.get("category").and_then(ParamValue::as_text) {
            if limits.denied_categories.contains(category) {
                violations.push(format!(
                    "category \"{category}\" is denied for {descriptor}"
                ));
            }
        }

        violations
    }

    /// Whether `actor` may initiate `descriptor` under `category`.
    ///
    /// Enterprise resolves the actor's current role set from the directory
    /// on every call; role membership changes independently of policy, so
    /// it is never cached here.
    pub fn can_act(
        &self,
        actor: &ParticipantId,
        category: ActorCategory,
        descriptor: &ActionDescriptor,
        directory: &dyn ParticipantDirectory,
    ) -> bool {
        if !directory.exists(actor) {
            return false;
        }
        let model = self.model(category);
        if model.role_actions.is_empty() {
            return true;
        }
        let roles = directory.resolve_roles(actor);
        roles.iter().any(|role| {
            model
                .role_actions
                .get(role)
                .is_some_and(|actions| actions.contains(descriptor))
        })
    }

    /// Read-only policy summary for dashboards.
    pub fn describe_policy(
        &self,
        category: ActorCategory,
        descriptor: &ActionDescriptor,
    ) -> PolicyDescription {
        let resolved = self.resolve(category, descriptor);
        let requirement = &resolved.requirement;
        PolicyDescription {
            category: category.name().to_string(),
            descriptor: descriptor.to_string(),
            requirement_kind: match requirement.kind {
                RequirementKind::Single => "single",
                RequirementKind::Multi => "multi",
                RequirementKind::Sequential => "sequential",
                RequirementKind::Majority => "majority",
            }
            .to_string(),
            required_roles: requirement.required_roles.iter().cloned().collect(),
            required_participants: requirement
                .required_participants
                .iter()
                .map(|id| id.to_string())
                .collect(),
            minimum_approvals: requirement.quorum(),
            time_constraint_secs: requirement.time_constraint_secs,
            chain: resolved
                .chain
                .steps
                .iter()
                .map(|s| format!("{}: {}", s.role, s.description))
                .collect(),
            audit_level: format!("{:?}", resolved.audit.level).to_lowercase(),
            retention_days: resolved.audit.retention_days,
        }
    }
}
