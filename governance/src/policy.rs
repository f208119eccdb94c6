//! Per-category governance models.
//!
//! A model is four lookup tables plus mandatory defaults. Defaults are
//! struct fields, not table entries, so a category without a default
//! requirement does not compile.

use crate::error::GovernanceError;
use acta_types::{
    ActionDescriptor, ActorCategory, ParticipantId, RequirementError, VerificationRequirement,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// One step in a human-readable approval chain (for UI display and verifier
/// notification; the enforceable rules live in the requirement).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApprovalStep {
    pub role: String,
    pub description: String,
}

/// The ordered approval-chain shape for an action.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ApprovalChain {
    pub steps: Vec<ApprovalStep>,
}

impl ApprovalChain {
    pub fn of(steps: &[(&str, &str)]) -> Self {
        Self {
            steps: steps
                .iter()
                .map(|(role, description)| ApprovalStep {
                    role: role.to_string(),
                    description: description.to_string(),
                })
                .collect(),
        }
    }
}

/// Quota and compliance limits for one action kind.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ActionLimits {
    /// Cap on the `amount` parameter.
    pub max_amount: Option<f64>,
    /// Cap on the `size` parameter.
    pub max_size: Option<f64>,
    /// Cap on actions of this kind per initiator per UTC day.
    pub max_per_day: Option<u32>,
    /// Cap on actions of this kind per initiator per 30-day window.
    pub max_per_month: Option<u32>,
    /// Allow-list for the `type` parameter. `None` allows any value.
    pub allowed_types: Option<BTreeSet<String>>,
    /// Deny-list for the `category` parameter.
    pub denied_categories: BTreeSet<String>,
}

/// How thoroughly an action is audited, and for how long the record is kept.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AuditLevel {
    Minimal,
    Standard,
    Full,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuditPolicy {
    pub level: AuditLevel,
    pub retention_days: u32,
}

impl AuditPolicy {
    pub fn new(level: AuditLevel, retention_days: u32) -> Self {
        Self {
            level,
            retention_days,
        }
    }
}

/// The full governance rule set for one actor category.
///
/// Built once at load time, read-only thereafter.
#[derive(Clone, Debug)]
pub struct GovernanceModel {
    pub category: ActorCategory,
    pub requirements: HashMap<ActionDescriptor, VerificationRequirement>,
    pub chains: HashMap<ActionDescriptor, ApprovalChain>,
    pub limits: HashMap<ActionDescriptor, ActionLimits>,
    pub audit: HashMap<ActionDescriptor, AuditPolicy>,
    /// Mandatory fallback when no exact descriptor match exists.
    pub default_requirement: VerificationRequirement,
    pub default_limits: ActionLimits,
    pub default_audit: AuditPolicy,
    /// Per-role allowed-action lists. Consulted by `can_act` for categories
    /// that restrict initiation by role (currently enterprise). Empty map
    /// means initiation is unrestricted for the category.
    pub role_actions: HashMap<String, BTreeSet<ActionDescriptor>>,
}

fn d(s: &str) -> ActionDescriptor {
    ActionDescriptor::from(s)
}

fn p(s: &str) -> ParticipantId {
    ParticipantId::from(s)
}

// A week, in seconds. Default time constraint for most requirements.
const WEEK_SECS: u64 = 7 * 24 * 3600;

/// Assembles one category's tables. Requirement constructor errors are held
/// until `build`, so the tables read declaratively.
struct ModelBuilder {
    model: GovernanceModel,
    error: Option<GovernanceError>,
}

impl ModelBuilder {
    fn new(
        category: ActorCategory,
        default_requirement: Result<VerificationRequirement, RequirementError>,
        default_limits: ActionLimits,
        default_audit: AuditPolicy,
    ) -> Self {
        let (default_requirement, error) = match default_requirement {
            Ok(requirement) => (requirement, None),
            Err(source) => (
                VerificationRequirement::single(),
                Some(GovernanceError::InvalidDefault { category, source }),
            ),
        };
        Self {
            model: GovernanceModel {
                category,
                requirements: HashMap::new(),
                chains: HashMap::new(),
                limits: HashMap::new(),
                audit: HashMap::new(),
                default_requirement,
                default_limits,
                default_audit,
                role_actions: HashMap::new(),
            },
            error,
        }
    }

    fn requirement(
        mut self,
        descriptor: &str,
        requirement: Result<VerificationRequirement, RequirementError>,
    ) -> Self {
        match requirement {
            Ok(requirement) => {
                self.model.requirements.insert(d(descriptor), requirement);
            }
            Err(source) => {
                self.error
                    .get_or_insert(GovernanceError::InvalidRequirement {
                        category: self.model.category,
                        descriptor: descriptor.to_string(),
                        source,
                    });
            }
        }
        self
    }

    fn limits(mut self, descriptor: &str, limits: ActionLimits) -> Self {
        self.model.limits.insert(d(descriptor), limits);
        self
    }

    fn audit(mut self, descriptor: &str, policy: AuditPolicy) -> Self {
        self.model.audit.insert(d(descriptor), policy);
        self
    }

    fn chain(mut self, descriptor: &str, steps: &[(&str, &str)]) -> Self {
        self.model
            .chains
            .insert(d(descriptor), ApprovalChain::of(steps));
        self
    }

    fn role(mut self, role: &str, actions: &[&str]) -> Self {
        self.model
            .role_actions
            .insert(role.to_string(), actions.iter().map(|a| d(a)).collect());
        self
    }

    fn build(self) -> Result<GovernanceModel, GovernanceError> {
        match self.error {
            Some(error) => Err(error),
            None => {
                self.model.validate()?;
                Ok(self.model)
            }
        }
    }
}

impl GovernanceModel {
    /// Build the model for one category. Tables are the engine's built-in
    /// policy; a deployment would load equivalents from configuration.
    pub fn for_category(category: ActorCategory) -> Result<Self, GovernanceError> {
        match category {
            ActorCategory::Individual => Self::individual(),
            ActorCategory::Professional => Self::professional(),
            ActorCategory::Enterprise => Self::enterprise(),
            ActorCategory::Student => Self::student(),
            ActorCategory::Research => Self::research(),
            ActorCategory::Government => Self::government(),
        }
    }

    /// Re-validate every requirement in the tables. The constructors already
    /// enforce the invariants for built-in tables; this is the load-time
    /// gate for models assembled from external configuration.
    pub fn validate(&self) -> Result<(), GovernanceError> {
        self.default_requirement
            .validate()
            .map_err(|source| GovernanceError::InvalidDefault {
                category: self.category,
                source,
            })?;
        for (descriptor, requirement) in &self.requirements {
            requirement
                .validate()
                .map_err(|source| GovernanceError::InvalidRequirement {
                    category: self.category,
                    descriptor: descriptor.to_string(),
                    source,
                })?;
        }
        Ok(())
    }

    fn individual() -> Result<Self, GovernanceError> {
        ModelBuilder::new(
            ActorCategory::Individual,
            Ok(VerificationRequirement::single().with_time_constraint(WEEK_SECS)),
            ActionLimits {
                max_per_day: Some(100),
                ..ActionLimits::default()
            },
            AuditPolicy::new(AuditLevel::Minimal, 365),
        )
        .requirement(
            "Transfer:Funds",
            VerificationRequirement::multi(2)
                .map(|r| r.with_roles(["finance"]).with_time_constraint(WEEK_SECS)),
        )
        .limits(
            "Transfer:Funds",
            ActionLimits {
                max_amount: Some(10_000.0),
                max_per_day: Some(5),
                max_per_month: Some(50),
                ..ActionLimits::default()
            },
        )
        .audit("Transfer:Funds", AuditPolicy::new(AuditLevel::Full, 2_555))
        .chain(
            "Transfer:Funds",
            &[("finance", "Finance reviewer approves the transfer")],
        )
        .build()
    }

    fn professional() -> Result<Self, GovernanceError> {
        ModelBuilder::new(
            ActorCategory::Professional,
            Ok(VerificationRequirement::single()
                .with_roles(["reviewer"])
                .with_time_constraint(WEEK_SECS)),
            ActionLimits {
                max_size: Some(50_000_000.0),
                max_per_day: Some(20),
                ..ActionLimits::default()
            },
            AuditPolicy::new(AuditLevel::Standard, 1_095),
        )
        .build()
    }

    fn enterprise() -> Result<Self, GovernanceError> {
        ModelBuilder::new(
            ActorCategory::Enterprise,
            VerificationRequirement::multi(2).map(|r| r.with_time_constraint(WEEK_SECS)),
            ActionLimits::default(),
            AuditPolicy::new(AuditLevel::Standard, 1_825),
        )
        // Budget approval walks the org chart in order.
        .requirement(
            "Approve:Budget",
            VerificationRequirement::sequential(vec![p("dept-head"), p("finance-dir")])
                .map(|r| r.with_time_constraint(2 * WEEK_SECS)),
        )
        .chain(
            "Approve:Budget",
            &[
                ("dept-head", "Department head approves scope"),
                ("finance-dir", "Finance director approves spend"),
            ],
        )
        .limits(
            "Approve:Budget",
            ActionLimits {
                max_amount: Some(1_000_000.0),
                ..ActionLimits::default()
            },
        )
        .audit("Approve:Budget", AuditPolicy::new(AuditLevel::Full, 2_555))
        .requirement(
            "Transfer:Funds",
            VerificationRequirement::multi(2).map(|r| {
                r.with_roles(["finance", "treasury"])
                    .with_time_constraint(WEEK_SECS)
            }),
        )
        .limits(
            "Transfer:Funds",
            ActionLimits {
                max_amount: Some(5_000_000.0),
                max_per_day: Some(100),
                denied_categories: ["restricted"].into_iter().map(String::from).collect(),
                ..ActionLimits::default()
            },
        )
        .audit("Transfer:Funds", AuditPolicy::new(AuditLevel::Full, 2_555))
        .role("finance", &["Transfer:Funds", "Approve:Budget"])
        .role("manager", &["Approve:Budget", "Create:Document", "Grant:Access"])
        .role("employee", &["Create:Document"])
        .build()
    }

    fn student() -> Result<Self, GovernanceError> {
        ModelBuilder::new(
            ActorCategory::Student,
            Ok(VerificationRequirement::single()
                .with_roles(["advisor", "instructor"])
                .with_time_constraint(WEEK_SECS)),
            ActionLimits {
                max_amount: Some(500.0),
                max_per_day: Some(20),
                ..ActionLimits::default()
            },
            AuditPolicy::new(AuditLevel::Minimal, 365),
        )
        .build()
    }

    fn research() -> Result<Self, GovernanceError> {
        ModelBuilder::new(
            ActorCategory::Research,
            Ok(VerificationRequirement::single()
                .with_roles(["principal-investigator"])
                .with_time_constraint(2 * WEEK_SECS)),
            ActionLimits::default(),
            AuditPolicy::new(AuditLevel::Standard, 3_650),
        )
        .build()
    }

    fn government() -> Result<Self, GovernanceError> {
        ModelBuilder::new(
            ActorCategory::Government,
            VerificationRequirement::multi(3)
                .map(|r| r.with_roles(["official"]).with_time_constraint(4 * WEEK_SECS)),
            ActionLimits::default(),
            AuditPolicy::new(AuditLevel::Full, 9_125),
        )
        .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_category_builds_and_validates() {
        for category in ActorCategory::ALL {
            let model = GovernanceModel::for_category(category).unwrap();
            assert_eq!(model.category, category);
            assert!(model.validate().is_ok());
        }
    }

    #[test]
    fn enterprise_budget_chain_is_sequential() {
        let model = GovernanceModel::for_category(ActorCategory::Enterprise).unwrap();
        let req = model.requirements.get(&d("Approve:Budget")).unwrap();
        assert_eq!(
            req.required_participants,
            vec![p("dept-head"), p("finance-dir")]
        );
    }

    #[test]
    fn defaults_carry_time_constraints() {
        for category in ActorCategory::ALL {
            let model = GovernanceModel::for_category(category).unwrap();
            assert!(model.default_requirement.time_constraint_secs.is_some());
        }
    }

    #[test]
    fn builder_surfaces_requirement_errors() {
        let err = ModelBuilder::new(
            ActorCategory::Individual,
            Ok(VerificationRequirement::single()),
            ActionLimits::default(),
            AuditPolicy::new(AuditLevel::Minimal, 365),
        )
        .requirement("Transfer:Funds", VerificationRequirement::multi(0))
        .build()
        .unwrap_err();
        assert!(matches!(err, GovernanceError::InvalidRequirement { .. }));
    }
}
