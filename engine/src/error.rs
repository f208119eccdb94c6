use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("registry error: {0}")]
    Registry(#[from] acta_registry::RegistryError),

    #[error("verification error: {0}")]
    Verification(#[from] acta_verification::VerificationError),

    #[error("governance error: {0}")]
    Governance(#[from] acta_governance::GovernanceError),

    #[error("store error: {0}")]
    Store(#[from] acta_store::StoreError),

    #[error("ledger error: {0}")]
    Ledger(#[from] acta_audit::LedgerError),

    #[error("verifier {0} is not known to the participant directory")]
    UnknownVerifier(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
