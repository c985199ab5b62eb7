//! Business logic layer

pub mod lifecycle;

pub use lifecycle::{
    ApprovalOutcome, CatchUpSummary, LoggingNotifier, OperatorNotifier, ProvisionOutcome,
    RegistrationOutcome, TenantLifecycleService,
};
