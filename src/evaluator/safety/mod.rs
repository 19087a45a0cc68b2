mod classifier;
mod context;
mod policy;
mod risk;

pub use classifier::CategoryClassifier;
pub use policy::risk_score;
pub(crate) use context::TermSet;
pub(crate) use policy::within_tolerance;
pub(crate) use risk::aggregate_risk;
pub use risk::{RiskAggregation, RiskLevel};
