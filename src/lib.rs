pub mod config;
pub mod error;
pub mod evaluator;
pub mod ops;

pub use config::{EngineConfig, RiskTolerances, SafetyConfig, SafetyConfigUpdate};
pub use error::{EvaluationError, GuidelineError, OracleError, SentimentError};
pub use evaluator::{
    BatchItem, BatchOptions, BatchReport, BrandGuideline, CombinedEvaluationResult,
    ComplianceEvaluation, ContentEvaluator, EvaluationKind, EvaluationOutcome, IncludeFlags,
    RiskLevel, SafetyEvaluation, ScoreWeights,
};
pub use ops::{BatchRegistry, EvaluatorRegistry};
