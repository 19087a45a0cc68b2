mod batch;
mod combined;
pub mod compliance;
mod content;
pub mod contextual;
mod engine;
pub mod safety;
pub mod sentiment;
pub mod telemetry;
pub mod types;


pub use batch::{
    BatchItem, BatchItemError, BatchItemResult, BatchItemStatus, BatchOptions, BatchReport,
    EvaluationKind, ERROR_PREVIEW_CHARS, MAX_BATCH_ITEMS,
};
pub use combined::{combine, COMBINED_PASS_SCORE};
pub use compliance::{BrandGuideline, CompiledGuideline, GuidelineSource, JsonGuidelineSource};
pub use content::Content;
pub use contextual::{ContextualOracle, ContextualSignal, ProviderOracle, ReasoningProvider};
pub use engine::{ContentEvaluator, IncludeFlags};
pub use safety::{risk_score, CategoryClassifier, RiskLevel};
pub use sentiment::{LexiconSentiment, Polarity, SentimentAnalyzer, SentimentSignal};
pub use telemetry::{BatchSummary, IssueFrequency};
pub use types::{
    CategoryEvaluation, CombinedEvaluationResult, ComplianceEvaluation, ComplianceIssue,
    ContextVerdict, ContextualAssessment, EvaluationOutcome, IssueType, SafetyEvaluation,
    ScoreWeights, Severity,
};
