use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::safety::RiskLevel;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryEvaluation {
    pub category: String,
    pub risk_level: RiskLevel,
    pub explanation: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextVerdict {
    SafeInContext,
    BorderlineContextualRisk,
    UnsafeDueToContext,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextualAssessment {
    pub verdict: ContextVerdict,
    pub explanation: String,
    pub suggested_risk: Option<RiskLevel>,
}

impl ContextualAssessment {
    pub fn unavailable() -> Self {
        ContextualAssessment {
            verdict: ContextVerdict::Unknown,
            explanation: "analysis unavailable".to_string(),
            suggested_risk: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafetyEvaluation {
    pub content: String,
    pub overall_risk: RiskLevel,
    pub category_evaluations: Vec<CategoryEvaluation>,
    pub contextual_assessment: Option<ContextualAssessment>,
    /// Every category and the overall level sit within configured tolerances.
    pub within_tolerance: bool,
    pub summary: String,
    pub evaluated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueType {
    Tone,
    Voice,
    Terminology,
}

impl IssueType {
    pub fn as_str(self) -> &'static str {
        match self {
            IssueType::Tone => "tone",
            IssueType::Voice => "voice",
            IssueType::Terminology => "terminology",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn penalty(self) -> u32 {
        match self {
            Severity::High => 20,
            Severity::Medium => 10,
            Severity::Low => 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceIssue {
    #[serde(rename = "type")]
    pub issue_type: IssueType,
    pub severity: Severity,
    pub description: String,
    pub suggestion: String,
}

impl ComplianceIssue {
    pub(crate) fn new(
        issue_type: IssueType,
        severity: Severity,
        description: impl Into<String>,
        suggestion: impl Into<String>,
    ) -> Self {
        ComplianceIssue {
            issue_type,
            severity,
            description: description.into(),
            suggestion: suggestion.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceEvaluation {
    pub content: String,
    pub guideline: String,
    pub score: u8,
    pub issues: Vec<ComplianceIssue>,
    pub is_compliant: bool,
    pub summary: String,
    pub context: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub safety: f64,
    pub brand: f64,
}

impl ScoreWeights {
    pub const MIN: f64 = 1.0;
    pub const MAX: f64 = 5.0;

    /// Clamps both weights into `[1.0, 5.0]`; non-finite values fall back to defaults.
    pub fn clamped(self) -> Self {
        let defaults = ScoreWeights::default();
        let clamp = |value: f64, fallback: f64| {
            if value.is_finite() {
                value.clamp(Self::MIN, Self::MAX)
            } else {
                fallback
            }
        };
        ScoreWeights {
            safety: clamp(self.safety, defaults.safety),
            brand: clamp(self.brand, defaults.brand),
        }
    }
}

impl Default for ScoreWeights {
    fn default() -> Self {
        ScoreWeights {
            safety: 1.0,
            brand: 2.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinedEvaluationResult {
    pub safety: Option<SafetyEvaluation>,
    pub compliance: Option<ComplianceEvaluation>,
    pub combined_score: Option<f64>,
    pub weights: ScoreWeights,
    pub is_compliant: bool,
    pub summary: String,
}

/// The result of any single-item evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EvaluationOutcome {
    Safety(SafetyEvaluation),
    Compliance(ComplianceEvaluation),
    Combined(CombinedEvaluationResult),
}

impl EvaluationOutcome {
    /// Numeric 0-100 score, when the outcome carries one.
    pub fn score(&self) -> Option<f64> {
        match self {
            EvaluationOutcome::Safety(_) => None,
            EvaluationOutcome::Compliance(evaluation) => Some(f64::from(evaluation.score)),
            EvaluationOutcome::Combined(result) => result.combined_score,
        }
    }

    pub fn is_compliant(&self) -> bool {
        match self {
            EvaluationOutcome::Safety(evaluation) => evaluation.within_tolerance,
            EvaluationOutcome::Compliance(evaluation) => evaluation.is_compliant,
            EvaluationOutcome::Combined(result) => result.is_compliant,
        }
    }

    pub fn overall_risk(&self) -> Option<RiskLevel> {
        match self {
            EvaluationOutcome::Safety(evaluation) => Some(evaluation.overall_risk),
            EvaluationOutcome::Compliance(_) => None,
            EvaluationOutcome::Combined(result) => {
                result.safety.as_ref().map(|evaluation| evaluation.overall_risk)
            }
        }
    }

    pub fn issues(&self) -> &[ComplianceIssue] {
        match self {
            EvaluationOutcome::Safety(_) => &[],
            EvaluationOutcome::Compliance(evaluation) => &evaluation.issues,
            EvaluationOutcome::Combined(result) => result
                .compliance
                .as_ref()
                .map(|evaluation| evaluation.issues.as_slice())
                .unwrap_or(&[]),
        }
    }
}
