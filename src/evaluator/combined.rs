use super::safety::risk_score;
use super::types::{CombinedEvaluationResult, ComplianceEvaluation, SafetyEvaluation, ScoreWeights};
use crate::error::EvaluationError;

/// Blended score at or above which content passes when both evaluations ran.
pub const COMBINED_PASS_SCORE: f64 = 70.0;

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Blends a safety and/or compliance evaluation into one 0-100 score.
pub fn combine(
    safety: Option<SafetyEvaluation>,
    compliance: Option<ComplianceEvaluation>,
    weights: ScoreWeights,
) -> Result<CombinedEvaluationResult, EvaluationError> {
    let weights = weights.clamped();

    let (combined_score, is_compliant, summary) = match (&safety, &compliance) {
        (Some(safety), Some(compliance)) => {
            let safety_score = risk_score(safety.overall_risk);
            let brand_score = f64::from(compliance.score);
            let blended = (safety_score * weights.safety + brand_score * weights.brand)
                / (weights.safety + weights.brand);
            let blended = round_one_decimal(blended.clamp(0.0, 100.0));
            let passed = blended >= COMBINED_PASS_SCORE;
            let summary = format!(
                "Combined score {blended:.1}/100 ({}): safety {safety_score:.0} (risk {}) x{}, brand {} x{}.",
                if passed { "compliant" } else { "not compliant" },
                safety.overall_risk,
                weights.safety,
                compliance.score,
                weights.brand,
            );
            (blended, passed, summary)
        }
        (Some(safety), None) => {
            let score = risk_score(safety.overall_risk);
            let summary = format!(
                "Safety only: score {score:.0}/100 (risk {}), {}.",
                safety.overall_risk,
                if safety.within_tolerance { "within tolerance" } else { "exceeds tolerance" },
            );
            (score, safety.within_tolerance, summary)
        }
        (None, Some(compliance)) => {
            let summary = format!(
                "Brand compliance only: score {}/100, {}.",
                compliance.score,
                if compliance.is_compliant { "compliant" } else { "not compliant" },
            );
            (f64::from(compliance.score), compliance.is_compliant, summary)
        }
        (None, None) => {
            return Err(EvaluationError::validation(
                "combined evaluation needs safety, brand compliance, or both",
            ))
        }
    };

    Ok(CombinedEvaluationResult {
        safety,
        compliance,
        combined_score: Some(combined_score),
        weights,
        is_compliant,
        summary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::safety::RiskLevel;
    use chrono::Utc;

    fn safety(level: RiskLevel, within_tolerance: bool) -> SafetyEvaluation {
        SafetyEvaluation {
            content: "text".into(),
            overall_risk: level,
            category_evaluations: Vec::new(),
            contextual_assessment: None,
            within_tolerance,
            summary: String::new(),
            evaluated_at: Utc::now(),
        }
    }

    fn compliance(score: u8) -> ComplianceEvaluation {
        ComplianceEvaluation {
            content: "text".into(),
            guideline: "acme".into(),
            score,
            issues: Vec::new(),
            is_compliant: score >= 70,
            summary: String::new(),
            context: None,
        }
    }

    #[test]
    fn weighted_mean_of_both_scores() {
        let result = combine(
            Some(safety(RiskLevel::None, true)),
            Some(compliance(60)),
            ScoreWeights::default(),
        )
        .unwrap();
        assert_eq!(result.combined_score, Some(73.3));
        assert!(result.is_compliant);
    }

    #[test]
    fn below_threshold_fails() {
        let result = combine(
            Some(safety(RiskLevel::High, false)),
            Some(compliance(90)),
            ScoreWeights {
                safety: 3.0,
                brand: 1.0,
            },
        )
        .unwrap();
        // (30 * 3 + 90) / 4
        assert_eq!(result.combined_score, Some(45.0));
        assert!(!result.is_compliant);
    }

    #[test]
    fn single_evaluation_is_not_averaged() {
        let result = combine(None, Some(compliance(60)), ScoreWeights::default()).unwrap();
        assert_eq!(result.combined_score, Some(60.0));
        assert!(!result.is_compliant);

        let result = combine(Some(safety(RiskLevel::Medium, true)), None, ScoreWeights::default()).unwrap();
        assert_eq!(result.combined_score, Some(60.0));
        // falls back to the safety evaluation's own flag
        assert!(result.is_compliant);
    }

    #[test]
    fn weights_are_clamped() {
        let result = combine(
            Some(safety(RiskLevel::None, true)),
            Some(compliance(100)),
            ScoreWeights {
                safety: 0.0,
                brand: 42.0,
            },
        )
        .unwrap();
        assert_eq!(result.weights, ScoreWeights { safety: 1.0, brand: 5.0 });
    }

    #[test]
    fn nothing_requested_is_rejected() {
        assert!(matches!(
            combine(None, None, ScoreWeights::default()),
            Err(EvaluationError::Validation(_))
        ));
    }
}
