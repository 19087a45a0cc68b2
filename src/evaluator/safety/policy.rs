use super::risk::RiskLevel;
use crate::config::RiskTolerances;
use crate::evaluator::types::CategoryEvaluation;

/// Fixed monotonic mapping from risk to a 0-100 safety score.
pub fn risk_score(level: RiskLevel) -> f64 {
    match level {
        RiskLevel::None => 100.0,
        RiskLevel::Low => 80.0,
        RiskLevel::Medium => 60.0,
        RiskLevel::High => 30.0,
        RiskLevel::VeryHigh => 0.0,
    }
}

pub(crate) fn within_tolerance(
    tolerances: &RiskTolerances,
    categories: &[CategoryEvaluation],
    overall: RiskLevel,
) -> bool {
    overall <= tolerances.overall()
        && categories
            .iter()
            .all(|evaluation| evaluation.risk_level <= tolerances.tolerance_for(&evaluation.category))
}
