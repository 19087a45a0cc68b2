#[cfg(feature = "parallel-classify")]
use rayon::prelude::*;

use super::context::TermSet;
use super::risk::RiskLevel;
use crate::config::{CategoryDefinition, SafetyConfig};
use crate::evaluator::types::CategoryEvaluation;

#[derive(Debug, Clone)]
struct CompiledTier {
    level: RiskLevel,
    terms: TermSet,
}

#[derive(Debug, Clone)]
struct CompiledCategory {
    name: String,
    /// Highest severity first.
    tiers: Vec<CompiledTier>,
}

impl CompiledCategory {
    fn compile(definition: &CategoryDefinition) -> Self {
        let mut tiers: Vec<CompiledTier> = definition
            .tiers
            .iter()
            .filter(|tier| tier.level > RiskLevel::None)
            .map(|tier| CompiledTier {
                level: tier.level,
                terms: TermSet::new(&tier.terms),
            })
            .filter(|tier| !tier.terms.is_empty())
            .collect();
        tiers.sort_by(|a, b| b.level.cmp(&a.level));
        CompiledCategory {
            name: definition.name.clone(),
            tiers,
        }
    }
}

/// Brand-level term lists that apply to every category.
#[derive(Debug, Clone)]
struct BrandOverrides {
    blocked_topics: TermSet,
    sensitive_keywords: TermSet,
    allowed_topics: TermSet,
}

/// Keyword classifier for every configured safety category.
///
/// Built once from a [`SafetyConfig`]; classification is a pure function of the
/// text and this compiled state.
#[derive(Debug, Clone)]
pub struct CategoryClassifier {
    categories: Vec<CompiledCategory>,
    overrides: BrandOverrides,
}

impl CategoryClassifier {
    pub fn new(config: &SafetyConfig) -> Self {
        CategoryClassifier {
            categories: config.categories.iter().map(CompiledCategory::compile).collect(),
            overrides: BrandOverrides {
                blocked_topics: TermSet::new(&config.blocked_topics),
                sensitive_keywords: TermSet::new(&config.sensitive_keywords),
                allowed_topics: TermSet::new(&config.allowed_topics),
            },
        }
    }

    pub fn category_names(&self) -> Vec<&str> {
        self.categories
            .iter()
            .map(|category| category.name.as_str())
            .collect()
    }

    /// Evaluates every category, preserving configuration order.
    pub fn classify_all(&self, normalized: &str) -> Vec<CategoryEvaluation> {
        #[cfg(feature = "parallel-classify")]
        {
            self.categories
                .par_iter()
                .map(|category| self.classify(category, normalized))
                .collect()
        }

        #[cfg(not(feature = "parallel-classify"))]
        {
            self.categories
                .iter()
                .map(|category| self.classify(category, normalized))
                .collect()
        }
    }

    fn classify(&self, category: &CompiledCategory, text: &str) -> CategoryEvaluation {
        let evaluation = |risk_level: RiskLevel, explanation: String| CategoryEvaluation {
            category: category.name.clone(),
            risk_level,
            explanation,
        };

        if let Some(term) = self.overrides.blocked_topics.first_match(text) {
            return evaluation(
                RiskLevel::VeryHigh,
                format!("Blocked topic detected: \"{term}\""),
            );
        }
        if let Some(term) = self.overrides.sensitive_keywords.first_match(text) {
            return evaluation(
                RiskLevel::High,
                format!("Brand-sensitive keyword detected: \"{term}\""),
            );
        }

        let hit = category
            .tiers
            .iter()
            .find_map(|tier| tier.terms.first_match(text).map(|term| (tier.level, term)));

        let Some((level, term)) = hit else {
            return evaluation(
                RiskLevel::None,
                format!("No {} indicators found", display_name(&category.name)),
            );
        };

        if let Some(topic) = self.overrides.allowed_topics.first_match(text) {
            let mitigated = level.lower().max(RiskLevel::Low);
            return evaluation(
                mitigated,
                format!(
                    "Matched \"{term}\" ({level}), mitigated to {mitigated} by allowed topic \"{topic}\""
                ),
            );
        }

        evaluation(level, format!("Matched \"{term}\" ({level} severity)"))
    }
}

fn display_name(category: &str) -> String {
    category.replace('_', " ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier(update: impl FnOnce(&mut SafetyConfig)) -> CategoryClassifier {
        let mut config = SafetyConfig::default();
        update(&mut config);
        CategoryClassifier::new(&config)
    }

    fn level_of(results: &[CategoryEvaluation], name: &str) -> RiskLevel {
        results
            .iter()
            .find(|evaluation| evaluation.category == name)
            .map(|evaluation| evaluation.risk_level)
            .unwrap()
    }

    #[test]
    fn blocked_topic_short_circuits_every_category() {
        let classifier = classifier(|config| {
            config.blocked_topics = vec!["guaranteed returns".into()];
        });
        let results = classifier.classify_all("buy now, guaranteed returns!!!");
        assert_eq!(results.len(), 8);
        assert!(results
            .iter()
            .all(|evaluation| evaluation.risk_level == RiskLevel::VeryHigh));
    }

    #[test]
    fn sensitive_keyword_yields_high() {
        let classifier = classifier(|config| {
            config.sensitive_keywords = vec!["recall".into()];
        });
        let results = classifier.classify_all("news about the product recall");
        assert_eq!(level_of(&results, "violence"), RiskLevel::High);
    }

    #[test]
    fn highest_tier_wins() {
        let classifier = classifier(|_| {});
        let results = classifier.classify_all("a fight ended in murder");
        assert_eq!(level_of(&results, "violence"), RiskLevel::High);
    }

    #[test]
    fn partial_words_do_not_match() {
        let classifier = classifier(|_| {});
        let results = classifier.classify_all("open a shell and run the script");
        assert_eq!(level_of(&results, "profanity"), RiskLevel::None);
    }

    #[test]
    fn allowed_topic_mitigates_one_tier_but_not_below_low() {
        let classifier = classifier(|config| {
            config.allowed_topics = vec!["video game".into()];
        });
        let results = classifier.classify_all("in this video game you shoot zombies");
        assert_eq!(level_of(&results, "violence"), RiskLevel::Medium);

        let results = classifier.classify_all("this video game is a crush fest");
        assert_eq!(level_of(&results, "violence"), RiskLevel::Low);
    }

    #[test]
    fn clean_text_is_none_everywhere() {
        let classifier = classifier(|_| {});
        let results = classifier.classify_all("our new recipe book is out today");
        assert!(results
            .iter()
            .all(|evaluation| evaluation.risk_level == RiskLevel::None));
        assert_eq!(classifier.category_names().len(), results.len());
    }
}
