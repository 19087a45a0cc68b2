use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use super::combined::combine;
use super::compliance::{BrandGuideline, CompiledGuideline, GuidelineSource};
use super::content::Content;
use super::contextual::{ContextualOracle, ContextualSignal, ProviderOracle, ReasoningProvider};
use super::safety::{aggregate_risk, within_tolerance, CategoryClassifier, RiskAggregation, RiskLevel};
use super::sentiment::{sentiment_or_neutral, LexiconSentiment, SentimentAnalyzer, SentimentSignal};
use super::types::{
    CategoryEvaluation, CombinedEvaluationResult, ComplianceEvaluation, ContextualAssessment,
    SafetyEvaluation, ScoreWeights,
};
use crate::config::{EngineConfig, SafetyConfig, SafetyConfigUpdate};
use crate::error::{EvaluationError, GuidelineError};
use crate::ops::BatchRegistry;

/// Which halves of a combined evaluation to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IncludeFlags {
    pub safety: bool,
    pub brand: bool,
}

impl Default for IncludeFlags {
    fn default() -> Self {
        IncludeFlags {
            safety: true,
            brand: true,
        }
    }
}

/// Safety configuration together with the classifier compiled from it.
#[derive(Debug)]
pub(crate) struct SafetyRules {
    pub(crate) config: SafetyConfig,
    pub(crate) classifier: CategoryClassifier,
}

impl SafetyRules {
    fn compile(config: SafetyConfig) -> Self {
        let classifier = CategoryClassifier::new(&config);
        SafetyRules { config, classifier }
    }
}

/// Immutable view of everything one evaluation needs.
///
/// Taken once per call (or once per batch) so a concurrent config update never
/// mixes rule sets inside a single operation.
#[derive(Clone)]
pub(crate) struct EvaluationSnapshot {
    pub(crate) engine: EngineConfig,
    pub(crate) rules: Arc<SafetyRules>,
    pub(crate) guideline: Option<Arc<CompiledGuideline>>,
    pub(crate) sentiment: Arc<dyn SentimentAnalyzer>,
    pub(crate) contextual: Option<ContextualSignal>,
}

impl EvaluationSnapshot {
    pub(crate) fn content(&self, raw: &str) -> Result<Content, EvaluationError> {
        Content::new(raw, self.engine.max_content_chars)
    }

    pub(crate) async fn safety(
        &self,
        content: &Content,
        context: Option<&str>,
    ) -> SafetyEvaluation {
        let mut categories = self.rules.classifier.classify_all(content.normalized());
        let sentiment = sentiment_or_neutral(self.sentiment.as_ref(), content.raw());

        let contextual = match &self.contextual {
            Some(signal) => Some(signal.assess(content.raw(), context).await),
            None => None,
        };

        let aggregation = aggregate_risk(&categories, sentiment.risk(), contextual.as_ref());
        categories.push(sentiment_evaluation(&sentiment));

        let within_tolerance = within_tolerance(
            &self.rules.config.risk_tolerances,
            &categories,
            aggregation.overall,
        );
        let summary = safety_summary(&aggregation, &categories, contextual.as_ref());

        SafetyEvaluation {
            content: content.raw().to_string(),
            overall_risk: aggregation.overall,
            category_evaluations: categories,
            contextual_assessment: contextual,
            within_tolerance,
            summary,
            evaluated_at: Utc::now(),
        }
    }

    pub(crate) fn compliance(
        &self,
        content: &Content,
        context: Option<&str>,
    ) -> Result<ComplianceEvaluation, EvaluationError> {
        let guideline = self
            .guideline
            .as_ref()
            .ok_or(EvaluationError::GuidelineNotConfigured)?;
        Ok(guideline.evaluate(content, context))
    }

    pub(crate) async fn combined(
        &self,
        content: &Content,
        context: Option<&str>,
        weights: Option<ScoreWeights>,
        include: IncludeFlags,
    ) -> Result<CombinedEvaluationResult, EvaluationError> {
        if !include.safety && !include.brand {
            return Err(EvaluationError::validation(
                "combined evaluation needs safety, brand compliance, or both",
            ));
        }
        let compliance = if include.brand {
            Some(self.compliance(content, context)?)
        } else {
            None
        };
        let safety = if include.safety {
            Some(self.safety(content, context).await)
        } else {
            None
        };
        combine(safety, compliance, weights.unwrap_or_default())
    }
}

fn sentiment_evaluation(signal: &SentimentSignal) -> CategoryEvaluation {
    CategoryEvaluation {
        category: "sentiment".to_string(),
        risk_level: signal.risk(),
        explanation: format!(
            "{:?} sentiment (confidence {:.2})",
            signal.polarity, signal.confidence
        ),
    }
}

fn safety_summary(
    aggregation: &RiskAggregation,
    categories: &[CategoryEvaluation],
    contextual: Option<&ContextualAssessment>,
) -> String {
    let flagged: Vec<String> = categories
        .iter()
        .filter(|evaluation| evaluation.risk_level >= RiskLevel::Medium)
        .map(|evaluation| format!("{} ({})", evaluation.category, evaluation.risk_level))
        .collect();

    let mut summary = format!("Overall risk: {}.", aggregation.overall);
    if flagged.is_empty() {
        summary.push_str(" No category at medium risk or above.");
    } else {
        summary.push_str(&format!(" Flagged: {}.", flagged.join(", ")));
    }
    if aggregation.escalated {
        summary.push_str(" Escalated to high: multiple independent medium-risk categories.");
    }
    if let Some(assessment) = contextual {
        summary.push_str(&format!(
            " Context: {:?}, {}.",
            assessment.verdict, assessment.explanation
        ));
        if aggregation.overall != aggregation.baseline {
            summary.push_str(&format!(
                " Keyword baseline {} adjusted to {} by context.",
                aggregation.baseline, aggregation.overall
            ));
        }
    }
    summary
}

/// Evaluates content for safety risk and brand compliance.
///
/// Each instance carries its own configuration, so differently configured
/// brands can run side by side.
pub struct ContentEvaluator {
    engine: EngineConfig,
    rules: RwLock<Arc<SafetyRules>>,
    guideline: RwLock<Option<Arc<CompiledGuideline>>>,
    sentiment: Arc<dyn SentimentAnalyzer>,
    contextual: Option<ContextualSignal>,
    batches: BatchRegistry,
}

impl ContentEvaluator {
    pub fn new(config: SafetyConfig) -> Self {
        Self::with_engine_config(config, EngineConfig::default())
    }

    pub fn with_engine_config(config: SafetyConfig, engine: EngineConfig) -> Self {
        ContentEvaluator {
            engine,
            rules: RwLock::new(Arc::new(SafetyRules::compile(config))),
            guideline: RwLock::new(None),
            sentiment: Arc::new(LexiconSentiment),
            contextual: None,
            batches: BatchRegistry::new(),
        }
    }

    pub fn with_sentiment(mut self, analyzer: Arc<dyn SentimentAnalyzer>) -> Self {
        self.sentiment = analyzer;
        self
    }

    pub fn with_oracle(mut self, oracle: Arc<dyn ContextualOracle>) -> Self {
        self.contextual = Some(ContextualSignal::new(oracle, self.engine.oracle_timeout_ms));
        self
    }

    /// Wires a raw completion backend through the JSON oracle contract.
    pub fn with_provider<P: ReasoningProvider + 'static>(self, provider: P) -> Self {
        let oracle = ProviderOracle::new(provider, self.engine.oracle_max_chars);
        self.with_oracle(Arc::new(oracle))
    }

    pub fn with_guideline(self, guideline: BrandGuideline) -> Self {
        ContentEvaluator {
            guideline: RwLock::new(Some(Arc::new(CompiledGuideline::new(guideline)))),
            ..self
        }
    }

    pub fn engine_config(&self) -> &EngineConfig {
        &self.engine
    }

    pub fn batch_registry(&self) -> &BatchRegistry {
        &self.batches
    }

    pub async fn config(&self) -> SafetyConfig {
        self.rules.read().await.config.clone()
    }

    /// Applies a partial update and recompiles the classifier.
    pub async fn update_config(&self, update: SafetyConfigUpdate) -> SafetyConfig {
        let mut guard = self.rules.write().await;
        let merged = guard.config.merge(update);
        *guard = Arc::new(SafetyRules::compile(merged.clone()));
        log::info!(
            "Safety configuration updated ({} categories, {} blocked topics)",
            merged.categories.len(),
            merged.blocked_topics.len()
        );
        merged
    }

    pub async fn set_guideline(&self, guideline: Option<BrandGuideline>) {
        *self.guideline.write().await = guideline.map(|g| Arc::new(CompiledGuideline::new(g)));
    }

    /// Loads the guideline from `source`; on failure compliance is disabled.
    pub async fn load_guideline(&self, source: &dyn GuidelineSource) -> Result<(), GuidelineError> {
        match source.load_guideline() {
            Ok(guideline) => {
                log::info!("Loaded brand guideline \"{}\"", guideline.name);
                self.set_guideline(Some(guideline)).await;
                Ok(())
            }
            Err(err) => {
                log::warn!("Brand guideline unavailable, compliance disabled: {}", err);
                self.set_guideline(None).await;
                Err(err)
            }
        }
    }

    pub async fn has_guideline(&self) -> bool {
        self.guideline.read().await.is_some()
    }

    pub(crate) async fn snapshot(&self) -> EvaluationSnapshot {
        EvaluationSnapshot {
            engine: self.engine.clone(),
            rules: Arc::clone(&*self.rules.read().await),
            guideline: self.guideline.read().await.clone(),
            sentiment: Arc::clone(&self.sentiment),
            contextual: self.contextual.clone(),
        }
    }

    pub async fn evaluate_safety(
        &self,
        content: &str,
        context: Option<&str>,
    ) -> Result<SafetyEvaluation, EvaluationError> {
        let snapshot = self.snapshot().await;
        let content = snapshot.content(content)?;
        Ok(snapshot.safety(&content, context).await)
    }

    pub async fn evaluate_compliance(
        &self,
        content: &str,
        context: Option<&str>,
    ) -> Result<ComplianceEvaluation, EvaluationError> {
        let snapshot = self.snapshot().await;
        let content = snapshot.content(content)?;
        snapshot.compliance(&content, context)
    }

    pub async fn evaluate_combined(
        &self,
        content: &str,
        context: Option<&str>,
        weights: Option<ScoreWeights>,
        include: IncludeFlags,
    ) -> Result<CombinedEvaluationResult, EvaluationError> {
        let snapshot = self.snapshot().await;
        let content = snapshot.content(content)?;
        snapshot.combined(&content, context, weights, include).await
    }
}
