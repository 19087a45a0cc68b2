//! Contextual signal backed by an external, untrusted reasoning provider.
//!
//! Every failure mode (provider error, timeout, malformed reply) collapses to
//! [`ContextualAssessment::unavailable`] at this boundary.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;
use serde::Deserialize;
use tokio::time::timeout;

use super::content::preview;
use super::safety::RiskLevel;
use super::types::{ContextVerdict, ContextualAssessment};
use crate::error::OracleError;

/// Judges whether content is safe given its intent or purpose.
///
/// `context` is the caller's publishing context tag, passed through as a hint.
pub trait ContextualOracle: Send + Sync {
    fn assess<'a>(
        &'a self,
        text: &'a str,
        context: Option<&'a str>,
    ) -> BoxFuture<'a, Result<ContextualAssessment, OracleError>>;
}

/// Raw text-completion backend, e.g. an LLM HTTP client.
pub trait ReasoningProvider: Send + Sync {
    fn complete(&self, system: &str, prompt: String) -> BoxFuture<'_, Result<String, OracleError>>;
}

pub const CONTEXT_SYSTEM_PROMPT: &str = r#"You are a brand-safety reviewer.

Decide whether the content is safe to publish once its intent and surrounding
context are taken into account (news reporting, education, fiction, satire,
medical or harm-reduction information).

Respond with a single JSON object and nothing else:
{"verdict": "safe_in_context" | "borderline_contextual_risk" | "unsafe_due_to_context",
 "explanation": "<one sentence>",
 "suggested_risk": "none" | "low" | "medium" | "high" | "very_high"}"#;

pub fn build_context_prompt(text: &str, context: Option<&str>, max_chars: usize) -> String {
    let mut prompt = String::new();
    if let Some(context) = context {
        prompt.push_str(&format!("Publishing context: {context}\n\n"));
    }
    prompt.push_str(&format!(
        "Content to review:\n\"\"\"\n{}\n\"\"\"",
        preview(text, max_chars)
    ));
    prompt
}

/// Adapts a [`ReasoningProvider`] into a [`ContextualOracle`] with a JSON contract.
pub struct ProviderOracle<P> {
    provider: P,
    max_chars: usize,
}

impl<P: ReasoningProvider> ProviderOracle<P> {
    pub fn new(provider: P, max_chars: usize) -> Self {
        ProviderOracle {
            provider,
            max_chars,
        }
    }
}

impl<P: ReasoningProvider> ContextualOracle for ProviderOracle<P> {
    fn assess<'a>(
        &'a self,
        text: &'a str,
        context: Option<&'a str>,
    ) -> BoxFuture<'a, Result<ContextualAssessment, OracleError>> {
        Box::pin(async move {
            let prompt = build_context_prompt(text, context, self.max_chars);
            let reply = self.provider.complete(CONTEXT_SYSTEM_PROMPT, prompt).await?;
            parse_assessment(&reply)
        })
    }
}

#[derive(Debug, Deserialize)]
struct RawAssessment {
    verdict: String,
    #[serde(default)]
    explanation: Option<String>,
    #[serde(default)]
    suggested_risk: Option<String>,
}

/// Parses a provider reply, tolerating Markdown code fences around the JSON.
pub fn parse_assessment(reply: &str) -> Result<ContextualAssessment, OracleError> {
    let body = strip_code_fence(reply);
    let raw: RawAssessment =
        serde_json::from_str(body).map_err(|err| OracleError::Malformed(err.to_string()))?;

    let verdict = match raw.verdict.trim().to_lowercase().as_str() {
        "safe_in_context" => ContextVerdict::SafeInContext,
        "borderline_contextual_risk" => ContextVerdict::BorderlineContextualRisk,
        "unsafe_due_to_context" => ContextVerdict::UnsafeDueToContext,
        "unknown" => ContextVerdict::Unknown,
        other => {
            return Err(OracleError::Malformed(format!("unknown verdict \"{other}\"")));
        }
    };
    let suggested_risk = match raw.suggested_risk.as_deref() {
        None | Some("") => None,
        Some(value) => Some(
            RiskLevel::parse(value)
                .ok_or_else(|| OracleError::Malformed(format!("unknown risk level \"{value}\"")))?,
        ),
    };
    let explanation = raw
        .explanation
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
        .unwrap_or_else(|| "no explanation provided".to_string());

    Ok(ContextualAssessment {
        verdict,
        explanation,
        suggested_risk,
    })
}

fn strip_code_fence(reply: &str) -> &str {
    let trimmed = reply.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Bounded, failure-absorbing wrapper around a contextual oracle.
#[derive(Clone)]
pub struct ContextualSignal {
    oracle: Arc<dyn ContextualOracle>,
    timeout: Duration,
}

impl ContextualSignal {
    pub fn new(oracle: Arc<dyn ContextualOracle>, timeout_ms: u64) -> Self {
        ContextualSignal {
            oracle,
            timeout: Duration::from_millis(timeout_ms.max(1)),
        }
    }

    pub async fn assess(&self, text: &str, context: Option<&str>) -> ContextualAssessment {
        let outcome = match panic::catch_unwind(AssertUnwindSafe(|| self.oracle.assess(text, context))) {
            Ok(pending) => {
                match timeout(self.timeout, AssertUnwindSafe(pending).catch_unwind()).await {
                    Ok(Ok(result)) => result,
                    Ok(Err(_)) => Err(OracleError::Provider("oracle panicked".to_string())),
                    Err(_) => Err(OracleError::Timeout(self.timeout.as_millis() as u64)),
                }
            }
            Err(_) => Err(OracleError::Provider("oracle panicked".to_string())),
        };
        match outcome {
            Ok(assessment) => assessment,
            Err(err) => {
                log::warn!("Contextual analysis unavailable: {}", err);
                ContextualAssessment::unavailable()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CannedProvider(Result<String, OracleError>);

    impl ReasoningProvider for CannedProvider {
        fn complete(&self, _system: &str, _prompt: String) -> BoxFuture<'_, Result<String, OracleError>> {
            let reply = self.0.clone();
            Box::pin(async move { reply })
        }
    }

    struct SlowOracle;

    impl ContextualOracle for SlowOracle {
        fn assess<'a>(
            &'a self,
            _text: &'a str,
            _context: Option<&'a str>,
        ) -> BoxFuture<'a, Result<ContextualAssessment, OracleError>> {
            Box::pin(async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(ContextualAssessment {
                    verdict: ContextVerdict::SafeInContext,
                    explanation: "late".into(),
                    suggested_risk: None,
                })
            })
        }
    }

    fn crash() -> Result<ContextualAssessment, OracleError> {
        panic!("provider client bug")
    }

    struct PanickingOracle;

    impl ContextualOracle for PanickingOracle {
        fn assess<'a>(
            &'a self,
            _text: &'a str,
            _context: Option<&'a str>,
        ) -> BoxFuture<'a, Result<ContextualAssessment, OracleError>> {
            Box::pin(async { crash() })
        }
    }

    struct EagerPanickingOracle;

    impl ContextualOracle for EagerPanickingOracle {
        fn assess<'a>(
            &'a self,
            _text: &'a str,
            _context: Option<&'a str>,
        ) -> BoxFuture<'a, Result<ContextualAssessment, OracleError>> {
            panic!("oracle failed before returning a future")
        }
    }

    fn signal_for(reply: Result<String, OracleError>) -> ContextualSignal {
        ContextualSignal::new(Arc::new(ProviderOracle::new(CannedProvider(reply), 200)), 1_000)
    }

    #[test]
    fn parses_fenced_json() {
        let reply = "```json\n{\"verdict\":\"unsafe_due_to_context\",\"explanation\":\"incites harm\",\"suggested_risk\":\"very_high\"}\n```";
        let assessment = parse_assessment(reply).unwrap();
        assert_eq!(assessment.verdict, ContextVerdict::UnsafeDueToContext);
        assert_eq!(assessment.suggested_risk, Some(RiskLevel::VeryHigh));
        assert_eq!(assessment.explanation, "incites harm");
    }

    #[test]
    fn rejects_unknown_verdicts() {
        let err = parse_assessment(r#"{"verdict":"probably fine"}"#).unwrap_err();
        assert!(matches!(err, OracleError::Malformed(_)));
    }

    #[test]
    fn prompt_truncates_long_content() {
        let prompt = build_context_prompt(&"a".repeat(500), Some("news"), 100);
        assert!(prompt.starts_with("Publishing context: news"));
        assert!(prompt.contains(&format!("{}...", "a".repeat(97))));
        assert!(!prompt.contains(&"a".repeat(101)));
    }

    #[tokio::test]
    async fn provider_reply_flows_through() {
        let signal = signal_for(Ok(
            r#"{"verdict":"borderline_contextual_risk","explanation":"satire"}"#.to_string(),
        ));
        let assessment = signal.assess("text", None).await;
        assert_eq!(assessment.verdict, ContextVerdict::BorderlineContextualRisk);
        assert_eq!(assessment.suggested_risk, None);
    }

    #[tokio::test]
    async fn provider_errors_become_unknown() {
        let signal = signal_for(Err(OracleError::Provider("503".into())));
        assert_eq!(signal.assess("text", None).await, ContextualAssessment::unavailable());

        let signal = signal_for(Ok("I think it is fine".to_string()));
        assert_eq!(signal.assess("text", None).await, ContextualAssessment::unavailable());
    }

    #[tokio::test]
    async fn panicking_oracles_become_unknown() {
        let signal = ContextualSignal::new(Arc::new(PanickingOracle), 1_000);
        assert_eq!(signal.assess("hello there", None).await, ContextualAssessment::unavailable());

        let signal = ContextualSignal::new(Arc::new(EagerPanickingOracle), 1_000);
        assert_eq!(signal.assess("hello there", None).await, ContextualAssessment::unavailable());
    }

    #[tokio::test]
    async fn timeouts_become_unknown() {
        let signal = ContextualSignal::new(Arc::new(SlowOracle), 20);
        let assessment = signal.assess("text", None).await;
        assert_eq!(assessment.verdict, ContextVerdict::Unknown);
        assert_eq!(assessment.explanation, "analysis unavailable");
    }
}
