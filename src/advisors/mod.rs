//! Advisor trait and the shared validate-or-fallback runner
//!
//! Every advisor walks the same path:
//! PROMPT → CALL → NORMALIZE → VALIDATE → {ACCEPT | FALLBACK} → RECONCILE
//!
//! Only the prompt, the schema check, the fallback formula and the
//! reconciliation rule differ per advisor; the runner owns the rest.

use crate::config::GenerationConfig;
use crate::error::AdvisoryError;
use crate::generation::GenerationClient;
use crate::models::{AdvisorKind, AdvisorResult, FinancialProfile, Provenance};
use crate::normalizer::{JsonShape, ResponseNormalizer};
use crate::Result;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

pub mod budget;
pub mod debt;
pub mod expense;
pub mod health;
pub mod investment;

pub use budget::BudgetAdvisor;
pub use debt::DebtAdvisor;
pub use expense::ExpenseAdvisor;
pub use health::HealthAdvisor;
pub use investment::InvestmentAdvisor;

/// One section of the report: how to ask for it, how to check the answer,
/// how to compute it without the model, and what to enforce afterwards.
pub trait Advisor: Send + Sync {
    type Output: Serialize + Send;

    const KIND: AdvisorKind;

    fn shape(&self) -> JsonShape {
        JsonShape::Object
    }

    fn build_prompt(&self, profile: &FinancialProfile) -> String;

    /// Structural check of the parsed model output. Never fails loudly.
    fn validate(&self, profile: &FinancialProfile, value: &Value) -> bool;

    /// Convert a validated value into the typed payload
    fn decode(&self, value: Value) -> Result<Self::Output>;

    /// Deterministic, total computation used when the model path fails
    fn fallback(&self, profile: &FinancialProfile) -> Self::Output;

    /// Invariants enforced on both generated and fallback payloads
    fn reconcile(&self, _profile: &FinancialProfile, output: Self::Output) -> Self::Output {
        output
    }
}

/// Runs advisors against a shared generation client
#[derive(Clone)]
pub struct AdvisorRunner {
    client: Arc<dyn GenerationClient>,
    timeout: Duration,
    /// Longer model text is rejected before normalization
    max_response_bytes: usize,
}

impl AdvisorRunner {
    pub fn new(client: Arc<dyn GenerationClient>, timeout: Duration) -> Self {
        Self {
            client,
            timeout,
            max_response_bytes: GenerationConfig::default().max_response_bytes(),
        }
    }

    pub fn with_response_limit(mut self, max_response_bytes: usize) -> Self {
        self.max_response_bytes = max_response_bytes;
        self
    }

    /// Run one advisor to completion. Always yields a result.
    pub async fn run<A: Advisor>(
        &self,
        advisor: &A,
        profile: &FinancialProfile,
    ) -> AdvisorResult<A::Output> {
        let kind = A::KIND;
        let (payload, provenance, fallback_reason) = match self.generate(advisor, profile).await {
            Ok(payload) => {
                debug!(advisor = %kind, "Generated payload accepted");
                (payload, Provenance::Generated, None)
            }
            Err(e) => {
                warn!(
                    advisor = %kind,
                    reason = e.label(),
                    error = %e,
                    "Generation path failed - using fallback"
                );
                (advisor.fallback(profile), Provenance::Fallback, Some(e.to_string()))
            }
        };

        let payload = advisor.reconcile(profile, payload);
        debug!(advisor = %kind, ?provenance, "Advisor reconciled");

        AdvisorResult {
            kind,
            payload,
            provenance,
            fallback_reason,
        }
    }

    /// The model half of the pipeline
    async fn generate<A: Advisor>(
        &self,
        advisor: &A,
        profile: &FinancialProfile,
    ) -> Result<A::Output> {
        let kind = A::KIND;
        let prompt = advisor.build_prompt(profile);
        debug!(advisor = %kind, prompt_len = prompt.len(), "Prompt built");

        let raw = tokio::time::timeout(self.timeout, self.client.generate(&prompt))
            .await
            .map_err(|_| {
                AdvisoryError::Transport(format!(
                    "generation timed out after {}ms",
                    self.timeout.as_millis()
                ))
            })??;

        if raw.len() > self.max_response_bytes {
            return Err(AdvisoryError::MalformedResponse(format!(
                "response of {} bytes exceeds the {} byte limit",
                raw.len(),
                self.max_response_bytes
            )));
        }

        let value = ResponseNormalizer::parse(&raw, advisor.shape())?;
        debug!(advisor = %kind, "Response normalized");

        if !advisor.validate(profile, &value) {
            return Err(AdvisoryError::Schema(format!(
                "{} response failed schema validation",
                kind
            )));
        }

        advisor.decode(value)
    }
}

//
// ================= Shared helpers =================
//

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub(crate) fn is_number(value: Option<&Value>) -> bool {
    value.and_then(Value::as_f64).is_some_and(f64::is_finite)
}

pub(crate) fn is_non_negative_number(value: Option<&Value>) -> bool {
    value.and_then(Value::as_f64).is_some_and(|v| v.is_finite() && v >= 0.0)
}

pub(crate) fn is_string(value: Option<&Value>) -> bool {
    value.is_some_and(Value::is_string)
}

pub(crate) fn is_string_array(value: Option<&Value>) -> bool {
    value
        .and_then(Value::as_array)
        .is_some_and(|items| items.iter().all(Value::is_string))
}

/// First key present on `object` among `keys`
pub(crate) fn field<'a>(object: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|key| object.get(*key))
}

pub(crate) fn schema_error(kind: AdvisorKind, err: serde_json::Error) -> AdvisoryError {
    AdvisoryError::Schema(format!("{} payload could not be decoded: {}", kind, err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::{OfflineClient, ScriptedClient};

    struct EchoAdvisor;

    impl Advisor for EchoAdvisor {
        type Output = i64;

        const KIND: AdvisorKind = AdvisorKind::Health;

        fn build_prompt(&self, profile: &FinancialProfile) -> String {
            format!("income={}", profile.income())
        }

        fn validate(&self, _profile: &FinancialProfile, value: &Value) -> bool {
            is_number(value.get("n"))
        }

        fn decode(&self, value: Value) -> Result<i64> {
            value["n"]
                .as_i64()
                .ok_or_else(|| AdvisoryError::Schema("n".to_string()))
        }

        fn fallback(&self, _profile: &FinancialProfile) -> i64 {
            -1
        }

        fn reconcile(&self, _profile: &FinancialProfile, output: i64) -> i64 {
            output.max(0)
        }
    }

    fn profile() -> FinancialProfile {
        FinancialProfile::builder(1000.0).build().unwrap()
    }

    #[tokio::test]
    async fn test_generated_path() {
        let runner = AdvisorRunner::new(
            Arc::new(ScriptedClient::fixed("```json\n{\"n\": 7}\n```")),
            Duration::from_secs(1),
        );
        let result = runner.run(&EchoAdvisor, &profile()).await;
        assert_eq!(result.payload, 7);
        assert_eq!(result.provenance, Provenance::Generated);
        assert!(result.fallback_reason.is_none());
    }

    #[tokio::test]
    async fn test_fallback_is_reconciled() {
        let runner = AdvisorRunner::new(
            Arc::new(OfflineClient::new("down")),
            Duration::from_secs(1),
        );
        let result = runner.run(&EchoAdvisor, &profile()).await;
        assert_eq!(result.provenance, Provenance::Fallback);
        assert_eq!(result.payload, 0);
        assert!(result.fallback_reason.unwrap().contains("down"));
    }

    #[tokio::test]
    async fn test_schema_failure_falls_back() {
        let runner = AdvisorRunner::new(
            Arc::new(ScriptedClient::fixed(r#"{"m": 7}"#)),
            Duration::from_secs(1),
        );
        let result = runner.run(&EchoAdvisor, &profile()).await;
        assert_eq!(result.provenance, Provenance::Fallback);
        assert!(result.fallback_reason.unwrap().starts_with("Schema error"));
    }

    #[tokio::test]
    async fn test_slow_client_times_out() {
        let client = ScriptedClient::fixed(r#"{"n": 7}"#).with_delay(Duration::from_secs(5));
        let runner = AdvisorRunner::new(Arc::new(client), Duration::from_millis(20));
        let result = runner.run(&EchoAdvisor, &profile()).await;
        assert_eq!(result.provenance, Provenance::Fallback);
        assert!(result.fallback_reason.unwrap().contains("timed out"));
    }

    #[tokio::test]
    async fn test_oversized_response_falls_back() {
        let padded = format!("{}{{\"n\": 7}}", "x".repeat(200));
        let runner = AdvisorRunner::new(
            Arc::new(ScriptedClient::fixed(padded.clone())),
            Duration::from_secs(1),
        )
        .with_response_limit(64);
        let result = runner.run(&EchoAdvisor, &profile()).await;
        assert_eq!(result.provenance, Provenance::Fallback);
        assert!(result.fallback_reason.unwrap().contains("exceeds the 64 byte limit"));

        let roomy = AdvisorRunner::new(
            Arc::new(ScriptedClient::fixed(padded)),
            Duration::from_secs(1),
        )
        .with_response_limit(1024);
        let result = roomy.run(&EchoAdvisor, &profile()).await;
        assert_eq!(result.provenance, Provenance::Generated);
        assert_eq!(result.payload, 7);
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(3000.0 * 0.15), 450.0);
        assert_eq!(round2(1234.567), 1234.57);
    }
}
