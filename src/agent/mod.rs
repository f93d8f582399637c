//! Orchestrator - runs the five advisors and assembles the report
//!
//! PROFILE → {BUDGET, INVESTMENT, DEBT, EXPENSE, HEALTH} → REPORT
//!
//! The advisors run concurrently on the caller's task. None of them can
//! fail the analysis: each one either returns the model's answer or its
//! fallback, so the only error surfaced here is an invalid profile.

use crate::advisors::{
    AdvisorRunner, BudgetAdvisor, DebtAdvisor, ExpenseAdvisor, HealthAdvisor, InvestmentAdvisor,
};
use crate::audit::short_digest;
use crate::config::GenerationConfig;
use crate::generation::GenerationClient;
use crate::models::{AdvisorKind, CombinedReport, FinancialProfile, ProfileRequest, Provenance};
use crate::Result;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};
use uuid::Uuid;

/// Income left after expenses and debt, never negative
pub fn monthly_investable(profile: &FinancialProfile) -> f64 {
    (profile.income() - profile.total_expenses() - profile.debt()).max(0.0)
}

/// Main orchestrator that coordinates the advisors
#[derive(Clone)]
pub struct Orchestrator {
    runner: AdvisorRunner,
}

impl Orchestrator {
    pub fn new(client: Arc<dyn GenerationClient>, config: &GenerationConfig) -> Self {
        Self {
            runner: AdvisorRunner::new(client, config.timeout())
                .with_response_limit(config.max_response_bytes()),
        }
    }

    /// Runner for calling a single advisor on its own
    pub fn runner(&self) -> &AdvisorRunner {
        &self.runner
    }

    /// Validate a raw request, then analyze it
    pub async fn analyze_request(&self, request: ProfileRequest) -> Result<CombinedReport> {
        let profile = FinancialProfile::try_from(request)?;
        Ok(self.analyze(&profile).await)
    }

    /// Produce the combined report. Always succeeds.
    pub async fn analyze(&self, profile: &FinancialProfile) -> CombinedReport {
        let start_time = Instant::now();
        let report_id = Uuid::new_v4();
        let investable = monthly_investable(profile);

        info!(
            report_id = %report_id,
            profile = %short_digest(profile),
            risk_level = %profile.risk_level(),
            categories = profile.expenses().len(),
            "Orchestrator: starting analysis"
        );
        debug!(monthly_investable = investable, "Investable amount computed");

        let investment_advisor = InvestmentAdvisor::new(investable);

        let (budget, investment, debt, expense, health) = tokio::join!(
            self.runner.run(&BudgetAdvisor, profile),
            self.runner.run(&investment_advisor, profile),
            self.runner.run(&DebtAdvisor, profile),
            self.runner.run(&ExpenseAdvisor, profile),
            self.runner.run(&HealthAdvisor, profile),
        );

        let provenance: BTreeMap<AdvisorKind, Provenance> = [
            (budget.kind, budget.provenance),
            (investment.kind, investment.provenance),
            (debt.kind, debt.provenance),
            (expense.kind, expense.provenance),
            (health.kind, health.provenance),
        ]
        .into_iter()
        .collect();

        let generation_used = provenance.values().any(|p| *p == Provenance::Generated);
        let fallbacks = provenance
            .values()
            .filter(|p| **p == Provenance::Fallback)
            .count();

        info!(
            report_id = %report_id,
            fallbacks,
            generation_used,
            elapsed_ms = start_time.elapsed().as_millis() as u64,
            "Analysis complete"
        );

        CombinedReport {
            report_id,
            generated_at: Utc::now(),
            budget_plan: budget.payload,
            investment_plan: investment.payload,
            debt_plan: debt.payload,
            expense_optimizations: expense.payload,
            financial_health_score: health.payload,
            generation_used,
            provenance,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AdvisoryError;
    use crate::generation::{OfflineClient, ScriptedClient};
    use crate::models::{Allocation, DebtStatus, HealthScore};

    fn orchestrator(client: impl GenerationClient + 'static) -> Orchestrator {
        Orchestrator::new(Arc::new(client), &GenerationConfig::default())
    }

    fn example_profile() -> FinancialProfile {
        FinancialProfile::builder(50000.0)
            .expense("rent", 20000.0)
            .expense("utilities", 3000.0)
            .expense("groceries", 5000.0)
            .build()
            .unwrap()
    }

    #[test]
    fn test_monthly_investable() {
        assert_eq!(monthly_investable(&example_profile()), 22000.0);

        let indebted = FinancialProfile::builder(30000.0)
            .expense("rent", 25000.0)
            .debt(10000.0)
            .build()
            .unwrap();
        assert_eq!(monthly_investable(&indebted), 0.0);
    }

    #[tokio::test]
    async fn test_offline_analysis_uses_fallbacks() {
        let report = orchestrator(OfflineClient::new("no key"))
            .analyze(&example_profile())
            .await;

        assert!(!report.generation_used);
        assert_eq!(report.provenance.len(), 5);
        assert!(report.provenance.values().all(|p| *p == Provenance::Fallback));

        assert_eq!(report.budget_plan.current_allocation.needs_percentage, 56.0);
        assert_eq!(report.budget_plan.current_allocation.savings_percentage, 44.0);
        assert_eq!(report.budget_plan.recommended_monthly_savings, 22000.0);
        assert_eq!(report.debt_plan.status, DebtStatus::DebtFree);
        assert_eq!(report.debt_plan.estimated_months_to_clear, 0);

        let invested: f64 = report.investment_plan.portfolio.iter().map(|e| e.amount).sum();
        assert_eq!(invested, 22000.0);
    }

    #[tokio::test]
    async fn test_offline_indebted_profile() {
        let profile = FinancialProfile::builder(30000.0)
            .expense("rent", 25000.0)
            .debt(10000.0)
            .build()
            .unwrap();
        let report = orchestrator(OfflineClient::new("no key")).analyze(&profile).await;

        assert_eq!(report.debt_plan.status, DebtStatus::HasDebt);
        assert_eq!(report.debt_plan.estimated_months_to_clear, 1);
        assert_eq!(report.financial_health_score, HealthScore(48));
    }

    #[tokio::test]
    async fn test_zero_income() {
        let profile = FinancialProfile::builder(0.0)
            .expense("rent", 500.0)
            .build()
            .unwrap();
        let report = orchestrator(OfflineClient::new("no key")).analyze(&profile).await;

        assert_eq!(report.financial_health_score, HealthScore(0));
        assert_eq!(report.budget_plan.current_allocation.total(), 0.0);
    }

    #[tokio::test]
    async fn test_mixed_provenance() {
        let client = ScriptedClient::new(|prompt| {
            if prompt.contains("financial health score") {
                Ok("Here you go: {\"score\": 250}".to_string())
            } else if prompt.contains("current_allocation") {
                Ok(r#"```json
{
  "current_allocation": {"needs_percentage": 56, "wants_percentage": 0, "savings_percentage": 44},
  "recommended_allocation_50_30_20": {"needs_percentage": 55, "wants_percentage": 35, "savings_percentage": 10},
  "recommended_monthly_savings": 5000,
  "tips": ["Model tip"]
}
```"#
                    .to_string())
            } else if prompt.contains("debt situation") {
                Ok(r#"{"status": "Has debt", "recommended_strategy": "x", "estimated_months_to_clear": 3}"#.to_string())
            } else {
                Err(AdvisoryError::Transport("unavailable".to_string()))
            }
        });

        let report = orchestrator(client).analyze(&example_profile()).await;

        assert!(report.generation_used);
        assert_eq!(report.provenance[&AdvisorKind::Budget], Provenance::Generated);
        assert_eq!(report.provenance[&AdvisorKind::Health], Provenance::Generated);
        // inconsistent with a debt-free profile
        assert_eq!(report.provenance[&AdvisorKind::Debt], Provenance::Fallback);
        assert_eq!(report.provenance[&AdvisorKind::Investment], Provenance::Fallback);
        assert_eq!(report.provenance[&AdvisorKind::Expense], Provenance::Fallback);

        assert_eq!(report.budget_plan.tips, vec!["Model tip".to_string()]);
        assert_eq!(report.budget_plan.recommended_monthly_savings, 22000.0);
        assert_eq!(report.budget_plan.recommended_allocation, Allocation::REFERENCE);
        assert_eq!(report.financial_health_score, HealthScore(100));
        assert_eq!(report.debt_plan.status, DebtStatus::DebtFree);
    }

    #[tokio::test]
    async fn test_analyze_request_rejects_invalid_profile() {
        let request = ProfileRequest {
            income: Some(-10.0),
            ..Default::default()
        };
        let err = orchestrator(OfflineClient::new("no key"))
            .analyze_request(request)
            .await
            .unwrap_err();
        assert!(matches!(err, AdvisoryError::InvalidProfile(_)));
    }

    #[tokio::test]
    async fn test_report_wire_shape() {
        let report = orchestrator(OfflineClient::new("no key"))
            .analyze(&example_profile())
            .await;
        let json = serde_json::to_value(&report).unwrap();

        for key in [
            "budget_plan",
            "investment_plan",
            "debt_plan",
            "expense_optimizations",
            "financial_health_score",
        ] {
            assert!(json.get(key).is_some(), "missing {}", key);
        }
        assert_eq!(json["debt_plan"]["status"], "Debt-free");
        assert_eq!(json["provenance"]["budget"], "fallback");
        assert!(json["budget_plan"]["recommended_allocation_50_30_20"].is_object());
        assert!(json["financial_health_score"].is_i64());
    }
}
