//! Health advisor: a single 0-100 score

use super::{is_number, Advisor};
use crate::error::AdvisoryError;
use crate::models::{AdvisorKind, FinancialProfile, HealthScore};
use crate::Result;
use serde_json::Value;

pub struct HealthAdvisor;

impl Advisor for HealthAdvisor {
    type Output = HealthScore;

    const KIND: AdvisorKind = AdvisorKind::Health;

    fn build_prompt(&self, profile: &FinancialProfile) -> String {
        format!(
            r#"Calculate a financial health score from 0 to 100 for:
Monthly income: {income:.2}
Monthly expenses: {expenses:.2}
Total debt: {debt:.2}
Monthly savings: {savings:.2}

Weigh the savings rate, the debt-to-income ratio and the expense ratio.

Respond in this EXACT JSON format:
{{"score": 75}}

Return ONLY the JSON object, no other text."#,
            income = profile.income(),
            expenses = profile.total_expenses(),
            debt = profile.debt(),
            savings = profile.actual_savings(),
        )
    }

    fn validate(&self, _profile: &FinancialProfile, value: &Value) -> bool {
        is_number(value.get("score"))
    }

    fn decode(&self, value: Value) -> Result<HealthScore> {
        value
            .get("score")
            .and_then(Value::as_f64)
            .map(|score| HealthScore(score.trunc() as i64))
            .ok_or_else(|| AdvisoryError::Schema("health payload has no numeric score".to_string()))
    }

    /// Savings (up to 50) + low debt (up to 30) + low spending (up to 20)
    fn fallback(&self, profile: &FinancialProfile) -> HealthScore {
        let income = profile.income();
        if income <= 0.0 {
            return HealthScore(0);
        }

        let savings_ratio = profile.actual_savings() / income;
        let debt_ratio = profile.debt() / income;
        let expense_ratio = profile.total_expenses() / income;

        let score = (savings_ratio * 100.0).min(50.0)
            + (30.0 - debt_ratio * 30.0).max(0.0)
            + (20.0 - expense_ratio * 10.0).max(0.0);

        HealthScore(score.clamp(0.0, 100.0).trunc() as i64)
    }

    fn reconcile(&self, _profile: &FinancialProfile, score: HealthScore) -> HealthScore {
        score.clamped()
    }
}
