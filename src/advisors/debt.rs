//! Debt advisor

use super::{is_non_negative_number, is_string, Advisor};
use crate::error::AdvisoryError;
use crate::models::{AdvisorKind, DebtPlan, DebtStatus, FinancialProfile};
use crate::Result;
use serde_json::Value;

/// Share of monthly income put toward repayment in the fallback plan
const REPAYMENT_SHARE: f64 = 0.2;

pub struct DebtAdvisor;

impl Advisor for DebtAdvisor {
    type Output = DebtPlan;

    const KIND: AdvisorKind = AdvisorKind::Debt;

    fn build_prompt(&self, profile: &FinancialProfile) -> String {
        format!(
            r#"Analyze this debt situation:
Total debt: {debt:.2}
Monthly income: {income:.2}
Monthly expenses: {expenses:.2}

Provide the analysis in this EXACT JSON format:
{{
  "status": "Has debt",
  "recommended_strategy": "Specific repayment strategy",
  "estimated_months_to_clear": 12
}}

Use "Debt-free" as the status and 0 months when total debt is 0.
Return ONLY the JSON object, no other text."#,
            debt = profile.debt(),
            income = profile.income(),
            expenses = profile.total_expenses(),
        )
    }

    /// Besides the shape, status and months must agree with the profile:
    /// no debt means "Debt-free" and 0 months, any debt means at least one.
    fn validate(&self, profile: &FinancialProfile, value: &Value) -> bool {
        if !is_string(value.get("recommended_strategy"))
            || !is_non_negative_number(value.get("estimated_months_to_clear"))
        {
            return false;
        }

        let status = value
            .get("status")
            .and_then(Value::as_str)
            .and_then(DebtStatus::from_label);
        let months = value.get("estimated_months_to_clear").and_then(months_of);

        match (status, months) {
            (Some(DebtStatus::DebtFree), Some(0)) => profile.debt() == 0.0,
            (Some(DebtStatus::HasDebt), Some(m)) => profile.debt() > 0.0 && m >= 1,
            _ => false,
        }
    }

    fn decode(&self, value: Value) -> Result<DebtPlan> {
        let schema = |what: &str| AdvisoryError::Schema(format!("debt payload has invalid {}", what));

        let status = value
            .get("status")
            .and_then(Value::as_str)
            .and_then(DebtStatus::from_label)
            .ok_or_else(|| schema("status"))?;
        let recommended_strategy = value
            .get("recommended_strategy")
            .and_then(Value::as_str)
            .ok_or_else(|| schema("recommended_strategy"))?
            .to_string();
        let estimated_months_to_clear = value
            .get("estimated_months_to_clear")
            .and_then(months_of)
            .ok_or_else(|| schema("estimated_months_to_clear"))?;

        Ok(DebtPlan {
            status,
            recommended_strategy,
            estimated_months_to_clear,
        })
    }

    fn fallback(&self, profile: &FinancialProfile) -> DebtPlan {
        let debt = profile.debt();
        if debt <= 0.0 {
            return DebtPlan {
                status: DebtStatus::DebtFree,
                recommended_strategy: "You have no debt. Keep it that way: pay card balances in full each month and avoid new high-interest borrowing.".to_string(),
                estimated_months_to_clear: 0,
            };
        }

        let repayment = monthly_repayment(profile);
        let months = ((debt / repayment).floor() as u32).max(1);

        DebtPlan {
            status: DebtStatus::HasDebt,
            recommended_strategy: format!(
                "Pay off high-interest debt first, then the rest. Dedicate 20% of your income ({:.2} per month) to repayment until the {:.2} balance is cleared.",
                repayment, debt
            ),
            estimated_months_to_clear: months,
        }
    }
}

/// 20% of income, or a twelve-month schedule when there is no income
fn monthly_repayment(profile: &FinancialProfile) -> f64 {
    if profile.income() > 0.0 {
        profile.income() * REPAYMENT_SHARE
    } else {
        profile.debt() / 12.0
    }
}

/// Month counts may arrive as floats; round to the nearest whole month
fn months_of(value: &Value) -> Option<u32> {
    let months = value.as_f64()?;
    if !months.is_finite() || months < 0.0 || months > u32::MAX as f64 {
        return None;
    }
    Some(months.round() as u32)
}
