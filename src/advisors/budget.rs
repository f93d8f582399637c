//! Budget advisor: current needs/wants/savings split against 50/30/20

use super::{field, is_number, is_string_array, round2, schema_error, Advisor};
use crate::models::{AdvisorKind, Allocation, BudgetPlan, FinancialProfile};
use crate::Result;
use serde_json::Value;

/// Categories counted as needs
const NEEDS_CATEGORIES: &[&str] = &["rent", "utilities", "groceries"];

/// Categories counted as wants. Anything outside both sets only shows up
/// in savings (through total expenses).
const WANTS_CATEGORIES: &[&str] = &["entertainment", "travel", "dining"];

const ALLOCATION_KEYS: &[&str] = &["needs_percentage", "wants_percentage", "savings_percentage"];

pub struct BudgetAdvisor;

impl Advisor for BudgetAdvisor {
    type Output = BudgetPlan;

    const KIND: AdvisorKind = AdvisorKind::Budget;

    fn build_prompt(&self, profile: &FinancialProfile) -> String {
        format!(
            r#"You are a financial assistant. Analyze this financial situation:
Monthly income: {income:.2}
Expenses: {expenses}
Savings goal: {goal}

Provide the analysis in this EXACT JSON format:
{{
  "current_allocation": {{
    "needs_percentage": 54.0,
    "wants_percentage": 9.0,
    "savings_percentage": 37.0
  }},
  "recommended_allocation_50_30_20": {{
    "needs_percentage": 50.0,
    "wants_percentage": 30.0,
    "savings_percentage": 20.0
  }},
  "recommended_monthly_savings": 10000.0,
  "tips": [
    "First practical tip",
    "Second practical tip",
    "Third practical tip"
  ]
}}

Calculate the current allocation percentages of income from:
- Needs: rent, utilities, groceries
- Wants: entertainment, travel, dining
- Savings: income minus total expenses

Return ONLY the JSON object, no other text."#,
            income = profile.income(),
            expenses = describe_expenses(profile),
            goal = profile
                .savings_goal()
                .filter(|g| *g > 0.0)
                .map(|g| format!("{:.2}", g))
                .unwrap_or_else(|| "Not specified".to_string()),
        )
    }

    fn validate(&self, _profile: &FinancialProfile, value: &Value) -> bool {
        let current_ok = value
            .get("current_allocation")
            .is_some_and(is_allocation);

        let recommended_ok = field(
            value,
            &["recommended_allocation_50_30_20", "recommended_allocation"],
        )
        .is_some_and(Value::is_object);

        let tips_ok = is_string_array(value.get("tips"))
            && value
                .get("tips")
                .and_then(Value::as_array)
                .is_some_and(|tips| !tips.is_empty());

        current_ok
            && recommended_ok
            && is_number(value.get("recommended_monthly_savings"))
            && tips_ok
    }

    fn decode(&self, value: Value) -> Result<BudgetPlan> {
        serde_json::from_value(value).map_err(|e| schema_error(Self::KIND, e))
    }

    fn fallback(&self, profile: &FinancialProfile) -> BudgetPlan {
        BudgetPlan {
            current_allocation: current_allocation(profile),
            recommended_allocation: Allocation::REFERENCE,
            recommended_monthly_savings: profile.actual_savings(),
            tips: fallback_tips(profile),
        }
    }

    /// Never recommend saving less than the user already saves.
    fn reconcile(&self, profile: &FinancialProfile, mut plan: BudgetPlan) -> BudgetPlan {
        plan.recommended_monthly_savings = profile.actual_savings();
        plan.recommended_allocation = Allocation::REFERENCE;
        plan
    }
}

fn is_allocation(value: &Value) -> bool {
    value.is_object() && ALLOCATION_KEYS.iter().all(|k| is_number(value.get(*k)))
}

/// Sum of the expenses whose category is in `bucket` (case-insensitive)
fn bucket_total(profile: &FinancialProfile, bucket: &[&str]) -> f64 {
    profile
        .expenses()
        .iter()
        .filter(|(category, _)| bucket.contains(&category.trim().to_lowercase().as_str()))
        .map(|(_, amount)| amount)
        .sum()
}

pub(crate) fn describe_expenses(profile: &FinancialProfile) -> String {
    if profile.expenses().is_empty() {
        return "none reported".to_string();
    }
    profile
        .expenses()
        .iter()
        .map(|(category, amount)| format!("{}: {:.2}", category, amount))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Shares of income. Savings goes negative when spending exceeds income.
fn current_allocation(profile: &FinancialProfile) -> Allocation {
    let income = profile.income();
    if income <= 0.0 {
        return Allocation {
            needs_percentage: 0.0,
            wants_percentage: 0.0,
            savings_percentage: 0.0,
        };
    }

    let needs = bucket_total(profile, NEEDS_CATEGORIES);
    let wants = bucket_total(profile, WANTS_CATEGORIES);

    Allocation {
        needs_percentage: round2(needs / income * 100.0),
        wants_percentage: round2(wants / income * 100.0),
        savings_percentage: round2(profile.actual_savings() / income * 100.0),
    }
}

fn fallback_tips(profile: &FinancialProfile) -> Vec<String> {
    let rate = profile.savings_rate() * 100.0;
    let saved = profile.actual_savings();

    if rate > 50.0 {
        vec![
            format!(
                "Outstanding: you save {:.1}% of your income ({:.2} per month).",
                rate, saved
            ),
            format!(
                "Put the surplus to work by investing part of your {:.2} monthly savings in diversified funds.",
                saved
            ),
            format!(
                "With a {:.1}% savings rate, keep six months of expenses as an emergency fund before taking on higher-risk investments.",
                rate
            ),
        ]
    } else if rate >= 20.0 {
        vec![
            format!(
                "You save {:.1}% of your income ({:.2} per month), meeting the 20% guideline.",
                rate, saved
            ),
            format!(
                "Automate a transfer of {:.2} to savings on payday to keep the habit.",
                saved
            ),
            format!(
                "Review discretionary spending each quarter to keep your {:.1}% savings rate above 20%.",
                rate
            ),
        ]
    } else {
        let target = profile.income() * 0.2;
        let mut tips = vec![
            format!(
                "Your savings rate is {:.1}% ({:.2} per month), below the recommended 20%.",
                rate, saved
            ),
            format!(
                "Aim to save at least {:.2} per month, which is 20% of your income.",
                target
            ),
            format!(
                "Trim dining, entertainment and travel first to lift your {:.1}% savings rate.",
                rate
            ),
        ];
        if saved < 0.0 {
            tips.insert(
                0,
                format!(
                    "Your expenses exceed your income by {:.2} per month; cut spending before anything else.",
                    -saved
                ),
            );
        }
        tips
    }
}
