//! Expense advisor: cut suggestions for the heaviest categories

use super::{is_non_negative_number, is_string, round2, schema_error, Advisor};
use crate::advisors::budget::describe_expenses;
use crate::models::{AdvisorKind, ExpenseOptimizations, ExpenseSuggestion, FinancialProfile};
use crate::normalizer::JsonShape;
use crate::Result;
use serde_json::Value;

/// A category above this share of total spending gets a suggestion
const HEAVY_SHARE: f64 = 0.15;
/// Suggested cut as a fraction of the category amount
const CUT_RATE: f64 = 0.15;
const MAX_SUGGESTIONS: usize = 5;

pub struct ExpenseAdvisor;

impl Advisor for ExpenseAdvisor {
    type Output = ExpenseOptimizations;

    const KIND: AdvisorKind = AdvisorKind::Expense;

    fn shape(&self) -> JsonShape {
        JsonShape::Array
    }

    fn build_prompt(&self, profile: &FinancialProfile) -> String {
        format!(
            r#"Suggest ways to reduce these monthly expenses:
{expenses}
Total: {total:.2}

Provide up to 5 suggestions in this EXACT JSON format:
[
  {{
    "action": "Specific action to take",
    "estimated_savings": 1000.0,
    "reason": "Why this helps"
  }}
]

Return ONLY the JSON array, no other text."#,
            expenses = describe_expenses(profile),
            total = profile.total_expenses(),
        )
    }

    fn validate(&self, _profile: &FinancialProfile, value: &Value) -> bool {
        value
            .as_array()
            .is_some_and(|items| items.iter().all(is_suggestion))
    }

    fn decode(&self, value: Value) -> Result<ExpenseOptimizations> {
        serde_json::from_value(value).map_err(|e| schema_error(Self::KIND, e))
    }

    fn fallback(&self, profile: &FinancialProfile) -> ExpenseOptimizations {
        let total = profile.total_expenses();

        let mut heavy: Vec<(&String, f64)> = if total > 0.0 {
            profile
                .expenses()
                .iter()
                .map(|(category, amount)| (category, *amount))
                .filter(|(_, amount)| amount / total > HEAVY_SHARE)
                .collect()
        } else {
            Vec::new()
        };

        if heavy.is_empty() {
            return generic_suggestions();
        }

        heavy.sort_by(|a, b| b.1.total_cmp(&a.1));

        heavy
            .into_iter()
            .map(|(category, amount)| ExpenseSuggestion {
                action: format!("Reduce spending on {}", category),
                estimated_savings: round2(amount * CUT_RATE),
                reason: format!(
                    "{} takes {:.1}% of your total expenses; a 15% cut frees up money for savings.",
                    category,
                    amount / total * 100.0
                ),
            })
            .collect()
    }

    fn reconcile(
        &self,
        _profile: &FinancialProfile,
        mut suggestions: ExpenseOptimizations,
    ) -> ExpenseOptimizations {
        suggestions.truncate(MAX_SUGGESTIONS);
        suggestions
    }
}

fn is_suggestion(item: &Value) -> bool {
    item.is_object()
        && is_string(item.get("action"))
        && is_non_negative_number(item.get("estimated_savings"))
        && is_string(item.get("reason"))
}

fn generic_suggestions() -> ExpenseOptimizations {
    vec![
        ExpenseSuggestion {
            action: "Review and cancel unused subscriptions".to_string(),
            estimated_savings: 1000.0,
            reason: "Forgotten recurring charges add up quickly.".to_string(),
        },
        ExpenseSuggestion {
            action: "Plan meals to reduce food waste".to_string(),
            estimated_savings: 800.0,
            reason: "Buying only what you cook lowers grocery bills.".to_string(),
        },
    ]
}
