//! Investment advisor: risk-weighted split of the monthly investable amount

use super::{field, is_number, is_string, is_string_array, round2, schema_error, Advisor};
use crate::models::{AdvisorKind, FinancialProfile, InvestmentPlan, PortfolioEntry, RiskLevel};
use crate::Result;
use serde_json::Value;

const CONSIDERATIONS: [&str; 4] = [
    "Keep an emergency fund of at least six months of expenses before investing.",
    "Diversify across asset classes so no single holding dominates the portfolio.",
    "Review and rebalance the portfolio at least once a year.",
    "Consult a licensed financial advisor before committing large sums.",
];

/// (asset, weight in percent, note) per risk level
fn risk_table(risk: RiskLevel) -> [(&'static str, f64, &'static str); 3] {
    match risk {
        RiskLevel::High => [
            ("Stocks", 60.0, "Growth-oriented equity exposure"),
            ("Mutual Funds", 25.0, "Diversified managed funds"),
            ("Bonds", 15.0, "Stability buffer"),
        ],
        RiskLevel::Medium => [
            ("Mutual Funds", 50.0, "Balanced growth through diversified funds"),
            ("Bonds", 30.0, "Steady income"),
            ("Fixed Deposits", 20.0, "Capital protection"),
        ],
        RiskLevel::Low => [
            ("Fixed Deposits", 50.0, "Guaranteed returns"),
            ("Bonds", 30.0, "Low-volatility income"),
            ("Mutual Funds", 20.0, "Modest growth"),
        ],
    }
}

pub struct InvestmentAdvisor {
    monthly_investable: f64,
}

impl InvestmentAdvisor {
    /// `monthly_investable` is clamped at zero
    pub fn new(monthly_investable: f64) -> Self {
        Self {
            monthly_investable: monthly_investable.max(0.0),
        }
    }

    pub fn monthly_investable(&self) -> f64 {
        self.monthly_investable
    }
}

impl Advisor for InvestmentAdvisor {
    type Output = InvestmentPlan;

    const KIND: AdvisorKind = AdvisorKind::Investment;

    fn build_prompt(&self, profile: &FinancialProfile) -> String {
        format!(
            r#"Create an investment plan with these parameters:
Monthly amount available to invest: {amount:.2}
Risk profile: {risk}

Provide the plan in this EXACT JSON format:
{{
  "portfolio": [
    {{"asset": "Mutual Funds", "allocation%": 50, "amount": 5000.0, "notes": "Short explanation"}},
    {{"asset": "Bonds", "allocation%": 30, "amount": 3000.0, "notes": "Short explanation"}}
  ],
  "important_considerations": [
    "First consideration",
    "Second consideration"
  ]
}}

Amounts must add up to the monthly amount available to invest.
Return ONLY the JSON object, no other text."#,
            amount = self.monthly_investable,
            risk = profile.risk_level(),
        )
    }

    fn validate(&self, _profile: &FinancialProfile, value: &Value) -> bool {
        let portfolio_ok = value
            .get("portfolio")
            .and_then(Value::as_array)
            .is_some_and(|entries| entries.iter().all(is_portfolio_entry));

        portfolio_ok && is_string_array(value.get("important_considerations"))
    }

    fn decode(&self, value: Value) -> Result<InvestmentPlan> {
        serde_json::from_value(value).map_err(|e| schema_error(Self::KIND, e))
    }

    fn fallback(&self, profile: &FinancialProfile) -> InvestmentPlan {
        let portfolio = risk_table(profile.risk_level())
            .iter()
            .map(|(asset, weight, note)| PortfolioEntry {
                asset: asset.to_string(),
                allocation_percent: *weight,
                amount: round2(self.monthly_investable * weight / 100.0),
                note: note.to_string(),
            })
            .collect();

        InvestmentPlan {
            portfolio,
            important_considerations: CONSIDERATIONS.iter().map(|c| c.to_string()).collect(),
        }
    }
}

fn is_portfolio_entry(entry: &Value) -> bool {
    entry.is_object()
        && is_string(entry.get("asset"))
        && is_number(field(entry, &["allocation%", "allocation_percent"]))
        && is_number(entry.get("amount"))
        && is_string(field(entry, &["notes", "note"]))
}
