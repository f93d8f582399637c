//! Core data models for the advisory engine

use crate::error::AdvisoryError;
use crate::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use tracing::warn;
use uuid::Uuid;

//
// ================= Enums =================
//

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    #[default]
    Medium,
    High,
}

impl RiskLevel {
    /// Map a free-text label onto a risk level. Unrecognized labels get the
    /// low-risk table rather than failing the request.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "low" | "conservative" => RiskLevel::Low,
            "medium" | "moderate" | "balanced" => RiskLevel::Medium,
            "high" | "aggressive" => RiskLevel::High,
            other => {
                warn!(risk_level = other, "Unrecognized risk level - treating as low");
                RiskLevel::Low
            }
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        };
        write!(f, "{}", s)
    }
}

/// The five report sections, one per advisor
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum AdvisorKind {
    Budget,
    Investment,
    Debt,
    Expense,
    Health,
}

impl fmt::Display for AdvisorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AdvisorKind::Budget => "budget",
            AdvisorKind::Investment => "investment",
            AdvisorKind::Debt => "debt",
            AdvisorKind::Expense => "expense",
            AdvisorKind::Health => "health",
        };
        write!(f, "{}", s)
    }
}

/// Which path produced a section
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    Generated,
    Fallback,
}

//
// ================= Profile =================
//

/// Validated, immutable input to every advisor.
///
/// Only constructible through [`ProfileBuilder`] or `TryFrom<ProfileRequest>`,
/// both of which reject negative or non-finite amounts.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FinancialProfile {
    income: f64,
    expenses: BTreeMap<String, f64>,
    debt: f64,
    risk_level: RiskLevel,
    savings_goal: Option<f64>,
}

impl FinancialProfile {
    pub fn builder(income: f64) -> ProfileBuilder {
        ProfileBuilder {
            income: Some(income),
            ..Default::default()
        }
    }

    pub fn income(&self) -> f64 {
        self.income
    }

    pub fn expenses(&self) -> &BTreeMap<String, f64> {
        &self.expenses
    }

    pub fn debt(&self) -> f64 {
        self.debt
    }

    pub fn risk_level(&self) -> RiskLevel {
        self.risk_level
    }

    pub fn savings_goal(&self) -> Option<f64> {
        self.savings_goal
    }

    pub fn total_expenses(&self) -> f64 {
        self.expenses.values().sum()
    }

    /// Income left after expenses. Negative when overspending.
    pub fn actual_savings(&self) -> f64 {
        self.income - self.total_expenses()
    }

    /// Fraction of income saved, 0 when there is no income
    pub fn savings_rate(&self) -> f64 {
        if self.income > 0.0 {
            self.actual_savings() / self.income
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProfileBuilder {
    income: Option<f64>,
    expenses: Vec<(String, f64)>,
    debt: Option<f64>,
    risk_level: Option<RiskLevel>,
    savings_goal: Option<f64>,
}

impl ProfileBuilder {
    pub fn expense(mut self, category: impl Into<String>, amount: f64) -> Self {
        self.expenses.push((category.into(), amount));
        self
    }

    pub fn debt(mut self, debt: f64) -> Self {
        self.debt = Some(debt);
        self
    }

    pub fn risk_level(mut self, risk_level: RiskLevel) -> Self {
        self.risk_level = Some(risk_level);
        self
    }

    pub fn savings_goal(mut self, goal: f64) -> Self {
        self.savings_goal = Some(goal);
        self
    }

    pub fn build(self) -> Result<FinancialProfile> {
        let income = self
            .income
            .ok_or_else(|| AdvisoryError::InvalidProfile("income is required".to_string()))?;
        check_amount("income", income)?;

        let mut expenses = BTreeMap::new();
        for (category, amount) in self.expenses {
            let category = category.trim().to_string();
            if category.is_empty() {
                return Err(AdvisoryError::InvalidProfile(
                    "expense category names must not be blank".to_string(),
                ));
            }
            check_amount(&format!("expenses.{}", category), amount)?;
            if expenses.insert(category.clone(), amount).is_some() {
                return Err(AdvisoryError::InvalidProfile(format!(
                    "duplicate expense category {:?}",
                    category
                )));
            }
        }

        let debt = self.debt.unwrap_or(0.0);
        check_amount("debt", debt)?;

        if let Some(goal) = self.savings_goal {
            check_amount("savings_goal", goal)?;
        }

        Ok(FinancialProfile {
            income,
            expenses,
            debt,
            risk_level: self.risk_level.unwrap_or_default(),
            savings_goal: self.savings_goal,
        })
    }
}

fn check_amount(field: &str, value: f64) -> Result<()> {
    if !value.is_finite() {
        return Err(AdvisoryError::InvalidProfile(format!(
            "{} must be a finite number",
            field
        )));
    }
    if value < 0.0 {
        return Err(AdvisoryError::InvalidProfile(format!(
            "{} must not be negative (got {})",
            field, value
        )));
    }
    Ok(())
}

/// Inbound profile payload, before validation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileRequest {
    pub income: Option<f64>,
    #[serde(default)]
    pub expenses: BTreeMap<String, f64>,
    #[serde(default)]
    pub risk_level: Option<String>,
    #[serde(default)]
    pub debt: Option<f64>,
    #[serde(default)]
    pub savings_goal: Option<f64>,
}

impl TryFrom<ProfileRequest> for FinancialProfile {
    type Error = AdvisoryError;

    fn try_from(req: ProfileRequest) -> Result<Self> {
        let mut builder = ProfileBuilder {
            income: req.income,
            ..Default::default()
        };
        for (category, amount) in req.expenses {
            builder = builder.expense(category, amount);
        }
        if let Some(debt) = req.debt {
            builder = builder.debt(debt);
        }
        if let Some(risk) = req.risk_level.as_deref() {
            builder = builder.risk_level(RiskLevel::from_label(risk));
        }
        if let Some(goal) = req.savings_goal {
            builder = builder.savings_goal(goal);
        }
        builder.build()
    }
}

//
// ================= Budget =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Allocation {
    pub needs_percentage: f64,
    pub wants_percentage: f64,
    pub savings_percentage: f64,
}

impl Allocation {
    /// The 50/30/20 reference split
    pub const REFERENCE: Allocation = Allocation {
        needs_percentage: 50.0,
        wants_percentage: 30.0,
        savings_percentage: 20.0,
    };

    pub fn total(&self) -> f64 {
        self.needs_percentage + self.wants_percentage + self.savings_percentage
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BudgetPlan {
    pub current_allocation: Allocation,
    #[serde(
        rename = "recommended_allocation_50_30_20",
        alias = "recommended_allocation"
    )]
    pub recommended_allocation: Allocation,
    pub recommended_monthly_savings: f64,
    pub tips: Vec<String>,
}

//
// ================= Investment =================
//

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PortfolioEntry {
    pub asset: String,
    #[serde(rename = "allocation%", alias = "allocation_percent")]
    pub allocation_percent: f64,
    pub amount: f64,
    #[serde(rename = "notes", alias = "note")]
    pub note: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InvestmentPlan {
    pub portfolio: Vec<PortfolioEntry>,
    pub important_considerations: Vec<String>,
}

//
// ================= Debt =================
//

/// Closed set of debt states. Model output is normalized into this set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebtStatus {
    DebtFree,
    HasDebt,
}

impl DebtStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DebtStatus::DebtFree => "Debt-free",
            DebtStatus::HasDebt => "Has debt",
        }
    }

    /// Map a free-text status label onto the closed set.
    ///
    /// Accepts the canonical labels plus the decorated variants the model
    /// tends to produce ("Excellent - Debt Free!", "In debt", ...).
    pub fn from_label(label: &str) -> Option<Self> {
        let lowered = label.trim().to_lowercase();
        let compact: String = lowered
            .chars()
            .filter(|c| c.is_alphanumeric() || c.is_whitespace())
            .collect();

        if compact.contains("debtfree")
            || compact.contains("debt free")
            || compact.contains("no debt")
            || compact.contains("without debt")
        {
            Some(DebtStatus::DebtFree)
        } else if compact.contains("debt") {
            Some(DebtStatus::HasDebt)
        } else {
            None
        }
    }
}

impl fmt::Display for DebtStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for DebtStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for DebtStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        DebtStatus::from_label(&label)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown debt status {:?}", label)))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DebtPlan {
    pub status: DebtStatus,
    pub recommended_strategy: String,
    pub estimated_months_to_clear: u32,
}

//
// ================= Expense =================
//

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExpenseSuggestion {
    pub action: String,
    pub estimated_savings: f64,
    pub reason: String,
}

pub type ExpenseOptimizations = Vec<ExpenseSuggestion>;

//
// ================= Health =================
//

/// Financial health score. Always within 0..=100 once reconciled.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(transparent)]
pub struct HealthScore(pub i64);

impl HealthScore {
    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn clamped(self) -> Self {
        HealthScore(self.0.clamp(0, 100))
    }
}

//
// ================= Results =================
//

/// One advisor's output plus where it came from
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvisorResult<T> {
    pub kind: AdvisorKind,
    pub payload: T,
    pub provenance: Provenance,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<String>,
}

impl<T> AdvisorResult<T> {
    pub fn is_generated(&self) -> bool {
        self.provenance == Provenance::Generated
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombinedReport {
    pub report_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub budget_plan: BudgetPlan,
    pub investment_plan: InvestmentPlan,
    pub debt_plan: DebtPlan,
    pub expense_optimizations: ExpenseOptimizations,
    pub financial_health_score: HealthScore,
    /// True when at least one section came from the model
    pub generation_used: bool,
    pub provenance: BTreeMap<AdvisorKind, Provenance>,
}
