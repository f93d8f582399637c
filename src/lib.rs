//! Personal Finance Advisory Engine
//!
//! Turns a financial profile (income, categorized expenses, debt, risk
//! appetite) into a combined report:
//! - 50/30/20 budget allocation
//! - Risk-weighted investment split
//! - Debt payoff plan
//! - Expense-cut suggestions
//! - Financial health score
//!
//! Each section is asked of a language model and checked before use. Any
//! failure (transport, malformed text, wrong shape) switches that section to
//! a deterministic calculation, so an analysis always completes.
//!
//! PROFILE → PROMPT → CALL → NORMALIZE → VALIDATE → {ACCEPT | FALLBACK} → RECONCILE → REPORT

pub mod advisors;
pub mod agent;
pub mod api;
pub mod audit;
pub mod config;
pub mod error;
pub mod generation;
pub mod models;
pub mod normalizer;

pub use error::Result;

// Re-export common types
pub use agent::Orchestrator;
pub use config::AppConfig;
pub use error::AdvisoryError;
pub use models::*;
