pub mod engine;
pub mod history;

use std::fmt::{Display, Formatter};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One earned-value measurement for a project. Immutable once created;
/// samples accumulate per project as an append-only, date-ordered
/// sequence.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EvmSample {
    pub project_id: String,
    pub measured_at: NaiveDate,
    pub planned_value: f64,
    pub earned_value: f64,
    pub actual_cost: f64,
    pub spi: f64,
    pub cpi: f64,
    pub schedule_variance: f64,
    pub cost_variance: f64,
    /// Budget at completion, copied from the project budget at sample
    /// time.
    pub budget_at_completion: f64,
    pub estimate_at_completion: f64,
    pub estimate_to_complete: f64,
    pub variance_at_completion: f64,
    pub captured_at: DateTime<Utc>,
}

/// Rolling summary for a project: the latest sample plus its status
/// classification and trend. One summary per project, overwritten on
/// each new sample.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EvmSummary {
    pub project_id: String,
    pub sample: EvmSample,
    pub status: PerformanceStatus,
    pub trend: TrendDirection,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum PerformanceStatus {
    Excellent,
    Good,
    Attention,
    Critical,
}

impl Display for PerformanceStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let display = match self {
            Self::Excellent => "excellent",
            Self::Good => "good",
            Self::Attention => "attention",
            Self::Critical => "critical",
        };
        write!(f, "{display}")
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Improving,
    Stable,
    Worsening,
}

impl Display for TrendDirection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let display = match self {
            Self::Improving => "improving",
            Self::Stable => "stable",
            Self::Worsening => "worsening",
        };
        write!(f, "{display}")
    }
}
