pub mod dashboard;
pub mod metrics;
pub mod scoring;

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum ActivityStatus {
    Planned,
    InProgress,
    Done,
    Suspended,
}

impl Display for ActivityStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let display = match self {
            Self::Planned => "planned",
            Self::InProgress => "in progress",
            Self::Done => "done",
            Self::Suspended => "suspended",
        };
        write!(f, "{display}")
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum RoutineLevel {
    Simple,
    Moderate,
    Complex,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Criticality {
    Low,
    Medium,
    High,
    Critical,
}

impl Criticality {
    pub fn tier(self) -> f64 {
        match self {
            Self::Low => 1.0,
            Self::Medium => 2.0,
            Self::High => 3.0,
            Self::Critical => 4.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Periodicity {
    Daily,
    Weekly,
    Monthly,
}

impl Periodicity {
    /// Executions expected in one reporting month.
    pub fn expected_monthly_runs(self) -> f64 {
        match self {
            Self::Daily => 30.0,
            Self::Weekly => 4.0,
            Self::Monthly => 1.0,
        }
    }

    /// Score multiplier: the more often an activity runs, the heavier
    /// it weighs in the portfolio.
    pub fn score_multiplier(self) -> f64 {
        match self {
            Self::Daily => 1.5,
            Self::Weekly => 1.2,
            Self::Monthly => 1.0,
        }
    }
}

#[derive(Debug, Error)]
#[error("unknown periodicity: {0}")]
pub struct PeriodicityParseError(pub String);

impl FromStr for Periodicity {
    type Err = PeriodicityParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            _ => Err(PeriodicityParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum ProjectSize {
    Small,
    Medium,
    Large,
    Mega,
}

impl ProjectSize {
    pub fn score_multiplier(self) -> f64 {
        match self {
            Self::Small => 1.0,
            Self::Medium => 1.5,
            Self::Large => 2.0,
            Self::Mega => 2.5,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub fn tier(self) -> f64 {
        match self {
            Self::Low => 1.0,
            Self::Medium => 2.0,
            Self::High => 3.0,
            Self::Critical => 4.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum HealthIndicator {
    Green,
    Yellow,
    Red,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
}

/// Complexity attributes of a recurring activity; the authoritative
/// input to its point score.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActivityComplexity {
    pub routine_level: RoutineLevel,
    pub estimated_hours: f64,
    pub resources_needed: u32,
    pub criticality: Criticality,
}

/// Complexity attributes of a project.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProjectComplexity {
    pub size: ProjectSize,
    pub duration_days: u32,
    pub team_size: u32,
    pub budget: f64,
    pub risk: RiskLevel,
}

/// One logged execution of an activity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExecutionRecord {
    pub executed_at: NaiveDate,
    pub time_spent_hours: f64,
    /// Reviewer grade on a 1–5 scale.
    pub quality: f64,
    pub notes: Option<String>,
}

/// Derived activity aggregates. A cache of a pure function over the
/// execution log: never authored directly, always overwritten together
/// with the point score.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ActivityMetrics {
    pub completion_rate: f64,
    pub average_execution_hours: f64,
    pub quality_score: f64,
    pub conformity_pct: f64,
    pub throughput: f64,
    pub time_efficiency: f64,
}

/// Derived project aggregates, recomputed on demand from the project's
/// current state.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ProjectMetrics {
    pub deadline_compliance: f64,
    pub average_delay_days: f64,
    pub budget_variance_pct: f64,
    pub financial_efficiency: f64,
    pub scope_completeness: f64,
    pub delivery_quality: f64,
    pub resource_utilization: f64,
    pub team_satisfaction: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Activity {
    pub id: String,
    pub name: String,
    pub unit: String,
    pub responsible_id: Option<String>,
    pub status: ActivityStatus,
    pub periodicity: Periodicity,
    pub complexity: Option<ActivityComplexity>,
    #[serde(default)]
    pub executions: Vec<ExecutionRecord>,
    pub metrics: Option<ActivityMetrics>,
    pub points: f64,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub unit: String,
    pub status: ActivityStatus,
    pub indicator: HealthIndicator,
    pub priority: Priority,
    pub percent_complete: f64,
    pub deadline: Option<NaiveDate>,
    pub completed_at: Option<NaiveDate>,
    pub actual_cost: f64,
    pub complexity: Option<ProjectComplexity>,
    pub metrics: Option<ProjectMetrics>,
    pub points: f64,
    pub updated_at: DateTime<Utc>,
}

/// Alert counters surfaced on the dashboard. `overloaded_resources`
/// lists resource ids carrying more than the assignment threshold.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DashboardAlerts {
    pub overdue_activities: usize,
    pub critical_projects: usize,
    pub overloaded_resources: Vec<String>,
}

/// The organization-wide rollup consumed by presentation layers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PerformanceDashboard {
    pub overall_score: f64,
    pub activity_score: f64,
    pub project_score: f64,
    pub activity_trend: crate::evm::TrendDirection,
    pub project_trend: crate::evm::TrendDirection,
    pub activity_delta_pct: f64,
    pub project_delta_pct: f64,
    pub alerts: DashboardAlerts,
    pub generated_at: DateTime<Utc>,
}

impl Activity {
    pub fn sample(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: "Nightly backup verification".to_string(),
            unit: "operations".to_string(),
            responsible_id: Some("res-01".to_string()),
            status: ActivityStatus::InProgress,
            periodicity: Periodicity::Daily,
            complexity: Some(ActivityComplexity {
                routine_level: RoutineLevel::Moderate,
                estimated_hours: 4.0,
                resources_needed: 2,
                criticality: Criticality::High,
            }),
            executions: Vec::new(),
            metrics: None,
            points: 0.0,
            updated_at: Utc::now(),
        }
    }
}

/// Demo portfolio used by the seed command: a spread of periodicities,
/// criticalities, and project health states so every dashboard path
/// lights up.
pub fn sample_portfolio() -> (Vec<Activity>, Vec<Project>) {
    let backup = Activity::sample("act-backup");

    let mut reconciliation = Activity::sample("act-reconciliation");
    reconciliation.name = "Monthly ledger reconciliation".to_string();
    reconciliation.unit = "finance".to_string();
    reconciliation.responsible_id = Some("res-02".to_string());
    reconciliation.periodicity = Periodicity::Monthly;
    reconciliation.complexity = Some(ActivityComplexity {
        routine_level: RoutineLevel::Complex,
        estimated_hours: 12.0,
        resources_needed: 4,
        criticality: Criticality::Critical,
    });
    reconciliation.executions = vec![ExecutionRecord {
        executed_at: NaiveDate::from_ymd_opt(2026, 1, 30).unwrap(),
        time_spent_hours: 10.0,
        quality: 4.0,
        notes: Some("closed without adjustments".to_string()),
    }];

    let mut triage = Activity::sample("act-triage");
    triage.name = "Incident queue triage".to_string();
    triage.responsible_id = Some("res-01".to_string());
    triage.periodicity = Periodicity::Weekly;
    triage.status = ActivityStatus::Done;
    triage.complexity = Some(ActivityComplexity {
        routine_level: RoutineLevel::Simple,
        estimated_hours: 1.5,
        resources_needed: 1,
        criticality: Criticality::Medium,
    });
    triage.executions = vec![
        ExecutionRecord {
            executed_at: NaiveDate::from_ymd_opt(2026, 2, 2).unwrap(),
            time_spent_hours: 1.0,
            quality: 5.0,
            notes: None,
        },
        ExecutionRecord {
            executed_at: NaiveDate::from_ymd_opt(2026, 2, 9).unwrap(),
            time_spent_hours: 2.0,
            quality: 4.0,
            notes: None,
        },
    ];

    let migration = Project::sample("proj-dc-migration");

    let mut portal = Project::sample("proj-portal");
    portal.name = "Self-service portal rollout".to_string();
    portal.unit = "operations".to_string();
    portal.status = ActivityStatus::Done;
    portal.indicator = HealthIndicator::Green;
    portal.priority = Priority::Medium;
    portal.percent_complete = 100.0;
    portal.deadline = NaiveDate::from_ymd_opt(2026, 1, 15);
    portal.completed_at = NaiveDate::from_ymd_opt(2026, 1, 10);
    portal.actual_cost = 95_000.0;
    portal.complexity = Some(ProjectComplexity {
        size: ProjectSize::Medium,
        duration_days: 120,
        team_size: 6,
        budget: 110_000.0,
        risk: RiskLevel::Medium,
    });

    (
        vec![backup, reconciliation, triage],
        vec![migration, portal],
    )
}

impl Project {
    pub fn sample(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: "Data center migration".to_string(),
            unit: "infrastructure".to_string(),
            status: ActivityStatus::InProgress,
            indicator: HealthIndicator::Yellow,
            priority: Priority::High,
            percent_complete: 45.0,
            deadline: NaiveDate::from_ymd_opt(2026, 3, 31),
            completed_at: None,
            actual_cost: 320_000.0,
            complexity: Some(ProjectComplexity {
                size: ProjectSize::Large,
                duration_days: 220,
                team_size: 12,
                budget: 750_000.0,
                risk: RiskLevel::High,
            }),
            metrics: None,
            points: 0.0,
            updated_at: Utc::now(),
        }
    }
}
