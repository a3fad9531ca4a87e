pub mod critical_path;
pub mod tree;

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Sentinel parent id that roots a new top-level item.
pub const ROOT_PARENT: &str = "root";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    NotStarted,
    InProgress,
    Done,
    Suspended,
}

impl TaskStatus {
    pub fn as_slug(&self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::InProgress => "in_progress",
            Self::Done => "done",
            Self::Suspended => "suspended",
        }
    }
}

impl Display for TaskStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let display = match self {
            Self::NotStarted => "Not started",
            Self::InProgress => "In progress",
            Self::Done => "Done",
            Self::Suspended => "Suspended",
        };
        write!(f, "{display}")
    }
}

#[derive(Debug, Error)]
#[error("unknown task status: {0}")]
pub struct TaskStatusParseError(pub String);

impl FromStr for TaskStatus {
    type Err = TaskStatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        match normalized.as_str() {
            "not_started" | "planned" => Ok(Self::NotStarted),
            "in_progress" | "active" => Ok(Self::InProgress),
            "done" | "completed" => Ok(Self::Done),
            "suspended" | "on_hold" => Ok(Self::Suspended),
            _ => Err(TaskStatusParseError(s.to_string())),
        }
    }
}

/// The four standard dependency relationship types. Dependencies are
/// informational edges on this tree: stored, rendered, and carried
/// through updates, but never used to reorder or re-time tasks.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DependencyType {
    FinishStart,
    StartStart,
    FinishFinish,
    StartFinish,
}

impl Display for DependencyType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let display = match self {
            Self::FinishStart => "FS",
            Self::StartStart => "SS",
            Self::FinishFinish => "FF",
            Self::StartFinish => "SF",
        };
        write!(f, "{display}")
    }
}

#[derive(Debug, Error)]
#[error("unknown dependency type: {0}")]
pub struct DependencyTypeParseError(pub String);

impl FromStr for DependencyType {
    type Err = DependencyTypeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        match normalized.as_str() {
            "fs" | "finish_start" => Ok(Self::FinishStart),
            "ss" | "start_start" => Ok(Self::StartStart),
            "ff" | "finish_finish" => Ok(Self::FinishFinish),
            "sf" | "start_finish" => Ok(Self::StartFinish),
            _ => Err(DependencyTypeParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Dependency {
    pub id: String,
    /// Id of the predecessor task this node depends on.
    pub predecessor_id: String,
    pub dependency_type: DependencyType,
    /// Lag in days; negative values model leads.
    pub lag_days: i32,
    pub note: Option<String>,
}

/// One node of a WBS tree. Children are owned exclusively by their
/// parent; dropping a node drops its whole subtree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WbsItem {
    pub id: String,
    /// Dot-separated display code, e.g. "1.1.2".
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    /// 0 = project root, 1 = phase, 2 = work package, 3 = task.
    pub level: u8,
    pub responsible_id: Option<String>,
    pub estimated_hours: f64,
    pub estimated_cost: f64,
    pub actual_hours: Option<f64>,
    pub actual_cost: Option<f64>,
    pub status: TaskStatus,
    /// Always within 0..=100.
    pub percent_complete: f64,
    pub planned_start: Option<NaiveDate>,
    pub planned_end: Option<NaiveDate>,
    pub actual_start: Option<NaiveDate>,
    pub actual_end: Option<NaiveDate>,
    #[serde(default)]
    pub dependencies: Vec<Dependency>,
    #[serde(default)]
    pub risk_tags: Vec<String>,
    #[serde(default)]
    pub children: Vec<WbsItem>,
    pub updated_at: DateTime<Utc>,
}

impl WbsItem {
    pub fn new(id: impl Into<String>, code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            code: code.into(),
            name: name.into(),
            description: None,
            level: 0,
            responsible_id: None,
            estimated_hours: 0.0,
            estimated_cost: 0.0,
            actual_hours: None,
            actual_cost: None,
            status: TaskStatus::NotStarted,
            percent_complete: 0.0,
            planned_start: None,
            planned_end: None,
            actual_start: None,
            actual_end: None,
            dependencies: Vec::new(),
            risk_tags: Vec::new(),
            children: Vec::new(),
            updated_at: Utc::now(),
        }
    }

    /// Total node count of this subtree, including self.
    pub fn subtree_size(&self) -> usize {
        1 + self
            .children
            .iter()
            .map(WbsItem::subtree_size)
            .sum::<usize>()
    }
}

/// Small four-level demo breakdown used by the seed command and the
/// tests: one project, one phase, one work package, three tasks.
pub fn sample_forest() -> Vec<WbsItem> {
    let mut root = WbsItem::new("wbs-p1", "1", "Data center migration");
    root.level = 0;

    let mut phase = WbsItem::new("wbs-f1", "1.1", "Network cutover");
    phase.level = 1;

    let mut package = WbsItem::new("wbs-wp1", "1.1.2", "Core switching");
    package.level = 2;

    let mut survey = WbsItem::new("wbs-t1", "1.1.2.3", "Site survey");
    survey.level = 3;
    survey.estimated_hours = 40.0;
    survey.estimated_cost = 6_000.0;
    survey.actual_cost = Some(5_500.0);
    survey.percent_complete = 100.0;
    survey.status = TaskStatus::Done;
    survey.planned_start = NaiveDate::from_ymd_opt(2026, 1, 5);
    survey.planned_end = NaiveDate::from_ymd_opt(2026, 1, 12);

    let mut install = WbsItem::new("wbs-t2", "1.1.2.3", "Rack and cable installation");
    install.level = 3;
    install.estimated_hours = 120.0;
    install.estimated_cost = 24_000.0;
    install.actual_cost = Some(15_000.0);
    install.percent_complete = 55.0;
    install.status = TaskStatus::InProgress;
    install.planned_start = NaiveDate::from_ymd_opt(2026, 1, 13);
    install.planned_end = NaiveDate::from_ymd_opt(2026, 2, 6);
    install.dependencies.push(Dependency {
        id: "dep-wbs-t2-1".to_string(),
        predecessor_id: "wbs-t1".to_string(),
        dependency_type: DependencyType::FinishStart,
        lag_days: 0,
        note: None,
    });

    let mut cutover = WbsItem::new("wbs-t3", "1.1.2.3", "Traffic cutover rehearsal");
    cutover.level = 3;
    cutover.estimated_hours = 64.0;
    cutover.estimated_cost = 12_000.0;
    cutover.percent_complete = 0.0;
    cutover.planned_start = NaiveDate::from_ymd_opt(2026, 2, 9);
    cutover.planned_end = NaiveDate::from_ymd_opt(2026, 2, 20);
    cutover.dependencies.push(Dependency {
        id: "dep-wbs-t3-1".to_string(),
        predecessor_id: "wbs-t2".to_string(),
        dependency_type: DependencyType::FinishStart,
        lag_days: 2,
        note: Some("after change-freeze review".to_string()),
    });

    package.children.push(survey);
    package.children.push(install);
    package.children.push(cutover);
    phase.children.push(package);
    root.children.push(phase);
    vec![root]
}
