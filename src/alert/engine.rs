use serde::{Deserialize, Serialize};

use crate::alert::rules::AlertEventKind;
use crate::portfolio::PerformanceDashboard;

/// Overall-score loss (in points) between two dashboards that counts
/// as a drop worth announcing.
const SCORE_DROP_POINTS: f64 = 5.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertEvent {
    pub kind: AlertEventKind,
    pub title: String,
    pub body: String,
}

/// Turns a freshly aggregated dashboard (and, when available, the one
/// before it) into deliverable alert events. The engine only counts;
/// wording and delivery live here at the boundary.
pub fn evaluate_alerts(
    previous: Option<&PerformanceDashboard>,
    current: &PerformanceDashboard,
) -> Vec<AlertEvent> {
    let mut events = Vec::new();

    if current.alerts.overdue_activities > 0 {
        events.push(AlertEvent {
            kind: AlertEventKind::StalledActivities,
            title: format!(
                "{} activities stalled for over a week",
                current.alerts.overdue_activities
            ),
            body: "In-progress activities with no update in the last 7 days.".to_string(),
        });
    }

    if current.alerts.critical_projects > 0 {
        events.push(AlertEvent {
            kind: AlertEventKind::CriticalProjects,
            title: format!("{} projects in critical state", current.alerts.critical_projects),
            body: "Projects flagged red or carrying critical priority.".to_string(),
        });
    }

    if !current.alerts.overloaded_resources.is_empty() {
        events.push(AlertEvent {
            kind: AlertEventKind::OverloadedResources,
            title: format!(
                "{} resources overloaded",
                current.alerts.overloaded_resources.len()
            ),
            body: format!(
                "Carrying more than 5 activities each: {}",
                current.alerts.overloaded_resources.join(", ")
            ),
        });
    }

    if let Some(previous) = previous {
        let drop = previous.overall_score - current.overall_score;
        if drop > SCORE_DROP_POINTS {
            events.push(AlertEvent {
                kind: AlertEventKind::ScoreDrop,
                title: format!("Overall score dropped {drop:.1} points"),
                body: format!(
                    "From {:.1} to {:.1} since the previous rollup.",
                    previous.overall_score, current.overall_score
                ),
            });
        }
    }

    events
}
