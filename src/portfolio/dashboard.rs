use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};

use crate::evm::TrendDirection;
use crate::portfolio::metrics::{refresh_activity, refresh_project};
use crate::portfolio::{
    Activity, ActivityStatus, DashboardAlerts, HealthIndicator, PerformanceDashboard, Priority,
    Project,
};

const ACTIVITY_SHARE: f64 = 0.4;
const PROJECT_SHARE: f64 = 0.6;

/// Done-to-total ratio above which a collection trends up, and below
/// which it trends down.
const TREND_UP_RATIO: f64 = 0.7;
const TREND_DOWN_RATIO: f64 = 0.3;

/// An in-progress activity untouched for this long counts as overdue.
const STALE_AFTER_DAYS: i64 = 7;

/// A resource carrying more than this many activities is overloaded.
const OVERLOAD_THRESHOLD: usize = 5;

/// Points map onto the 0–100 blend scale by this divisor.
const POINTS_SCALE: f64 = 10.0;

/// Rolls the whole portfolio up into one dashboard value. Entity
/// caches are recomputed on the way in, so stale or absent metrics
/// never skew the blend. `previous` supplies the month-over-month
/// baseline; without one the deltas are zero.
pub fn aggregate_dashboard(
    activities: &[Activity],
    projects: &[Project],
    previous: Option<&PerformanceDashboard>,
    as_of: DateTime<Utc>,
) -> PerformanceDashboard {
    let activities: Vec<Activity> = activities.iter().map(refresh_activity).collect();
    let projects: Vec<Project> = projects
        .iter()
        .map(|p| refresh_project(p, as_of.date_naive()))
        .collect();

    let activity_score = mean(activities.iter().map(activity_entity_score));
    let project_score = mean(projects.iter().map(project_entity_score));
    let overall_score = activity_score * ACTIVITY_SHARE + project_score * PROJECT_SHARE;

    PerformanceDashboard {
        overall_score,
        activity_score,
        project_score,
        activity_trend: collection_trend(
            activities.iter().filter(|a| a.status == ActivityStatus::Done).count(),
            activities.len(),
        ),
        project_trend: collection_trend(
            projects.iter().filter(|p| p.status == ActivityStatus::Done).count(),
            projects.len(),
        ),
        activity_delta_pct: delta_pct(activity_score, previous.map(|p| p.activity_score)),
        project_delta_pct: delta_pct(project_score, previous.map(|p| p.project_score)),
        alerts: collect_alerts(&activities, &projects, as_of),
        generated_at: as_of,
    }
}

/// Blend of one activity's cached metrics and point score, capped at
/// 100.
pub fn activity_entity_score(activity: &Activity) -> f64 {
    let Some(metrics) = &activity.metrics else {
        return 0.0;
    };
    let efficiency_pct = (metrics.time_efficiency * 100.0).min(100.0);
    let points_pct = (activity.points / POINTS_SCALE * 100.0).min(100.0);
    (metrics.completion_rate * 0.3
        + metrics.conformity_pct * 0.3
        + efficiency_pct * 0.2
        + points_pct * 0.2)
        .min(100.0)
}

/// Blend of one project's cached metrics and point score, capped at
/// 100.
pub fn project_entity_score(project: &Project) -> f64 {
    let Some(metrics) = &project.metrics else {
        return 0.0;
    };
    let quality_pct = (metrics.delivery_quality * 20.0).min(100.0);
    let points_pct = (project.points / POINTS_SCALE * 100.0).min(100.0);
    (metrics.deadline_compliance * 0.25
        + metrics.scope_completeness * 0.25
        + quality_pct * 0.2
        + metrics.resource_utilization * 0.15
        + points_pct * 0.15)
        .min(100.0)
}

fn mean(scores: impl Iterator<Item = f64>) -> f64 {
    let mut total = 0.0;
    let mut count = 0usize;
    for score in scores {
        total += score;
        count += 1;
    }
    if count == 0 {
        0.0
    } else {
        total / count as f64
    }
}

fn collection_trend(done: usize, total: usize) -> TrendDirection {
    if total == 0 {
        return TrendDirection::Stable;
    }
    let ratio = done as f64 / total as f64;
    if ratio > TREND_UP_RATIO {
        TrendDirection::Improving
    } else if ratio < TREND_DOWN_RATIO {
        TrendDirection::Worsening
    } else {
        TrendDirection::Stable
    }
}

fn delta_pct(current: f64, previous: Option<f64>) -> f64 {
    match previous {
        Some(prev) if prev > 0.0 => (current - prev) / prev * 100.0,
        _ => 0.0,
    }
}

fn collect_alerts(
    activities: &[Activity],
    projects: &[Project],
    as_of: DateTime<Utc>,
) -> DashboardAlerts {
    let stale_cutoff = as_of - Duration::days(STALE_AFTER_DAYS);
    let overdue_activities = activities
        .iter()
        .filter(|a| a.status == ActivityStatus::InProgress && a.updated_at < stale_cutoff)
        .count();

    let critical_projects = projects
        .iter()
        .filter(|p| p.indicator == HealthIndicator::Red || p.priority == Priority::Critical)
        .count();

    let mut assignments: BTreeMap<&str, usize> = BTreeMap::new();
    for activity in activities {
        if let Some(resource) = activity.responsible_id.as_deref() {
            *assignments.entry(resource).or_insert(0) += 1;
        }
    }
    let overloaded_resources = assignments
        .into_iter()
        .filter(|(_, count)| *count > OVERLOAD_THRESHOLD)
        .map(|(resource, _)| resource.to_string())
        .collect();

    DashboardAlerts {
        overdue_activities,
        critical_projects,
        overloaded_resources,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::portfolio::ExecutionRecord;
    use chrono::NaiveDate;

    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    #[test]
    fn empty_portfolio_aggregates_to_zero_without_panicking() {
        let dashboard = aggregate_dashboard(&[], &[], None, now());
        assert_eq!(dashboard.overall_score, 0.0);
        assert_eq!(dashboard.activity_score, 0.0);
        assert_eq!(dashboard.project_score, 0.0);
        assert_eq!(dashboard.activity_trend, TrendDirection::Stable);
        assert_eq!(dashboard.alerts, DashboardAlerts::default());
    }

    #[test]
    fn overall_weighs_projects_heavier_than_activities() {
        let activity = {
            let mut a = Activity::sample("a1");
            a.executions = vec![ExecutionRecord {
                executed_at: NaiveDate::from_ymd_opt(2025, 6, 2).unwrap(),
                time_spent_hours: 4.0,
                quality: 5.0,
                notes: None,
            }];
            a
        };
        let project = Project::sample("p1");
        let dashboard = aggregate_dashboard(&[activity], &[project], None, now());
        let expected =
            dashboard.activity_score * 0.4 + dashboard.project_score * 0.6;
        assert!((dashboard.overall_score - expected).abs() < 1e-9);
        assert!(dashboard.project_score > 0.0);
    }

    #[test]
    fn trend_follows_done_ratio() {
        assert_eq!(collection_trend(8, 10), TrendDirection::Improving);
        assert_eq!(collection_trend(2, 10), TrendDirection::Worsening);
        assert_eq!(collection_trend(5, 10), TrendDirection::Stable);
        assert_eq!(collection_trend(0, 0), TrendDirection::Stable);
    }

    #[test]
    fn stale_in_progress_activities_raise_the_overdue_counter() {
        let mut fresh = Activity::sample("a1");
        fresh.status = ActivityStatus::InProgress;
        let mut stale = Activity::sample("a2");
        stale.status = ActivityStatus::InProgress;
        stale.updated_at = Utc::now() - Duration::days(10);
        let mut done_but_old = Activity::sample("a3");
        done_but_old.status = ActivityStatus::Done;
        done_but_old.updated_at = Utc::now() - Duration::days(30);

        let alerts = collect_alerts(&[fresh, stale, done_but_old], &[], now());
        assert_eq!(alerts.overdue_activities, 1);
    }

    #[test]
    fn red_or_critical_projects_count_as_critical() {
        let mut red = Project::sample("p1");
        red.indicator = HealthIndicator::Red;
        red.priority = Priority::Low;
        let mut critical = Project::sample("p2");
        critical.indicator = HealthIndicator::Green;
        critical.priority = Priority::Critical;
        let mut calm = Project::sample("p3");
        calm.indicator = HealthIndicator::Green;
        calm.priority = Priority::Medium;

        let alerts = collect_alerts(&[], &[red, critical, calm], now());
        assert_eq!(alerts.critical_projects, 2);
    }

    #[test]
    fn resources_past_the_threshold_are_listed_once() {
        let mut activities = Vec::new();
        for i in 0..6 {
            let mut a = Activity::sample(format!("a{i}"));
            a.responsible_id = Some("res-42".to_string());
            activities.push(a);
        }
        let mut light = Activity::sample("a9");
        light.responsible_id = Some("res-07".to_string());
        activities.push(light);

        let alerts = collect_alerts(&activities, &[], now());
        assert_eq!(alerts.overloaded_resources, vec!["res-42".to_string()]);
    }

    #[test]
    fn deltas_compare_against_the_previous_snapshot() {
        let project = Project::sample("p1");
        let first = aggregate_dashboard(&[], &[project.clone()], None, now());
        assert_eq!(first.project_delta_pct, 0.0);

        let second = aggregate_dashboard(&[], &[project], Some(&first), now());
        assert!((second.project_delta_pct).abs() < 1e-9);
    }

    #[test]
    fn entity_scores_cap_at_one_hundred() {
        let mut a = Activity::sample("a1");
        a.executions = (0..40)
            .map(|_| ExecutionRecord {
                executed_at: NaiveDate::from_ymd_opt(2025, 6, 2).unwrap(),
                time_spent_hours: 0.5,
                quality: 5.0,
                notes: None,
            })
            .collect();
        let refreshed = refresh_activity(&a);
        assert!(activity_entity_score(&refreshed) <= 100.0);
    }
}
