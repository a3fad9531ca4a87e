use chrono::NaiveDate;

use crate::portfolio::{
    Activity, ActivityMetrics, HealthIndicator, Priority, Project, ProjectMetrics,
};
use crate::portfolio::scoring::{score_activity, score_project};

/// Scale factor from a 1–5 grade to a percentage.
const GRADE_TO_PCT: f64 = 20.0;

/// Derives the cached activity aggregates purely from the execution
/// log. An empty log yields the all-zero metrics value.
pub fn compute_activity_metrics(activity: &Activity) -> ActivityMetrics {
    if activity.executions.is_empty() {
        return ActivityMetrics::default();
    }

    let count = activity.executions.len() as f64;
    let total_hours: f64 = activity
        .executions
        .iter()
        .map(|e| e.time_spent_hours)
        .sum();
    let quality_score =
        activity.executions.iter().map(|e| e.quality).sum::<f64>() / count;

    let expected = activity.periodicity.expected_monthly_runs();
    let completion_rate = if expected > 0.0 {
        ((count / expected) * 100.0).min(100.0)
    } else {
        0.0
    };

    let estimated_hours = activity
        .complexity
        .as_ref()
        .map(|c| c.estimated_hours)
        .unwrap_or(0.0);
    let time_efficiency = if total_hours > 0.0 && estimated_hours > 0.0 {
        count / (total_hours / estimated_hours)
    } else {
        0.0
    };

    ActivityMetrics {
        completion_rate,
        average_execution_hours: total_hours / count,
        quality_score,
        conformity_pct: quality_score * GRADE_TO_PCT,
        throughput: count,
        time_efficiency,
    }
}

/// Derives the cached project aggregates from the project's current
/// state. `as_of` anchors the delay computation for projects still in
/// flight.
pub fn compute_project_metrics(project: &Project, as_of: NaiveDate) -> ProjectMetrics {
    let budget = project
        .complexity
        .as_ref()
        .map(|c| c.budget)
        .unwrap_or(0.0);
    let team_size = project
        .complexity
        .as_ref()
        .map(|c| c.team_size)
        .unwrap_or(0);
    let percent = project.percent_complete.clamp(0.0, 100.0);

    let completed_on_time = match (project.completed_at, project.deadline) {
        (Some(done), Some(deadline)) => done <= deadline,
        (Some(_), None) => true,
        _ => false,
    };
    let deadline_compliance = if completed_on_time {
        100.0
    } else if percent < 100.0 {
        percent
    } else {
        0.0
    };

    let average_delay_days = match project.deadline {
        Some(deadline) => {
            let reference = match project.completed_at {
                Some(done) => done,
                None if percent < 100.0 => as_of,
                None => deadline,
            };
            ((reference - deadline).num_days().max(0)) as f64
        }
        None => 0.0,
    };

    let budget_variance_pct = if budget > 0.0 {
        (project.actual_cost - budget) / budget * 100.0
    } else {
        0.0
    };
    let financial_efficiency = if project.actual_cost > 0.0 {
        (budget * percent / 100.0) / project.actual_cost
    } else {
        0.0
    };

    let delivery_quality = {
        let base = match project.indicator {
            HealthIndicator::Green => 4.5,
            HealthIndicator::Yellow => 3.5,
            HealthIndicator::Red => 2.0,
        };
        let boosted: f64 = if percent >= 90.0 { base + 0.5 } else { base };
        boosted.clamp(1.0, 5.0)
    };

    let resource_utilization =
        (0.8 * percent + 2.0 * f64::from(team_size.min(10))).min(100.0);

    let team_satisfaction = {
        let base = match project.indicator {
            HealthIndicator::Green => 4.0,
            HealthIndicator::Yellow => 3.0,
            HealthIndicator::Red => 2.0,
        };
        let adjusted: f64 = match project.priority {
            Priority::High | Priority::Critical => base - 0.5,
            _ => base,
        };
        adjusted.clamp(1.0, 5.0)
    };

    ProjectMetrics {
        deadline_compliance,
        average_delay_days,
        budget_variance_pct,
        financial_efficiency,
        scope_completeness: percent,
        delivery_quality,
        resource_utilization,
        team_satisfaction,
    }
}

/// Recomputes the metrics cache and the point score together. The two
/// are never written independently: the cache feeds the quality factor
/// of the score.
pub fn refresh_activity(activity: &Activity) -> Activity {
    let mut refreshed = activity.clone();
    refreshed.metrics = Some(compute_activity_metrics(activity));
    refreshed.points = score_activity(&refreshed);
    refreshed
}

/// Project analogue of [`refresh_activity`].
pub fn refresh_project(project: &Project, as_of: NaiveDate) -> Project {
    let mut refreshed = project.clone();
    refreshed.metrics = Some(compute_project_metrics(project, as_of));
    refreshed.points = score_project(&refreshed);
    refreshed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::portfolio::{ExecutionRecord, Periodicity};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn execution(hours: f64, quality: f64) -> ExecutionRecord {
        ExecutionRecord {
            executed_at: date(2025, 6, 2),
            time_spent_hours: hours,
            quality,
            notes: None,
        }
    }

    #[test]
    fn empty_history_yields_all_zero_metrics() {
        let mut a = Activity::sample("a1");
        a.executions.clear();
        assert_eq!(compute_activity_metrics(&a), ActivityMetrics::default());
    }

    #[test]
    fn activity_metrics_derive_from_the_log() {
        let mut a = Activity::sample("a1");
        a.periodicity = Periodicity::Weekly; // 4 expected per month
        a.executions = vec![execution(4.0, 4.0), execution(2.0, 5.0)];
        let m = compute_activity_metrics(&a);
        assert_eq!(m.completion_rate, 50.0);
        assert_eq!(m.average_execution_hours, 3.0);
        assert_eq!(m.quality_score, 4.5);
        assert_eq!(m.conformity_pct, 90.0);
        assert_eq!(m.throughput, 2.0);
        // 2 executions over 6h against a 4h estimate: 2 / (6/4)
        assert!((m.time_efficiency - 4.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn completion_rate_caps_at_one_hundred() {
        let mut a = Activity::sample("a1");
        a.periodicity = Periodicity::Monthly;
        a.executions = vec![execution(1.0, 3.0), execution(1.0, 3.0)];
        assert_eq!(compute_activity_metrics(&a).completion_rate, 100.0);
    }

    #[test]
    fn on_time_completion_scores_full_compliance() {
        let mut p = Project::sample("p1");
        p.deadline = Some(date(2025, 6, 30));
        p.completed_at = Some(date(2025, 6, 20));
        p.percent_complete = 100.0;
        let m = compute_project_metrics(&p, date(2025, 7, 1));
        assert_eq!(m.deadline_compliance, 100.0);
        assert_eq!(m.average_delay_days, 0.0);
    }

    #[test]
    fn late_open_project_tracks_percent_and_delay() {
        let mut p = Project::sample("p1");
        p.deadline = Some(date(2025, 6, 1));
        p.completed_at = None;
        p.percent_complete = 60.0;
        let m = compute_project_metrics(&p, date(2025, 6, 11));
        assert_eq!(m.deadline_compliance, 60.0);
        assert_eq!(m.average_delay_days, 10.0);
    }

    #[test]
    fn fully_complete_without_completion_date_scores_zero_compliance() {
        let mut p = Project::sample("p1");
        p.deadline = Some(date(2025, 6, 1));
        p.completed_at = None;
        p.percent_complete = 100.0;
        let m = compute_project_metrics(&p, date(2025, 7, 1));
        assert_eq!(m.deadline_compliance, 0.0);
    }

    #[test]
    fn budget_variance_guards_division() {
        let mut p = Project::sample("p1");
        p.complexity = None;
        p.actual_cost = 10_000.0;
        let m = compute_project_metrics(&p, date(2025, 7, 1));
        assert_eq!(m.budget_variance_pct, 0.0);
        assert_eq!(m.financial_efficiency, 0.0);
    }

    #[test]
    fn overrun_shows_positive_variance() {
        let mut p = Project::sample("p1");
        if let Some(c) = p.complexity.as_mut() {
            c.budget = 100_000.0;
        }
        p.actual_cost = 125_000.0;
        let m = compute_project_metrics(&p, date(2025, 7, 1));
        assert_eq!(m.budget_variance_pct, 25.0);
    }

    #[test]
    fn satisfaction_stays_within_grade_bounds() {
        let mut p = Project::sample("p1");
        p.indicator = HealthIndicator::Red;
        p.priority = Priority::Critical;
        let m = compute_project_metrics(&p, date(2025, 7, 1));
        assert!((1.0..=5.0).contains(&m.team_satisfaction));
        assert_eq!(m.team_satisfaction, 1.5);
    }

    #[test]
    fn refresh_overwrites_metrics_and_points_together() {
        let mut a = Activity::sample("a1");
        a.executions = vec![execution(4.0, 5.0)];
        a.points = -1.0;
        let refreshed = refresh_activity(&a);
        assert!(refreshed.metrics.is_some());
        assert!(refreshed.points > 0.0);
        // Quality now comes from the cache, not the default grade.
        let cached = refreshed.metrics.as_ref().unwrap();
        assert_eq!(cached.quality_score, 5.0);
    }
}
