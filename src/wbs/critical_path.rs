use serde::{Deserialize, Serialize};

use crate::wbs::WbsItem;

/// Task level: nodes at this depth and below count toward path
/// duration. Levels above are structural (project, phase, package).
const TASK_LEVEL: u8 = 3;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CriticalPathResult {
    pub critical_task_ids: Vec<String>,
    pub total_duration_days: f64,
}

/// Longest-chain scan over the forest. Not a forward/backward-pass
/// CPM: dependency edges are ignored and duration accumulates only
/// along each root-to-node chain. A task id is appended whenever its
/// chain total beats the running maximum, so the returned set traces
/// the successive maxima of the scan. Gantt highlighting depends on
/// this exact task set.
pub fn compute_critical_path(forest: &[WbsItem]) -> CriticalPathResult {
    let mut result = CriticalPathResult {
        critical_task_ids: Vec::new(),
        total_duration_days: 0.0,
    };
    for item in forest {
        walk(item, 0.0, &mut result);
    }
    result
}

/// Duration of a single task: span of the planned dates when both are
/// present, otherwise an eight-hour-day conversion of the estimate.
pub fn task_duration_days(item: &WbsItem) -> f64 {
    match (item.planned_start, item.planned_end) {
        (Some(start), Some(end)) => (end - start).num_days() as f64,
        _ => item.estimated_hours / 8.0,
    }
}

fn walk(item: &WbsItem, accumulated: f64, result: &mut CriticalPathResult) {
    let mut accumulated = accumulated;
    if item.level >= TASK_LEVEL {
        accumulated += task_duration_days(item);
        if accumulated > result.total_duration_days {
            result.total_duration_days = accumulated;
            result.critical_task_ids.push(item.id.clone());
        }
    }
    for child in &item.children {
        walk(child, accumulated, result);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn task(id: &str, hours: f64) -> WbsItem {
        let mut node = WbsItem::new(id, "1.3", id);
        node.level = 3;
        node.estimated_hours = hours;
        node
    }

    #[test]
    fn shallow_forest_yields_empty_path_and_zero_duration() {
        let forest = vec![WbsItem::new("p1", "1", "root only")];
        let result = compute_critical_path(&forest);
        assert!(result.critical_task_ids.is_empty());
        assert_eq!(result.total_duration_days, 0.0);
    }

    #[test]
    fn dated_task_uses_calendar_span() {
        let mut t = task("t1", 80.0);
        t.planned_start = NaiveDate::from_ymd_opt(2025, 3, 3);
        t.planned_end = NaiveDate::from_ymd_opt(2025, 3, 10);
        assert_eq!(task_duration_days(&t), 7.0);
    }

    #[test]
    fn undated_task_falls_back_to_eight_hour_days() {
        assert_eq!(task_duration_days(&task("t1", 20.0)), 2.5);
    }

    #[test]
    fn accumulates_along_chains_not_across_siblings() {
        let mut root = WbsItem::new("p1", "1", "project");
        let mut phase = WbsItem::new("f1", "1.1", "phase");
        phase.level = 1;
        let mut wp = WbsItem::new("wp1", "1.1.2", "package");
        wp.level = 2;

        let mut long_task = task("t-long", 40.0); // 5 days
        long_task.children.push(task("t-sub", 24.0)); // chain: 5 + 3 = 8
        let short_task = task("t-short", 16.0); // sibling chain: 2

        wp.children.push(long_task);
        wp.children.push(short_task);
        phase.children.push(wp);
        root.children.push(phase);

        let result = compute_critical_path(&[root]);
        assert_eq!(result.total_duration_days, 8.0);
        assert_eq!(result.critical_task_ids, vec!["t-long", "t-sub"]);
    }

    #[test]
    fn records_successive_maxima_in_scan_order() {
        let mut wp = WbsItem::new("wp1", "1.2", "package");
        wp.level = 2;
        wp.children.push(task("t1", 8.0)); // max 1
        wp.children.push(task("t2", 24.0)); // max 3
        wp.children.push(task("t3", 16.0)); // 2, not a new max

        let result = compute_critical_path(&[wp]);
        assert_eq!(result.critical_task_ids, vec!["t1", "t2"]);
        assert_eq!(result.total_duration_days, 3.0);
    }
}
