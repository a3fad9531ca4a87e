use chrono::{NaiveDate, Utc};

use crate::evm::{EvmSample, EvmSummary, PerformanceStatus, TrendDirection};
use crate::wbs::WbsItem;

/// Minimum favorable index; below it a project drops out of
/// "excellent".
const THRESHOLD_GOOD: f64 = 1.0;
const THRESHOLD_ATTENTION: f64 = 0.95;
const THRESHOLD_CRITICAL: f64 = 0.85;

/// Index delta beyond which two consecutive samples count as a real
/// movement rather than noise.
const TREND_BAND: f64 = 0.05;

/// Computes a point-in-time EVM sample over the project's WBS forest.
///
/// Planned value weights each node's estimated cost by the elapsed
/// fraction of its planned window at `as_of`; nodes without both
/// planned dates contribute nothing. Earned value credits every node,
/// parents and children both, by percent complete; parent rollups are
/// not de-duplicated and recorded baselines assume that. Actual cost
/// sums the recorded actuals.
///
/// The index guards are strict: SPI and CPI are 0 unless both sides of
/// the ratio are positive, so PV=0, EV=0, or AC=0 can never surface as
/// NaN or infinity.
pub fn compute_sample(
    forest: &[WbsItem],
    project_id: impl Into<String>,
    budget: f64,
    as_of: NaiveDate,
) -> EvmSample {
    let mut planned_value = 0.0;
    let mut earned_value = 0.0;
    let mut actual_cost = 0.0;
    for item in forest {
        accumulate(item, as_of, &mut planned_value, &mut earned_value, &mut actual_cost);
    }

    let spi = if earned_value > 0.0 && planned_value > 0.0 {
        earned_value / planned_value
    } else {
        0.0
    };
    let cpi = if earned_value > 0.0 && actual_cost > 0.0 {
        earned_value / actual_cost
    } else {
        0.0
    };

    let budget_at_completion = budget.max(0.0);
    let estimate_at_completion = if cpi > 0.0 {
        budget_at_completion / cpi
    } else {
        budget_at_completion
    };

    EvmSample {
        project_id: project_id.into(),
        measured_at: as_of,
        planned_value,
        earned_value,
        actual_cost,
        spi,
        cpi,
        schedule_variance: earned_value - planned_value,
        cost_variance: earned_value - actual_cost,
        budget_at_completion,
        estimate_at_completion,
        estimate_to_complete: estimate_at_completion - actual_cost,
        variance_at_completion: budget_at_completion - estimate_at_completion,
        captured_at: Utc::now(),
    }
}

fn accumulate(item: &WbsItem, as_of: NaiveDate, pv: &mut f64, ev: &mut f64, ac: &mut f64) {
    *pv += item.estimated_cost * time_fraction(item, as_of);
    *ev += item.estimated_cost * (item.percent_complete / 100.0);
    *ac += item.actual_cost.unwrap_or(0.0);
    for child in &item.children {
        accumulate(child, as_of, pv, ev, ac);
    }
}

/// Fraction of the node's planned window elapsed at `as_of`: 1 past
/// the planned end, 0 before the planned start, linear in between.
/// Zero-length windows count as fully elapsed once reached.
fn time_fraction(item: &WbsItem, as_of: NaiveDate) -> f64 {
    let (Some(start), Some(end)) = (item.planned_start, item.planned_end) else {
        return 0.0;
    };
    if as_of >= end {
        return 1.0;
    }
    if as_of < start {
        return 0.0;
    }
    let total = (end - start).num_days() as f64;
    let elapsed = (as_of - start).num_days() as f64;
    elapsed / total
}

/// Classifies the sample and derives the trend against the most recent
/// prior sample. The status ladder matches spi and cpi as a pair:
/// critical below 0.85, attention below 0.95, good below 1.0, excellent
/// only when both indices reach 1.0. Trend needs a prior sample; both
/// index deltas above +0.05 improve, either below −0.05 worsens,
/// anything else is stable.
pub fn summarize(sample: &EvmSample, prior: &[EvmSample]) -> EvmSummary {
    let status = classify(sample.spi, sample.cpi);
    let trend = match prior.last() {
        Some(previous) => {
            let d_spi = sample.spi - previous.spi;
            let d_cpi = sample.cpi - previous.cpi;
            if d_spi > TREND_BAND && d_cpi > TREND_BAND {
                TrendDirection::Improving
            } else if d_spi < -TREND_BAND || d_cpi < -TREND_BAND {
                TrendDirection::Worsening
            } else {
                TrendDirection::Stable
            }
        }
        None => TrendDirection::Stable,
    };
    EvmSummary {
        project_id: sample.project_id.clone(),
        sample: sample.clone(),
        status,
        trend,
    }
}

fn classify(spi: f64, cpi: f64) -> PerformanceStatus {
    if spi < THRESHOLD_CRITICAL || cpi < THRESHOLD_CRITICAL {
        PerformanceStatus::Critical
    } else if spi < THRESHOLD_ATTENTION || cpi < THRESHOLD_ATTENTION {
        PerformanceStatus::Attention
    } else if spi < THRESHOLD_GOOD || cpi < THRESHOLD_GOOD {
        PerformanceStatus::Good
    } else {
        PerformanceStatus::Excellent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn node(cost: f64, pct: f64, actual: Option<f64>) -> WbsItem {
        let mut item = WbsItem::new("n", "1", "node");
        item.estimated_cost = cost;
        item.percent_complete = pct;
        item.actual_cost = actual;
        item
    }

    fn raw_sample(spi: f64, cpi: f64) -> EvmSample {
        EvmSample {
            project_id: "p1".to_string(),
            measured_at: date(2025, 6, 1),
            planned_value: 0.0,
            earned_value: 0.0,
            actual_cost: 0.0,
            spi,
            cpi,
            schedule_variance: 0.0,
            cost_variance: 0.0,
            budget_at_completion: 0.0,
            estimate_at_completion: 0.0,
            estimate_to_complete: 0.0,
            variance_at_completion: 0.0,
            captured_at: Utc::now(),
        }
    }

    #[test]
    fn empty_plan_yields_zero_indices_not_nan() {
        let sample = compute_sample(&[node(0.0, 0.0, None)], "p1", 0.0, date(2025, 6, 1));
        assert_eq!(sample.spi, 0.0);
        assert_eq!(sample.cpi, 0.0);
        assert!(sample.spi.is_finite() && sample.cpi.is_finite());
    }

    #[test]
    fn zero_actual_cost_with_earned_value_reports_cpi_zero() {
        let mut item = node(1000.0, 50.0, None);
        item.planned_start = Some(date(2025, 5, 1));
        item.planned_end = Some(date(2025, 5, 31));
        let sample = compute_sample(&[item], "p1", 1000.0, date(2025, 6, 15));
        assert!(sample.earned_value > 0.0);
        assert_eq!(sample.cpi, 0.0);
    }

    #[test]
    fn behind_schedule_over_budget_scenario() {
        let mut item = node(1000.0, 80.0, Some(1000.0));
        item.planned_start = Some(date(2025, 5, 1));
        item.planned_end = Some(date(2025, 5, 31));
        // As-of past the planned end: PV = full 1000.
        let sample = compute_sample(&[item], "p1", 5000.0, date(2025, 6, 15));
        assert_eq!(sample.planned_value, 1000.0);
        assert_eq!(sample.earned_value, 800.0);
        assert_eq!(sample.actual_cost, 1000.0);
        assert!((sample.spi - 0.8).abs() < 1e-9);
        assert!((sample.cpi - 0.8).abs() < 1e-9);
        assert_eq!(sample.schedule_variance, -200.0);
        assert_eq!(sample.cost_variance, -200.0);
        assert!((sample.estimate_at_completion - 6250.0).abs() < 1e-9);
        assert!((sample.estimate_to_complete - 5250.0).abs() < 1e-9);
        assert!((sample.variance_at_completion + 1250.0).abs() < 1e-9);

        let summary = summarize(&sample, &[]);
        assert_eq!(summary.status, PerformanceStatus::Critical);
        assert_eq!(summary.trend, TrendDirection::Stable);
    }

    #[test]
    fn planned_value_is_linear_inside_the_window() {
        let mut item = node(1000.0, 0.0, None);
        item.planned_start = Some(date(2025, 6, 1));
        item.planned_end = Some(date(2025, 6, 11));
        let sample = compute_sample(&[item.clone()], "p1", 0.0, date(2025, 6, 6));
        assert!((sample.planned_value - 500.0).abs() < 1e-9);

        let before = compute_sample(&[item.clone()], "p1", 0.0, date(2025, 5, 30));
        assert_eq!(before.planned_value, 0.0);

        let after = compute_sample(&[item], "p1", 0.0, date(2025, 7, 1));
        assert_eq!(after.planned_value, 1000.0);
    }

    #[test]
    fn undated_nodes_contribute_no_planned_value_but_full_earned_value() {
        let item = node(400.0, 25.0, Some(50.0));
        let sample = compute_sample(&[item], "p1", 400.0, date(2025, 6, 1));
        assert_eq!(sample.planned_value, 0.0);
        assert_eq!(sample.earned_value, 100.0);
        assert_eq!(sample.actual_cost, 50.0);
    }

    #[test]
    fn parents_and_children_both_earn_value() {
        let mut parent = node(1000.0, 50.0, None);
        parent.children.push(node(500.0, 100.0, None));
        let sample = compute_sample(&[parent], "p1", 0.0, date(2025, 6, 1));
        assert_eq!(sample.earned_value, 1000.0);
    }

    #[test]
    fn status_ladder_evaluates_worst_index_first() {
        assert_eq!(classify(0.84, 1.2), PerformanceStatus::Critical);
        assert_eq!(classify(1.2, 0.84), PerformanceStatus::Critical);
        assert_eq!(classify(0.85, 0.9), PerformanceStatus::Attention);
        assert_eq!(classify(0.99, 1.1), PerformanceStatus::Good);
        assert_eq!(classify(1.0, 1.0), PerformanceStatus::Excellent);
    }

    #[test]
    fn trend_requires_both_indices_to_improve() {
        let current = raw_sample(1.0, 1.0);
        let both_up = raw_sample(0.9, 0.9);
        let one_up = raw_sample(0.9, 0.99);
        assert_eq!(
            summarize(&current, &[both_up]).trend,
            TrendDirection::Improving
        );
        assert_eq!(summarize(&current, &[one_up]).trend, TrendDirection::Stable);
    }

    #[test]
    fn trend_worsens_on_either_index_dropping() {
        let current = raw_sample(1.0, 0.8);
        let previous = raw_sample(1.0, 0.9);
        assert_eq!(
            summarize(&current, &[previous]).trend,
            TrendDirection::Worsening
        );
    }

    #[test]
    fn trend_uses_the_most_recent_prior_sample() {
        let current = raw_sample(1.0, 1.0);
        let older = raw_sample(1.2, 1.2);
        let newer = raw_sample(0.9, 0.9);
        assert_eq!(
            summarize(&current, &[older, newer]).trend,
            TrendDirection::Improving
        );
    }
}
