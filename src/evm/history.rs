use crate::evm::{EvmSample, PerformanceStatus};

/// One-line digest of a project's sample history: how many samples sat
/// at good-or-better, plus the latest indices.
pub fn summarize_timeline(samples: &[EvmSample]) -> String {
    if samples.is_empty() {
        return "No EVM samples recorded.".to_string();
    }

    let on_plan = samples
        .iter()
        .map(status_of)
        .filter(|status| {
            matches!(
                status,
                PerformanceStatus::Excellent | PerformanceStatus::Good
            )
        })
        .count();
    let total = samples.len();
    let latest = samples.last().expect("non-empty checked above");

    format!(
        "On-plan samples: {on_plan}/{total} ({:.1}%); latest SPI {:.2}, CPI {:.2}",
        (on_plan as f64 / total as f64) * 100.0,
        latest.spi,
        latest.cpi
    )
}

fn status_of(sample: &EvmSample) -> PerformanceStatus {
    crate::evm::engine::summarize(sample, &[]).status
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};

    fn sample(spi: f64, cpi: f64) -> EvmSample {
        EvmSample {
            project_id: "p1".to_string(),
            measured_at: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            planned_value: 100.0,
            earned_value: 100.0,
            actual_cost: 100.0,
            spi,
            cpi,
            schedule_variance: 0.0,
            cost_variance: 0.0,
            budget_at_completion: 100.0,
            estimate_at_completion: 100.0,
            estimate_to_complete: 0.0,
            variance_at_completion: 0.0,
            captured_at: Utc::now(),
        }
    }

    #[test]
    fn empty_history_has_a_placeholder_line() {
        assert_eq!(summarize_timeline(&[]), "No EVM samples recorded.");
    }

    #[test]
    fn counts_good_or_better_samples() {
        let history = vec![sample(1.0, 1.0), sample(0.9, 0.9), sample(0.97, 1.05)];
        let line = summarize_timeline(&history);
        assert!(line.starts_with("On-plan samples: 2/3"), "{line}");
        assert!(line.contains("SPI 0.97"), "{line}");
    }
}
