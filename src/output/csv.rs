use anyhow::Result;

use crate::evm::EvmSample;
use crate::portfolio::PerformanceDashboard;

pub fn history_to_csv(samples: &[EvmSample]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record([
        "measured_at",
        "pv",
        "ev",
        "ac",
        "spi",
        "cpi",
        "sv",
        "cv",
        "bac",
        "eac",
        "etc",
        "vac",
    ])?;
    for s in samples {
        writer.write_record([
            s.measured_at.to_string(),
            format!("{:.2}", s.planned_value),
            format!("{:.2}", s.earned_value),
            format!("{:.2}", s.actual_cost),
            format!("{:.4}", s.spi),
            format!("{:.4}", s.cpi),
            format!("{:.2}", s.schedule_variance),
            format!("{:.2}", s.cost_variance),
            format!("{:.2}", s.budget_at_completion),
            format!("{:.2}", s.estimate_at_completion),
            format!("{:.2}", s.estimate_to_complete),
            format!("{:.2}", s.variance_at_completion),
        ])?;
    }
    let data = writer.into_inner()?;
    Ok(String::from_utf8_lossy(&data).to_string())
}

pub fn dashboard_to_csv(dashboard: &PerformanceDashboard) -> Result<String> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record([
        "category",
        "score",
        "trend",
        "mom_delta_pct",
    ])?;
    writer.write_record([
        "activities".to_string(),
        format!("{:.1}", dashboard.activity_score),
        dashboard.activity_trend.to_string(),
        format!("{:.1}", dashboard.activity_delta_pct),
    ])?;
    writer.write_record([
        "projects".to_string(),
        format!("{:.1}", dashboard.project_score),
        dashboard.project_trend.to_string(),
        format!("{:.1}", dashboard.project_delta_pct),
    ])?;
    writer.write_record([
        "overall".to_string(),
        format!("{:.1}", dashboard.overall_score),
        String::new(),
        String::new(),
    ])?;
    let data = writer.into_inner()?;
    Ok(String::from_utf8_lossy(&data).to_string())
}
