use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color, ContentArrangement, Row, Table};

use crate::evm::{EvmSample, EvmSummary, PerformanceStatus};
use crate::portfolio::scoring::ScoreBreakdown;
use crate::portfolio::PerformanceDashboard;
use crate::wbs::critical_path::CriticalPathResult;
use crate::wbs::tree::find_node;
use crate::wbs::WbsItem;

pub fn render_dashboard_table(dashboard: &PerformanceDashboard) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Category", "Score", "Trend", "MoM Delta"]);
    table.add_row(vec![
        "Activities".to_string(),
        format!("{:.1}", dashboard.activity_score),
        dashboard.activity_trend.to_string(),
        format!("{:+.1}%", dashboard.activity_delta_pct),
    ]);
    table.add_row(vec![
        "Projects".to_string(),
        format!("{:.1}", dashboard.project_score),
        dashboard.project_trend.to_string(),
        format!("{:+.1}%", dashboard.project_delta_pct),
    ]);
    table.add_row(vec![
        "Overall".to_string(),
        format!("{:.1}", dashboard.overall_score),
        "-".to_string(),
        "-".to_string(),
    ]);

    let mut out = table.to_string();
    out.push_str(&format!(
        "\nAlerts: {} stalled activities, {} critical projects, {} overloaded resources",
        dashboard.alerts.overdue_activities,
        dashboard.alerts.critical_projects,
        dashboard.alerts.overloaded_resources.len()
    ));
    out
}

pub fn render_evm_table(summary: &EvmSummary) -> String {
    let s = &summary.sample;
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Measure", "Value"]);
    table.add_row(vec!["PV".to_string(), format!("{:.2}", s.planned_value)]);
    table.add_row(vec!["EV".to_string(), format!("{:.2}", s.earned_value)]);
    table.add_row(vec!["AC".to_string(), format!("{:.2}", s.actual_cost)]);
    table.add_row(vec!["SPI".to_string(), format!("{:.2}", s.spi)]);
    table.add_row(vec!["CPI".to_string(), format!("{:.2}", s.cpi)]);
    table.add_row(vec!["SV".to_string(), format!("{:.2}", s.schedule_variance)]);
    table.add_row(vec!["CV".to_string(), format!("{:.2}", s.cost_variance)]);
    table.add_row(vec![
        "BAC".to_string(),
        format!("{:.2}", s.budget_at_completion),
    ]);
    table.add_row(vec![
        "EAC".to_string(),
        format!("{:.2}", s.estimate_at_completion),
    ]);
    table.add_row(vec![
        "ETC".to_string(),
        format!("{:.2}", s.estimate_to_complete),
    ]);
    table.add_row(vec![
        "VAC".to_string(),
        format!("{:.2}", s.variance_at_completion),
    ]);

    let status_cell = match summary.status {
        PerformanceStatus::Excellent | PerformanceStatus::Good => {
            Cell::new(summary.status.to_string()).fg(Color::Green)
        }
        PerformanceStatus::Attention => Cell::new(summary.status.to_string()).fg(Color::Yellow),
        PerformanceStatus::Critical => Cell::new(summary.status.to_string()).fg(Color::Red),
    };
    table.add_row(Row::from(vec![Cell::new("Status"), status_cell]));
    table.add_row(vec!["Trend".to_string(), summary.trend.to_string()]);
    table.to_string()
}

pub fn render_history_table(samples: &[EvmSample]) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Date", "PV", "EV", "AC", "SPI", "CPI", "EAC"]);
    for s in samples {
        table.add_row(vec![
            s.measured_at.to_string(),
            format!("{:.0}", s.planned_value),
            format!("{:.0}", s.earned_value),
            format!("{:.0}", s.actual_cost),
            format!("{:.2}", s.spi),
            format!("{:.2}", s.cpi),
            format!("{:.0}", s.estimate_at_completion),
        ]);
    }
    table.to_string()
}

pub fn render_critical_path_table(result: &CriticalPathResult, forest: &[WbsItem]) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Task", "Code", "Name"]);
    for id in &result.critical_task_ids {
        let (code, name) = match find_node(forest, id) {
            Some(node) => (node.code.clone(), node.name.clone()),
            None => ("-".to_string(), "-".to_string()),
        };
        table.add_row(vec![id.clone(), code, name]);
    }
    let mut out = table.to_string();
    out.push_str(&format!(
        "\nTotal duration: {:.1} days",
        result.total_duration_days
    ));
    out
}

pub fn render_wbs_table(forest: &[WbsItem]) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Code", "Name", "Level", "Status", "% Done", "Deps"]);
    for item in forest {
        add_wbs_rows(&mut table, item);
    }
    table.to_string()
}

fn add_wbs_rows(table: &mut Table, item: &WbsItem) {
    let deps = item
        .dependencies
        .iter()
        .map(|d| format!("{} {}", d.dependency_type, d.predecessor_id))
        .collect::<Vec<_>>()
        .join(", ");
    table.add_row(vec![
        item.code.clone(),
        format!("{}{}", "  ".repeat(item.level as usize), item.name),
        item.level.to_string(),
        item.status.to_string(),
        format!("{:.0}", item.percent_complete),
        deps,
    ]);
    for child in &item.children {
        add_wbs_rows(table, child);
    }
}

pub fn render_score_table(label: &str, breakdown: &ScoreBreakdown) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Factor", "Tier", "Weight", "Contribution"]);
    for factor in &breakdown.factors {
        table.add_row(vec![
            factor.name.clone(),
            format!("{:.0}", factor.tier),
            format!("{:.2}", factor.weight),
            format!("{:.2}", factor.tier * factor.weight),
        ]);
    }
    let mut out = table.to_string();
    out.push_str(&format!(
        "\n{label}: base {:.2} x multiplier {:.1} = {:.1} points",
        breakdown.base, breakdown.multiplier, breakdown.points
    ));
    out
}
