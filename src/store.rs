use std::path::Path;

use anyhow::Result;
use rusqlite::{params, Connection};

use crate::evm::{EvmSample, EvmSummary};
use crate::portfolio::{Activity, PerformanceDashboard, Project};
use crate::wbs::WbsItem;

const BASE_MIGRATION: &str = r#"
CREATE TABLE IF NOT EXISTS wbs_trees (
    project_id TEXT PRIMARY KEY,
    tree_json  TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS evm_history (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    project_id  TEXT NOT NULL,
    measured_at TEXT NOT NULL,
    sample_json TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS evm_summaries (
    project_id   TEXT PRIMARY KEY,
    summary_json TEXT NOT NULL,
    updated_at   TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS activities (
    id            TEXT PRIMARY KEY,
    unit          TEXT NOT NULL,
    activity_json TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS projects (
    id           TEXT PRIMARY KEY,
    unit         TEXT NOT NULL,
    project_json TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS dashboards (
    scope          TEXT PRIMARY KEY,
    dashboard_json TEXT NOT NULL,
    updated_at     TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_evm_history_project
    ON evm_history(project_id, measured_at);
"#;

/// SQLite-backed entity store. The engine never touches this directly:
/// callers load inputs here, run the pure computations, and hand the
/// results back for persistence.
pub struct PortfolioStore {
    conn: Connection,
}

impl PortfolioStore {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self> {
        let store = Self {
            conn: Connection::open_in_memory()?,
        };
        store.migrate()?;
        Ok(store)
    }

    pub fn migrate(&self) -> Result<()> {
        self.conn.execute_batch(BASE_MIGRATION)?;
        Ok(())
    }

    pub fn save_wbs(&self, project_id: &str, forest: &[WbsItem]) -> Result<()> {
        self.conn.execute(
            r#"
INSERT INTO wbs_trees(project_id, tree_json, updated_at)
VALUES (?1, ?2, datetime('now'))
ON CONFLICT(project_id) DO UPDATE SET
    tree_json = excluded.tree_json,
    updated_at = excluded.updated_at
"#,
            params![project_id, serde_json::to_string(forest)?],
        )?;
        Ok(())
    }

    pub fn load_wbs(&self, project_id: &str) -> Result<Option<Vec<WbsItem>>> {
        let mut stmt = self
            .conn
            .prepare("SELECT tree_json FROM wbs_trees WHERE project_id = ?1")?;
        let result = stmt.query_row(params![project_id], |row| row.get::<_, String>(0));
        match result {
            Ok(json) => Ok(Some(serde_json::from_str(&json)?)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Samples are append-only; nothing ever updates or deletes a row.
    /// Exactly-once-per-date semantics, when wanted, belong to a
    /// uniqueness constraint here, not to the engine.
    pub fn append_evm_sample(&self, sample: &EvmSample) -> Result<()> {
        self.conn.execute(
            r#"
INSERT INTO evm_history(project_id, measured_at, sample_json)
VALUES (?1, ?2, ?3)
"#,
            params![
                sample.project_id,
                sample.measured_at.to_string(),
                serde_json::to_string(sample)?
            ],
        )?;
        Ok(())
    }

    pub fn load_evm_history(&self, project_id: &str) -> Result<Vec<EvmSample>> {
        let mut stmt = self.conn.prepare(
            r#"
SELECT sample_json
FROM evm_history
WHERE project_id = ?1
ORDER BY measured_at ASC, id ASC
"#,
        )?;
        let rows = stmt
            .query_map(params![project_id], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let mut samples = Vec::with_capacity(rows.len());
        for json in rows {
            samples.push(serde_json::from_str(&json)?);
        }
        Ok(samples)
    }

    pub fn save_evm_summary(&self, summary: &EvmSummary) -> Result<()> {
        self.conn.execute(
            r#"
INSERT INTO evm_summaries(project_id, summary_json, updated_at)
VALUES (?1, ?2, datetime('now'))
ON CONFLICT(project_id) DO UPDATE SET
    summary_json = excluded.summary_json,
    updated_at = excluded.updated_at
"#,
            params![summary.project_id, serde_json::to_string(summary)?],
        )?;
        Ok(())
    }

    pub fn load_evm_summary(&self, project_id: &str) -> Result<Option<EvmSummary>> {
        let mut stmt = self
            .conn
            .prepare("SELECT summary_json FROM evm_summaries WHERE project_id = ?1")?;
        let result = stmt.query_row(params![project_id], |row| row.get::<_, String>(0));
        match result {
            Ok(json) => Ok(Some(serde_json::from_str(&json)?)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn upsert_activity(&self, activity: &Activity) -> Result<()> {
        self.conn.execute(
            r#"
INSERT INTO activities(id, unit, activity_json)
VALUES (?1, ?2, ?3)
ON CONFLICT(id) DO UPDATE SET
    unit = excluded.unit,
    activity_json = excluded.activity_json
"#,
            params![activity.id, activity.unit, serde_json::to_string(activity)?],
        )?;
        Ok(())
    }

    pub fn load_activities(&self, unit: Option<&str>) -> Result<Vec<Activity>> {
        self.load_entities("activities", "activity_json", unit)
    }

    pub fn upsert_project(&self, project: &Project) -> Result<()> {
        self.conn.execute(
            r#"
INSERT INTO projects(id, unit, project_json)
VALUES (?1, ?2, ?3)
ON CONFLICT(id) DO UPDATE SET
    unit = excluded.unit,
    project_json = excluded.project_json
"#,
            params![project.id, project.unit, serde_json::to_string(project)?],
        )?;
        Ok(())
    }

    pub fn load_projects(&self, unit: Option<&str>) -> Result<Vec<Project>> {
        self.load_entities("projects", "project_json", unit)
    }

    /// Latest dashboard per scope ("all" or a unit name); the previous
    /// snapshot seeds the month-over-month deltas of the next rollup.
    pub fn save_dashboard(&self, scope: &str, dashboard: &PerformanceDashboard) -> Result<()> {
        self.conn.execute(
            r#"
INSERT INTO dashboards(scope, dashboard_json, updated_at)
VALUES (?1, ?2, datetime('now'))
ON CONFLICT(scope) DO UPDATE SET
    dashboard_json = excluded.dashboard_json,
    updated_at = excluded.updated_at
"#,
            params![scope, serde_json::to_string(dashboard)?],
        )?;
        Ok(())
    }

    pub fn load_dashboard(&self, scope: &str) -> Result<Option<PerformanceDashboard>> {
        let mut stmt = self
            .conn
            .prepare("SELECT dashboard_json FROM dashboards WHERE scope = ?1")?;
        let result = stmt.query_row(params![scope], |row| row.get::<_, String>(0));
        match result {
            Ok(json) => Ok(Some(serde_json::from_str(&json)?)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn load_entities<T: serde::de::DeserializeOwned>(
        &self,
        table: &str,
        column: &str,
        unit: Option<&str>,
    ) -> Result<Vec<T>> {
        let sql = if unit.is_some() {
            format!("SELECT {column} FROM {table} WHERE unit = ?1 ORDER BY id ASC")
        } else {
            format!("SELECT {column} FROM {table} ORDER BY id ASC")
        };
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = if let Some(unit) = unit {
            stmt.query_map(params![unit], |row| row.get::<_, String>(0))?
                .collect::<std::result::Result<Vec<_>, _>>()?
        } else {
            stmt.query_map([], |row| row.get::<_, String>(0))?
                .collect::<std::result::Result<Vec<_>, _>>()?
        };
        let mut entities = Vec::with_capacity(rows.len());
        for json in rows {
            entities.push(serde_json::from_str(&json)?);
        }
        Ok(entities)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evm::engine::{compute_sample, summarize};
    use crate::wbs::sample_forest;
    use chrono::NaiveDate;

    #[test]
    fn wbs_round_trips_through_the_json_column() {
        let store = PortfolioStore::open_in_memory().unwrap();
        let forest = sample_forest();
        store.save_wbs("p1", &forest).unwrap();
        let loaded = store.load_wbs("p1").unwrap().unwrap();
        assert_eq!(loaded, forest);
        assert!(store.load_wbs("missing").unwrap().is_none());
    }

    #[test]
    fn evm_history_is_append_only_and_date_ordered() {
        let store = PortfolioStore::open_in_memory().unwrap();
        let forest = sample_forest();
        let early = compute_sample(
            &forest,
            "p1",
            42_000.0,
            NaiveDate::from_ymd_opt(2026, 1, 20).unwrap(),
        );
        let late = compute_sample(
            &forest,
            "p1",
            42_000.0,
            NaiveDate::from_ymd_opt(2026, 2, 10).unwrap(),
        );
        store.append_evm_sample(&late).unwrap();
        store.append_evm_sample(&early).unwrap();

        let history = store.load_evm_history("p1").unwrap();
        assert_eq!(history.len(), 2);
        assert!(history[0].measured_at < history[1].measured_at);
    }

    #[test]
    fn summary_is_overwritten_per_project() {
        let store = PortfolioStore::open_in_memory().unwrap();
        let forest = sample_forest();
        let sample = compute_sample(
            &forest,
            "p1",
            42_000.0,
            NaiveDate::from_ymd_opt(2026, 2, 10).unwrap(),
        );
        let summary = summarize(&sample, &[]);
        store.save_evm_summary(&summary).unwrap();
        store.save_evm_summary(&summary).unwrap();
        let loaded = store.load_evm_summary("p1").unwrap().unwrap();
        assert_eq!(loaded.status, summary.status);
    }

    #[test]
    fn entities_filter_by_unit() {
        let store = PortfolioStore::open_in_memory().unwrap();
        let mut ops = Activity::sample("a1");
        ops.unit = "operations".to_string();
        let mut finance = Activity::sample("a2");
        finance.unit = "finance".to_string();
        store.upsert_activity(&ops).unwrap();
        store.upsert_activity(&finance).unwrap();

        assert_eq!(store.load_activities(None).unwrap().len(), 2);
        let filtered = store.load_activities(Some("finance")).unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id, "a2");
    }
}
