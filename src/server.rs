use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::Result;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::config::Config;
use crate::evm::engine::{compute_sample, summarize};
use crate::evm::history::summarize_timeline;
use crate::evm::{EvmSample, EvmSummary};
use crate::portfolio::dashboard::aggregate_dashboard;
use crate::portfolio::scoring::{activity_breakdown, project_breakdown, ScoreBreakdown};
use crate::portfolio::PerformanceDashboard;
use crate::store::PortfolioStore;
use crate::wbs::critical_path::{compute_critical_path, CriticalPathResult};
use crate::wbs::tree::{add_dependency, insert_child, next_code, update_node};
use crate::wbs::{Dependency, DependencyType, WbsItem, ROOT_PARENT};

#[derive(Clone)]
struct ApiState {
    config: Config,
    db_path: PathBuf,
}

#[derive(Debug, Serialize)]
struct ApiResponse<T: Serialize> {
    ok: bool,
    data: T,
}

#[derive(Debug, Serialize)]
struct ApiErrorBody {
    ok: bool,
    error: String,
}

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }

    fn internal(error: impl std::fmt::Display) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: error.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ApiErrorBody {
            ok: false,
            error: self.message,
        });
        (self.status, body).into_response()
    }
}

type ApiResult<T> = std::result::Result<Json<ApiResponse<T>>, ApiError>;

#[derive(Debug, Clone, Default, Deserialize)]
struct DashboardRequest {
    unit: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct EvmComputeRequest {
    project_id: String,
    as_of: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct ProjectScopedRequest {
    project_id: String,
}

#[derive(Debug, Clone, Deserialize)]
struct WbsTaskRequest {
    project_id: String,
    #[serde(default = "default_parent")]
    parent_id: String,
    name: String,
    #[serde(default)]
    estimated_hours: f64,
    #[serde(default)]
    estimated_cost: f64,
}

#[derive(Debug, Clone, Deserialize)]
struct WbsUpdateRequest {
    project_id: String,
    node: WbsItem,
}

#[derive(Debug, Clone, Deserialize)]
struct WbsDependencyRequest {
    project_id: String,
    task_id: String,
    predecessor_id: String,
    #[serde(default = "default_dependency_type")]
    dependency_type: String,
    #[serde(default)]
    lag_days: i32,
    note: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct ScoreRequest {
    kind: String,
    id: String,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

#[derive(Debug, Serialize)]
struct EvmComputeResponse {
    summary: EvmSummary,
}

#[derive(Debug, Serialize)]
struct HistoryResponse {
    summary: String,
    samples: Vec<EvmSample>,
}

#[derive(Debug, Serialize)]
struct WbsResponse {
    project_id: String,
    tree: Vec<WbsItem>,
}

#[derive(Debug, Serialize)]
struct ScoreResponse {
    id: String,
    breakdown: ScoreBreakdown,
}

pub async fn run_server(config: Config, bind: SocketAddr) -> Result<()> {
    let state = ApiState {
        db_path: config.resolved_db_path(),
        config,
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/health", get(health))
        .route("/v1/dashboard", post(dashboard))
        .route("/v1/evm/compute", post(evm_compute))
        .route("/v1/evm/history", post(evm_history))
        .route("/v1/critical-path", post(critical_path))
        .route("/v1/wbs/show", post(wbs_show))
        .route("/v1/wbs/task", post(wbs_task))
        .route("/v1/wbs/update", post(wbs_update))
        .route("/v1/wbs/dependency", post(wbs_dependency))
        .route("/v1/score", post(score))
        .route("/v1/config", get(show_config))
        .layer(cors)
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!("REST API listening on http://{bind}");
    axum::serve(listener, app).await?;
    Ok(())
}

async fn health() -> Json<ApiResponse<HealthResponse>> {
    ok(HealthResponse { status: "ok" })
}

async fn show_config(State(state): State<ApiState>) -> Json<ApiResponse<Config>> {
    ok(state.config)
}

async fn dashboard(
    State(state): State<ApiState>,
    Json(request): Json<DashboardRequest>,
) -> ApiResult<PerformanceDashboard> {
    let store = open_store(&state)?;
    let unit = request
        .unit
        .as_deref()
        .or_else(|| state.config.unit_filter());
    let dashboard = compute_and_store_dashboard(&store, unit).map_err(ApiError::internal)?;
    Ok(ok(dashboard))
}

async fn evm_compute(
    State(state): State<ApiState>,
    Json(request): Json<EvmComputeRequest>,
) -> ApiResult<EvmComputeResponse> {
    let store = open_store(&state)?;
    let as_of = parse_as_of(request.as_of.as_deref())?;
    let summary = compute_and_store_evm(&store, &request.project_id, as_of)
        .map_err(|e| ApiError::not_found(e.to_string()))?;
    Ok(ok(EvmComputeResponse { summary }))
}

async fn evm_history(
    State(state): State<ApiState>,
    Json(request): Json<ProjectScopedRequest>,
) -> ApiResult<HistoryResponse> {
    let store = open_store(&state)?;
    let samples = store
        .load_evm_history(&request.project_id)
        .map_err(ApiError::internal)?;
    Ok(ok(HistoryResponse {
        summary: summarize_timeline(&samples),
        samples,
    }))
}

async fn critical_path(
    State(state): State<ApiState>,
    Json(request): Json<ProjectScopedRequest>,
) -> ApiResult<CriticalPathResult> {
    let store = open_store(&state)?;
    let forest = load_wbs_or_404(&store, &request.project_id)?;
    Ok(ok(compute_critical_path(&forest)))
}

async fn wbs_show(
    State(state): State<ApiState>,
    Json(request): Json<ProjectScopedRequest>,
) -> ApiResult<WbsResponse> {
    let store = open_store(&state)?;
    let forest = load_wbs_or_404(&store, &request.project_id)?;
    Ok(ok(WbsResponse {
        project_id: request.project_id,
        tree: forest,
    }))
}

async fn wbs_task(
    State(state): State<ApiState>,
    Json(request): Json<WbsTaskRequest>,
) -> ApiResult<WbsResponse> {
    if request.name.trim().is_empty() {
        return Err(ApiError::bad_request("task name cannot be empty"));
    }
    let store = open_store(&state)?;
    let forest = store
        .load_wbs(&request.project_id)
        .map_err(ApiError::internal)?
        .unwrap_or_default();

    let mut node = WbsItem::new(
        generate_node_id(&forest),
        next_code(&forest, &request.parent_id),
        request.name.trim(),
    );
    node.level = child_level(&forest, &request.parent_id);
    node.estimated_hours = request.estimated_hours;
    node.estimated_cost = request.estimated_cost;

    let forest = insert_child(forest, &request.parent_id, node);
    store
        .save_wbs(&request.project_id, &forest)
        .map_err(ApiError::internal)?;
    Ok(ok(WbsResponse {
        project_id: request.project_id,
        tree: forest,
    }))
}

/// Replaces a node in place, keeping its children. An unknown node id
/// leaves the tree as it was; callers treat the write as idempotent.
async fn wbs_update(
    State(state): State<ApiState>,
    Json(request): Json<WbsUpdateRequest>,
) -> ApiResult<WbsResponse> {
    let store = open_store(&state)?;
    let forest = load_wbs_or_404(&store, &request.project_id)?;
    let forest = update_node(forest, &request.node);
    store
        .save_wbs(&request.project_id, &forest)
        .map_err(ApiError::internal)?;
    Ok(ok(WbsResponse {
        project_id: request.project_id,
        tree: forest,
    }))
}

async fn wbs_dependency(
    State(state): State<ApiState>,
    Json(request): Json<WbsDependencyRequest>,
) -> ApiResult<WbsResponse> {
    let dependency_type = DependencyType::from_str(&request.dependency_type)
        .map_err(|e| ApiError::bad_request(e.to_string()))?;
    let store = open_store(&state)?;
    let forest = load_wbs_or_404(&store, &request.project_id)?;

    let forest = add_dependency(
        forest,
        &request.task_id,
        Dependency {
            id: String::new(),
            predecessor_id: request.predecessor_id,
            dependency_type,
            lag_days: request.lag_days,
            note: request.note,
        },
    );
    store
        .save_wbs(&request.project_id, &forest)
        .map_err(ApiError::internal)?;
    Ok(ok(WbsResponse {
        project_id: request.project_id,
        tree: forest,
    }))
}

async fn score(
    State(state): State<ApiState>,
    Json(request): Json<ScoreRequest>,
) -> ApiResult<ScoreResponse> {
    let store = open_store(&state)?;
    let breakdown = match request.kind.as_str() {
        "activity" => {
            let activities = store.load_activities(None).map_err(ApiError::internal)?;
            let activity = activities
                .iter()
                .find(|a| a.id == request.id)
                .ok_or_else(|| ApiError::not_found(format!("unknown activity: {}", request.id)))?;
            activity_breakdown(activity)
        }
        "project" => {
            let projects = store.load_projects(None).map_err(ApiError::internal)?;
            let project = projects
                .iter()
                .find(|p| p.id == request.id)
                .ok_or_else(|| ApiError::not_found(format!("unknown project: {}", request.id)))?;
            project_breakdown(project)
        }
        other => {
            return Err(ApiError::bad_request(format!(
                "kind must be 'activity' or 'project', got '{other}'"
            )))
        }
    };
    Ok(ok(ScoreResponse {
        id: request.id,
        breakdown,
    }))
}

fn ok<T: Serialize>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse { ok: true, data })
}

fn default_parent() -> String {
    ROOT_PARENT.to_string()
}

fn default_dependency_type() -> String {
    "fs".to_string()
}

fn open_store(state: &ApiState) -> std::result::Result<PortfolioStore, ApiError> {
    PortfolioStore::open(&state.db_path).map_err(ApiError::internal)
}

fn load_wbs_or_404(
    store: &PortfolioStore,
    project_id: &str,
) -> std::result::Result<Vec<WbsItem>, ApiError> {
    store
        .load_wbs(project_id)
        .map_err(ApiError::internal)?
        .ok_or_else(|| ApiError::not_found(format!("no WBS stored for project: {project_id}")))
}

fn parse_as_of(raw: Option<&str>) -> std::result::Result<NaiveDate, ApiError> {
    match raw {
        Some(raw) => raw
            .parse::<NaiveDate>()
            .map_err(|e| ApiError::bad_request(format!("invalid as_of date '{raw}': {e}"))),
        None => Ok(Utc::now().date_naive()),
    }
}

fn generate_node_id(forest: &[WbsItem]) -> String {
    let total: usize = forest.iter().map(WbsItem::subtree_size).sum();
    format!("wbs-n{}", total + 1)
}

fn child_level(forest: &[WbsItem], parent_id: &str) -> u8 {
    if parent_id == ROOT_PARENT {
        return 0;
    }
    crate::wbs::tree::find_node(forest, parent_id)
        .map(|parent| parent.level + 1)
        .unwrap_or(0)
}

/// Loads the scoped portfolio, rolls it up against the previous
/// snapshot, and persists the result as the new baseline.
pub fn compute_and_store_dashboard(
    store: &PortfolioStore,
    unit: Option<&str>,
) -> Result<PerformanceDashboard> {
    let activities = store.load_activities(unit)?;
    let projects = store.load_projects(unit)?;
    let scope = unit.unwrap_or("all");
    let previous = store.load_dashboard(scope)?;
    let dashboard = aggregate_dashboard(&activities, &projects, previous.as_ref(), Utc::now());
    store.save_dashboard(scope, &dashboard)?;
    Ok(dashboard)
}

/// Computes a sample over the stored WBS with the project's budget,
/// appends it to the history, and overwrites the rolling summary.
pub fn compute_and_store_evm(
    store: &PortfolioStore,
    project_id: &str,
    as_of: NaiveDate,
) -> Result<EvmSummary> {
    let forest = store
        .load_wbs(project_id)?
        .ok_or_else(|| anyhow::anyhow!("no WBS stored for project: {project_id}"))?;
    let budget = store
        .load_projects(None)?
        .into_iter()
        .find(|p| p.id == project_id)
        .and_then(|p| p.complexity.map(|c| c.budget))
        .unwrap_or(0.0);

    let prior = store.load_evm_history(project_id)?;
    let sample = compute_sample(&forest, project_id, budget, as_of);
    let summary = summarize(&sample, &prior);
    store.append_evm_sample(&sample)?;
    store.save_evm_summary(&summary)?;
    Ok(summary)
}
