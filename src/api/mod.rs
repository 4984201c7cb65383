use axum::{
    Router,
    extract::{Json, Query},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use clap::{Parser, ValueEnum};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::net::SocketAddr;
use tokio::net::TcpListener;

use crate::core::{
    Frequency, GoalSolveConfig, GoalSolveResult, GoalType, InvalidReason, ProjectionError,
    ProjectionInput, ProjectionResult, convert, default_search_max, goal_progress_percent, project,
    solve_goal,
};

/// Longest horizon served over HTTP; the engine itself has no cap.
const MAX_API_YEARS: u32 = 1_000;

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliFrequency {
    Monthly,
    Annual,
}

impl From<CliFrequency> for Frequency {
    fn from(value: CliFrequency) -> Self {
        match value {
            CliFrequency::Monthly => Frequency::Monthly,
            CliFrequency::Annual => Frequency::Annual,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliGoalType {
    RequiredContribution,
    RequiredPrincipal,
}

impl From<CliGoalType> for GoalType {
    fn from(value: CliGoalType) -> Self {
        match value {
            CliGoalType::RequiredContribution => GoalType::RequiredContribution,
            CliGoalType::RequiredPrincipal => GoalType::RequiredPrincipal,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum ApiFrequency {
    #[serde(alias = "month", alias = "MONTHLY")]
    Monthly,
    #[serde(alias = "yearly", alias = "year", alias = "ANNUAL")]
    Annual,
}

impl From<ApiFrequency> for CliFrequency {
    fn from(value: ApiFrequency) -> Self {
        match value {
            ApiFrequency::Monthly => CliFrequency::Monthly,
            ApiFrequency::Annual => CliFrequency::Annual,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum ApiGoalType {
    #[serde(alias = "requiredContribution", alias = "required_contribution", alias = "contribution")]
    RequiredContribution,
    #[serde(alias = "requiredPrincipal", alias = "required_principal", alias = "principal")]
    RequiredPrincipal,
}

impl From<ApiGoalType> for CliGoalType {
    fn from(value: ApiGoalType) -> Self {
        match value {
            ApiGoalType::RequiredContribution => CliGoalType::RequiredContribution,
            ApiGoalType::RequiredPrincipal => CliGoalType::RequiredPrincipal,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ProjectionPayload {
    principal: Option<f64>,
    contribution: Option<f64>,
    rate_percent: Option<f64>,
    frequency: Option<ApiFrequency>,
    years: Option<i64>,

    target: Option<f64>,
    goal: Option<ApiGoalType>,
    search_min: Option<f64>,
    search_max: Option<f64>,
    tolerance: Option<f64>,
    max_iterations: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ConvertPayload {
    amount: Option<f64>,
    rate: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ProgressPayload {
    accumulated: Option<f64>,
    target: Option<f64>,
}

#[derive(Parser, Debug)]
#[command(
    name = "compound",
    about = "Compound interest projection (lump sum + periodic contributions)"
)]
struct Cli {
    #[arg(long, default_value_t = 100.0, help = "Initial lump sum")]
    principal: f64,
    #[arg(
        long,
        default_value_t = 100.0,
        help = "Monthly contribution; annual frequency pays twelve of these once a year"
    )]
    contribution: f64,
    #[arg(
        long,
        default_value_t = 10.0,
        allow_negative_numbers = true,
        help = "Nominal annual interest rate in percent, e.g. 10"
    )]
    rate: f64,
    #[arg(long, value_enum, default_value_t = CliFrequency::Monthly)]
    frequency: CliFrequency,
    #[arg(long, default_value_t = 5, help = "Projection horizon in years")]
    years: u32,
    #[arg(
        long,
        help = "Target future value; when set, also solve the input needed to reach it"
    )]
    target: Option<f64>,
    #[arg(long, value_enum, default_value_t = CliGoalType::RequiredContribution)]
    goal: CliGoalType,
    #[arg(long, default_value_t = 0.0, help = "Lower bound of the goal search")]
    search_min: f64,
    #[arg(
        long,
        help = "Upper bound of the goal search; defaults to --target, raised when a negative rate shrinks the searched amount"
    )]
    search_max: Option<f64>,
    #[arg(long, default_value_t = 0.01, help = "Goal search tolerance")]
    tolerance: f64,
    #[arg(long, default_value_t = 64)]
    max_iterations: u32,
}

#[derive(Debug)]
struct ApiRequest {
    input: ProjectionInput,
    goal: Option<GoalSolveConfig>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProjectResponse {
    frequency: Frequency,
    years: u32,
    #[serde(flatten)]
    projection: ProjectionResult,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Report {
    projection: ProjectResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    goal: Option<GoalSolveResult>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ConvertResponse {
    amount: f64,
    rate: f64,
    converted: f64,
}

#[derive(Debug, Serialize)]
struct ProgressResponse {
    percent: f64,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn build_input(cli: &Cli) -> Result<ProjectionInput, String> {
    if cli.years == 0 {
        return Err(ProjectionError::invalid("years", InvalidReason::NonPositiveHorizon).to_string());
    }

    Ok(ProjectionInput {
        principal: cli.principal,
        periodic_contribution: cli.contribution,
        annual_rate_percent: cli.rate,
        frequency: cli.frequency.into(),
        years: cli.years,
    })
}

fn build_goal_config(
    cli: &Cli,
    input: &ProjectionInput,
) -> Result<Option<GoalSolveConfig>, String> {
    let Some(target) = cli.target else {
        return Ok(None);
    };
    let goal_type = cli.goal.into();
    let search_max = match cli.search_max {
        Some(v) => v,
        None => default_search_max(input, goal_type, target).map_err(|e| e.to_string())?,
    };
    Ok(Some(GoalSolveConfig {
        goal_type,
        target_future_value: target,
        search_min: cli.search_min,
        search_max,
        tolerance: cli.tolerance,
        max_iterations: cli.max_iterations,
    }))
}

fn build_report(request: &ApiRequest) -> Result<Report, ProjectionError> {
    let projection = project(&request.input)?;
    let goal = match request.goal {
        Some(config) => Some(solve_goal(&request.input, config)?),
        None => None,
    };

    Ok(Report {
        projection: ProjectResponse {
            frequency: request.input.frequency,
            years: request.input.years,
            projection,
        },
        goal,
    })
}

/// Parses command-line arguments and renders the projection report as
/// pretty JSON.
pub fn run_cli<I, T>(args: I) -> Result<String, String>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = Cli::parse_from(args);
    render_cli(&cli)
}

fn render_cli(cli: &Cli) -> Result<String, String> {
    let input = build_input(cli)?;
    let request = ApiRequest {
        input,
        goal: build_goal_config(cli, &input)?,
    };
    let report = build_report(&request).map_err(|e| e.to_string())?;
    serde_json::to_string_pretty(&report).map_err(|e| format!("Failed to encode report: {e}"))
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = Router::new()
        .route(
            "/api/project",
            get(project_get_handler).post(project_post_handler),
        )
        .route(
            "/api/solve",
            get(solve_get_handler).post(solve_post_handler),
        )
        .route("/api/convert", get(convert_handler))
        .route("/api/progress", get(progress_handler))
        .fallback(not_found_handler);

    let listener = TcpListener::bind(addr).await?;
    info!("projection HTTP API listening on http://{addr}");
    info!("local access: http://127.0.0.1:{port}/api/project");

    axum::serve(listener, app).await
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn project_get_handler(Query(payload): Query<ProjectionPayload>) -> Response {
    project_handler_impl(payload).await
}

async fn project_post_handler(Json(payload): Json<ProjectionPayload>) -> Response {
    project_handler_impl(payload).await
}

async fn solve_get_handler(Query(payload): Query<ProjectionPayload>) -> Response {
    solve_handler_impl(payload).await
}

async fn solve_post_handler(Json(payload): Json<ProjectionPayload>) -> Response {
    solve_handler_impl(payload).await
}

async fn project_handler_impl(mut payload: ProjectionPayload) -> Response {
    payload.target = None;
    match report_from_payload(payload) {
        Ok(report) => json_response(StatusCode::OK, report.projection),
        Err(msg) => bad_request(&msg),
    }
}

async fn solve_handler_impl(payload: ProjectionPayload) -> Response {
    if payload.target.is_none() {
        return bad_request("target is required");
    }
    match report_from_payload(payload) {
        Ok(Report {
            goal: Some(goal), ..
        }) => json_response(StatusCode::OK, goal),
        Ok(_) => bad_request("target is required"),
        Err(msg) => bad_request(&msg),
    }
}

fn report_from_payload(payload: ProjectionPayload) -> Result<Report, String> {
    let request = api_request_from_payload(payload)?;
    build_report(&request).map_err(|e| e.to_string())
}

async fn convert_handler(Query(payload): Query<ConvertPayload>) -> Response {
    let Some(amount) = payload.amount else {
        return bad_request("amount is required");
    };
    let Some(rate) = payload.rate else {
        return bad_request("rate is required");
    };
    match convert(amount, rate) {
        Ok(converted) => json_response(
            StatusCode::OK,
            ConvertResponse {
                amount,
                rate,
                converted,
            },
        ),
        Err(err) => bad_request(&err.to_string()),
    }
}

async fn progress_handler(Query(payload): Query<ProgressPayload>) -> Response {
    let percent = goal_progress_percent(
        payload.accumulated.unwrap_or(0.0),
        payload.target.unwrap_or(0.0),
    );
    json_response(StatusCode::OK, ProgressResponse { percent })
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

fn bad_request(msg: &str) -> Response {
    warn!("rejected request: {msg}");
    error_response(StatusCode::BAD_REQUEST, msg)
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

#[cfg(test)]
fn api_request_from_json(json: &str) -> Result<ApiRequest, String> {
    let payload = serde_json::from_str::<ProjectionPayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    api_request_from_payload(payload)
}

fn api_request_from_payload(payload: ProjectionPayload) -> Result<ApiRequest, String> {
    let mut cli = default_cli_for_api();

    if let Some(v) = payload.principal {
        cli.principal = v;
    }
    if let Some(v) = payload.contribution {
        cli.contribution = v;
    }
    if let Some(v) = payload.rate_percent {
        cli.rate = v;
    }
    if let Some(v) = payload.frequency {
        cli.frequency = v.into();
    }
    if let Some(v) = payload.years {
        if v <= 0 {
            return Err(
                ProjectionError::invalid("years", InvalidReason::NonPositiveHorizon).to_string(),
            );
        }
        cli.years = match u32::try_from(v) {
            Ok(years) if years <= MAX_API_YEARS => years,
            _ => return Err(format!("years must be <= {MAX_API_YEARS}")),
        };
    }

    cli.target = payload.target;
    if let Some(v) = payload.goal {
        cli.goal = v.into();
    }
    if let Some(v) = payload.search_min {
        cli.search_min = v;
    }
    cli.search_max = payload.search_max;
    if let Some(v) = payload.tolerance {
        cli.tolerance = v;
    }
    if let Some(v) = payload.max_iterations {
        cli.max_iterations = v;
    }

    let input = build_input(&cli)?;
    Ok(ApiRequest {
        input,
        goal: build_goal_config(&cli, &input)?,
    })
}

fn default_cli_for_api() -> Cli {
    Cli {
        principal: 100.0,
        contribution: 100.0,
        rate: 10.0,
        frequency: CliFrequency::Monthly,
        years: 5,
        target: None,
        goal: CliGoalType::RequiredContribution,
        search_min: 0.0,
        search_max: None,
        tolerance: 0.01,
        max_iterations: 64,
    }
}
