mod form;
mod session;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router,
    extract::{Json, Query, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

use crate::advice::{AdviceError, AdviceSession};
use crate::core::{Field, FinancialSnapshot, PlanningInputs, ProjectionResult, ValidationErrors};

pub use form::{RawValue, assign, parse_or_default};
pub use session::{
    AdviceState, MAX_PROJECTION_YEARS, PlannerSession, evaluate_for_display, validate_for_display,
};

const INDEX_HTML: &str = include_str!("../../web/index.html");
const STYLES_CSS: &str = include_str!("../../web/styles.css");
const APP_JS: &str = include_str!("../../web/app.js");

#[derive(Clone)]
pub struct AppState {
    advice: Arc<AdviceSession>,
}

impl AppState {
    pub fn new(advice: AdviceSession) -> Self {
        Self {
            advice: Arc::new(advice),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct PlannerPayload {
    current_age: Option<RawValue>,
    retirement_age: Option<RawValue>,
    current_savings: Option<RawValue>,
    monthly_contribution: Option<RawValue>,
    expected_return: Option<RawValue>,
    inflation_rate: Option<RawValue>,
    retirement_expenses: Option<RawValue>,
    social_security: Option<RawValue>,
    safe_withdrawal_rate: Option<RawValue>,
    snapshot: Option<FinancialSnapshot>,
}

impl PlannerPayload {
    fn fields(&self) -> [(Field, Option<&RawValue>); 9] {
        [
            (Field::CurrentAge, self.current_age.as_ref()),
            (Field::RetirementAge, self.retirement_age.as_ref()),
            (Field::CurrentSavings, self.current_savings.as_ref()),
            (Field::MonthlyContribution, self.monthly_contribution.as_ref()),
            (Field::ExpectedReturn, self.expected_return.as_ref()),
            (Field::InflationRate, self.inflation_rate.as_ref()),
            (Field::RetirementExpenses, self.retirement_expenses.as_ref()),
            (Field::SocialSecurity, self.social_security.as_ref()),
            (Field::SafeWithdrawalRate, self.safe_withdrawal_rate.as_ref()),
        ]
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProjectResponse {
    inputs: PlanningInputs,
    result: ProjectionResult,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AdviceResponse {
    provider: String,
    result: ProjectionResult,
    advice: Option<String>,
    advice_error: Option<String>,
}

#[derive(Debug, Serialize)]
struct ValidationResponse<'a> {
    errors: &'a ValidationErrors,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn session_from_payload(payload: PlannerPayload) -> PlannerSession {
    let mut session = PlannerSession::default();
    for (field, raw) in payload.fields() {
        if let Some(raw) = raw {
            session.set_field(field, raw);
        }
    }
    session.set_snapshot(payload.snapshot);
    session
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/index.html", get(index_handler))
        .route("/styles.css", get(styles_handler))
        .route("/app.js", get(app_js_handler))
        .route(
            "/api/project",
            get(project_get_handler).post(project_post_handler),
        )
        .route("/api/advice", post(advice_handler))
        .route("/api/advice/cancel", post(advice_cancel_handler))
        .fallback(not_found_handler)
        .with_state(state)
}

pub async fn run_http_server(addr: SocketAddr, state: AppState) -> std::io::Result<()> {
    let provider = state.advice.provider_name().to_string();
    let app = router(state);

    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, advisor = %provider, "retirement planner listening");
    tracing::info!("local access: http://127.0.0.1:{}/", addr.port());

    axum::serve(listener, app).await
}

async fn index_handler() -> impl IntoResponse {
    with_cache_control(Html(INDEX_HTML))
}

async fn styles_handler() -> impl IntoResponse {
    with_cache_control((
        [(header::CONTENT_TYPE, "text/css; charset=utf-8")],
        STYLES_CSS,
    ))
}

async fn app_js_handler() -> impl IntoResponse {
    with_cache_control((
        [(
            header::CONTENT_TYPE,
            "application/javascript; charset=utf-8",
        )],
        APP_JS,
    ))
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn project_get_handler(Query(payload): Query<PlannerPayload>) -> Response {
    project_handler_impl(payload)
}

async fn project_post_handler(Json(payload): Json<PlannerPayload>) -> Response {
    project_handler_impl(payload)
}

fn project_handler_impl(payload: PlannerPayload) -> Response {
    let session = session_from_payload(payload);
    match session.evaluate() {
        Ok(result) => json_response(
            StatusCode::OK,
            ProjectResponse {
                inputs: session.effective_inputs(),
                result,
            },
        ),
        Err(errors) => validation_response(&errors),
    }
}

async fn advice_handler(
    State(state): State<AppState>,
    Json(payload): Json<PlannerPayload>,
) -> Response {
    let mut session = session_from_payload(payload);
    let (prompt, result) = match session.advice_prompt() {
        Ok(rendered) => rendered,
        Err(errors) => return validation_response(&errors),
    };

    session.begin_advice();
    match state.advice.request(&prompt).await {
        Err(AdviceError::InFlight) => {
            return error_response(
                StatusCode::CONFLICT,
                &AdviceError::InFlight.user_message(),
            );
        }
        outcome => session.finish_advice(outcome),
    }

    json_response(
        StatusCode::OK,
        AdviceResponse {
            provider: state.advice.provider_name().to_string(),
            result,
            advice: session.advice().text().map(str::to_string),
            advice_error: session.advice().failure().map(str::to_string),
        },
    )
}

async fn advice_cancel_handler(State(state): State<AppState>) -> Response {
    if state.advice.cancel() {
        tracing::info!("advice request cancelled by caller");
    }
    StatusCode::NO_CONTENT.into_response()
}

fn with_cache_control<R: IntoResponse>(response: R) -> Response {
    let mut response = response.into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    with_cache_control((status, Json(body)))
}

fn validation_response(errors: &ValidationErrors) -> Response {
    tracing::debug!(%errors, "rejected planning inputs");
    json_response(
        StatusCode::UNPROCESSABLE_ENTITY,
        ValidationResponse { errors },
    )
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}
