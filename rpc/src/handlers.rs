//! Request handlers.
//!
//! Store access is synchronous, so every handler moves its work onto the
//! blocking pool and awaits the result.

use std::time::Instant;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use groundtruth_ledger::{ChainAudit, RawSubmission};
use groundtruth_query::{QueryParams, ReportQuery};
use groundtruth_store::LedgerStore;
use groundtruth_types::{
    ActivityEntry, AnalysisSignal, ModerationLogEntry, Report, ReportId, ReportStatus, UserId,
    UserRole, VoteChoice,
};
use groundtruth_verification::{VerificationError, VoteOutcome, VoteSummary};

use crate::{ApiError, AppState};

async fn blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::internal(format!("worker task failed: {e}")))?
}

fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    body.map(|Json(v)| v)
        .map_err(|e| ApiError::bad_request(e.body_text()))
}

/// Optional upstream analyzer output sent alongside a submission.
#[derive(Clone, Debug, Deserialize)]
pub struct RawAnalysis {
    pub confidence: f64,
    pub model: String,
    #[serde(default)]
    pub labels: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct SubmitReportBody {
    #[serde(flatten)]
    pub submission: RawSubmission,
    #[serde(default)]
    pub analysis: Option<RawAnalysis>,
}

pub async fn submit_report<S: LedgerStore + 'static>(
    State(state): State<AppState<S>>,
    body: Result<Json<SubmitReportBody>, JsonRejection>,
) -> Result<(StatusCode, Json<Report>), ApiError> {
    let metrics = state.metrics.clone();
    let outcome = async {
        let body = json_body(body)?;
        let submission = body.submission.validate()?;
        let signal = match body.analysis {
            Some(a) => AnalysisSignal::scored(a.confidence, a.model, a.labels)?,
            None => AnalysisSignal::absent(),
        };
        blocking(move || Ok(state.ledger.submit(submission, signal)?)).await
    }
    .await;

    match outcome {
        Ok(report) => {
            metrics.reports_accepted.inc();
            Ok((StatusCode::CREATED, Json(report)))
        }
        Err(e) => {
            metrics.reports_failed.inc();
            Err(e)
        }
    }
}

pub async fn list_reports<S: LedgerStore + 'static>(
    State(state): State<AppState<S>>,
    params: Result<Query<QueryParams>, QueryRejection>,
) -> Result<Json<Vec<Report>>, ApiError> {
    let Query(params) = params.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let query = ReportQuery::from_params(&params)?;
    let metrics = state.metrics.clone();
    let started = Instant::now();
    let reports = blocking(move || Ok(state.query.query(&query)?)).await?;
    metrics
        .query_latency_ms
        .observe(started.elapsed().as_secs_f64() * 1_000.0);
    metrics.queries_served.inc();
    Ok(Json(reports))
}

pub async fn get_report<S: LedgerStore + 'static>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
) -> Result<Json<Report>, ApiError> {
    let id = ReportId::new(id);
    let report = blocking(move || Ok(state.ledger.get_report(&id)?)).await?;
    Ok(Json(report))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteBody {
    pub user_id: String,
    pub vote: String,
}

pub async fn cast_vote<S: LedgerStore + 'static>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
    body: Result<Json<VoteBody>, JsonRejection>,
) -> Result<(StatusCode, Json<VoteOutcome>), ApiError> {
    let body = json_body(body)?;
    let user_id = UserId::new(body.user_id)?;
    let choice: VoteChoice = body.vote.parse()?;
    let id = ReportId::new(id);
    let metrics = state.metrics.clone();

    let result = blocking(move || {
        state
            .verification
            .cast_vote(&id, user_id, choice)
            .map_err(|e| {
                if matches!(e, VerificationError::DuplicateVote { .. }) {
                    state.metrics.duplicate_votes.inc();
                }
                ApiError::from(e)
            })
    })
    .await?;

    metrics.votes_accepted.inc();
    if result.transitioned {
        metrics.consensus_transitions.inc();
    }
    Ok((StatusCode::CREATED, Json(result)))
}

pub async fn list_votes<S: LedgerStore + 'static>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
) -> Result<Json<VoteSummary>, ApiError> {
    let id = ReportId::new(id);
    let summary = blocking(move || Ok(state.verification.votes(&id)?)).await?;
    Ok(Json(summary))
}

#[derive(Debug, Deserialize)]
pub struct ArchiveBody {
    pub actor: String,
    #[serde(default)]
    pub reason: Option<String>,
}

pub async fn archive_report<S: LedgerStore + 'static>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
    body: Result<Json<ArchiveBody>, JsonRejection>,
) -> Result<Json<Report>, ApiError> {
    let body = json_body(body)?;
    let actor = UserId::new(body.actor)?;
    let id = ReportId::new(id);
    let report =
        blocking(move || Ok(state.ledger.archive(&id, &actor, body.reason)?)).await?;
    Ok(Json(report))
}

#[derive(Debug, Deserialize)]
pub struct StatusBody {
    pub actor: String,
    pub status: String,
}

pub async fn set_status<S: LedgerStore + 'static>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
    body: Result<Json<StatusBody>, JsonRejection>,
) -> Result<Json<Report>, ApiError> {
    let body = json_body(body)?;
    let actor = UserId::new(body.actor)?;
    let status: ReportStatus = body.status.parse()?;
    let id = ReportId::new(id);
    let report = blocking(move || Ok(state.ledger.set_status(&id, status, &actor)?)).await?;
    Ok(Json(report))
}

pub async fn moderation_log<S: LedgerStore + 'static>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<ModerationLogEntry>>, ApiError> {
    let id = ReportId::new(id);
    let entries = blocking(move || {
        state.ledger.get_report(&id)?;
        Ok(state.ledger.moderation_log(Some(&id))?)
    })
    .await?;
    Ok(Json(entries))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserActivity {
    pub user_id: UserId,
    pub role: UserRole,
    pub entries: Vec<ActivityEntry>,
}

pub async fn user_activity<S: LedgerStore + 'static>(
    State(state): State<AppState<S>>,
    Path(user): Path<String>,
) -> Result<Json<UserActivity>, ApiError> {
    let user_id = UserId::new(user)?;
    let activity = blocking(move || {
        Ok(UserActivity {
            role: state.ledger.role_of(&user_id),
            entries: state.ledger.activity_log(&user_id)?,
            user_id,
        })
    })
    .await?;
    Ok(Json(activity))
}

pub async fn verify_chain<S: LedgerStore + 'static>(
    State(state): State<AppState<S>>,
) -> Result<Json<ChainAudit>, ApiError> {
    let audit = blocking(move || Ok(state.ledger.verify_chain()?)).await?;
    Ok(Json(audit))
}

#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
}

pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

pub async fn metrics<S: LedgerStore + 'static>(
    State(state): State<AppState<S>>,
) -> Result<impl IntoResponse, ApiError> {
    let text = state
        .metrics
        .encode()
        .map_err(|e| ApiError::internal(e.to_string()))?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        text,
    ))
}
