use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::header,
    response::{IntoResponse, Response},
    Extension, Json,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::analytics::{Dimension, ReportPeriod, UsageFilter};
use crate::auth::Claims;
use crate::errors::AppError;
use crate::handlers::AppState;
use crate::models::{CostReport, DailyCostPoint, ForecastResult, UsageRecord};

#[derive(Debug, Deserialize)]
pub struct CostQueryParams {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub range: Option<String>,
    pub team_id: Option<Uuid>,
    pub project_id: Option<Uuid>,
    pub dimension: Option<String>,
}

impl CostQueryParams {
    /// Unwraps the query string, reporting malformed values in the API's
    /// error body rather than axum's plain-text rejection.
    fn from_query(query: Result<Query<Self>, QueryRejection>) -> Result<Self, AppError> {
        query
            .map(|Query(params)| params)
            .map_err(|rejection| AppError::bad_request(rejection.body_text()))
    }

    /// Builds the ledger scope for the caller. Members are pinned to their
    /// own team; admins may pick any team or none.
    fn filter(&self, claims: &Claims) -> Result<UsageFilter, AppError> {
        let period = match (self.start_date, self.end_date, self.range.as_deref()) {
            (Some(start), Some(end), _) => ReportPeriod::from_dates(start, end)?,
            (None, None, Some(range)) => ReportPeriod::preset(range, Utc::now().date_naive())?,
            (None, None, None) => {
                return Err(AppError::bad_request(
                    "Either start_date and end_date or range is required",
                ))
            }
            _ => return Err(AppError::bad_request("start_date and end_date must be given together")),
        };

        let team_id = if claims.is_admin() {
            self.team_id
        } else {
            match self.team_id {
                Some(team) if team != claims.team_id => {
                    return Err(AppError::forbidden("Cannot read costs of another team"))
                }
                _ => Some(claims.team_id),
            }
        };

        Ok(UsageFilter::new(period)
            .with_team(team_id)
            .with_project(self.project_id))
    }
}

pub async fn get_report(
    State(state): State<AppState>,
    query: Result<Query<CostQueryParams>, QueryRejection>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<CostReport>, AppError> {
    let filter = CostQueryParams::from_query(query)?.filter(&claims)?;
    let report = state.analyzer.generate_cost_report(&filter).await?;
    Ok(Json(report))
}

pub async fn get_forecast(
    State(state): State<AppState>,
    query: Result<Query<CostQueryParams>, QueryRejection>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<ForecastResult>, AppError> {
    let filter = CostQueryParams::from_query(query)?.filter(&claims)?;
    let forecast = state.analyzer.forecast(&filter).await?;
    Ok(Json(forecast))
}

pub async fn get_trends(
    State(state): State<AppState>,
    query: Result<Query<CostQueryParams>, QueryRejection>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<DailyCostPoint>>, AppError> {
    let filter = CostQueryParams::from_query(query)?.filter(&claims)?;
    let trends = state.analyzer.trends(&filter).await?;
    Ok(Json(trends))
}

pub async fn get_breakdown(
    State(state): State<AppState>,
    query: Result<Query<CostQueryParams>, QueryRejection>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<serde_json::Value>, AppError> {
    let params = CostQueryParams::from_query(query)?;
    let filter = params.filter(&claims)?;
    let name = params.dimension.as_deref().unwrap_or("service");
    let dimension = Dimension::parse(name).ok_or_else(|| {
        AppError::bad_request(format!(
            "Unknown dimension '{name}', expected service, project, region or team"
        ))
    })?;

    let breakdown = state.analyzer.breakdown(&filter, dimension).await?;

    Ok(Json(serde_json::json!({
        "dimension": name,
        "items": breakdown.items,
        "total": breakdown.total,
    })))
}

pub async fn export_csv(
    State(state): State<AppState>,
    query: Result<Query<CostQueryParams>, QueryRejection>,
    Extension(claims): Extension<Claims>,
) -> Result<Response, AppError> {
    let filter = CostQueryParams::from_query(query)?.filter(&claims)?;
    let records = state.analyzer.export_records(&filter).await?;
    let csv = write_csv(&records).map_err(|e| {
        tracing::error!("CSV export failed: {:?}", e);
        AppError::internal("Failed to write CSV export")
    })?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv"),
            (header::CONTENT_DISPOSITION, "attachment; filename=usage.csv"),
        ],
        csv,
    )
        .into_response())
}

fn write_csv(records: &[UsageRecord]) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["created_at", "service", "amount", "quantity", "region", "team_id", "project_id"])?;
    for r in records {
        wtr.write_record([
            r.created_at.to_rfc3339(),
            r.service.to_string(),
            r.amount.to_string(),
            r.quantity.to_string(),
            r.region.clone(),
            r.team_id.to_string(),
            r.project_id.to_string(),
        ])?;
    }
    let data = wtr.into_inner().map_err(|e| anyhow::anyhow!("CSV writer error: {e}"))?;
    Ok(String::from_utf8(data)?)
}
