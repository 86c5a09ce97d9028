pub mod assignment;
pub mod lifecycle;
pub mod service;
pub mod status;
pub mod storage;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::core::shared::error::{ApiError, StorageError};
use crate::core::shared::state::AppState;
use crate::core::shared::utils::required_field;
use crate::core::urls::ApiUrls;
use crate::security::identity::Identity;
use status::TicketStatus;
use storage::ViewScope;

#[derive(Debug, thiserror::Error)]
pub enum TicketError {
    #[error("cannot move ticket from {from} to {to}")]
    InvalidTransition { from: TicketStatus, to: TicketStatus },
    #[error("{0:?} is not a final status")]
    InvalidStatus(String),
    #[error("ticket {0} not found")]
    NotFound(i32),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl IntoResponse for TicketError {
    fn into_response(self) -> axum::response::Response {
        let message = self.to_string();
        let status = match self {
            Self::Storage(e) => return e.into_response(),
            Self::InvalidTransition { .. } => StatusCode::CONFLICT,
            Self::InvalidStatus(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

/// A maintenance request raised by an owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ticket {
    pub id: i32,
    pub organization_id: i32,
    pub owner_id: i32,
    pub operator_id: Option<i32>,
    pub category_id: Option<i32>,
    pub text: String,
    pub response: Option<String>,
    pub status: TicketStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewTicket {
    pub organization_id: i32,
    pub owner_id: i32,
    pub operator_id: Option<i32>,
    pub category_id: Option<i32>,
    pub text: String,
    pub status: TicketStatus,
    pub created_at: DateTime<Utc>,
}

impl NewTicket {
    pub fn new(organization_id: i32, owner_id: i32, text: impl Into<String>) -> Self {
        Self {
            organization_id,
            owner_id,
            operator_id: None,
            category_id: None,
            text: text.into(),
            status: TicketStatus::New,
            created_at: Utc::now(),
        }
    }
}

/// Ticket joined with the names and contacts shown in listings.
#[derive(Debug, Clone, Serialize)]
pub struct TicketView {
    #[serde(flatten)]
    pub ticket: Ticket,
    pub category_name: Option<String>,
    pub operator_name: Option<String>,
    pub operator_phone: Option<String>,
    pub owner_name: String,
    pub owner_phone: String,
    pub owner_address: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateTicketRequest {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct FinalizeRequest {
    pub status: String,
    #[serde(default)]
    pub response: String,
}

impl FinalizeRequest {
    fn target(&self) -> Result<TicketStatus, TicketError> {
        self.status
            .trim()
            .parse()
            .map_err(|_| TicketError::InvalidStatus(self.status.clone()))
    }
}

pub async fn list_operator_requests(
    State(state): State<Arc<AppState>>,
    identity: Identity,
) -> Result<Json<Vec<TicketView>>, ApiError> {
    let operator_id = identity.require_operator()?;
    let views = state.store.ticket_views(ViewScope::Operator(operator_id)).await?;
    Ok(Json(views))
}

pub async fn claim_request(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Path(id): Path<i32>,
) -> Result<Json<Ticket>, ApiError> {
    let operator_id = identity.require_operator()?;
    let ticket = state.tickets.claim_ticket(operator_id, id).await?;
    Ok(Json(ticket))
}

pub async fn finalize_request(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Path(id): Path<i32>,
    Json(req): Json<FinalizeRequest>,
) -> Result<Json<Ticket>, ApiError> {
    let operator_id = identity.require_operator()?;
    let target = req.target()?;
    let ticket = state
        .tickets
        .finalize_ticket(operator_id, id, target, req.response.trim().to_string())
        .await?;
    Ok(Json(ticket))
}

pub async fn list_owner_requests(
    State(state): State<Arc<AppState>>,
    identity: Identity,
) -> Result<Json<Vec<TicketView>>, ApiError> {
    let (owner_id, _) = identity.require_owner()?;
    let views = state.store.ticket_views(ViewScope::Owner(owner_id)).await?;
    Ok(Json(views))
}

pub async fn create_owner_request(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Json(req): Json<CreateTicketRequest>,
) -> Result<(StatusCode, Json<Ticket>), ApiError> {
    let (owner_id, organization_id) = identity.require_owner()?;
    let text = required_field("text", &req.text).map_err(ApiError::Validation)?;
    let ticket = state
        .tickets
        .create_ticket(organization_id, owner_id, text)
        .await?;
    Ok((StatusCode::CREATED, Json(ticket)))
}

pub fn configure() -> Router<Arc<AppState>> {
    Router::new()
        .route(ApiUrls::OPERATOR_REQUESTS, get(list_operator_requests))
        .route(ApiUrls::OPERATOR_REQUEST_CLAIM, post(claim_request))
        .route(ApiUrls::OPERATOR_REQUEST_FINALIZE, post(finalize_request))
        .route(
            ApiUrls::OWNER_REQUESTS,
            get(list_owner_requests).post(create_owner_request),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_codes() {
        let conflict = TicketError::InvalidTransition {
            from: TicketStatus::Resolved,
            to: TicketStatus::Rejected,
        };
        assert_eq!(conflict.into_response().status(), StatusCode::CONFLICT);
        assert_eq!(
            TicketError::InvalidStatus("new".into()).into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            TicketError::NotFound(9).into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            TicketError::Storage(StorageError::Pool("down".into()))
                .into_response()
                .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_finalize_target_parsing() {
        let req = |status: &str| FinalizeRequest {
            status: status.into(),
            response: String::new(),
        };
        assert_eq!(req(" resolved ").target().unwrap(), TicketStatus::Resolved);

        let err = req("closed").target().unwrap_err();
        assert!(matches!(&err, TicketError::InvalidStatus(s) if s == "closed"));
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_view_flattens_ticket() {
        let view = TicketView {
            ticket: Ticket {
                id: 1,
                organization_id: 2,
                owner_id: 3,
                operator_id: None,
                category_id: None,
                text: "leaking pipe".into(),
                response: None,
                status: TicketStatus::New,
                created_at: Utc::now(),
            },
            category_name: None,
            operator_name: None,
            operator_phone: None,
            owner_name: "Ann".into(),
            owner_phone: "+100".into(),
            owner_address: "Flat 4".into(),
        };
        let value = serde_json::to_value(&view).unwrap();
        assert_eq!(value["status"], "new");
        assert_eq!(value["text"], "leaking pipe");
        assert_eq!(value["owner_name"], "Ann");
    }
}
