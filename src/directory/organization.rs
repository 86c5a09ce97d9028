use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use diesel::prelude::*;
use log::info;
use serde::Deserialize;
use std::sync::Arc;

use crate::core::shared::error::ApiError;
use crate::core::shared::models::{NewOperator, NewOwner, Operator, Owner};
use crate::core::shared::schema::{operators, owners};
use crate::core::shared::state::AppState;
use crate::core::shared::utils::{required_field, with_conn};
use crate::security::Identity;

#[derive(Debug, Deserialize)]
pub struct OperatorInput {
    pub phone: String,
    pub name: String,
    #[serde(default)]
    pub responsible_categories: Vec<i32>,
}

impl OperatorInput {
    fn validate(self, organization_id: i32) -> Result<NewOperator, ApiError> {
        let mut responsible_categories = self.responsible_categories;
        responsible_categories.sort_unstable();
        responsible_categories.dedup();
        Ok(NewOperator {
            organization_id,
            phone: normalize_phone(&self.phone)?,
            name: required_field("name", &self.name).map_err(ApiError::Validation)?,
            responsible_categories,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct OwnerInput {
    pub phone: String,
    pub name: String,
    pub address: String,
}

impl OwnerInput {
    fn validate(self, organization_id: i32) -> Result<NewOwner, ApiError> {
        Ok(NewOwner {
            organization_id,
            phone: normalize_phone(&self.phone)?,
            name: required_field("name", &self.name).map_err(ApiError::Validation)?,
            address: required_field("address", &self.address).map_err(ApiError::Validation)?,
        })
    }
}

/// Strips spaces, dashes and parentheses. Phones are logins, so they must be
/// stored in one canonical form.
pub(crate) fn normalize_phone(raw: &str) -> Result<String, ApiError> {
    let phone: String = raw
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '(' | ')'))
        .collect();
    let digits = phone.strip_prefix('+').unwrap_or(&phone);
    if digits.len() < 5 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(ApiError::Validation(format!("invalid phone: {raw:?}")));
    }
    Ok(phone)
}

pub async fn list_operators(
    State(state): State<Arc<AppState>>,
    identity: Identity,
) -> Result<Json<Vec<Operator>>, ApiError> {
    let organization_id = identity.require_organization()?;
    let list = with_conn(&state.conn, move |conn| {
        Ok(operators::table
            .filter(operators::organization_id.eq(organization_id))
            .order(operators::id)
            .select(Operator::as_select())
            .load(conn)?)
    })
    .await?;
    Ok(Json(list))
}

pub async fn create_operator(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Json(input): Json<OperatorInput>,
) -> Result<(StatusCode, Json<Operator>), ApiError> {
    let organization_id = identity.require_organization()?;
    let new = input.validate(organization_id)?;
    let operator = with_conn(&state.conn, move |conn| {
        Ok(diesel::insert_into(operators::table)
            .values(&new)
            .returning(Operator::as_returning())
            .get_result(conn)?)
    })
    .await
    .map_err(ApiError::from_write)?;
    info!(
        "Operator {} created in organization {}",
        operator.id, organization_id
    );
    Ok((StatusCode::CREATED, Json(operator)))
}

pub async fn update_operator(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Path(id): Path<i32>,
    Json(input): Json<OperatorInput>,
) -> Result<Json<Operator>, ApiError> {
    let organization_id = identity.require_organization()?;
    let changes = input.validate(organization_id)?;
    with_conn(&state.conn, move |conn| {
        Ok(diesel::update(
            operators::table
                .filter(operators::id.eq(id))
                .filter(operators::organization_id.eq(organization_id)),
        )
        .set(&changes)
        .returning(Operator::as_returning())
        .get_result(conn)
        .optional()?)
    })
    .await
    .map_err(ApiError::from_write)?
    .map(Json)
    .ok_or_else(|| ApiError::NotFound(format!("operator {id}")))
}

pub async fn delete_operator(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    let organization_id = identity.require_organization()?;
    let deleted = with_conn(&state.conn, move |conn| {
        Ok(diesel::delete(
            operators::table
                .filter(operators::id.eq(id))
                .filter(operators::organization_id.eq(organization_id)),
        )
        .execute(conn)?)
    })
    .await?;
    if deleted == 0 {
        return Err(ApiError::NotFound(format!("operator {id}")));
    }
    info!("Operator {} deleted from organization {}", id, organization_id);
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_owners(
    State(state): State<Arc<AppState>>,
    identity: Identity,
) -> Result<Json<Vec<Owner>>, ApiError> {
    let organization_id = identity.require_organization()?;
    let list = with_conn(&state.conn, move |conn| {
        Ok(owners::table
            .filter(owners::organization_id.eq(organization_id))
            .order(owners::id)
            .select(Owner::as_select())
            .load(conn)?)
    })
    .await?;
    Ok(Json(list))
}

pub async fn create_owner(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Json(input): Json<OwnerInput>,
) -> Result<(StatusCode, Json<Owner>), ApiError> {
    let organization_id = identity.require_organization()?;
    let new = input.validate(organization_id)?;
    let owner = with_conn(&state.conn, move |conn| {
        Ok(diesel::insert_into(owners::table)
            .values(&new)
            .returning(Owner::as_returning())
            .get_result(conn)?)
    })
    .await
    .map_err(ApiError::from_write)?;
    info!("Owner {} created in organization {}", owner.id, organization_id);
    Ok((StatusCode::CREATED, Json(owner)))
}

pub async fn update_owner(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Path(id): Path<i32>,
    Json(input): Json<OwnerInput>,
) -> Result<Json<Owner>, ApiError> {
    let organization_id = identity.require_organization()?;
    let changes = input.validate(organization_id)?;
    with_conn(&state.conn, move |conn| {
        Ok(diesel::update(
            owners::table
                .filter(owners::id.eq(id))
                .filter(owners::organization_id.eq(organization_id)),
        )
        .set(&changes)
        .returning(Owner::as_returning())
        .get_result(conn)
        .optional()?)
    })
    .await
    .map_err(ApiError::from_write)?
    .map(Json)
    .ok_or_else(|| ApiError::NotFound(format!("owner {id}")))
}

pub async fn delete_owner(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    let organization_id = identity.require_organization()?;
    let deleted = with_conn(&state.conn, move |conn| {
        Ok(diesel::delete(
            owners::table
                .filter(owners::id.eq(id))
                .filter(owners::organization_id.eq(organization_id)),
        )
        .execute(conn)?)
    })
    .await?;
    if deleted == 0 {
        return Err(ApiError::NotFound(format!("owner {id}")));
    }
    info!("Owner {} deleted from organization {}", id, organization_id);
    Ok(StatusCode::NO_CONTENT)
}
