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
use crate::core::shared::models::{
    Category, CategorySample, NewCategory, NewOrganization, Organization,
};
use crate::core::shared::schema::{categories, category_samples, organizations};
use crate::core::shared::state::AppState;
use crate::core::shared::utils::{required_field, with_conn};
use crate::security::{Identity, Role};

/// Organizations pick responsible categories for their operators, so they
/// and operators may read the category list.
const CATEGORY_READERS: [Role; 3] = [Role::Admin, Role::Organization, Role::Operator];

#[derive(Debug, Deserialize)]
pub struct CategoryInput {
    pub name: String,
}

impl CategoryInput {
    fn validate(self) -> Result<NewCategory, ApiError> {
        Ok(NewCategory {
            name: required_field("name", &self.name).map_err(ApiError::Validation)?,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct OrganizationInput {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub flats_count: i32,
}

impl OrganizationInput {
    fn validate(self) -> Result<NewOrganization, ApiError> {
        let name = required_field("name", &self.name).map_err(ApiError::Validation)?;
        let email = required_field("email", &self.email).map_err(ApiError::Validation)?;
        if !email.contains('@') {
            return Err(ApiError::Validation(format!("invalid email: {email}")));
        }
        if self.flats_count < 0 {
            return Err(ApiError::Validation(
                "flats_count must not be negative".to_string(),
            ));
        }
        Ok(NewOrganization {
            name,
            email: email.to_lowercase(),
            flats_count: self.flats_count,
        })
    }
}

fn validate_samples(samples: Vec<CategorySample>) -> Result<Vec<CategorySample>, ApiError> {
    samples
        .into_iter()
        .enumerate()
        .map(|(i, sample)| {
            let text = required_field("text", &sample.text)
                .map_err(|e| ApiError::Validation(format!("sample {i}: {e}")))?;
            Ok(CategorySample {
                category_id: sample.category_id,
                text,
            })
        })
        .collect()
}

pub async fn list_categories(
    State(state): State<Arc<AppState>>,
    identity: Identity,
) -> Result<Json<Vec<Category>>, ApiError> {
    identity.require_any_of(&CATEGORY_READERS)?;
    let list = with_conn(&state.conn, |conn| {
        Ok(categories::table
            .order(categories::id)
            .select(Category::as_select())
            .load(conn)?)
    })
    .await?;
    Ok(Json(list))
}

pub async fn create_category(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Json(input): Json<CategoryInput>,
) -> Result<(StatusCode, Json<Category>), ApiError> {
    identity.require_admin()?;
    let new = input.validate()?;
    let category = with_conn(&state.conn, move |conn| {
        Ok(diesel::insert_into(categories::table)
            .values(&new)
            .returning(Category::as_returning())
            .get_result(conn)?)
    })
    .await
    .map_err(ApiError::from_write)?;
    info!("Category {} created: {}", category.id, category.name);
    Ok((StatusCode::CREATED, Json(category)))
}

pub async fn update_category(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Path(id): Path<i32>,
    Json(input): Json<CategoryInput>,
) -> Result<Json<Category>, ApiError> {
    identity.require_admin()?;
    let new = input.validate()?;
    with_conn(&state.conn, move |conn| {
        Ok(diesel::update(categories::table.find(id))
            .set(categories::name.eq(new.name))
            .returning(Category::as_returning())
            .get_result(conn)
            .optional()?)
    })
    .await
    .map_err(ApiError::from_write)?
    .map(Json)
    .ok_or_else(|| ApiError::NotFound(format!("category {id}")))
}

pub async fn delete_category(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    identity.require_admin()?;
    let deleted = with_conn(&state.conn, move |conn| {
        Ok(diesel::delete(categories::table.find(id)).execute(conn)?)
    })
    .await?;
    if deleted == 0 {
        return Err(ApiError::NotFound(format!("category {id}")));
    }
    info!("Category {} deleted", id);
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_category_samples(
    State(state): State<Arc<AppState>>,
    identity: Identity,
) -> Result<Json<Vec<CategorySample>>, ApiError> {
    identity.require_admin()?;
    let samples = with_conn(&state.conn, |conn| {
        Ok(category_samples::table
            .order(category_samples::id)
            .select(CategorySample::as_select())
            .load(conn)?)
    })
    .await?;
    Ok(Json(samples))
}

/// Replaces the whole sample set in one transaction.
pub async fn replace_category_samples(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Json(samples): Json<Vec<CategorySample>>,
) -> Result<StatusCode, ApiError> {
    identity.require_admin()?;
    let samples = validate_samples(samples)?;
    let count = samples.len();
    with_conn(&state.conn, move |conn| {
        conn.transaction(|conn| {
            diesel::delete(category_samples::table).execute(conn)?;
            if !samples.is_empty() {
                diesel::insert_into(category_samples::table)
                    .values(&samples)
                    .execute(conn)?;
            }
            Ok(())
        })
    })
    .await
    .map_err(ApiError::from_write)?;
    info!("Category samples replaced ({} samples)", count);
    Ok(StatusCode::NO_CONTENT)
}

pub async fn train_classifier(
    State(state): State<Arc<AppState>>,
    identity: Identity,
) -> Result<StatusCode, ApiError> {
    identity.require_admin()?;
    let samples = with_conn(&state.conn, |conn| {
        Ok(category_samples::table
            .order(category_samples::id)
            .select(CategorySample::as_select())
            .load(conn)?)
    })
    .await?;
    if samples.is_empty() {
        return Err(ApiError::Validation(
            "no category samples to train on".to_string(),
        ));
    }
    state.classifier.train(&samples).await?;
    info!("Classifier training requested with {} samples", samples.len());
    Ok(StatusCode::ACCEPTED)
}

pub async fn classifier_training(
    State(state): State<Arc<AppState>>,
    identity: Identity,
) -> Result<Json<bool>, ApiError> {
    identity.require_admin()?;
    Ok(Json(state.classifier.is_training().await?))
}

pub async fn list_organizations(
    State(state): State<Arc<AppState>>,
    identity: Identity,
) -> Result<Json<Vec<Organization>>, ApiError> {
    identity.require_admin()?;
    let list = with_conn(&state.conn, |conn| {
        Ok(organizations::table
            .order(organizations::id)
            .select(Organization::as_select())
            .load(conn)?)
    })
    .await?;
    Ok(Json(list))
}

pub async fn create_organization(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Json(input): Json<OrganizationInput>,
) -> Result<(StatusCode, Json<Organization>), ApiError> {
    identity.require_admin()?;
    let new = input.validate()?;
    let org = with_conn(&state.conn, move |conn| {
        Ok(diesel::insert_into(organizations::table)
            .values(&new)
            .returning(Organization::as_returning())
            .get_result(conn)?)
    })
    .await
    .map_err(ApiError::from_write)?;
    info!("Organization {} created: {}", org.id, org.email);
    Ok((StatusCode::CREATED, Json(org)))
}

pub async fn update_organization(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Path(id): Path<i32>,
    Json(input): Json<OrganizationInput>,
) -> Result<Json<Organization>, ApiError> {
    identity.require_admin()?;
    let changes = input.validate()?;
    with_conn(&state.conn, move |conn| {
        Ok(diesel::update(organizations::table.find(id))
            .set(&changes)
            .returning(Organization::as_returning())
            .get_result(conn)
            .optional()?)
    })
    .await
    .map_err(ApiError::from_write)?
    .map(Json)
    .ok_or_else(|| ApiError::NotFound(format!("organization {id}")))
}

pub async fn delete_organization(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    identity.require_admin()?;
    let deleted = with_conn(&state.conn, move |conn| {
        Ok(diesel::delete(organizations::table.find(id)).execute(conn)?)
    })
    .await?;
    if deleted == 0 {
        return Err(ApiError::NotFound(format!("organization {id}")));
    }
    info!("Organization {} deleted", id);
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_list_readers() {
        assert!(Identity::Admin { admin_id: 1 }.require_any_of(&CATEGORY_READERS).is_ok());
        assert!(Identity::Organization { organization_id: 3 }
            .require_any_of(&CATEGORY_READERS)
            .is_ok());
        assert!(Identity::Operator { operator_id: 42 }
            .require_any_of(&CATEGORY_READERS)
            .is_ok());
        assert!(Identity::Owner {
            owner_id: 5,
            organization_id: 3
        }
        .require_any_of(&CATEGORY_READERS)
        .is_err());
    }

    #[test]
    fn test_category_name_is_trimmed() {
        let new = CategoryInput {
            name: "  Plumbing ".into(),
        }
        .validate()
        .unwrap();
        assert_eq!(new.name, "Plumbing");
        assert!(CategoryInput { name: " ".into() }.validate().is_err());
    }

    #[test]
    fn test_organization_validation() {
        let org = OrganizationInput {
            name: "Green Yard".into(),
            email: " Office@GreenYard.example ".into(),
            flats_count: 120,
        }
        .validate()
        .unwrap();
        assert_eq!(org.email, "office@greenyard.example");

        assert!(OrganizationInput {
            name: "Green Yard".into(),
            email: "no-at-sign".into(),
            flats_count: 1,
        }
        .validate()
        .is_err());

        assert!(OrganizationInput {
            name: "Green Yard".into(),
            email: "a@b.c".into(),
            flats_count: -1,
        }
        .validate()
        .is_err());
    }

    #[test]
    fn test_blank_sample_is_rejected_with_index() {
        let err = validate_samples(vec![
            CategorySample {
                category_id: 1,
                text: "no hot water".into(),
            },
            CategorySample {
                category_id: 2,
                text: "   ".into(),
            },
        ])
        .unwrap_err();
        assert!(matches!(err, ApiError::Validation(msg) if msg.starts_with("sample 1")));
    }
}
