//! Account and reference data managed by admins and organizations.

pub mod admin;
pub mod organization;

use axum::{
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;

use crate::core::shared::state::AppState;
use crate::core::urls::ApiUrls;

pub fn configure() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            ApiUrls::CATEGORIES,
            get(admin::list_categories).post(admin::create_category),
        )
        .route(
            ApiUrls::CATEGORY_BY_ID,
            put(admin::update_category).delete(admin::delete_category),
        )
        .route(
            ApiUrls::CATEGORY_SAMPLES,
            get(admin::list_category_samples).put(admin::replace_category_samples),
        )
        .route(ApiUrls::CLASSIFIER_TRAIN, post(admin::train_classifier))
        .route(ApiUrls::CLASSIFIER_TRAINING, get(admin::classifier_training))
        .route(
            ApiUrls::ORGANIZATIONS,
            get(admin::list_organizations).post(admin::create_organization),
        )
        .route(
            ApiUrls::ORGANIZATION_BY_ID,
            put(admin::update_organization).delete(admin::delete_organization),
        )
        .route(
            ApiUrls::OPERATORS,
            get(organization::list_operators).post(organization::create_operator),
        )
        .route(
            ApiUrls::OPERATOR_BY_ID,
            put(organization::update_operator).delete(organization::delete_operator),
        )
        .route(
            ApiUrls::OWNERS,
            get(organization::list_owners).post(organization::create_owner),
        )
        .route(
            ApiUrls::OWNER_BY_ID,
            put(organization::update_owner).delete(organization::delete_owner),
        )
}
