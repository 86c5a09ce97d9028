use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::core::shared::schema::{
    admins, categories, category_samples, operators, organizations, owners, password_codes,
};

#[derive(Debug, Clone, Serialize, Queryable, Selectable)]
#[diesel(table_name = admins)]
pub struct Admin {
    pub id: i32,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Queryable, Selectable)]
#[diesel(table_name = categories)]
pub struct Category {
    pub id: i32,
    pub name: String,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = categories)]
pub struct NewCategory {
    pub name: String,
}

/// Labelled text fed to the classifier when it is retrained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Queryable, Selectable, Insertable)]
#[diesel(table_name = category_samples)]
pub struct CategorySample {
    pub category_id: i32,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Queryable, Selectable)]
#[diesel(table_name = organizations)]
pub struct Organization {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub flats_count: i32,
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
}

#[derive(Debug, Insertable, AsChangeset)]
#[diesel(table_name = organizations)]
pub struct NewOrganization {
    pub name: String,
    pub email: String,
    pub flats_count: i32,
}

/// An operator handles tickets of the categories listed in
/// `responsible_categories` for a single organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Queryable, Selectable)]
#[diesel(table_name = operators)]
pub struct Operator {
    pub id: i32,
    pub organization_id: i32,
    pub phone: String,
    pub name: String,
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    pub responsible_categories: Vec<i32>,
}

impl Operator {
    pub fn is_responsible_for(&self, category_id: i32) -> bool {
        self.responsible_categories.contains(&category_id)
    }
}

#[derive(Debug, Insertable, AsChangeset)]
#[diesel(table_name = operators)]
pub struct NewOperator {
    pub organization_id: i32,
    pub phone: String,
    pub name: String,
    pub responsible_categories: Vec<i32>,
}

#[derive(Debug, Clone, Serialize, Queryable, Selectable)]
#[diesel(table_name = owners)]
pub struct Owner {
    pub id: i32,
    pub organization_id: i32,
    pub phone: String,
    pub name: String,
    pub address: String,
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
}

#[derive(Debug, Insertable, AsChangeset)]
#[diesel(table_name = owners)]
pub struct NewOwner {
    pub organization_id: i32,
    pub phone: String,
    pub name: String,
    pub address: String,
}

#[derive(Debug, Clone, Queryable, Insertable, AsChangeset)]
#[diesel(table_name = password_codes)]
pub struct PasswordCode {
    pub role: String,
    pub login: String,
    pub code: String,
    pub created_at: DateTime<Utc>,
}
