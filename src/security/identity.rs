//! Authenticated caller, carried in the access token.

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use super::jwt::extract_bearer_token;
use super::AuthError;
use crate::core::shared::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Organization,
    Operator,
    Owner,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Organization => "organization",
            Role::Operator => "operator",
            Role::Owner => "owner",
        }
    }

    /// Admins and organizations log in by e-mail, operators and owners by phone.
    pub fn logs_in_by_phone(&self) -> bool {
        matches!(self, Role::Operator | Role::Owner)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "organization" => Ok(Role::Organization),
            "operator" => Ok(Role::Operator),
            "owner" => Ok(Role::Owner),
            other => Err(format!("unknown role: {other:?}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Identity {
    Admin { admin_id: i32 },
    Organization { organization_id: i32 },
    Operator { operator_id: i32 },
    Owner { owner_id: i32, organization_id: i32 },
}

impl Identity {
    pub fn role(&self) -> Role {
        match self {
            Identity::Admin { .. } => Role::Admin,
            Identity::Organization { .. } => Role::Organization,
            Identity::Operator { .. } => Role::Operator,
            Identity::Owner { .. } => Role::Owner,
        }
    }

    pub fn account_id(&self) -> i32 {
        match *self {
            Identity::Admin { admin_id } => admin_id,
            Identity::Organization { organization_id } => organization_id,
            Identity::Operator { operator_id } => operator_id,
            Identity::Owner { owner_id, .. } => owner_id,
        }
    }

    pub fn subject(&self) -> String {
        format!("{}:{}", self.role(), self.account_id())
    }

    pub fn require_any_of(&self, roles: &[Role]) -> Result<(), AuthError> {
        if roles.contains(&self.role()) {
            Ok(())
        } else {
            Err(AuthError::Forbidden)
        }
    }

    pub fn require_admin(&self) -> Result<i32, AuthError> {
        match *self {
            Identity::Admin { admin_id } => Ok(admin_id),
            _ => Err(AuthError::Forbidden),
        }
    }

    pub fn require_organization(&self) -> Result<i32, AuthError> {
        match *self {
            Identity::Organization { organization_id } => Ok(organization_id),
            _ => Err(AuthError::Forbidden),
        }
    }

    pub fn require_operator(&self) -> Result<i32, AuthError> {
        match *self {
            Identity::Operator { operator_id } => Ok(operator_id),
            _ => Err(AuthError::Forbidden),
        }
    }

    /// Returns `(owner_id, organization_id)`.
    pub fn require_owner(&self) -> Result<(i32, i32), AuthError> {
        match *self {
            Identity::Owner {
                owner_id,
                organization_id,
            } => Ok((owner_id, organization_id)),
            _ => Err(AuthError::Forbidden),
        }
    }
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for Identity {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(extract_bearer_token)
            .ok_or(AuthError::MissingToken)?;
        state.jwt.validate(token)
    }
}
