use diesel::prelude::*;
use serde::Serialize;

use crate::core::shared::models::{Admin, Operator, Organization, Owner};
use crate::core::shared::schema::{admins, operators, organizations, owners};
use crate::security::{Identity, Role};

/// Any account that can log in, tagged by role when serialized.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Account {
    Admin(Admin),
    Organization(Organization),
    Operator(Operator),
    Owner(Owner),
}

/// Where a password reset code is delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Contact {
    Email(String),
    Phone(String),
}

impl Account {
    pub fn role(&self) -> Role {
        match self {
            Account::Admin(_) => Role::Admin,
            Account::Organization(_) => Role::Organization,
            Account::Operator(_) => Role::Operator,
            Account::Owner(_) => Role::Owner,
        }
    }

    /// E-mail for admins and organizations, phone for operators and owners.
    pub fn login(&self) -> &str {
        match self {
            Account::Admin(a) => &a.email,
            Account::Organization(o) => &o.email,
            Account::Operator(o) => &o.phone,
            Account::Owner(o) => &o.phone,
        }
    }

    pub fn contact(&self) -> Contact {
        match self {
            Account::Admin(a) => Contact::Email(a.email.clone()),
            Account::Organization(o) => Contact::Email(o.email.clone()),
            Account::Operator(o) => Contact::Phone(o.phone.clone()),
            Account::Owner(o) => Contact::Phone(o.phone.clone()),
        }
    }

    pub fn password_hash(&self) -> Option<&str> {
        match self {
            Account::Admin(a) => a.password_hash.as_deref(),
            Account::Organization(o) => o.password_hash.as_deref(),
            Account::Operator(o) => o.password_hash.as_deref(),
            Account::Owner(o) => o.password_hash.as_deref(),
        }
    }

    pub fn identity(&self) -> Identity {
        match self {
            Account::Admin(a) => Identity::Admin { admin_id: a.id },
            Account::Organization(o) => Identity::Organization {
                organization_id: o.id,
            },
            Account::Operator(o) => Identity::Operator { operator_id: o.id },
            Account::Owner(o) => Identity::Owner {
                owner_id: o.id,
                organization_id: o.organization_id,
            },
        }
    }
}

pub fn find_account(
    conn: &mut PgConnection,
    role: Role,
    login: &str,
) -> QueryResult<Option<Account>> {
    match role {
        Role::Admin => admins::table
            .filter(admins::email.eq(login))
            .select(Admin::as_select())
            .first(conn)
            .optional()
            .map(|a| a.map(Account::Admin)),
        Role::Organization => organizations::table
            .filter(organizations::email.eq(login))
            .select(Organization::as_select())
            .first(conn)
            .optional()
            .map(|o| o.map(Account::Organization)),
        Role::Operator => operators::table
            .filter(operators::phone.eq(login))
            .select(Operator::as_select())
            .first(conn)
            .optional()
            .map(|o| o.map(Account::Operator)),
        Role::Owner => owners::table
            .filter(owners::phone.eq(login))
            .select(Owner::as_select())
            .first(conn)
            .optional()
            .map(|o| o.map(Account::Owner)),
    }
}

pub fn find_account_by_identity(
    conn: &mut PgConnection,
    identity: &Identity,
) -> QueryResult<Option<Account>> {
    match *identity {
        Identity::Admin { admin_id } => admins::table
            .find(admin_id)
            .select(Admin::as_select())
            .first(conn)
            .optional()
            .map(|a| a.map(Account::Admin)),
        Identity::Organization { organization_id } => organizations::table
            .find(organization_id)
            .select(Organization::as_select())
            .first(conn)
            .optional()
            .map(|o| o.map(Account::Organization)),
        Identity::Operator { operator_id } => operators::table
            .find(operator_id)
            .select(Operator::as_select())
            .first(conn)
            .optional()
            .map(|o| o.map(Account::Operator)),
        Identity::Owner { owner_id, .. } => owners::table
            .find(owner_id)
            .select(Owner::as_select())
            .first(conn)
            .optional()
            .map(|o| o.map(Account::Owner)),
    }
}

pub fn set_password_hash(
    conn: &mut PgConnection,
    account: &Account,
    hash: &str,
) -> QueryResult<usize> {
    match account {
        Account::Admin(a) => diesel::update(admins::table.find(a.id))
            .set(admins::password_hash.eq(Some(hash)))
            .execute(conn),
        Account::Organization(o) => diesel::update(organizations::table.find(o.id))
            .set(organizations::password_hash.eq(Some(hash)))
            .execute(conn),
        Account::Operator(o) => diesel::update(operators::table.find(o.id))
            .set(operators::password_hash.eq(Some(hash)))
            .execute(conn),
        Account::Owner(o) => diesel::update(owners::table.find(o.id))
            .set(owners::password_hash.eq(Some(hash)))
            .execute(conn),
    }
}
