use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::dsl::{self, Filter};
use diesel::pg::Pg;
use diesel::prelude::*;

use super::status::TicketStatus;
use super::{NewTicket, Ticket, TicketView};
use crate::core::shared::error::StorageError;
use crate::core::shared::models::Operator;
use crate::core::shared::schema::{categories, operators, owners, requests};
use crate::core::shared::utils::{with_conn, DbPool};

#[async_trait]
pub trait TicketStore: Send + Sync {
    async fn insert_ticket(&self, ticket: NewTicket) -> Result<Ticket, StorageError>;

    /// Looks a ticket up on behalf of an operator. Tickets assigned to anyone
    /// else are reported as absent.
    async fn operator_ticket(
        &self,
        operator_id: i32,
        ticket_id: i32,
    ) -> Result<Option<Ticket>, StorageError>;

    /// Moves the ticket from `expected` to `next` in one atomic step,
    /// writing `response` alongside when given. `None` means the persisted
    /// status was no longer `expected` (or the ticket is not the operator's)
    /// and nothing was written.
    async fn compare_and_set_status(
        &self,
        operator_id: i32,
        ticket_id: i32,
        expected: TicketStatus,
        next: TicketStatus,
        response: Option<String>,
    ) -> Result<Option<Ticket>, StorageError>;
}

#[async_trait]
pub trait OperatorDirectory: Send + Sync {
    async fn find_responsible_operators(
        &self,
        organization_id: i32,
        category_id: i32,
    ) -> Result<Vec<Operator>, StorageError>;
}

#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = requests)]
struct TicketRow {
    id: i32,
    organization_id: i32,
    owner_id: i32,
    operator_id: Option<i32>,
    category_id: Option<i32>,
    text: String,
    response: Option<String>,
    status: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<TicketRow> for Ticket {
    type Error = StorageError;

    fn try_from(row: TicketRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse()
            .map_err(|e| StorageError::Corrupt(format!("request {}: {e}", row.id)))?;
        Ok(Ticket {
            id: row.id,
            organization_id: row.organization_id,
            owner_id: row.owner_id,
            operator_id: row.operator_id,
            category_id: row.category_id,
            text: row.text,
            response: row.response,
            status,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = requests)]
struct NewTicketRow<'a> {
    organization_id: i32,
    owner_id: i32,
    operator_id: Option<i32>,
    category_id: Option<i32>,
    text: &'a str,
    status: &'static str,
    created_at: DateTime<Utc>,
}

type TicketViewRow = (
    TicketRow,
    Option<String>,
    Option<String>,
    Option<String>,
    String,
    String,
    String,
);

type StatusGuard = Filter<
    Filter<
        Filter<requests::table, dsl::Eq<requests::id, i32>>,
        dsl::Eq<requests::operator_id, i32>,
    >,
    dsl::Eq<requests::status, &'static str>,
>;

/// Rows an operator may move out of `expected`. An UPDATE on this target is
/// the compare-and-set that makes a claim happen at most once.
fn status_guard(operator_id: i32, ticket_id: i32, expected: TicketStatus) -> StatusGuard {
    requests::table
        .filter(requests::id.eq(ticket_id))
        .filter(requests::operator_id.eq(operator_id))
        .filter(requests::status.eq(expected.as_str()))
}

fn responsible_operators(
    organization_id: i32,
    category_id: i32,
) -> operators::BoxedQuery<'static, Pg> {
    operators::table
        .filter(operators::organization_id.eq(organization_id))
        .filter(operators::responsible_categories.contains(vec![category_id]))
        .into_boxed()
}

/// Whose tickets a listing shows.
#[derive(Debug, Clone, Copy)]
pub enum ViewScope {
    Operator(i32),
    Owner(i32),
}

/// Postgres-backed ticket store and operator directory.
#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Tickets with category, operator and owner details, newest first.
    pub async fn ticket_views(&self, scope: ViewScope) -> Result<Vec<TicketView>, StorageError> {
        with_conn(&self.pool, move |conn| {
            let query = requests::table
                .left_join(categories::table)
                .left_join(operators::table)
                .inner_join(owners::table)
                .select((
                    TicketRow::as_select(),
                    categories::name.nullable(),
                    operators::name.nullable(),
                    operators::phone.nullable(),
                    owners::name,
                    owners::phone,
                    owners::address,
                ))
                .order(requests::created_at.desc())
                .into_boxed();

            let query = match scope {
                ViewScope::Operator(operator_id) => {
                    query.filter(requests::operator_id.eq(operator_id))
                }
                ViewScope::Owner(owner_id) => query.filter(requests::owner_id.eq(owner_id)),
            };

            let rows: Vec<TicketViewRow> = query.load(conn)?;

            rows.into_iter()
                .map(|(ticket, category, op_name, op_phone, name, phone, address)| {
                    Ok(TicketView {
                        ticket: Ticket::try_from(ticket)?,
                        category_name: category,
                        operator_name: op_name,
                        operator_phone: op_phone,
                        owner_name: name,
                        owner_phone: phone,
                        owner_address: address,
                    })
                })
                .collect()
        })
        .await
    }
}

#[async_trait]
impl TicketStore for PgStore {
    async fn insert_ticket(&self, ticket: NewTicket) -> Result<Ticket, StorageError> {
        with_conn(&self.pool, move |conn| {
            let row: TicketRow = diesel::insert_into(requests::table)
                .values(&NewTicketRow {
                    organization_id: ticket.organization_id,
                    owner_id: ticket.owner_id,
                    operator_id: ticket.operator_id,
                    category_id: ticket.category_id,
                    text: &ticket.text,
                    status: ticket.status.as_str(),
                    created_at: ticket.created_at,
                })
                .returning(TicketRow::as_returning())
                .get_result(conn)?;
            Ticket::try_from(row)
        })
        .await
    }

    async fn operator_ticket(
        &self,
        operator_id: i32,
        ticket_id: i32,
    ) -> Result<Option<Ticket>, StorageError> {
        with_conn(&self.pool, move |conn| {
            let row: Option<TicketRow> = requests::table
                .filter(requests::id.eq(ticket_id))
                .filter(requests::operator_id.eq(operator_id))
                .select(TicketRow::as_select())
                .first(conn)
                .optional()?;
            row.map(Ticket::try_from).transpose()
        })
        .await
    }

    async fn compare_and_set_status(
        &self,
        operator_id: i32,
        ticket_id: i32,
        expected: TicketStatus,
        next: TicketStatus,
        response: Option<String>,
    ) -> Result<Option<Ticket>, StorageError> {
        with_conn(&self.pool, move |conn| {
            let target = status_guard(operator_id, ticket_id, expected);

            let row: Option<TicketRow> = match response {
                Some(response) => diesel::update(target)
                    .set((
                        requests::status.eq(next.as_str()),
                        requests::response.eq(Some(response)),
                    ))
                    .returning(TicketRow::as_returning())
                    .get_result(conn)
                    .optional()?,
                None => diesel::update(target)
                    .set(requests::status.eq(next.as_str()))
                    .returning(TicketRow::as_returning())
                    .get_result(conn)
                    .optional()?,
            };
            row.map(Ticket::try_from).transpose()
        })
        .await
    }
}

#[async_trait]
impl OperatorDirectory for PgStore {
    async fn find_responsible_operators(
        &self,
        organization_id: i32,
        category_id: i32,
    ) -> Result<Vec<Operator>, StorageError> {
        with_conn(&self.pool, move |conn| {
            let found = responsible_operators(organization_id, category_id)
                .select(Operator::as_select())
                .load(conn)?;
            Ok(found)
        })
        .await
    }
}
