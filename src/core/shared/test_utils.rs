use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Mutex;
use std::time::Duration;

use crate::classifier::{Classifier, ClassifierError};
use crate::core::shared::error::StorageError;
use crate::core::shared::models::{CategorySample, Operator};
use crate::tickets::status::TicketStatus;
use crate::tickets::storage::{OperatorDirectory, TicketStore};
use crate::tickets::{NewTicket, Ticket};

pub fn operator(id: i32, organization_id: i32, categories: &[i32]) -> Operator {
    Operator {
        id,
        organization_id,
        phone: format!("+7900000{id:04}"),
        name: format!("Operator {id}"),
        password_hash: None,
        responsible_categories: categories.to_vec(),
    }
}

#[derive(Default)]
struct MemoryState {
    next_id: i32,
    tickets: BTreeMap<i32, Ticket>,
}

/// Ticket store and operator directory held in memory. The lock is held
/// across each compare-and-set, so it linearizes claims like the SQL update.
#[derive(Default)]
pub struct MemoryStore {
    operators: Vec<Operator>,
    state: Mutex<MemoryState>,
    fail_inserts: bool,
}

impl MemoryStore {
    pub fn with_operators(operators: Vec<Operator>) -> Self {
        Self {
            operators,
            ..Self::default()
        }
    }

    pub fn failing_inserts() -> Self {
        Self {
            fail_inserts: true,
            ..Self::default()
        }
    }

    pub fn ticket(&self, id: i32) -> Option<Ticket> {
        self.lock().tickets.get(&id).cloned()
    }

    pub fn ticket_count(&self) -> usize {
        self.lock().tickets.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl TicketStore for MemoryStore {
    async fn insert_ticket(&self, ticket: NewTicket) -> Result<Ticket, StorageError> {
        if self.fail_inserts {
            return Err(StorageError::Pool("connection refused".to_string()));
        }
        let mut state = self.lock();
        state.next_id += 1;
        let saved = Ticket {
            id: state.next_id,
            organization_id: ticket.organization_id,
            owner_id: ticket.owner_id,
            operator_id: ticket.operator_id,
            category_id: ticket.category_id,
            text: ticket.text,
            response: None,
            status: ticket.status,
            created_at: ticket.created_at,
        };
        state.tickets.insert(saved.id, saved.clone());
        Ok(saved)
    }

    async fn operator_ticket(
        &self,
        operator_id: i32,
        ticket_id: i32,
    ) -> Result<Option<Ticket>, StorageError> {
        Ok(self
            .lock()
            .tickets
            .get(&ticket_id)
            .filter(|t| t.operator_id == Some(operator_id))
            .cloned())
    }

    async fn compare_and_set_status(
        &self,
        operator_id: i32,
        ticket_id: i32,
        expected: TicketStatus,
        next: TicketStatus,
        response: Option<String>,
    ) -> Result<Option<Ticket>, StorageError> {
        let mut state = self.lock();
        let Some(ticket) = state.tickets.get_mut(&ticket_id) else {
            return Ok(None);
        };
        if ticket.operator_id != Some(operator_id) || ticket.status != expected {
            return Ok(None);
        }
        ticket.status = next;
        if response.is_some() {
            ticket.response = response;
        }
        Ok(Some(ticket.clone()))
    }
}

#[async_trait]
impl OperatorDirectory for MemoryStore {
    async fn find_responsible_operators(
        &self,
        organization_id: i32,
        category_id: i32,
    ) -> Result<Vec<Operator>, StorageError> {
        Ok(self
            .operators
            .iter()
            .filter(|op| {
                op.organization_id == organization_id && op.is_responsible_for(category_id)
            })
            .cloned()
            .collect())
    }
}

pub struct FailingDirectory;

#[async_trait]
impl OperatorDirectory for FailingDirectory {
    async fn find_responsible_operators(
        &self,
        _organization_id: i32,
        _category_id: i32,
    ) -> Result<Vec<Operator>, StorageError> {
        Err(StorageError::Pool("directory unavailable".to_string()))
    }
}

/// Always answers with the same category.
pub struct FixedClassifier(pub i32);

#[async_trait]
impl Classifier for FixedClassifier {
    async fn train(&self, _samples: &[CategorySample]) -> Result<(), ClassifierError> {
        Ok(())
    }

    async fn is_training(&self) -> Result<bool, ClassifierError> {
        Ok(false)
    }

    async fn classify(&self, _text: &str) -> Result<i32, ClassifierError> {
        Ok(self.0)
    }
}

pub struct FailingClassifier;

#[async_trait]
impl Classifier for FailingClassifier {
    async fn train(&self, _samples: &[CategorySample]) -> Result<(), ClassifierError> {
        Err(ClassifierError::UnexpectedStatus(503))
    }

    async fn is_training(&self) -> Result<bool, ClassifierError> {
        Err(ClassifierError::UnexpectedStatus(503))
    }

    async fn classify(&self, _text: &str) -> Result<i32, ClassifierError> {
        Err(ClassifierError::UnexpectedStatus(503))
    }
}

pub struct SlowClassifier {
    pub category_id: i32,
    pub delay: Duration,
}

#[async_trait]
impl Classifier for SlowClassifier {
    async fn train(&self, _samples: &[CategorySample]) -> Result<(), ClassifierError> {
        Ok(())
    }

    async fn is_training(&self) -> Result<bool, ClassifierError> {
        Ok(true)
    }

    async fn classify(&self, _text: &str) -> Result<i32, ClassifierError> {
        tokio::time::sleep(self.delay).await;
        Ok(self.category_id)
    }
}
