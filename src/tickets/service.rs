use log::{info, warn};
use std::sync::Arc;
use std::time::Duration;

use super::assignment::OperatorAssigner;
use super::lifecycle::{next_status, Transition};
use super::status::TicketStatus;
use super::storage::{OperatorDirectory, TicketStore};
use super::{NewTicket, Ticket, TicketError};
use crate::classifier::Classifier;

/// Creates tickets and drives them through their lifecycle.
pub struct TicketService {
    classifier: Arc<dyn Classifier>,
    directory: Arc<dyn OperatorDirectory>,
    store: Arc<dyn TicketStore>,
    assigner: OperatorAssigner,
    classify_timeout: Duration,
}

impl TicketService {
    pub fn new(
        classifier: Arc<dyn Classifier>,
        directory: Arc<dyn OperatorDirectory>,
        store: Arc<dyn TicketStore>,
        assigner: OperatorAssigner,
        classify_timeout: Duration,
    ) -> Self {
        Self {
            classifier,
            directory,
            store,
            assigner,
            classify_timeout,
        }
    }

    /// Classifies, assigns and persists a new ticket. Only a storage failure
    /// is returned; the ticket is saved without category or operator when
    /// those cannot be resolved.
    pub async fn create_ticket(
        &self,
        organization_id: i32,
        owner_id: i32,
        text: String,
    ) -> Result<Ticket, TicketError> {
        let mut ticket = NewTicket::new(organization_id, owner_id, text);

        ticket.category_id = self.classify(organization_id, &ticket.text).await;
        ticket.operator_id = self
            .assigner
            .assign(self.directory.as_ref(), organization_id, ticket.category_id)
            .await;

        let saved = self.store.insert_ticket(ticket).await?;
        info!(
            "Ticket {} created for owner {} (category {:?}, operator {:?})",
            saved.id, owner_id, saved.category_id, saved.operator_id
        );
        Ok(saved)
    }

    pub async fn claim_ticket(
        &self,
        operator_id: i32,
        ticket_id: i32,
    ) -> Result<Ticket, TicketError> {
        self.transition(operator_id, ticket_id, Transition::Claim, None)
            .await
    }

    pub async fn finalize_ticket(
        &self,
        operator_id: i32,
        ticket_id: i32,
        status: TicketStatus,
        response: String,
    ) -> Result<Ticket, TicketError> {
        if !status.is_final() {
            return Err(TicketError::InvalidStatus(status.as_str().to_string()));
        }
        self.transition(
            operator_id,
            ticket_id,
            Transition::Finalize(status),
            Some(response),
        )
        .await
    }

    async fn classify(&self, organization_id: i32, text: &str) -> Option<i32> {
        match tokio::time::timeout(self.classify_timeout, self.classifier.classify(text)).await {
            Ok(Ok(category_id)) => Some(category_id),
            Ok(Err(e)) => {
                warn!(
                    "Classification failed for organization {}: {}",
                    organization_id, e
                );
                None
            }
            Err(_) => {
                warn!(
                    "Classification timed out after {:?} for organization {}",
                    self.classify_timeout, organization_id
                );
                None
            }
        }
    }

    async fn transition(
        &self,
        operator_id: i32,
        ticket_id: i32,
        transition: Transition,
        response: Option<String>,
    ) -> Result<Ticket, TicketError> {
        let current = self
            .store
            .operator_ticket(operator_id, ticket_id)
            .await?
            .ok_or(TicketError::NotFound(ticket_id))?;

        let next = next_status(current.status, transition)?;

        match self
            .store
            .compare_and_set_status(operator_id, ticket_id, current.status, next, response)
            .await?
        {
            Some(updated) => {
                info!(
                    "Ticket {} {}: {} -> {} by operator {}",
                    ticket_id,
                    transition.name(),
                    current.status,
                    next,
                    operator_id
                );
                Ok(updated)
            }
            None => {
                warn!(
                    "Ticket {} changed before {} by operator {} could apply",
                    ticket_id,
                    transition.name(),
                    operator_id
                );
                Err(TicketError::InvalidTransition {
                    from: current.status,
                    to: next,
                })
            }
        }
    }
}
