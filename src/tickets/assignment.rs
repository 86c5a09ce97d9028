use log::{error, warn};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::sync::Mutex;

use super::storage::OperatorDirectory;
use crate::core::shared::models::Operator;

/// Picks the operator responsible for a new ticket, uniformly at random among
/// the organization's operators who handle its category.
pub struct OperatorAssigner {
    rng: Mutex<StdRng>,
}

impl OperatorAssigner {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Returns `None` when there is no category, nobody is responsible, or
    /// the directory cannot be read. Failures never block ticket creation.
    pub async fn assign(
        &self,
        directory: &dyn OperatorDirectory,
        organization_id: i32,
        category_id: Option<i32>,
    ) -> Option<i32> {
        let category_id = category_id?;

        let candidates = match directory
            .find_responsible_operators(organization_id, category_id)
            .await
        {
            Ok(candidates) => candidates,
            Err(e) => {
                error!(
                    "Operator lookup failed for organization {} category {}: {}",
                    organization_id, category_id, e
                );
                return None;
            }
        };

        let chosen = self.pick(&candidates);
        if chosen.is_none() {
            warn!(
                "No operator responsible for category {} in organization {}",
                category_id, organization_id
            );
        }
        chosen
    }

    fn pick(&self, candidates: &[Operator]) -> Option<i32> {
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        candidates.choose(&mut *rng).map(|op| op.id)
    }
}

impl Default for OperatorAssigner {
    fn default() -> Self {
        Self::new()
    }
}
