//! Ticket status state machine.
//!
//! ```text
//! new --claim--> in_progress --finalize--> resolved | rejected | irrelevant
//! ```
//!
//! The machine works on statuses only. Whether the caller may drive a given
//! ticket is decided when the ticket is looked up for that operator.

use super::status::TicketStatus;
use super::TicketError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Claim,
    Finalize(TicketStatus),
}

impl Transition {
    pub fn name(&self) -> &'static str {
        match self {
            Transition::Claim => "claim",
            Transition::Finalize(_) => "finalize",
        }
    }
}

/// Returns the status `current` moves to under `transition`.
///
/// A non-terminal finalize target is rejected with `InvalidStatus` before the
/// current status is looked at.
pub fn next_status(
    current: TicketStatus,
    transition: Transition,
) -> Result<TicketStatus, TicketError> {
    match transition {
        Transition::Claim => match current {
            TicketStatus::New => Ok(TicketStatus::InProgress),
            from => Err(TicketError::InvalidTransition {
                from,
                to: TicketStatus::InProgress,
            }),
        },
        Transition::Finalize(target) if !target.is_final() => Err(TicketError::InvalidStatus(
            target.as_str().to_string(),
        )),
        Transition::Finalize(target) => match current {
            TicketStatus::InProgress => Ok(target),
            from => Err(TicketError::InvalidTransition { from, to: target }),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    const TERMINAL: [TicketStatus; 3] = [
        TicketStatus::Resolved,
        TicketStatus::Rejected,
        TicketStatus::Irrelevant,
    ];

    fn is_legal_edge(from: TicketStatus, to: TicketStatus) -> bool {
        matches!(
            (from, to),
            (TicketStatus::New, TicketStatus::InProgress)
                | (TicketStatus::InProgress, TicketStatus::Resolved)
                | (TicketStatus::InProgress, TicketStatus::Rejected)
                | (TicketStatus::InProgress, TicketStatus::Irrelevant)
        )
    }

    #[test]
    fn test_claim_only_from_new() {
        assert_eq!(
            next_status(TicketStatus::New, Transition::Claim).unwrap(),
            TicketStatus::InProgress
        );
        for from in TicketStatus::ALL.into_iter().filter(|s| *s != TicketStatus::New) {
            assert!(matches!(
                next_status(from, Transition::Claim),
                Err(TicketError::InvalidTransition { .. })
            ));
        }
    }

    #[test]
    fn test_finalize_from_in_progress() {
        for target in TERMINAL {
            assert_eq!(
                next_status(TicketStatus::InProgress, Transition::Finalize(target)).unwrap(),
                target
            );
        }
    }

    #[test]
    fn test_finalize_new_ticket_directly() {
        for target in TERMINAL {
            assert!(matches!(
                next_status(TicketStatus::New, Transition::Finalize(target)),
                Err(TicketError::InvalidTransition {
                    from: TicketStatus::New,
                    ..
                })
            ));
        }
    }

    #[test]
    fn test_finalize_terminal_ticket() {
        for from in TERMINAL {
            for target in TERMINAL {
                assert!(matches!(
                    next_status(from, Transition::Finalize(target)),
                    Err(TicketError::InvalidTransition { .. })
                ));
            }
        }
    }

    #[test]
    fn test_finalize_with_active_target() {
        for from in TicketStatus::ALL {
            for target in [TicketStatus::New, TicketStatus::InProgress] {
                assert!(matches!(
                    next_status(from, Transition::Finalize(target)),
                    Err(TicketError::InvalidStatus(_))
                ));
            }
        }
    }

    #[test]
    fn test_random_sequences_follow_legal_edges() {
        let mut rng = StdRng::seed_from_u64(0x5eed);

        for _ in 0..500 {
            let mut status = TicketStatus::New;
            let mut left_new = false;

            for _ in 0..12 {
                let transition = if rng.gen_bool(0.3) {
                    Transition::Claim
                } else {
                    let idx = rng.gen_range(0..TicketStatus::ALL.len());
                    Transition::Finalize(TicketStatus::ALL[idx])
                };

                if let Ok(next) = next_status(status, transition) {
                    assert!(is_legal_edge(status, next), "{status} -> {next}");
                    assert!(!status.is_final());
                    status = next;
                    left_new = true;
                }

                if left_new {
                    assert_ne!(status, TicketStatus::New);
                }
            }
        }
    }
}
