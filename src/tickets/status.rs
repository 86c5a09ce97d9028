use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    New,
    InProgress,
    Resolved,
    Rejected,
    Irrelevant,
}

impl TicketStatus {
    pub const ALL: [TicketStatus; 5] = [
        TicketStatus::New,
        TicketStatus::InProgress,
        TicketStatus::Resolved,
        TicketStatus::Rejected,
        TicketStatus::Irrelevant,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::New => "new",
            TicketStatus::InProgress => "in_progress",
            TicketStatus::Resolved => "resolved",
            TicketStatus::Rejected => "rejected",
            TicketStatus::Irrelevant => "irrelevant",
        }
    }

    /// Terminal states have no outgoing transitions.
    pub fn is_final(&self) -> bool {
        matches!(
            self,
            TicketStatus::Resolved | TicketStatus::Rejected | TicketStatus::Irrelevant
        )
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown ticket status: {0:?}")]
pub struct UnknownStatus(pub String);

impl FromStr for TicketStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(TicketStatus::New),
            "in_progress" => Ok(TicketStatus::InProgress),
            "resolved" => Ok(TicketStatus::Resolved),
            "rejected" => Ok(TicketStatus::Rejected),
            "irrelevant" => Ok(TicketStatus::Irrelevant),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_matches_as_str() {
        for status in TicketStatus::ALL {
            assert_eq!(status.as_str().parse::<TicketStatus>().unwrap(), status);
        }
    }

    #[test]
    fn test_unknown_status() {
        assert_eq!(
            "closed".parse::<TicketStatus>(),
            Err(UnknownStatus("closed".to_string()))
        );
        assert!("In_Progress".parse::<TicketStatus>().is_err());
    }

    #[test]
    fn test_final_states() {
        assert!(!TicketStatus::New.is_final());
        assert!(!TicketStatus::InProgress.is_final());
        assert!(TicketStatus::Resolved.is_final());
        assert!(TicketStatus::Rejected.is_final());
        assert!(TicketStatus::Irrelevant.is_final());
    }

    #[test]
    fn test_serde_uses_snake_case() {
        assert_eq!(
            serde_json::to_string(&TicketStatus::InProgress).unwrap(),
            "\"in_progress\""
        );
    }
}
