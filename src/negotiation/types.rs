//! Negotiation messages, actions and outcomes

use crate::domain::Bid;
use crate::types::{OpponentId, SessionId};
use serde::{Deserialize, Serialize};

/// Session parameters delivered before the first turn
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionSettings {
    pub session: SessionId,
    pub opponent: OpponentId,
}

/// Everything a party can be told by the protocol driver
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Message {
    Settings(SessionSettings),
    /// The opponent placed a new offer on the table
    OpponentOffer { bid: Bid },
    /// The opponent accepted our standing offer
    OpponentAccept { bid: Bid },
    YourTurn,
    /// Session closed, with the agreed bid if there is one
    Finished { agreement: Option<Bid> },
}

/// Response to `YourTurn`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "bid", rename_all = "snake_case")]
pub enum Action {
    /// Accept the opponent's standing offer
    Accept(Bid),
    Offer(Bid),
}

impl Action {
    pub fn bid(&self) -> &Bid {
        match self {
            Action::Accept(bid) | Action::Offer(bid) => bid,
        }
    }
}

/// How a session ended
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum SessionOutcome {
    Agreement { bid: Bid, utility: f64, round: u32 },
    NoAgreement { reason: String },
}

impl SessionOutcome {
    pub fn is_agreement(&self) -> bool {
        matches!(self, SessionOutcome::Agreement { .. })
    }

    pub fn agreement(&self) -> Option<&Bid> {
        match self {
            SessionOutcome::Agreement { bid, .. } => Some(bid),
            SessionOutcome::NoAgreement { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Domain;

    #[test]
    fn test_message_serialization() {
        let domain = Domain::synthetic(2, 2).unwrap();
        let message = Message::OpponentOffer {
            bid: domain.nth_bid(3),
        };

        let serialized = serde_json::to_string(&message).unwrap();
        assert!(serialized.contains("\"type\":\"opponent_offer\""));
        let deserialized: Message = serde_json::from_str(&serialized).unwrap();
        assert_eq!(message, deserialized);
    }

    #[test]
    fn test_outcome_agreement() {
        let domain = Domain::synthetic(1, 2).unwrap();
        let agreed = SessionOutcome::Agreement {
            bid: domain.nth_bid(1),
            utility: 0.7,
            round: 12,
        };
        assert!(agreed.is_agreement());
        assert_eq!(agreed.agreement(), Some(&domain.nth_bid(1)));

        let failed = SessionOutcome::NoAgreement {
            reason: "deadline".to_string(),
        };
        assert!(!failed.is_agreement());
        assert!(failed.agreement().is_none());
    }

    #[test]
    fn test_action_bid() {
        let domain = Domain::synthetic(1, 3).unwrap();
        assert_eq!(Action::Offer(domain.nth_bid(2)).bid(), &domain.nth_bid(2));
        assert_eq!(Action::Accept(domain.nth_bid(0)).bid(), &domain.nth_bid(0));
    }
}
