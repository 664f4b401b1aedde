//! Stacked alternating offers between two agents

use crate::domain::Bid;
use crate::error::Result;
use crate::negotiation::{Action, Message, NegotiationAgent, RoundClock, SessionSettings};
use crate::types::{OpponentId, SessionId};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use super::party::PartyHandle;

/// Deadline and pacing of a protocol run
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SaopConfig {
    /// Total turns across both parties
    pub rounds: u32,
    /// Longest a party may take to answer one message
    #[serde(with = "millis")]
    pub turn_timeout: Duration,
}

impl Default for SaopConfig {
    fn default() -> Self {
        Self {
            rounds: 200,
            turn_timeout: Duration::from_secs(1),
        }
    }
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}

/// What happened on one turn
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TurnEvent {
    Offered { turn: u32, party: String, bid: Bid },
    Accepted { turn: u32, party: String, bid: Bid },
    /// No answer within the turn timeout
    Missed { turn: u32, party: String },
    Failed { turn: u32, party: String, error: String },
}

/// Result of a protocol run
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NegotiationOutcome {
    pub session: SessionId,
    pub parties: [String; 2],
    pub agreement: Option<Bid>,
    /// Each party's own utility of the agreement
    pub utilities: Option<[f64; 2]>,
    pub turns: u32,
    pub events: Vec<TurnEvent>,
    /// Fatal error that ended the run early
    pub aborted: Option<String>,
}

impl NegotiationOutcome {
    pub fn social_welfare(&self) -> Option<f64> {
        self.utilities.map(|[a, b]| a + b)
    }

    pub fn nash_product(&self) -> Option<f64> {
        self.utilities.map(|[a, b]| a * b)
    }

    pub fn missed_turns(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, TurnEvent::Missed { .. }))
            .count()
    }
}

/// Drives one session between two agents
pub struct SaopRunner {
    config: SaopConfig,
    clock: RoundClock,
    session: SessionId,
}

impl SaopRunner {
    pub fn new(config: SaopConfig) -> Self {
        Self {
            clock: RoundClock::new(config.rounds),
            config,
            session: SessionId::generate(),
        }
    }

    /// Progress signal to hand to both agents
    pub fn clock(&self) -> RoundClock {
        self.clock.clone()
    }

    pub fn session(&self) -> &SessionId {
        &self.session
    }

    /// Run to agreement, deadline or fatal error; `first` opens
    pub async fn run(
        self,
        first: NegotiationAgent,
        second: NegotiationAgent,
    ) -> Result<NegotiationOutcome> {
        let parties = [PartyHandle::spawn(first), PartyHandle::spawn(second)];
        let names = [parties[0].name().to_string(), parties[1].name().to_string()];
        info!(
            session = %self.session,
            first = %names[0],
            second = %names[1],
            rounds = self.config.rounds,
            "starting negotiation"
        );

        for (i, party) in parties.iter().enumerate() {
            let settings = SessionSettings {
                session: self.session.clone(),
                opponent: OpponentId::new(names[1 - i].clone()),
            };
            party.call(Message::Settings(settings)).await?;
        }

        let mut standing: Option<(usize, Bid)> = None;
        let mut agreement = None;
        let mut aborted = None;
        let mut events = Vec::new();

        while self.clock.round() < self.clock.total() {
            let turn = self.clock.round();
            let i = (turn % 2) as usize;
            let (actor, other) = (&parties[i], &parties[1 - i]);
            let party = names[i].clone();

            let reply = timeout(self.config.turn_timeout, actor.call(Message::YourTurn)).await;
            self.clock.advance();

            match reply {
                // a late answer is dropped; the move is lost
                Err(_) => {
                    warn!(party = %party, turn, "turn timed out, move forfeited");
                    events.push(TurnEvent::Missed { turn, party });
                }
                Ok(Err(e)) if e.is_fatal() => {
                    error!(party = %party, turn, error = %e, "aborting negotiation");
                    aborted = Some(e.to_string());
                    events.push(TurnEvent::Failed {
                        turn,
                        party,
                        error: e.to_string(),
                    });
                    break;
                }
                Ok(Err(e)) => {
                    warn!(party = %party, turn, error = %e, "turn failed");
                    events.push(TurnEvent::Failed {
                        turn,
                        party,
                        error: e.to_string(),
                    });
                }
                Ok(Ok(Some(Action::Offer(bid)))) => {
                    debug!(party = %party, turn, bid = %bid, "offer");
                    events.push(TurnEvent::Offered {
                        turn,
                        party,
                        bid: bid.clone(),
                    });
                    standing = Some((i, bid.clone()));
                    self.deliver(other, Message::OpponentOffer { bid }).await;
                }
                Ok(Ok(Some(Action::Accept(bid)))) => match &standing {
                    Some((from, offered)) if *from != i && *offered == bid => {
                        info!(party = %party, turn, bid = %bid, "offer accepted");
                        events.push(TurnEvent::Accepted {
                            turn,
                            party,
                            bid: bid.clone(),
                        });
                        self.deliver(other, Message::OpponentAccept { bid: bid.clone() })
                            .await;
                        agreement = Some(bid);
                        break;
                    }
                    _ => {
                        warn!(party = %party, turn, bid = %bid, "accepted a bid that is not on the table");
                        events.push(TurnEvent::Failed {
                            turn,
                            party,
                            error: format!("accepted {} which is not the standing offer", bid),
                        });
                    }
                },
                Ok(Ok(None)) => {
                    warn!(party = %party, turn, "no action returned for turn");
                    events.push(TurnEvent::Failed {
                        turn,
                        party,
                        error: "no action".to_string(),
                    });
                }
            }
        }

        for party in &parties {
            self.deliver(
                party,
                Message::Finished {
                    agreement: agreement.clone(),
                },
            )
            .await;
        }

        let [a, b] = parties;
        let first = a.shutdown().await?;
        let second = b.shutdown().await?;
        let utilities = agreement
            .as_ref()
            .map(|bid| [first.utility_of(bid), second.utility_of(bid)]);

        let outcome = NegotiationOutcome {
            session: self.session,
            parties: names,
            agreement,
            utilities,
            turns: self.clock.round(),
            events,
            aborted,
        };
        info!(
            session = %outcome.session,
            agreement = outcome.agreement.is_some(),
            turns = outcome.turns,
            "negotiation finished"
        );
        Ok(outcome)
    }

    /// Send a notification, logging instead of failing
    async fn deliver(&self, party: &PartyHandle, message: Message) {
        match timeout(self.config.turn_timeout, party.call(message)).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => warn!(party = %party.name(), error = %e, "party rejected message"),
            Err(_) => warn!(party = %party.name(), "party did not acknowledge message in time"),
        }
    }
}
