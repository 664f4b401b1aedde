//! Negotiating agent driven one message at a time
//!
//! The agent is the thin layer between a protocol driver and the strategy
//! core. Each turn it reads progress, lets the bidding strategy plan a
//! counter-offer, asks the acceptance strategy whether the opponent's
//! standing offer beats that plan, and records whatever it sends.

use crate::config::{AgentConfig, HistoryConfig};
use crate::domain::{Bid, UtilityFunction};
use crate::error::{ParleyError, Result};
use crate::persist::{OpponentStats, StatsStore};
use crate::strategy::{
    rng_from_seed, AcceptanceEngine, AcceptanceStrategy, BidSpaceIndex, BiddingEngine,
    BiddingStrategy, ConcessionCurve, DecisionContext, Phase,
};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::progress::ProgressSignal;
use super::session::SessionState;
use super::types::{Action, Message, SessionOutcome, SessionSettings};

/// One side of a bilateral negotiation
pub struct NegotiationAgent {
    name: String,
    state: SessionState,
    bidding: Box<dyn BiddingStrategy>,
    acceptance: Box<dyn AcceptanceStrategy>,
    progress: Box<dyn ProgressSignal>,
    store: Arc<dyn StatsStore>,
    history_config: HistoryConfig,
    offer_best_when_closing: bool,
    stats: Option<OpponentStats>,
}

impl NegotiationAgent {
    /// Build an agent with the default strategies described by `config`
    pub fn new(
        name: impl Into<String>,
        utility: Arc<dyn UtilityFunction>,
        config: &AgentConfig,
        progress: Box<dyn ProgressSignal>,
        store: Arc<dyn StatsStore>,
    ) -> Result<Self> {
        config.validate()?;
        utility.domain().validate()?;
        let reservation = utility.reservation();
        if !(0.0..=1.0).contains(&reservation) {
            return Err(ParleyError::InvalidProfile(format!(
                "reservation {} outside [0, 1]",
                reservation
            )));
        }

        let name = name.into();
        let mut rng = rng_from_seed(config.seed);
        let index = BidSpaceIndex::build(utility.as_ref(), &config.index, &mut rng);
        info!(
            agent = %name,
            bids = index.len(),
            exhaustive = index.is_exhaustive(),
            "built bid space index"
        );

        let max_utility = index.best().map(|b| b.utility).unwrap_or(1.0);
        let curve = ConcessionCurve::new(
            config.concession.exponent,
            config.concession.min_utility.min(max_utility),
            max_utility,
        )?;
        let bidding = BiddingEngine::new(curve, config.bidding.clone(), rng);
        let acceptance = AcceptanceEngine::new(config.acceptance.clone());
        let model = config.opponent_model.build(utility.domain());

        let state = SessionState::new(utility, index, model);
        Ok(Self::from_parts(
            name,
            state,
            Box::new(bidding),
            Box::new(acceptance),
            progress,
            store,
            config,
        ))
    }

    /// Assemble an agent from explicit strategy objects
    pub fn from_parts(
        name: impl Into<String>,
        state: SessionState,
        bidding: Box<dyn BiddingStrategy>,
        acceptance: Box<dyn AcceptanceStrategy>,
        progress: Box<dyn ProgressSignal>,
        store: Arc<dyn StatsStore>,
        config: &AgentConfig,
    ) -> Self {
        Self {
            name: name.into(),
            state,
            bidding,
            acceptance,
            progress,
            store,
            history_config: config.history.clone(),
            offer_best_when_closing: config.offer_best_when_closing,
            stats: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Opponent statistics as loaded at start, or as saved at the end
    pub fn stats(&self) -> Option<&OpponentStats> {
        self.stats.as_ref()
    }

    pub fn outcome(&self) -> Option<&SessionOutcome> {
        self.state.outcome()
    }

    pub fn utility_of(&self, bid: &Bid) -> f64 {
        self.state.utility().utility(bid)
    }

    /// Target utility the bidding strategy aims for at `progress`
    pub fn target_at(&self, progress: f64) -> f64 {
        self.bidding.target(progress, self.state.utility().reservation())
    }

    /// Dispatch one protocol message
    pub fn handle(&mut self, message: Message) -> Result<Option<Action>> {
        match message {
            Message::Settings(settings) => {
                self.start(settings)?;
                Ok(None)
            }
            Message::OpponentOffer { bid } => {
                self.on_opponent_offer(bid)?;
                Ok(None)
            }
            Message::OpponentAccept { bid } => {
                self.on_opponent_accept(bid)?;
                Ok(None)
            }
            Message::YourTurn => self.your_turn().map(Some),
            Message::Finished { agreement } => {
                self.on_finished(agreement)?;
                Ok(None)
            }
        }
    }

    /// Bind to an opponent and adapt to what earlier sessions taught us
    pub fn start(&mut self, settings: SessionSettings) -> Result<()> {
        let SessionSettings { session, opponent } = settings;
        self.state.start(session, opponent.clone())?;

        let stats = OpponentStats::load(self.store.as_ref(), &opponent).unwrap_or_default();
        if self.history_config.adapt && stats.agreements > 0 {
            let reservation = self.state.utility().reservation();
            let floor = (stats.mean_agreement_utility - self.history_config.margin)
                .max(reservation)
                .min(1.0);
            self.bidding.raise_floor(floor);
            info!(
                agent = %self.name,
                opponent = %opponent,
                agreements = stats.agreements,
                floor,
                "raised concession floor from past agreements"
            );
        }

        info!(
            agent = %self.name,
            session = %self.state.id(),
            opponent = %opponent,
            sessions = stats.sessions,
            "session started"
        );
        self.stats = Some(stats);
        Ok(())
    }

    pub fn on_opponent_offer(&mut self, bid: Bid) -> Result<()> {
        self.state.advance_progress(self.progress.progress());
        let record = self.state.record_received(bid)?;
        debug!(
            agent = %self.name,
            round = record.round,
            utility = record.own_utility,
            "received offer"
        );
        Ok(())
    }

    /// The opponent accepted our standing offer
    pub fn on_opponent_accept(&mut self, bid: Bid) -> Result<()> {
        let ours = self.state.history().last_sent().map(|r| &r.bid);
        if ours != Some(&bid) {
            return Err(ParleyError::ProtocolViolation(format!(
                "opponent accepted {} which is not our standing offer",
                bid
            )));
        }
        info!(
            agent = %self.name,
            utility = self.utility_of(&bid),
            "opponent accepted our offer"
        );
        Ok(())
    }

    /// Decide between accepting the standing offer and a counter-offer
    pub fn your_turn(&mut self) -> Result<Action> {
        if self.state.is_terminal() {
            return Err(ParleyError::InvalidStateTransition(
                "Cannot act in terminal state".to_string(),
            ));
        }

        let progress = self.state.advance_progress(self.progress.progress());
        let phase = self.acceptance.phase(progress);
        self.state.set_phase(phase)?;
        if phase.is_terminal() {
            return Err(ParleyError::InvalidStateTransition(
                "Deadline reached".to_string(),
            ));
        }

        let planned = {
            let ctx = self.state.context();
            let planned = match self.bidding.next_bid(&ctx) {
                Ok(bid) => bid,
                Err(e) => {
                    if e.is_fatal() {
                        error!(agent = %self.name, error = %e, "cannot continue session");
                    }
                    return Err(e);
                }
            };
            let planned = if phase == Phase::Closing && self.offer_best_when_closing {
                offer_back_best(&ctx, planned)
            } else {
                planned
            };

            if let Some(standing) = self.state.standing_offer() {
                if self.acceptance.accept(&ctx, Some(standing), Some(&planned)) {
                    info!(
                        agent = %self.name,
                        progress,
                        utility = standing.own_utility,
                        "accepting offer"
                    );
                    return Ok(Action::Accept(standing.bid.clone()));
                }
            }
            planned
        };

        let record = self.state.record_sent(planned)?;
        debug!(
            agent = %self.name,
            round = record.round,
            progress,
            phase = ?phase,
            utility = record.own_utility,
            opponent_utility = record.opponent_utility,
            "sending offer"
        );
        Ok(Action::Offer(record.bid.clone()))
    }

    /// Close the session and update opponent statistics once
    pub fn on_finished(&mut self, agreement: Option<Bid>) -> Result<()> {
        if self.state.outcome().is_some() {
            debug!(agent = %self.name, "session already finished");
            return Ok(());
        }

        let outcome = match agreement {
            Some(bid) => {
                self.state.utility().domain().check(&bid)?;
                SessionOutcome::Agreement {
                    utility: self.utility_of(&bid),
                    round: self.state.round(),
                    bid,
                }
            }
            None => SessionOutcome::NoAgreement {
                reason: "no offer was accepted before the deadline".to_string(),
            },
        };
        self.state.finish(outcome.clone())?;

        match &outcome {
            SessionOutcome::Agreement { utility, round, .. } => {
                info!(agent = %self.name, utility, round, "session ended in agreement");
            }
            SessionOutcome::NoAgreement { reason } => {
                info!(agent = %self.name, %reason, "session ended without agreement");
            }
        }

        self.save_stats(&outcome);
        Ok(())
    }

    fn save_stats(&mut self, outcome: &SessionOutcome) {
        let Some(opponent) = self.state.opponent().cloned() else {
            return;
        };
        let mut stats = self.stats.take().unwrap_or_default();
        stats.record(outcome, self.state.model().issue_weights());
        if !stats.save(self.store.as_ref(), &opponent) {
            warn!(agent = %self.name, opponent = %opponent, "opponent stats were not saved");
        }
        self.stats = Some(stats);
    }
}

/// The best bid the opponent offered, if it beats the planned offer
fn offer_back_best(ctx: &DecisionContext<'_>, planned: Bid) -> Bid {
    let planned_utility = ctx.utility.utility(&planned);
    match ctx.history.best_received() {
        Some(best)
            if best.own_utility > planned_utility
                && best.own_utility >= ctx.utility.reservation() =>
        {
            debug!(
                planned = planned_utility,
                best = best.own_utility,
                "offering back best received bid"
            );
            best.bid.clone()
        }
        _ => planned,
    }
}
