//! Per-session negotiation state

use crate::domain::{Bid, UtilityFunction};
use crate::error::{ParleyError, Result};
use crate::opponent::OpponentModel;
use crate::strategy::{BidSpaceIndex, DecisionContext, Phase};
use crate::types::{OpponentId, Party, SessionId};
use std::sync::Arc;

use super::history::{BidRecord, History};
use super::types::SessionOutcome;

/// State owned by one session against one opponent
pub struct SessionState {
    id: SessionId,
    opponent: Option<OpponentId>,
    utility: Arc<dyn UtilityFunction>,
    index: BidSpaceIndex,
    model: Box<dyn OpponentModel>,
    history: History,
    phase: Phase,
    round: u32,
    progress: f64,
    /// Opponent offer waiting for our response
    standing_offer: bool,
    outcome: Option<SessionOutcome>,
}

impl SessionState {
    pub fn new(
        utility: Arc<dyn UtilityFunction>,
        index: BidSpaceIndex,
        model: Box<dyn OpponentModel>,
    ) -> Self {
        Self {
            id: SessionId::generate(),
            opponent: None,
            utility,
            index,
            model,
            history: History::default(),
            phase: Phase::Exploring,
            round: 0,
            progress: 0.0,
            standing_offer: false,
            outcome: None,
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn opponent(&self) -> Option<&OpponentId> {
        self.opponent.as_ref()
    }

    pub fn utility(&self) -> &dyn UtilityFunction {
        self.utility.as_ref()
    }

    pub fn index(&self) -> &BidSpaceIndex {
        &self.index
    }

    pub fn model(&self) -> &dyn OpponentModel {
        self.model.as_ref()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn progress(&self) -> f64 {
        self.progress
    }

    pub fn outcome(&self) -> Option<&SessionOutcome> {
        self.outcome.as_ref()
    }

    pub fn is_terminal(&self) -> bool {
        self.phase.is_terminal()
    }

    /// Bind the session to an opponent; only allowed once, before any bids
    pub fn start(&mut self, id: SessionId, opponent: OpponentId) -> Result<()> {
        if self.opponent.is_some() || !self.history.is_empty() {
            return Err(ParleyError::InvalidStateTransition(
                "Session already started".to_string(),
            ));
        }
        self.id = id;
        self.opponent = Some(opponent);
        Ok(())
    }

    /// Fold a new progress reading in; progress never moves backwards
    pub fn advance_progress(&mut self, progress: f64) -> f64 {
        let progress = if progress.is_finite() {
            progress.clamp(0.0, 1.0)
        } else {
            self.progress
        };
        self.progress = self.progress.max(progress);
        self.progress
    }

    /// Move to a new phase
    pub fn set_phase(&mut self, phase: Phase) -> Result<()> {
        if self.phase.is_terminal() {
            return Err(ParleyError::InvalidStateTransition(
                "Cannot transition from terminal state".to_string(),
            ));
        }
        self.phase = phase;
        Ok(())
    }

    /// Whether an opponent offer is waiting for our response
    pub fn has_standing_offer(&self) -> bool {
        self.standing_offer
    }

    /// The opponent offer we would be accepting right now
    pub fn standing_offer(&self) -> Option<&BidRecord> {
        if self.standing_offer {
            self.history.last_received()
        } else {
            None
        }
    }

    /// Record an opponent offer and feed it to the opponent model
    pub fn record_received(&mut self, bid: Bid) -> Result<&BidRecord> {
        self.ensure_active("receive an offer")?;
        self.utility.domain().check(&bid)?;

        self.model.update(&bid);
        self.round += 1;
        self.standing_offer = true;
        self.push(bid, Party::Opponent);
        self.last_record()
    }

    /// Record our own offer
    pub fn record_sent(&mut self, bid: Bid) -> Result<&BidRecord> {
        self.ensure_active("send an offer")?;
        self.utility.domain().check(&bid)?;

        self.round += 1;
        self.standing_offer = false;
        self.push(bid, Party::Own);
        self.last_record()
    }

    /// Close the session; a second call is an invalid transition
    pub fn finish(&mut self, outcome: SessionOutcome) -> Result<()> {
        if self.outcome.is_some() {
            return Err(ParleyError::InvalidStateTransition(
                "Negotiation already finished".to_string(),
            ));
        }
        self.phase = Phase::Terminal;
        self.standing_offer = false;
        self.outcome = Some(outcome);
        Ok(())
    }

    /// Read-only view for the strategies
    pub fn context(&self) -> DecisionContext<'_> {
        DecisionContext {
            progress: self.progress,
            utility: self.utility.as_ref(),
            index: &self.index,
            opponent: Some(self.model.as_ref()),
            history: &self.history,
        }
    }

    fn push(&mut self, bid: Bid, sender: Party) {
        let record = BidRecord {
            own_utility: self.utility.utility(&bid),
            opponent_utility: self.model.utility(&bid),
            round: self.round,
            progress: self.progress,
            sender,
            bid,
        };
        self.history.append(record);
    }

    fn last_record(&self) -> Result<&BidRecord> {
        self.history
            .records()
            .last()
            .ok_or_else(|| ParleyError::Internal("history is empty after append".to_string()))
    }

    fn ensure_active(&self, action: &str) -> Result<()> {
        if self.phase.is_terminal() {
            return Err(ParleyError::InvalidStateTransition(format!(
                "Cannot {} in terminal state",
                action
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Domain, LinearAdditiveUtility};
    use crate::opponent::FrequencyModel;
    use crate::strategy::IndexConfig;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn session() -> SessionState {
        let mut rng = StdRng::seed_from_u64(3);
        let domain = Domain::synthetic(3, 3).unwrap();
        let utility = LinearAdditiveUtility::random(domain.clone(), 0.2, &mut rng).unwrap();
        let index = BidSpaceIndex::build(&utility, &IndexConfig::default(), &mut rng);
        SessionState::new(
            Arc::new(utility),
            index,
            Box::new(FrequencyModel::new(&domain)),
        )
    }

    #[test]
    fn test_records_and_standing_offer() {
        let mut state = session();
        let domain = state.utility().domain().clone();

        state.advance_progress(0.1);
        let record = state.record_received(domain.nth_bid(4)).unwrap();
        assert_eq!(record.sender, Party::Opponent);
        assert_eq!(record.round, 1);
        assert_eq!(record.progress, 0.1);
        assert!(state.has_standing_offer());
        assert_eq!(state.model().observations(), 1);

        state.record_sent(domain.nth_bid(0)).unwrap();
        assert!(!state.has_standing_offer());
        assert!(state.standing_offer().is_none());
        assert_eq!(state.history().len(), 2);
        assert_eq!(state.round(), 2);
    }

    #[test]
    fn test_rejects_foreign_bids() {
        let mut state = session();
        let other = Domain::synthetic(2, 3).unwrap();
        let result = state.record_received(other.nth_bid(0));
        assert!(matches!(result, Err(ParleyError::InvalidBid(_))));
        assert!(state.history().is_empty());
        assert_eq!(state.model().observations(), 0);
    }

    #[test]
    fn test_progress_is_monotone() {
        let mut state = session();
        assert_eq!(state.advance_progress(0.4), 0.4);
        assert_eq!(state.advance_progress(0.2), 0.4);
        assert_eq!(state.advance_progress(f64::NAN), 0.4);
        assert_eq!(state.advance_progress(7.0), 1.0);
    }

    #[test]
    fn test_terminal_is_absorbing() {
        let mut state = session();
        let domain = state.utility().domain().clone();
        state
            .finish(SessionOutcome::NoAgreement {
                reason: "deadline".to_string(),
            })
            .unwrap();

        assert!(state.is_terminal());
        assert!(state.set_phase(Phase::Bidding).is_err());
        assert!(state.record_sent(domain.nth_bid(0)).is_err());
        assert!(state
            .finish(SessionOutcome::NoAgreement {
                reason: "again".to_string()
            })
            .is_err());
    }

    #[test]
    fn test_start_only_once() {
        let mut state = session();
        state
            .start(SessionId::generate(), OpponentId::new("bob"))
            .unwrap();
        assert_eq!(state.opponent(), Some(&OpponentId::new("bob")));
        assert!(state
            .start(SessionId::generate(), OpponentId::new("eve"))
            .is_err());
    }
}
