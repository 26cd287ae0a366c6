use crate::error::{GameError, Result};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase
{
    Idle,
    Presenting,
    AwaitingResponse,
    Scoring,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseEvent
{
    Start,
    PresentationDone,
    /// Also sent when the response window runs out.
    Submit,
    Continue,
    Stop,
}

#[derive(Debug)]
pub struct Session
{
    phase: Phase,
    round: u32,
    score: u32,
    scored_this_round: bool,
}

impl Session
{
    pub fn new() -> Self
    {
        Self {
            phase: Phase::Idle,
            round: 0,
            score: 0,
            scored_this_round: false,
        }
    }

    pub fn phase(&self) -> Phase
    {
        self.phase
    }

    pub fn round(&self) -> u32
    {
        self.round
    }

    pub fn score(&self) -> u32
    {
        self.score
    }

    pub fn apply(&mut self, event: PhaseEvent) -> Result<Phase>
    {
        let next = match (self.phase, event) {
            (Phase::Idle, PhaseEvent::Start) | (Phase::Scoring, PhaseEvent::Continue) => {
                self.round += 1;
                self.scored_this_round = false;
                Phase::Presenting
            }
            (Phase::Presenting, PhaseEvent::PresentationDone) => Phase::AwaitingResponse,
            (Phase::AwaitingResponse, PhaseEvent::Submit) => Phase::Scoring,
            (Phase::Scoring, PhaseEvent::Stop) => Phase::Idle,
            (phase, event) => return Err(GameError::InvalidTransition { phase, event }),
        };
        debug!(from = ?self.phase, to = ?next, ?event, round = self.round, "phase change");
        self.phase = next;
        Ok(next)
    }

    // Only the first verdict of a round counts.
    pub fn record_verdict(&mut self, correct: bool) -> Result<()>
    {
        if self.phase != Phase::Scoring {
            return Err(GameError::InvalidTransition {
                phase: self.phase,
                event: PhaseEvent::Submit,
            });
        }
        if correct && !self.scored_this_round {
            self.score += 1;
        }
        self.scored_this_round = true;
        Ok(())
    }

    pub fn reset(&mut self)
    {
        *self = Self::new();
    }
}

impl Default for Session
{
    fn default() -> Self
    {
        Self::new()
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    fn play_round(session: &mut Session, correct: bool)
    {
        session.apply(PhaseEvent::PresentationDone).unwrap();
        session.apply(PhaseEvent::Submit).unwrap();
        session.record_verdict(correct).unwrap();
    }

    #[test]
    fn full_cycle_counts_rounds_and_score()
    {
        let mut session = Session::new();
        assert_eq!(session.phase(), Phase::Idle);

        session.apply(PhaseEvent::Start).unwrap();
        assert_eq!(session.round(), 1);
        play_round(&mut session, true);
        assert_eq!(session.score(), 1);

        assert_eq!(session.apply(PhaseEvent::Continue).unwrap(), Phase::Presenting);
        assert_eq!(session.round(), 2);
        play_round(&mut session, false);
        assert_eq!(session.score(), 1);

        assert_eq!(session.apply(PhaseEvent::Stop).unwrap(), Phase::Idle);
        assert_eq!(session.round(), 2);
    }

    #[test]
    fn submit_before_presentation_finishes_is_rejected()
    {
        let mut session = Session::new();
        session.apply(PhaseEvent::Start).unwrap();
        let err = session.apply(PhaseEvent::Submit).unwrap_err();
        assert!(matches!(
            err,
            GameError::InvalidTransition {
                phase: Phase::Presenting,
                event: PhaseEvent::Submit,
            }
        ));
        assert_eq!(session.phase(), Phase::Presenting);
    }

    #[test]
    fn verdict_outside_scoring_is_rejected()
    {
        let mut session = Session::new();
        assert!(session.record_verdict(true).is_err());
        assert_eq!(session.score(), 0);
    }

    #[test]
    fn repeated_verdicts_score_once()
    {
        let mut session = Session::new();
        session.apply(PhaseEvent::Start).unwrap();
        play_round(&mut session, true);
        session.record_verdict(true).unwrap();
        assert_eq!(session.score(), 1);
    }

    #[test]
    fn reset_returns_to_idle()
    {
        let mut session = Session::new();
        session.apply(PhaseEvent::Start).unwrap();
        play_round(&mut session, true);
        session.reset();
        assert_eq!(session.phase(), Phase::Idle);
        assert_eq!(session.round(), 0);
        assert_eq!(session.score(), 0);
    }
}
