use crate::config::SequenceTiming;
use crate::error::Result;
use crate::games::Summary;
use crate::games::session::{Phase, PhaseEvent, Session};
use crate::games::terminal::{self, GREEN, RED, TICK_MS, TerminalGuard};
use crossterm::event::KeyCode;
use rand::Rng;
use std::time::Duration;
use tracing::info;

pub const MAX_DIGIT: u8 = 9;
const CONFETTI: &[&str] = &["🌹", "❤️", "💕"];
const SAD: &[&str] = &["💔", "😢", "😭"];
const BURST_COUNT: usize = 15;

/// The expected reply: every digit not smaller than the first, in order.
pub fn compute_correct_answer(sequence: &[u8]) -> String
{
    let Some(&first) = sequence.first() else {
        return String::new();
    };
    sequence
        .iter()
        .filter(|&&digit| digit >= first)
        .map(|digit| digit.to_string())
        .collect()
}

pub fn generate_sequence(rng: &mut impl Rng, len: usize) -> Vec<u8>
{
    (0..len).map(|_| rng.gen_range(0..=MAX_DIGIT)).collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict
{
    pub correct: bool,
    pub expected: String,
    pub given: String,
}

/// State of one numeric-recall run: the current sequence and the reply being typed.
#[derive(Debug, Default)]
pub struct SequenceGame
{
    session: Session,
    sequence: Vec<u8>,
    response: String,
    verdict: Option<Verdict>,
}

impl SequenceGame
{
    pub fn new() -> Self
    {
        Self::default()
    }

    pub fn phase(&self) -> Phase
    {
        self.session.phase()
    }

    pub fn round(&self) -> u32
    {
        self.session.round()
    }

    pub fn score(&self) -> u32
    {
        self.session.score()
    }

    pub fn sequence(&self) -> &[u8]
    {
        &self.sequence
    }

    pub fn response(&self) -> &str
    {
        &self.response
    }

    pub fn verdict(&self) -> Option<&Verdict>
    {
        self.verdict.as_ref()
    }

    /// Starts the next round with a fresh sequence as long as the round number.
    pub fn start_round(&mut self, rng: &mut impl Rng) -> Result<()>
    {
        let event = if self.phase() == Phase::Scoring {
            PhaseEvent::Continue
        } else {
            PhaseEvent::Start
        };
        self.session.apply(event)?;
        self.sequence = generate_sequence(rng, self.round() as usize);
        self.response.clear();
        self.verdict = None;
        info!(round = self.round(), "sequence round started");
        Ok(())
    }

    pub fn finish_presentation(&mut self) -> Result<()>
    {
        self.session.apply(PhaseEvent::PresentationDone)?;
        Ok(())
    }

    /// Appends a digit to the reply. Ignored outside the response phase.
    pub fn push_digit(&mut self, digit: u8) -> bool
    {
        if self.phase() != Phase::AwaitingResponse || digit > MAX_DIGIT {
            return false;
        }
        self.response.push(char::from(b'0' + digit));
        true
    }

    pub fn clear_response(&mut self)
    {
        self.response.clear();
    }

    /// Scores the reply. An empty reply is not submittable and yields `None`.
    /// A wrong reply ends the run.
    pub fn submit(&mut self) -> Result<Option<&Verdict>>
    {
        if self.response.is_empty() {
            return Ok(None);
        }
        self.session.apply(PhaseEvent::Submit)?;
        let expected = compute_correct_answer(&self.sequence);
        let given = std::mem::take(&mut self.response);
        let correct = given == expected;
        self.session.record_verdict(correct)?;
        info!(round = self.round(), correct, %expected, %given, "sequence scored");
        if !correct {
            self.session.apply(PhaseEvent::Stop)?;
        }
        self.verdict = Some(Verdict {
            correct,
            expected,
            given,
        });
        Ok(self.verdict.as_ref())
    }

    pub fn restart(&mut self)
    {
        self.session.reset();
        self.sequence.clear();
        self.response.clear();
        self.verdict = None;
    }

    pub fn summary(&self) -> Summary
    {
        Summary {
            game: "sequence",
            rounds: self.round(),
            score: self.score(),
        }
    }
}

pub fn run(timing: SequenceTiming) -> Result<Summary>
{
    let mut term = TerminalGuard::enter()?;
    let mut rng = rand::thread_rng();
    let mut game = SequenceGame::new();
    let mut burst = String::new();

    'game: loop {
        match game.phase() {
            Phase::Idle => {
                let status = match game.verdict() {
                    Some(verdict) => format!(
                        "Wrong — correct was {}. Game over. Press R to restart.",
                        verdict.expected
                    ),
                    None => "Press SPACE to start.".to_string(),
                };
                draw(&mut term, &game, "", &status, &burst)?;
                let Some(key) = terminal::poll_key(Duration::from_millis(TICK_MS))? else {
                    continue;
                };
                if terminal::is_quit(&key) {
                    break 'game;
                }
                match key.code {
                    KeyCode::Char('r') | KeyCode::Char('R') => {
                        game.restart();
                        burst.clear();
                    }
                    KeyCode::Char(' ') | KeyCode::Enter if game.verdict().is_none() => {
                        game.start_round(&mut rng)?;
                    }
                    _ => {}
                }
            }
            Phase::Presenting => {
                burst.clear();
                let digits = game.sequence().to_vec();
                for digit in digits {
                    draw(&mut term, &game, &digit.to_string(), "Watch closely...", "")?;
                    if terminal::pause(timing.digit_on())? {
                        break 'game;
                    }
                    draw(&mut term, &game, "", "Watch closely...", "")?;
                    if terminal::pause(timing.digit_off())? {
                        break 'game;
                    }
                }
                terminal::drain_input()?;
                game.finish_presentation()?;
            }
            Phase::AwaitingResponse => {
                draw(&mut term, &game, "", "Type your answer.", "")?;
                let Some(key) = terminal::poll_key(Duration::from_millis(TICK_MS))? else {
                    continue;
                };
                if terminal::is_quit(&key) {
                    break 'game;
                }
                match key.code {
                    KeyCode::Char(ch) if ch.is_ascii_digit() => {
                        game.push_digit(ch as u8 - b'0');
                    }
                    KeyCode::Backspace => game.clear_response(),
                    KeyCode::Enter => {
                        if let Some(verdict) = game.submit()? {
                            let glyphs = if verdict.correct { CONFETTI } else { SAD };
                            burst = terminal::scatter(
                                &mut rng,
                                glyphs,
                                BURST_COUNT,
                                terminal::screen_width() / 2,
                            );
                        }
                    }
                    _ => {}
                }
            }
            Phase::Scoring => {
                draw(&mut term, &game, "", "Correct! Press N for the next round.", &burst)?;
                let Some(key) = terminal::poll_key(Duration::from_millis(TICK_MS))? else {
                    continue;
                };
                if terminal::is_quit(&key) {
                    break 'game;
                }
                if matches!(key.code, KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Char(' ')) {
                    game.start_round(&mut rng)?;
                }
            }
        }
    }

    let summary = game.summary();
    info!(rounds = summary.rounds, score = summary.score, "sequence game finished");
    Ok(summary)
}

fn draw(
    term: &mut TerminalGuard,
    game: &SequenceGame,
    shown: &str,
    status: &str,
    burst: &str,
) -> Result<()>
{
    let status = match game.verdict() {
        Some(verdict) if verdict.correct => terminal::paint(status, GREEN),
        Some(_) => terminal::paint(status, RED),
        None => status.to_string(),
    };
    let lines = vec![
        "Memory Max - Number Sequence".to_string(),
        format!("Round: {}  Score: {}", game.round(), game.score()),
        String::new(),
        burst.to_string(),
        format!("        [ {:^3} ]", shown),
        String::new(),
        status,
        match game.verdict() {
            Some(verdict) => format!("You entered: {}", verdict.given),
            None => format!("Response: {}", game.response()),
        },
        String::new(),
        "Controls: 0-9 to answer, Backspace clears, Enter submits, ESC quits".to_string(),
    ];
    term.draw(&lines)
}

#[cfg(test)]
mod tests
{
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn empty_sequence_has_empty_answer()
    {
        assert_eq!(compute_correct_answer(&[]), "");
    }

    #[test]
    fn answers_keep_digits_not_below_the_first()
    {
        assert_eq!(compute_correct_answer(&[5, 9]), "59");
        assert_eq!(compute_correct_answer(&[5, 3, 7]), "57");
        assert_eq!(compute_correct_answer(&[9, 9, 9]), "999");
        assert_eq!(compute_correct_answer(&[7, 2, 1]), "7");
        assert_eq!(compute_correct_answer(&[0, 4, 0, 1]), "0401");
    }

    #[test]
    fn answer_is_deterministic()
    {
        let mut rng = StdRng::seed_from_u64(42);
        for len in 0..12 {
            let sequence = generate_sequence(&mut rng, len);
            let first = compute_correct_answer(&sequence);
            assert_eq!(first, compute_correct_answer(&sequence));
            assert!(first.len() <= sequence.len());
            if let Some(&head) = sequence.first() {
                assert!(first.starts_with(&head.to_string()));
            }
        }
    }

    #[test]
    fn generated_digits_stay_in_range()
    {
        let mut rng = StdRng::seed_from_u64(3);
        let sequence = generate_sequence(&mut rng, 500);
        assert_eq!(sequence.len(), 500);
        assert!(sequence.iter().all(|&digit| digit <= MAX_DIGIT));
    }

    #[test]
    fn round_length_tracks_round_number()
    {
        let mut rng = StdRng::seed_from_u64(9);
        let mut game = SequenceGame::new();
        for expected_round in 1..=4 {
            game.start_round(&mut rng).unwrap();
            assert_eq!(game.sequence().len(), expected_round);
            game.finish_presentation().unwrap();
            for ch in compute_correct_answer(game.sequence()).chars() {
                assert!(game.push_digit(ch as u8 - b'0'));
            }
            let verdict = game.submit().unwrap().unwrap();
            assert!(verdict.correct);
        }
        assert_eq!(game.score(), 4);
        assert_eq!(game.phase(), Phase::Scoring);
    }

    #[test]
    fn digits_are_ignored_while_presenting()
    {
        let mut rng = StdRng::seed_from_u64(1);
        let mut game = SequenceGame::new();
        game.start_round(&mut rng).unwrap();
        assert!(!game.push_digit(3));
        assert_eq!(game.response(), "");
    }

    #[test]
    fn empty_reply_cannot_be_submitted()
    {
        let mut rng = StdRng::seed_from_u64(1);
        let mut game = SequenceGame::new();
        game.start_round(&mut rng).unwrap();
        game.finish_presentation().unwrap();
        assert!(game.submit().unwrap().is_none());
        assert_eq!(game.phase(), Phase::AwaitingResponse);
    }

    #[test]
    fn wrong_reply_ends_the_run()
    {
        let mut rng = StdRng::seed_from_u64(5);
        let mut game = SequenceGame::new();
        game.start_round(&mut rng).unwrap();
        game.finish_presentation().unwrap();
        let expected = compute_correct_answer(game.sequence());
        game.push_digit(1);
        game.push_digit(1);
        let verdict = game.submit().unwrap().unwrap().clone();
        assert!(!verdict.correct);
        assert_eq!(verdict.expected, expected);
        assert_eq!(game.phase(), Phase::Idle);
        assert_eq!(game.score(), 0);

        game.restart();
        assert_eq!(game.round(), 0);
        assert!(game.verdict().is_none());
    }

    fn answer_round(game: &mut SequenceGame, rng: &mut StdRng, correct: bool)
    {
        game.start_round(rng).unwrap();
        game.finish_presentation().unwrap();
        let mut reply = compute_correct_answer(game.sequence());
        if !correct {
            reply.push('0');
        }
        for ch in reply.chars() {
            game.push_digit(ch as u8 - b'0');
        }
        game.submit().unwrap();
    }

    #[test]
    fn summary_rounds_and_score_cover_the_same_run()
    {
        let mut rng = StdRng::seed_from_u64(13);
        let mut game = SequenceGame::new();
        answer_round(&mut game, &mut rng, true);
        answer_round(&mut game, &mut rng, true);
        answer_round(&mut game, &mut rng, false);
        let summary = game.summary();
        assert_eq!((summary.rounds, summary.score), (3, 2));

        game.restart();
        assert_eq!(game.phase(), Phase::Idle);
        assert!(game.sequence().is_empty());
        answer_round(&mut game, &mut rng, true);
        let summary = game.summary();
        assert_eq!((summary.rounds, summary.score), (1, 1));
    }

    #[test]
    fn clearing_discards_the_whole_reply()
    {
        let mut rng = StdRng::seed_from_u64(2);
        let mut game = SequenceGame::new();
        game.start_round(&mut rng).unwrap();
        game.finish_presentation().unwrap();
        game.push_digit(4);
        game.push_digit(2);
        assert_eq!(game.response(), "42");
        game.clear_response();
        assert_eq!(game.response(), "");
    }
}
