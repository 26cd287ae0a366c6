use crate::cities;
use crate::config::CorridorTiming;
use crate::error::{GameError, Result};
use crate::games::Summary;
use crate::games::session::{Phase, PhaseEvent, Session};
use crate::games::terminal::{self, DIM, GREEN, ORANGE, RED, Rgb, TICK_MS, TerminalGuard};
use crossterm::event::KeyCode;
use rand::Rng;
use rand::seq::{IteratorRandom, SliceRandom};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};
use tracing::{debug, info};

pub const CORRIDOR_COUNT: u8 = 9;
pub const CLOSED_PER_ROUND: usize = 2;
const GRID_COLUMNS: usize = 5;
const TIMER_BAR_WIDTH: usize = 30;
const AUTO_ADVANCE: Duration = Duration::from_millis(1400);
const RESPONSE_LEAD_IN: Duration = Duration::from_millis(400);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Level
{
    Easy,
    #[default]
    Normal,
    Hard,
}

impl Level
{
    pub fn instruction_count(self) -> usize
    {
        match self {
            Level::Easy => 5,
            Level::Normal => 8,
            Level::Hard => 10,
        }
    }
}

impl FromStr for Level
{
    type Err = GameError;

    fn from_str(value: &str) -> Result<Self>
    {
        match value.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Level::Easy),
            "normal" => Ok(Level::Normal),
            "hard" => Ok(Level::Hard),
            _ => Err(GameError::InvalidOption {
                kind: "level",
                value: value.to_string(),
                expected: "easy, normal, hard",
            }),
        }
    }
}

impl fmt::Display for Level
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match self {
            Level::Easy => write!(f, "easy"),
            Level::Normal => write!(f, "normal"),
            Level::Hard => write!(f, "hard"),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Speed
{
    Slow,
    #[default]
    Normal,
    Fast,
}

impl Speed
{
    pub fn per_instruction(self) -> Duration
    {
        match self {
            Speed::Slow => Duration::from_millis(3500),
            Speed::Normal => Duration::from_millis(2500),
            Speed::Fast => Duration::from_millis(1800),
        }
    }

    pub fn base(self) -> Duration
    {
        match self {
            Speed::Slow => Duration::from_millis(2500),
            Speed::Normal => Duration::from_millis(2000),
            Speed::Fast => Duration::from_millis(1200),
        }
    }

    pub fn response_window(self, count: usize) -> Duration
    {
        self.base() + self.per_instruction() * count as u32
    }
}

impl FromStr for Speed
{
    type Err = GameError;

    fn from_str(value: &str) -> Result<Self>
    {
        match value.trim().to_ascii_lowercase().as_str() {
            "slow" => Ok(Speed::Slow),
            "normal" => Ok(Speed::Normal),
            "fast" => Ok(Speed::Fast),
            _ => Err(GameError::InvalidOption {
                kind: "speed",
                value: value.to_string(),
                expected: "slow, normal, fast",
            }),
        }
    }
}

impl fmt::Display for Speed
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match self {
            Speed::Slow => write!(f, "slow"),
            Speed::Normal => write!(f, "normal"),
            Speed::Fast => write!(f, "fast"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Instruction
{
    pub city: String,
    pub corridor: u8,
    pub closed: bool,
}

impl Instruction
{
    pub fn announcement(&self) -> String
    {
        format!("To {} on Corridor {}", self.city, self.corridor)
    }
}

/// Two distinct corridors from `1..=9`, ascending.
pub fn pick_closed_corridors(rng: &mut impl Rng) -> [u8; CLOSED_PER_ROUND]
{
    let mut picked = [0u8; CLOSED_PER_ROUND];
    for (slot, corridor) in picked
        .iter_mut()
        .zip((1..=CORRIDOR_COUNT).choose_multiple(rng, CLOSED_PER_ROUND))
    {
        *slot = corridor;
    }
    picked.sort_unstable();
    picked
}

/// Cities are drawn without replacement, so a set never names a city twice.
/// Yields fewer than `count` instructions if the list is shorter.
pub fn build_instructions(
    rng: &mut impl Rng,
    cities: &[String],
    closed: &[u8],
    count: usize,
) -> Vec<Instruction>
{
    let mut shuffled_cities: Vec<&String> = cities.iter().collect();
    shuffled_cities.shuffle(rng);
    let mut corridors: Vec<u8> = (1..=CORRIDOR_COUNT).collect();
    corridors.shuffle(rng);

    shuffled_cities
        .into_iter()
        .take(count)
        .enumerate()
        .map(|(i, city)| {
            let corridor = corridors[i % corridors.len()];
            Instruction {
                city: city.to_string(),
                corridor,
                closed: closed.contains(&corridor),
            }
        })
        .collect()
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Evaluation
{
    pub correct: bool,
    /// Cities announced on open corridors.
    pub required: BTreeSet<String>,
}

/// Correct iff the trimmed selection equals the set of open-corridor cities.
pub fn evaluate<I, S>(instructions: &[Instruction], selected: I) -> Evaluation
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let required: BTreeSet<String> = instructions
        .iter()
        .filter(|instruction| !instruction.closed)
        .map(|instruction| instruction.city.trim().to_string())
        .collect();
    let selected: BTreeSet<String> = selected
        .into_iter()
        .map(|city| city.as_ref().trim().to_string())
        .collect();
    Evaluation {
        correct: selected == required,
        required,
    }
}

pub fn open_cities(instructions: &[Instruction]) -> Vec<&str>
{
    instructions
        .iter()
        .filter(|instruction| !instruction.closed)
        .map(|instruction| instruction.city.trim())
        .collect()
}

pub struct CorridorGame
{
    session: Session,
    cities: Vec<String>,
    level: Level,
    speed: Speed,
    closed: [u8; CLOSED_PER_ROUND],
    instructions: Vec<Instruction>,
    selected: BTreeSet<String>,
    evaluation: Option<Evaluation>,
}

impl CorridorGame
{
    pub fn new(city_list: &[String], level: Level, speed: Speed) -> Result<Self>
    {
        let cities = cities::prepare_city_list(city_list)?;
        let needed = level.instruction_count();
        if cities.len() < needed {
            return Err(GameError::TooFewCities {
                level,
                needed,
                found: cities.len(),
            });
        }
        Ok(Self {
            session: Session::new(),
            cities,
            level,
            speed,
            closed: [0; CLOSED_PER_ROUND],
            instructions: Vec::new(),
            selected: BTreeSet::new(),
            evaluation: None,
        })
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

    pub fn cities(&self) -> &[String]
    {
        &self.cities
    }

    pub fn closed(&self) -> [u8; CLOSED_PER_ROUND]
    {
        self.closed
    }

    pub fn instructions(&self) -> &[Instruction]
    {
        &self.instructions
    }

    pub fn evaluation(&self) -> Option<&Evaluation>
    {
        self.evaluation.as_ref()
    }

    pub fn is_selected(&self, city: &str) -> bool
    {
        self.selected.contains(city)
    }

    pub fn response_window(&self) -> Duration
    {
        self.speed.response_window(self.instructions.len())
    }

    pub fn new_set(&mut self, rng: &mut impl Rng) -> Result<()>
    {
        let event = if self.phase() == Phase::Scoring {
            PhaseEvent::Continue
        } else {
            PhaseEvent::Start
        };
        self.session.apply(event)?;
        self.closed = pick_closed_corridors(rng);
        self.instructions =
            build_instructions(rng, &self.cities, &self.closed, self.level.instruction_count());
        self.selected.clear();
        self.evaluation = None;
        info!(
            round = self.round(),
            closed = ?self.closed,
            count = self.instructions.len(),
            "corridor set prepared"
        );
        Ok(())
    }

    pub fn finish_presentation(&mut self) -> Result<()>
    {
        self.session.apply(PhaseEvent::PresentationDone)?;
        Ok(())
    }

    pub fn toggle(&mut self, city: &str) -> bool
    {
        if self.phase() != Phase::AwaitingResponse {
            return false;
        }
        if !self.selected.remove(city) {
            self.selected.insert(city.to_string());
        }
        true
    }

    pub fn submit(&mut self) -> Result<&Evaluation>
    {
        self.session.apply(PhaseEvent::Submit)?;
        let evaluation = evaluate(&self.instructions, &self.selected);
        self.session.record_verdict(evaluation.correct)?;
        info!(
            round = self.round(),
            correct = evaluation.correct,
            required = evaluation.required.len(),
            selected = self.selected.len(),
            "corridor set scored"
        );
        Ok(self.evaluation.insert(evaluation))
    }
}

struct ResponseTimer
{
    started: Instant,
    window: Duration,
}

impl ResponseTimer
{
    fn start(window: Duration) -> Self
    {
        Self {
            started: Instant::now(),
            window,
        }
    }

    fn remaining(&self) -> Duration
    {
        self.window.saturating_sub(self.started.elapsed())
    }

    fn expired(&self) -> bool
    {
        self.remaining().is_zero()
    }
}

fn countdown_seconds(remaining: Duration) -> u64
{
    remaining.as_millis().div_ceil(1000) as u64
}

fn timer_color(fraction_left: f32) -> Rgb
{
    if fraction_left <= 0.30 {
        RED
    } else if fraction_left <= 0.60 {
        ORANGE
    } else {
        GREEN
    }
}

fn timer_bar(remaining: Duration, window: Duration) -> String
{
    let fraction = if window.is_zero() {
        0.0
    } else {
        (remaining.as_secs_f32() / window.as_secs_f32()).clamp(0.0, 1.0)
    };
    let filled = (fraction * TIMER_BAR_WIDTH as f32).round() as usize;
    let bar = format!(
        "{}{}",
        "█".repeat(filled),
        " ".repeat(TIMER_BAR_WIDTH - filled)
    );
    format!(
        "Time: {:>2}s [{}]",
        countdown_seconds(remaining),
        terminal::paint(&bar, timer_color(fraction))
    )
}

/// Rows needed to lay out `len` cells column by column.
fn grid_rows(len: usize) -> usize
{
    len.div_ceil(GRID_COLUMNS).max(1)
}

fn move_cursor(cursor: usize, len: usize, code: KeyCode) -> usize
{
    if len == 0 {
        return 0;
    }
    let rows = grid_rows(len);
    let row = cursor % rows;
    let target = match code {
        KeyCode::Up if row > 0 => Some(cursor - 1),
        KeyCode::Down if row + 1 < rows => Some(cursor + 1),
        KeyCode::Left => cursor.checked_sub(rows),
        KeyCode::Right => Some(cursor + rows),
        _ => None,
    };
    match target {
        Some(index) if index < len => index,
        _ => cursor,
    }
}

pub fn run(
    cities: &[String],
    level: Level,
    speed: Speed,
    timing: CorridorTiming,
) -> Result<Summary>
{
    let mut game = CorridorGame::new(cities, level, speed)?;
    let mut term = TerminalGuard::enter()?;
    let mut rng = rand::thread_rng();
    let mut cursor = 0usize;
    let mut timer: Option<ResponseTimer> = None;
    let mut message = format!("Loaded {} cities. Press N for a new set.", game.cities().len());

    'game: loop {
        match game.phase() {
            Phase::Idle => {
                draw(&mut term, &game, &message, 0, None, cursor)?;
                let Some(key) = terminal::poll_key(Duration::from_millis(TICK_MS))? else {
                    continue;
                };
                if terminal::is_quit(&key) {
                    break 'game;
                }
                if matches!(key.code, KeyCode::Char('n') | KeyCode::Char('N')) {
                    game.new_set(&mut rng)?;
                }
            }
            Phase::Presenting => {
                message = format!("Prepared {} instructions.", game.instructions().len());
                let total = game.instructions().len();
                for announced in 1..=total {
                    debug!(
                        announcement = %game.instructions()[announced - 1].announcement(),
                        "announcing"
                    );
                    draw(&mut term, &game, &message, announced, None, cursor)?;
                    term.bell()?;
                    if terminal::pause(timing.gap())? {
                        break 'game;
                    }
                }
                if terminal::pause(RESPONSE_LEAD_IN)? {
                    break 'game;
                }
                terminal::drain_input()?;
                game.finish_presentation()?;
                timer = Some(ResponseTimer::start(game.response_window()));
                cursor = 0;
                message = "Now select the cities on the response screen.".to_string();
            }
            Phase::AwaitingResponse => {
                let expired = timer.as_ref().is_none_or(ResponseTimer::expired);
                if expired {
                    game.submit()?;
                    timer = None;
                    continue;
                }
                draw(&mut term, &game, &message, 0, timer.as_ref(), cursor)?;
                let Some(key) = terminal::poll_key(Duration::from_millis(TICK_MS))? else {
                    continue;
                };
                if terminal::is_quit(&key) {
                    break 'game;
                }
                match key.code {
                    KeyCode::Char(' ') => {
                        if let Some(city) = game.cities().get(cursor).cloned() {
                            game.toggle(&city);
                        }
                    }
                    KeyCode::Enter => {
                        game.submit()?;
                        timer = None;
                    }
                    code => cursor = move_cursor(cursor, game.cities().len(), code),
                }
            }
            Phase::Scoring => {
                let correct = game.evaluation().is_some_and(|evaluation| evaluation.correct);
                message = if correct {
                    "Correct!".to_string()
                } else {
                    format!(
                        "Wrong — correct: {}. Press N for a new set.",
                        open_cities(game.instructions()).join(", ")
                    )
                };
                draw(&mut term, &game, &message, 0, None, cursor)?;
                if correct {
                    if terminal::pause(AUTO_ADVANCE)? {
                        break 'game;
                    }
                    game.new_set(&mut rng)?;
                    continue;
                }
                let Some(key) = terminal::poll_key(Duration::from_millis(TICK_MS))? else {
                    continue;
                };
                if terminal::is_quit(&key) {
                    break 'game;
                }
                if matches!(key.code, KeyCode::Char('n') | KeyCode::Char('N')) {
                    game.new_set(&mut rng)?;
                }
            }
        }
    }

    let summary = Summary {
        game: "corridor",
        rounds: game.round(),
        score: game.score(),
    };
    info!(rounds = summary.rounds, score = summary.score, "corridor game finished");
    Ok(summary)
}

fn draw(
    term: &mut TerminalGuard,
    game: &CorridorGame,
    message: &str,
    announced: usize,
    timer: Option<&ResponseTimer>,
    cursor: usize,
) -> Result<()>
{
    term.draw(&screen_lines(game, message, announced, timer, cursor))
}

fn screen_lines(
    game: &CorridorGame,
    message: &str,
    announced: usize,
    timer: Option<&ResponseTimer>,
    cursor: usize,
) -> Vec<String>
{
    let closed = game.closed();
    let mut lines = vec![
        "Memory Max - Audio Visual Corridors".to_string(),
        format!(
            "Round: {}  Score: {}  Level: {}  Speed: {}",
            game.round(),
            game.score(),
            game.level,
            game.speed
        ),
    ];
    if game.round() > 0 {
        lines.push(format!("Closed corridors: {}, {}", closed[0], closed[1]));
        let strip: Vec<String> = (1..=CORRIDOR_COUNT)
            .map(|corridor| {
                let cell = format!("[{corridor}]");
                if closed.contains(&corridor) {
                    terminal::paint(&cell, DIM)
                } else {
                    cell
                }
            })
            .collect();
        lines.push(strip.join(" "));
    }
    lines.push(String::new());

    match game.phase() {
        Phase::Presenting => {
            let shown = announced.min(game.instructions().len());
            lines.extend(
                game.instructions()[..shown]
                    .iter()
                    .map(Instruction::announcement),
            );
        }
        Phase::AwaitingResponse | Phase::Scoring => {
            if let Some(timer) = timer {
                lines.push(timer_bar(timer.remaining(), timer.window));
            } else {
                lines.push(String::new());
            }
            lines.push(String::new());
            lines.extend(render_grid(game, cursor));
            if game.phase() == Phase::Scoring {
                lines.push(String::new());
                lines.extend(game.instructions().iter().map(Instruction::announcement));
            }
        }
        Phase::Idle => {}
    }

    lines.push(String::new());
    lines.push(message.to_string());
    lines.push(
        "Controls: N new set, arrows move, SPACE toggles, Enter submits, ESC quits".to_string(),
    );
    lines
}

fn render_grid(game: &CorridorGame, cursor: usize) -> Vec<String>
{
    let cities = game.cities();
    let rows = grid_rows(cities.len());
    let width = cities.iter().map(|city| city.chars().count()).max().unwrap_or(0) + 5;
    let evaluation = game.evaluation();

    (0..rows)
        .map(|row| {
            let mut line = String::new();
            for col in 0..GRID_COLUMNS {
                let index = col * rows + row;
                let Some(city) = cities.get(index) else {
                    continue;
                };
                let selected = game.is_selected(city);
                let mut cell = format!(
                    "[{}] {:<pad$}",
                    if selected { 'x' } else { ' ' },
                    city,
                    pad = width - 4
                );
                if let Some(evaluation) = evaluation {
                    if evaluation.required.contains(city.as_str()) {
                        cell = terminal::paint(&cell, GREEN);
                    } else if selected {
                        cell = terminal::paint(&cell, RED);
                    }
                } else if index == cursor && game.phase() == Phase::AwaitingResponse {
                    cell = terminal::highlight(&cell, Rgb { r: 60, g: 60, b: 60 });
                }
                line.push_str(&cell);
            }
            line
        })
        .collect()
}
