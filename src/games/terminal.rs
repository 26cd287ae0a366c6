use crate::error::Result;
use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{execute, queue};
use rand::Rng;
use rand::seq::SliceRandom;
use std::io::{self, Stdout, Write};
use std::time::{Duration, Instant};

pub const TICK_MS: u64 = 33;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Rgb
{
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

pub const GREEN: Rgb = Rgb { r: 34, g: 197, b: 94 };
pub const ORANGE: Rgb = Rgb { r: 255, g: 140, b: 0 };
pub const RED: Rgb = Rgb { r: 239, g: 68, b: 68 };
pub const DIM: Rgb = Rgb { r: 110, g: 110, b: 110 };

pub struct TerminalGuard
{
    stdout: Stdout,
}

impl TerminalGuard
{
    pub fn enter() -> io::Result<Self>
    {
        let mut stdout = io::stdout();
        terminal::enable_raw_mode()?;
        execute!(stdout, EnterAlternateScreen, Hide)?;
        Ok(Self { stdout })
    }

    /// Replaces the whole screen with `lines`.
    pub fn draw(&mut self, lines: &[String]) -> Result<()>
    {
        let output = format!("{}\r\n", lines.join("\r\n"));
        queue!(self.stdout, MoveTo(0, 0), Clear(ClearType::All))?;
        self.stdout.write_all(output.as_bytes())?;
        self.stdout.flush()?;
        Ok(())
    }

    pub fn bell(&mut self) -> Result<()>
    {
        self.stdout.write_all(b"\x07")?;
        self.stdout.flush()?;
        Ok(())
    }
}

impl Drop for TerminalGuard
{
    fn drop(&mut self)
    {
        let _ = execute!(self.stdout, Show, LeaveAlternateScreen);
        let _ = terminal::disable_raw_mode();
    }
}

/// Returns the next key press within `timeout`, if any.
pub fn poll_key(timeout: Duration) -> Result<Option<KeyEvent>>
{
    let deadline = Instant::now() + timeout;
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if !event::poll(remaining)? {
            return Ok(None);
        }
        if let Event::Key(key) = event::read()? {
            if key.kind == KeyEventKind::Press {
                return Ok(Some(key));
            }
        }
        if remaining.is_zero() {
            return Ok(None);
        }
    }
}

pub fn drain_input() -> Result<()>
{
    while event::poll(Duration::from_millis(0))? {
        let _ = event::read()?;
    }
    Ok(())
}

pub fn is_quit(key: &KeyEvent) -> bool
{
    match key.code {
        KeyCode::Esc => true,
        KeyCode::Char('c') => key.modifiers.contains(KeyModifiers::CONTROL),
        _ => false,
    }
}

/// Sleeps for `duration` while still honouring quit keys. Returns `true` on quit.
pub fn pause(duration: Duration) -> Result<bool>
{
    let deadline = Instant::now() + duration;
    while Instant::now() < deadline {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if let Some(key) = poll_key(remaining.min(Duration::from_millis(TICK_MS)))? {
            if is_quit(&key) {
                return Ok(true);
            }
        }
    }
    Ok(false)
}

pub fn paint(text: &str, color: Rgb) -> String
{
    format!("\x1b[38;2;{};{};{}m{}\x1b[0m", color.r, color.g, color.b, text)
}

pub fn highlight(text: &str, color: Rgb) -> String
{
    format!("\x1b[48;2;{};{};{}m{}\x1b[0m", color.r, color.g, color.b, text)
}

/// A line of randomly placed glyphs, used for the win and loss bursts.
pub fn scatter(rng: &mut impl Rng, glyphs: &[&str], count: usize, width: usize) -> String
{
    let width = width.max(count);
    let mut slots = vec![" "; width];
    let mut columns: Vec<usize> = (0..width).collect();
    columns.shuffle(rng);
    for &col in columns.iter().take(count) {
        slots[col] = glyphs.choose(rng).copied().unwrap_or("*");
    }
    slots.concat()
}

pub fn screen_width() -> usize
{
    terminal::size().map(|(cols, _)| cols as usize).unwrap_or(80)
}
