use std::path::PathBuf;
use thiserror::Error;

use crate::games::corridor::Level;
use crate::games::session::{Phase, PhaseEvent};

#[derive(Debug, Error)]
pub enum GameError
{
    #[error("Terminal I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read config at {path}: {source}")]
    ConfigRead
    {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Unknown {kind} '{value}' (expected one of: {expected})")]
    InvalidOption
    {
        kind: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error("City list is empty after removing blank names")]
    EmptyCityList,

    #[error("Level {level} needs at least {needed} cities, but only {found} are configured")]
    TooFewCities
    {
        level: Level,
        needed: usize,
        found: usize,
    },

    #[error("Cannot handle {event:?} while {phase:?}")]
    InvalidTransition
    {
        phase: Phase,
        event: PhaseEvent,
    },

    #[error("Unknown game '{0}'. Run with --help.")]
    UnknownGame(String),
}

pub type Result<T> = std::result::Result<T, GameError>;

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn invalid_option_names_the_choices()
    {
        let err = GameError::InvalidOption {
            kind: "level",
            value: "extreme".to_string(),
            expected: "easy, normal, hard",
        };
        assert_eq!(
            err.to_string(),
            "Unknown level 'extreme' (expected one of: easy, normal, hard)"
        );
    }

    #[test]
    fn io_errors_convert()
    {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "gone");
        let err: GameError = io.into();
        assert!(matches!(err, GameError::Io(_)));
        assert!(err.to_string().contains("gone"));
    }
}
