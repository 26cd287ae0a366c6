//! Settings loaded from `~/.memory-games/config.toml` (or `$MEMORY_GAMES_CONFIG`).

use crate::cities;
use crate::error::{GameError, Result};
use crate::games::corridor::{Level, Speed};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

const CONFIG_ENV: &str = "MEMORY_GAMES_CONFIG";
const LEVEL_ENV: &str = "MEMORY_GAMES_LEVEL";
const SPEED_ENV: &str = "MEMORY_GAMES_SPEED";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config
{
    /// City names offered on the corridor response screen.
    pub cities: Vec<String>,
    pub level: Level,
    pub speed: Speed,
    pub sequence: SequenceTiming,
    pub corridor: CorridorTiming,
}

impl Default for Config
{
    fn default() -> Self
    {
        Self {
            cities: cities::default_cities(),
            level: Level::default(),
            speed: Speed::default(),
            sequence: SequenceTiming::default(),
            corridor: CorridorTiming::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct SequenceTiming
{
    pub digit_on_ms: u64,
    pub digit_off_ms: u64,
}

impl SequenceTiming
{
    pub fn digit_on(&self) -> Duration
    {
        Duration::from_millis(self.digit_on_ms)
    }

    pub fn digit_off(&self) -> Duration
    {
        Duration::from_millis(self.digit_off_ms)
    }
}

impl Default for SequenceTiming
{
    fn default() -> Self
    {
        Self {
            digit_on_ms: 1000,
            digit_off_ms: 100,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct CorridorTiming
{
    /// Pause between two announced instructions.
    pub gap_ms: u64,
}

impl CorridorTiming
{
    pub fn gap(&self) -> Duration
    {
        Duration::from_millis(self.gap_ms)
    }
}

impl Default for CorridorTiming
{
    fn default() -> Self
    {
        Self { gap_ms: 700 }
    }
}

pub fn default_path() -> PathBuf
{
    if let Ok(path) = env::var(CONFIG_ENV) {
        return PathBuf::from(path);
    }
    let home = env::var("HOME")
        .or_else(|_| env::var("USERPROFILE"))
        .unwrap_or_else(|_| ".".to_string());
    path_for_home(&home)
}

fn path_for_home(home: &str) -> PathBuf
{
    PathBuf::from(home).join(".memory-games").join("config.toml")
}

/// Loads the config. An explicit path must exist; the default location may be
/// absent, in which case built-in defaults are used.
pub fn load(explicit: Option<&Path>) -> Result<Config>
{
    let mut config = match explicit {
        Some(path) => read_file(path)?,
        None => {
            let path = default_path();
            if path.exists() {
                read_file(&path)?
            } else {
                debug!(path = %path.display(), "no config file, using defaults");
                Config::default()
            }
        }
    };
    apply_overrides(&mut config, |key| env::var(key).ok());
    config.cities = cities::prepare_city_list(&config.cities)?;
    Ok(config)
}

fn read_file(path: &Path) -> Result<Config>
{
    let raw = fs::read_to_string(path).map_err(|source| GameError::ConfigRead {
        path: path.to_path_buf(),
        source,
    })?;
    let config: Config = toml::from_str(&raw)?;
    info!(path = %path.display(), cities = config.cities.len(), "loaded config");
    Ok(config)
}

fn apply_overrides(config: &mut Config, lookup: impl Fn(&str) -> Option<String>)
{
    if let Some(value) = lookup(LEVEL_ENV) {
        match value.parse::<Level>() {
            Ok(level) => config.level = level,
            Err(err) => warn!(%err, "ignoring {LEVEL_ENV}"),
        }
    }
    if let Some(value) = lookup(SPEED_ENV) {
        match value.parse::<Speed>() {
            Ok(speed) => config.speed = speed,
            Err(err) => warn!(%err, "ignoring {SPEED_ENV}"),
        }
    }
}

#[cfg(test)]
mod tests
{
    use super::*;
    use std::io::Write;

    fn write_config(dir: &tempfile::TempDir, body: &str) -> PathBuf
    {
        let path = dir.path().join("config.toml");
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(body.as_bytes()).unwrap();
        path
    }

    #[test]
    fn defaults_match_the_original_games()
    {
        let config = Config::default();
        assert_eq!(config.level, Level::Normal);
        assert_eq!(config.speed, Speed::Normal);
        assert_eq!(config.sequence.digit_on(), Duration::from_millis(1000));
        assert_eq!(config.sequence.digit_off(), Duration::from_millis(100));
        assert_eq!(config.corridor.gap(), Duration::from_millis(700));
        assert_eq!(config.cities.len(), 65);
    }

    #[test]
    fn partial_file_keeps_other_defaults()
    {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            "level = \"hard\"\ncities = [\"zagreb\", \"Athens\"]\n\n[sequence]\ndigit_on_ms = 400\n",
        );
        let config = load(Some(&path)).unwrap();
        assert_eq!(config.level, Level::Hard);
        assert_eq!(config.speed, Speed::Normal);
        assert_eq!(config.sequence.digit_on_ms, 400);
        assert_eq!(config.sequence.digit_off_ms, 100);
        assert_eq!(config.cities, vec!["Athens".to_string(), "zagreb".to_string()]);
    }

    #[test]
    fn missing_explicit_file_is_an_error()
    {
        let dir = tempfile::tempdir().unwrap();
        let err = load(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(matches!(err, GameError::ConfigRead { .. }));
    }

    #[test]
    fn malformed_file_is_a_parse_error()
    {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "level = [1, 2");
        let err = load(Some(&path)).unwrap_err();
        assert!(matches!(err, GameError::ConfigParse(_)));
    }

    #[test]
    fn unknown_level_in_file_is_rejected()
    {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "level = \"extreme\"\n");
        assert!(load(Some(&path)).is_err());
    }

    #[test]
    fn blank_city_list_is_rejected()
    {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "cities = [\" \"]\n");
        let err = load(Some(&path)).unwrap_err();
        assert!(matches!(err, GameError::EmptyCityList));
    }

    #[test]
    fn env_overrides_apply_and_bad_values_are_ignored()
    {
        let mut config = Config::default();
        apply_overrides(&mut config, |key| match key {
            LEVEL_ENV => Some("easy".to_string()),
            SPEED_ENV => Some("warp".to_string()),
            _ => None,
        });
        assert_eq!(config.level, Level::Easy);
        assert_eq!(config.speed, Speed::Normal);
    }

    #[test]
    fn home_path_layout()
    {
        assert_eq!(
            path_for_home("/home/player"),
            PathBuf::from("/home/player/.memory-games/config.toml")
        );
    }
}
