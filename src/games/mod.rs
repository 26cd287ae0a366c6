pub mod corridor;
pub mod sequence;
pub mod session;
pub mod terminal;

pub struct GameDescriptor
{
    pub name: &'static str,
    pub description: &'static str,
}

pub fn registry() -> Vec<GameDescriptor>
{
    vec![GameDescriptor {
        name: "sequence",
        description: "Recall a growing digit sequence, keeping digits not below the first",
    },
    GameDescriptor {
        name: "corridor",
        description: "Remember which cities were sent down open corridors",
    }]
}

pub fn find(name: &str) -> Option<&'static str>
{
    registry()
        .into_iter()
        .find(|game| game.name.eq_ignore_ascii_case(name))
        .map(|game| game.name)
}

/// Outcome of one play session, printed after the terminal is restored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary
{
    pub game: &'static str,
    pub rounds: u32,
    pub score: u32,
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn registry_lists_both_games()
    {
        let names: Vec<&str> = registry().iter().map(|game| game.name).collect();
        assert_eq!(names, vec!["sequence", "corridor"]);
    }

    #[test]
    fn lookup_ignores_case()
    {
        assert_eq!(find("Corridor"), Some("corridor"));
        assert_eq!(find("wordle"), None);
    }
}
