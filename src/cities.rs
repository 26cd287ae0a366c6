use crate::error::{GameError, Result};
use std::collections::HashSet;

pub const DEFAULT_CITIES: &[&str] = &[
    "Amsterdam", "Ankara", "Ashgabat", "Baghdat", "Bahrein", "Baku", "Bangkok", "Basel",
    "Batumi", "Beirut", "Belgrade", "Berlin", "Bilbao", "Bishkek", "Bologna", "Bombay",
    "Boston", "Bremen", "Budapest", "Dallas", "Delhi", "Doha", "Dubai", "Dublin", "Hamburg",
    "Havana", "Houston", "Kathmandu", "Kiev", "Lagos", "Lisbon", "London", "Lyon", "Madrid",
    "Malaga", "Malta", "Manchester", "Melbourne", "Miami", "Milan", "Montreal", "Moscow",
    "Munich", "Paris", "Phuket", "Porto", "Prague", "Riyadh", "Rotterdam", "Salzburg",
    "Santiago", "Shanghai", "Singapore", "Stockholm", "Stuttgart", "Sydney", "Tashkent",
    "Tokyo", "Toronto", "Tunis", "Valencia", "Venice", "Vienna", "Zagreb", "Zurich",
];

pub fn default_cities() -> Vec<String>
{
    DEFAULT_CITIES.iter().map(|city| city.to_string()).collect()
}

/// Trims names, drops blanks and case-insensitive duplicates (first spelling
/// wins), then sorts case-insensitively for display.
pub fn prepare_city_list(raw: &[String]) -> Result<Vec<String>>
{
    let mut seen = HashSet::new();
    let mut cities: Vec<String> = raw
        .iter()
        .map(|city| city.trim())
        .filter(|city| !city.is_empty())
        .filter(|city| seen.insert(city.to_lowercase()))
        .map(str::to_string)
        .collect();
    if cities.is_empty() {
        return Err(GameError::EmptyCityList);
    }
    sort_case_insensitive(&mut cities);
    Ok(cities)
}

pub fn sort_case_insensitive(cities: &mut [String])
{
    cities.sort_by(|a, b| {
        a.to_lowercase()
            .cmp(&b.to_lowercase())
            .then_with(|| a.cmp(b))
    });
}

#[cfg(test)]
mod tests
{
    use super::*;

    fn owned(names: &[&str]) -> Vec<String>
    {
        names.iter().map(|name| name.to_string()).collect()
    }

    #[test]
    fn default_list_has_sixty_five_unique_cities()
    {
        let prepared = prepare_city_list(&default_cities()).unwrap();
        assert_eq!(prepared.len(), 65);
    }

    #[test]
    fn sorting_ignores_case()
    {
        let prepared = prepare_city_list(&owned(&["zurich", "Amsterdam", "berlin"])).unwrap();
        assert_eq!(prepared, owned(&["Amsterdam", "berlin", "zurich"]));
    }

    #[test]
    fn blanks_and_duplicates_are_dropped()
    {
        let prepared =
            prepare_city_list(&owned(&["  Paris ", "", "paris", "Lyon", "   "])).unwrap();
        assert_eq!(prepared, owned(&["Lyon", "Paris"]));
    }

    #[test]
    fn empty_list_is_rejected()
    {
        let err = prepare_city_list(&owned(&["", "  "])).unwrap_err();
        assert!(matches!(err, GameError::EmptyCityList));
    }
}
