//! Team-name normalization and fuzzy matching across providers.
//!
//! The odds feed and the scoreboard feed spell franchises differently
//! ("LA Lakers" vs "Los Angeles Lakers"), so merge keys are built from
//! normalized names and compared with a tolerant equality.

/// Shortest shared tail that counts as the same nickname. Five keeps
/// "brooklynnets" and "charlottehornets" apart (their shared tail "nets"
/// is four) while "lalakers" / "losangeleslakers" share six.
const MIN_SUFFIX_OVERLAP: usize = 5;

/// Lowercase a name and strip everything but ASCII letters and digits.
pub fn normalize_team(name: &str) -> String {
    name.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Merge key for a matchup: normalized away and home names joined by a
/// separator that cannot appear inside a normalized name.
pub fn pair_key(away_team: &str, home_team: &str) -> String {
    format!("{}__{}", normalize_team(away_team), normalize_team(home_team))
}

/// Do two raw provider names refer to the same franchise?
pub fn same_team(a: &str, b: &str) -> bool {
    same_team_normalized(&normalize_team(a), &normalize_team(b))
}

/// Tolerant equality over already-normalized names: exact match, containment
/// in either direction (short forms like "heat" inside "miamiheat"), or a
/// shared nickname tail ("lalakers" / "losangeleslakers").
pub fn same_team_normalized(a: &str, b: &str) -> bool {
    if a.is_empty() || b.is_empty() {
        return false;
    }
    if a == b || a.contains(b) || b.contains(a) {
        return true;
    }
    common_suffix_len(a, b) >= MIN_SUFFIX_OVERLAP
}

fn common_suffix_len(a: &str, b: &str) -> usize {
    a.bytes()
        .rev()
        .zip(b.bytes().rev())
        .take_while(|(x, y)| x == y)
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_punctuation_and_case() {
        assert_eq!(normalize_team("Los Angeles Lakers"), "losangeleslakers");
        assert_eq!(normalize_team("L.A. Lakers"), "lalakers");
        assert_eq!(normalize_team("Philadelphia 76ers"), "philadelphia76ers");
    }

    #[test]
    fn test_pair_key_is_away_then_home() {
        assert_eq!(
            pair_key("Boston Celtics", "Miami Heat"),
            "bostonceltics__miamiheat"
        );
    }

    #[test]
    fn test_short_and_long_forms_match() {
        assert!(same_team("LA Lakers", "Los Angeles Lakers"));
        assert!(same_team("Heat", "Miami Heat"));
        assert!(same_team("LA Clippers", "Los Angeles Clippers"));
        assert!(same_team("NY Knicks", "New York Knicks"));
    }

    #[test]
    fn test_different_franchises_do_not_match() {
        assert!(!same_team("Los Angeles Lakers", "LA Clippers"));
        assert!(!same_team("Brooklyn Nets", "Charlotte Hornets"));
        assert!(!same_team("Indiana Pacers", "Los Angeles Lakers"));
        assert!(!same_team("Denver Nuggets", "Brooklyn Nets"));
    }

    #[test]
    fn test_empty_names_never_match() {
        assert!(!same_team("", ""));
        assert!(!same_team("", "Miami Heat"));
    }
}
