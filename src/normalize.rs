//! County name canonicalization and the match key used to join the vote
//! table to the federal registry before FIPS codes exist as a key.
//!
//! The two name-keyed sources use different suffix conventions: the vote
//! scrape marks counties with a trailing " Co." while the registry marks
//! independent cities with a trailing " City". Each extractor strips its own
//! suffix convention, then both feed the same alias table and the same
//! key-squashing rule, so the keys actually collide where they should.

/// Irregular spellings that differ between the vote scrape and the registry.
/// Applied to the display name before the key is built. Every right-hand side
/// is a fixed point of the table, which keeps key construction idempotent.
pub const COUNTY_ALIASES: &[(&str, &str)] = &[
    ("Sainte Genevieve", "Ste. Genevieve"),
    ("Carson City", "Carson"),
    ("Charles City", "Charles"),
    // The registry truncates this one at 20 characters.
    ("Colonial Heights", "Colonial Heights Cit"),
    ("James City", "James"),
];

/// Drop the vote source's " Co." county marker.
pub fn strip_vote_suffix(name: &str) -> &str {
    name.strip_suffix(" Co.").unwrap_or(name).trim()
}

/// Drop the registry's " City" independent-city marker. Counties that keep a
/// deliberate "City"/"County" suffix after this point only exist through the
/// positional overrides, which re-apply the disambiguated name afterwards.
pub fn strip_registry_suffix(name: &str) -> &str {
    name.strip_suffix(" City").unwrap_or(name).trim()
}

/// Resolve a display name through the alias table.
pub fn canonical_county(name: &str) -> &str {
    COUNTY_ALIASES
        .iter()
        .find(|(from, _)| *from == name)
        .map(|(_, to)| *to)
        .unwrap_or(name)
}

/// Build the normalized join key from a county display name and a state
/// abbreviation: alias, lowercase, concatenate, then squash periods, spaces,
/// and apostrophes.
pub fn match_key(county: &str, state_abbr: &str) -> String {
    let county = canonical_county(county.trim());
    let mut key = String::with_capacity(county.len() + state_abbr.len());
    for c in county.chars().chain(state_abbr.trim().chars()) {
        match c {
            '.' | ' ' | '\'' => {}
            c => key.extend(c.to_lowercase()),
        }
    }
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn squashes_punctuation_and_case() {
        assert_eq!(match_key("Ste. Genevieve", "MO"), "stegenevievemo");
        assert_eq!(match_key("O'Brien", "IA"), "obrienia");
        assert_eq!(match_key("De Kalb", "IL"), "dekalbil");
    }

    #[test]
    fn applies_aliases_before_concatenation() {
        assert_eq!(match_key("Sainte Genevieve", "MO"), "stegenevievemo");
        assert_eq!(match_key("Carson City", "NV"), "carsonnv");
        assert_eq!(match_key("James City", "VA"), "jamesva");
    }

    #[test]
    fn key_building_is_idempotent_over_canonicalization() {
        for (raw, canonical) in COUNTY_ALIASES {
            assert_eq!(match_key(raw, "xx"), match_key(canonical, "xx"));
            // Canonical forms are fixed points of the alias table.
            assert_eq!(canonical_county(canonical), *canonical);
        }
    }

    #[test]
    fn source_suffix_conventions_reconcile() {
        // "Harris Co." in the vote scrape and "Harris" in the registry must
        // land on the same key; same for an independent city the registry
        // suffixes with " City".
        assert_eq!(
            match_key(strip_vote_suffix("Harris Co."), "TX"),
            match_key("Harris", "TX"),
        );
        assert_eq!(
            match_key(strip_registry_suffix("Carson City"), "NV"),
            match_key(canonical_county("Carson City"), "NV"),
        );
    }

    #[test]
    fn suffixes_only_strip_at_the_end() {
        assert_eq!(strip_vote_suffix("Harris Co."), "Harris");
        assert_eq!(strip_vote_suffix("Harris"), "Harris");
        assert_eq!(strip_registry_suffix("Fairfax City"), "Fairfax");
        assert_eq!(strip_registry_suffix("City of Industry"), "City of Industry");
    }
}
