//! Closed country-name to ISO-3166-1 alpha-3 mapping used by the map-chart
//! extractor. Deliberately a fixed table rather than a fuzzy-match library:
//! the sub-agents that feed this table (sentiment, media bias) already
//! constrain themselves to a known set of country mentions, so a closed
//! table keeps the mapping auditable and avoids pulling in a geodata crate
//! for a few hundred lookups.

use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;

static TABLE: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    let mut m = HashMap::new();
    m.insert("united states", "USA");
    m.insert("united states of america", "USA");
    m.insert("usa", "USA");
    m.insert("u.s.", "USA");
    m.insert("u.s.a.", "USA");
    m.insert("china", "CHN");
    m.insert("people's republic of china", "CHN");
    m.insert("russia", "RUS");
    m.insert("russian federation", "RUS");
    m.insert("united kingdom", "GBR");
    m.insert("uk", "GBR");
    m.insert("britain", "GBR");
    m.insert("great britain", "GBR");
    m.insert("france", "FRA");
    m.insert("germany", "DEU");
    m.insert("japan", "JPN");
    m.insert("india", "IND");
    m.insert("brazil", "BRA");
    m.insert("canada", "CAN");
    m.insert("australia", "AUS");
    m.insert("south korea", "KOR");
    m.insert("republic of korea", "KOR");
    m.insert("north korea", "PRK");
    m.insert("democratic people's republic of korea", "PRK");
    m.insert("ukraine", "UKR");
    m.insert("israel", "ISR");
    m.insert("palestine", "PSE");
    m.insert("iran", "IRN");
    m.insert("iraq", "IRQ");
    m.insert("saudi arabia", "SAU");
    m.insert("turkey", "TUR");
    m.insert("turkiye", "TUR");
    m.insert("egypt", "EGY");
    m.insert("south africa", "ZAF");
    m.insert("nigeria", "NGA");
    m.insert("mexico", "MEX");
    m.insert("italy", "ITA");
    m.insert("spain", "ESP");
    m.insert("poland", "POL");
    m.insert("netherlands", "NLD");
    m.insert("sweden", "SWE");
    m.insert("norway", "NOR");
    m.insert("finland", "FIN");
    m.insert("switzerland", "CHE");
    m.insert("austria", "AUT");
    m.insert("belgium", "BEL");
    m.insert("greece", "GRC");
    m.insert("portugal", "PRT");
    m.insert("ireland", "IRL");
    m.insert("denmark", "DNK");
    m.insert("taiwan", "TWN");
    m.insert("vietnam", "VNM");
    m.insert("indonesia", "IDN");
    m.insert("philippines", "PHL");
    m.insert("thailand", "THA");
    m.insert("pakistan", "PAK");
    m.insert("bangladesh", "BGD");
    m.insert("afghanistan", "AFG");
    m.insert("syria", "SYR");
    m.insert("lebanon", "LBN");
    m.insert("jordan", "JOR");
    m.insert("yemen", "YEM");
    m.insert("qatar", "QAT");
    m.insert("united arab emirates", "ARE");
    m.insert("uae", "ARE");
    m.insert("argentina", "ARG");
    m.insert("chile", "CHL");
    m.insert("colombia", "COL");
    m.insert("venezuela", "VEN");
    m.insert("cuba", "CUB");
    m.insert("new zealand", "NZL");
    m
});

/// The set of ISO-3 codes `TABLE` maps onto, used so `resolve` treats an
/// already-mapped code as a fixed point rather than an unknown name.
static VALID_CODES: Lazy<HashSet<&'static str>> = Lazy::new(|| TABLE.values().copied().collect());

/// Disjoint outcome of mapping a set of country-name mentions: unmapped
/// names are dropped from the chart but reported, never silently
/// discarded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MappingOutcome {
    pub mapped: Vec<(String, String)>,
    pub skipped: Vec<String>,
}

/// Resolve a single country name (case-insensitive, exact match against the
/// closed table) to its ISO-3 code. An input that is already a valid ISO-3
/// code resolves to itself, so re-normalizing an already-mapped payload is
/// stable: `resolve(resolve(x)) == resolve(x)`.
pub fn resolve(name: &str) -> Option<&'static str> {
    let trimmed = name.trim();
    if let Some(code) = TABLE.get(trimmed.to_lowercase().as_str()) {
        return Some(code);
    }
    VALID_CODES.get(trimmed.to_uppercase().as_str()).copied()
}

/// Resolve a batch of country-name mentions into mapped/skipped sets,
/// disjoint and order-preserving within each set.
pub fn resolve_all(names: &[String]) -> MappingOutcome {
    let mut outcome = MappingOutcome::default();
    for name in names {
        match resolve(name) {
            Some(code) => outcome.mapped.push((name.clone(), code.to_string())),
            None => outcome.skipped.push(name.clone()),
        }
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_known_country_case_insensitively() {
        assert_eq!(resolve("United States"), Some("USA"));
        assert_eq!(resolve("RUSSIA"), Some("RUS"));
        assert_eq!(resolve("  france  "), Some("FRA"));
    }

    #[test]
    fn unknown_country_resolves_to_none() {
        assert_eq!(resolve("Narnia"), None);
    }

    #[test]
    fn resolve_is_idempotent_on_already_mapped_codes() {
        for name in ["Israel", "China", "Russia", "United Kingdom"] {
            let code = resolve(name).unwrap();
            assert_eq!(resolve(code), Some(code));
        }
    }

    #[test]
    fn resolve_all_partitions_mapped_and_skipped_disjointly() {
        let names = vec!["China".to_string(), "Narnia".to_string(), "Japan".to_string()];
        let outcome = resolve_all(&names);
        assert_eq!(outcome.mapped.len(), 2);
        assert_eq!(outcome.skipped, vec!["Narnia".to_string()]);
        let mapped_names: Vec<_> = outcome.mapped.iter().map(|(n, _)| n.clone()).collect();
        assert!(mapped_names.iter().all(|n| !outcome.skipped.contains(n)));
    }
}
