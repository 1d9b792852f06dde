//! Switch name expansion and substation derivation.

use std::collections::BTreeMap;

use relay_model::SuffixExpansion;

/// Expand a double cable box name into its component switch names.
///
/// `expansions` must be ordered longest suffix first. The stem before the
/// matched suffix is kept and each component appended, so `NIP1A+B` becomes
/// `NIP1A` and `NIP1B`. Names without a known suffix expand to themselves.
pub fn expand_double_box(name: &str, expansions: &[SuffixExpansion]) -> Vec<String> {
    for expansion in expansions {
        let Some(stem) = name.strip_suffix(expansion.suffix.as_str()) else {
            continue;
        };
        if stem.is_empty() {
            break;
        }
        return expansion
            .components
            .iter()
            .map(|component| format!("{stem}{component}"))
            .collect();
    }
    vec![name.to_string()]
}

/// How a record relates to a substation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SubstationScope {
    /// Alphabetic code, either read directly or translated.
    Scoped(String),
    /// A non-alphabetic code with no translation. The record is only
    /// reachable through unscoped lookups.
    Untranslatable(String),
    /// No location path, or one too short to carry a substation segment.
    Unknown,
}

impl SubstationScope {
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Scoped(code) => Some(code),
            Self::Untranslatable(_) | Self::Unknown => None,
        }
    }
}

/// Substation of a location path such as `/Energex/GYM/Feeders/...`.
///
/// The third `/`-separated segment is the substation. Purely alphabetic
/// segments are used as-is; anything else goes through `substation_map`.
pub fn derive_substation(
    location_path: Option<&str>,
    substation_map: &BTreeMap<String, Option<String>>,
) -> SubstationScope {
    let Some(segment) = location_path
        .and_then(|path| path.split('/').nth(2))
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
    else {
        return SubstationScope::Unknown;
    };

    if segment.chars().all(char::is_alphabetic) {
        return SubstationScope::Scoped(segment.to_string());
    }
    match substation_map.get(segment) {
        Some(Some(alpha)) => SubstationScope::Scoped(alpha.clone()),
        _ => SubstationScope::Untranslatable(segment.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> Vec<SuffixExpansion> {
        vec![
            SuffixExpansion::new("A+B+CP11", ["A", "B", "CP11"]),
            SuffixExpansion::new("A+B+C", ["A", "B", "C"]),
            SuffixExpansion::new("A+B", ["A", "B"]),
        ]
    }

    #[test]
    fn longest_suffix_wins() {
        assert_eq!(
            expand_double_box("NIP1A+B+CP11", &table()),
            ["NIP1A", "NIP1B", "NIP1CP11"]
        );
        assert_eq!(
            expand_double_box("NIP1A+B+C", &table()),
            ["NIP1A", "NIP1B", "NIP1C"]
        );
    }

    #[test]
    fn plain_names_are_unchanged() {
        assert_eq!(expand_double_box("NIP12", &table()), ["NIP12"]);
        assert_eq!(expand_double_box("A+B", &table()), ["A+B"]);
    }

    #[test]
    fn substation_segments() {
        let mut map = BTreeMap::new();
        map.insert("T8".to_string(), Some("GYM".to_string()));
        map.insert("T124".to_string(), None);

        assert_eq!(
            derive_substation(Some("/Energex/NBR/Feeders"), &map),
            SubstationScope::Scoped("NBR".to_string())
        );
        assert_eq!(
            derive_substation(Some("/Energex/T8/Feeders"), &map),
            SubstationScope::Scoped("GYM".to_string())
        );
        assert_eq!(
            derive_substation(Some("/Energex/T124"), &map),
            SubstationScope::Untranslatable("T124".to_string())
        );
        assert_eq!(
            derive_substation(Some("/Energex/T999/x"), &map),
            SubstationScope::Untranslatable("T999".to_string())
        );
        assert_eq!(derive_substation(Some("/Energex"), &map), SubstationScope::Unknown);
        assert_eq!(derive_substation(None, &map), SubstationScope::Unknown);
    }
}
