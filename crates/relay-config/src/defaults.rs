//! Built-in reference tables used when the config file omits a section.

use std::collections::BTreeMap;

use relay_model::SuffixExpansion;

pub const EXCLUDED_PATTERNS: &[&str] = &[
    "RTU",
    "CMGR12",
    "SEL2505_Energex",
    "GenericRelayWithoutSetting_Energex",
    "SEL-2505",
    "GenericRelayWithoutSetting",
    "T> in TMS no Current_Energex",
    "I>> 3Ph no Time I>> in A_Energex",
    "I> 1Ph no Time I in A_Energex",
    "I> 1Ph no Time I in %_Energex",
];

/// Numeric substation codes and their alpha codes; empty means leave unscoped.
pub const SUBSTATION_MAP: &[(&str, &str)] = &[
    ("H22", "LGL"),
    ("H31", "MRD"),
    ("H38", "GNA"),
    ("H4", "MGB"),
    ("T108", "BLH"),
    ("T11", "CBT"),
    ("T124", ""),
    ("T128", "RBA"),
    ("T136", "ABM"),
    ("T142", "TSN"),
    ("T16", "NBR"),
    ("T160", "SMR"),
    ("T161", "AGT"),
    ("T162", "BDB"),
    ("T187", "RLD"),
    ("T24", "RBS"),
    ("T29", "PRG"),
    ("T30", "AGW"),
    ("T70", "CRY"),
    ("T75", "NRG"),
    ("T78", "LRE"),
    ("T8", "GYM"),
    ("T80", "RPN"),
    ("T81", "CCY"),
];

pub const OUT_OF_SERVICE_PATTERNS: &[&str] = &[
    "7PG21 (SOLKOR-RF)",
    "7SG18 (SOLKOR-N)",
    "RED615 2.6 - 2.8",
    "SOLKOR-N_Energex",
    "SOLKOR-RF_Energex",
];

pub const SINGLE_PHASE_PATTERNS: &[&str] = &[
    "I>+ I>> 1Ph I in % + T in TMS_Energex",
    "I> 1Ph I in A + I>> in xIs + T in %_Energex",
    "I> 2Ph I in A + T in TMS_Energex",
    "MCGG22",
    "MCGG21",
    "RXIDF",
];

pub const MULTI_PHASE_PATTERNS: &[&str] = &[
    "I> 2Ph +IE>1Ph I in A + T in TMS_Energex",
    "I>+ I>> 2Ph +IE>+IE>> I in A + T in TMS_Energex",
    "CDG61",
];

/// Patterns without a trips-to-lockout setting; the ceiling is tallied instead.
pub const TALLY_LOCKOUT_PATTERNS: &[&str] = &["RC01"];

/// Last regional CP number with an `A+CP{n}` double box suffix.
pub const REGIONAL_CP_MAX: u32 = 14;

pub fn excluded_patterns() -> Vec<String> {
    to_strings(EXCLUDED_PATTERNS)
}

pub fn substation_map() -> BTreeMap<String, String> {
    SUBSTATION_MAP
        .iter()
        .map(|(code, alpha)| ((*code).to_string(), (*alpha).to_string()))
        .collect()
}

/// Multi-pole suffixes, general table first then the regional CP pairs.
pub fn suffix_expansions() -> Vec<SuffixExpansion> {
    let mut expansions = vec![
        SuffixExpansion::new("A+B+C", ["A", "B", "C"]),
        SuffixExpansion::new("A+B+CP11", ["A", "B", "CP11"]),
        SuffixExpansion::new("A+B+CP12", ["A", "B", "CP12"]),
        SuffixExpansion::new("A+B", ["A", "B"]),
    ];
    expansions.extend((1..=REGIONAL_CP_MAX).map(|n| {
        let cp = format!("CP{n}");
        SuffixExpansion::new(format!("A+{cp}"), ["A".to_string(), cp])
    }));
    expansions
}

pub fn out_of_service_patterns() -> Vec<String> {
    to_strings(OUT_OF_SERVICE_PATTERNS)
}

pub fn single_phase_patterns() -> Vec<String> {
    to_strings(SINGLE_PHASE_PATTERNS)
}

pub fn multi_phase_patterns() -> Vec<String> {
    to_strings(MULTI_PHASE_PATTERNS)
}

pub fn tally_lockout_patterns() -> Vec<String> {
    to_strings(TALLY_LOCKOUT_PATTERNS)
}

fn to_strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| (*value).to_string()).collect()
}
