use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Indicator codes keyed by their LCIA indicator code, before sub-impacts are folded
/// into the closed trigram set.
pub type RawImpacts = BTreeMap<String, f64>;

/// The closed set of impact trigrams plus the two weighted aggregates.
///
/// Variants are declared in canonical output order, so `Ord` on `Trigram` is the
/// order in which impacts are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Trigram {
    #[serde(rename = "acd")]
    Acd,
    #[serde(rename = "cch")]
    Cch,
    #[serde(rename = "etf")]
    Etf,
    #[serde(rename = "etf-c")]
    EtfC,
    #[serde(rename = "fru")]
    Fru,
    #[serde(rename = "fwe")]
    Fwe,
    #[serde(rename = "htc")]
    Htc,
    #[serde(rename = "htc-c")]
    HtcC,
    #[serde(rename = "htn")]
    Htn,
    #[serde(rename = "htn-c")]
    HtnC,
    #[serde(rename = "ior")]
    Ior,
    #[serde(rename = "ldu")]
    Ldu,
    #[serde(rename = "mru")]
    Mru,
    #[serde(rename = "ozd")]
    Ozd,
    #[serde(rename = "pco")]
    Pco,
    #[serde(rename = "pma")]
    Pma,
    #[serde(rename = "swe")]
    Swe,
    #[serde(rename = "tre")]
    Tre,
    #[serde(rename = "wtu")]
    Wtu,
    #[serde(rename = "ecs")]
    Ecs,
    #[serde(rename = "pef")]
    Pef,
}

impl Trigram {
    pub const ALL: [Trigram; 21] = [
        Trigram::Acd,
        Trigram::Cch,
        Trigram::Etf,
        Trigram::EtfC,
        Trigram::Fru,
        Trigram::Fwe,
        Trigram::Htc,
        Trigram::HtcC,
        Trigram::Htn,
        Trigram::HtnC,
        Trigram::Ior,
        Trigram::Ldu,
        Trigram::Mru,
        Trigram::Ozd,
        Trigram::Pco,
        Trigram::Pma,
        Trigram::Swe,
        Trigram::Tre,
        Trigram::Wtu,
        Trigram::Ecs,
        Trigram::Pef,
    ];

    /// The 19 characterized indicators, aggregates excluded.
    pub fn indicators() -> impl Iterator<Item = Trigram> {
        Self::ALL.into_iter().filter(|t| !t.is_aggregate())
    }

    pub fn code(self) -> &'static str {
        match self {
            Trigram::Acd => "acd",
            Trigram::Cch => "cch",
            Trigram::Etf => "etf",
            Trigram::EtfC => "etf-c",
            Trigram::Fru => "fru",
            Trigram::Fwe => "fwe",
            Trigram::Htc => "htc",
            Trigram::HtcC => "htc-c",
            Trigram::Htn => "htn",
            Trigram::HtnC => "htn-c",
            Trigram::Ior => "ior",
            Trigram::Ldu => "ldu",
            Trigram::Mru => "mru",
            Trigram::Ozd => "ozd",
            Trigram::Pco => "pco",
            Trigram::Pma => "pma",
            Trigram::Swe => "swe",
            Trigram::Tre => "tre",
            Trigram::Wtu => "wtu",
            Trigram::Ecs => "ecs",
            Trigram::Pef => "pef",
        }
    }

    pub fn is_aggregate(self) -> bool {
        matches!(self, Trigram::Ecs | Trigram::Pef)
    }

    /// `*-c` indicators are rebuilt from sub-impacts and never read from an LCA engine.
    pub fn is_corrected(self) -> bool {
        matches!(self, Trigram::EtfC | Trigram::HtcC | Trigram::HtnC)
    }
}

impl fmt::Display for Trigram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownTrigram(pub String);

impl fmt::Display for UnknownTrigram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown impact trigram '{}'", self.0)
    }
}

impl std::error::Error for UnknownTrigram {}

impl FromStr for Trigram {
    type Err = UnknownTrigram;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Trigram::ALL
            .into_iter()
            .find(|t| t.code() == s)
            .ok_or_else(|| UnknownTrigram(s.to_string()))
    }
}

/// A characterized impact vector over the closed trigram set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Impacts(BTreeMap<Trigram, f64>);

impl Impacts {
    /// A vector with every trigram present and set to zero.
    pub fn zeroed() -> Self {
        Self(Trigram::ALL.into_iter().map(|t| (t, 0.0)).collect())
    }

    pub fn get(&self, trigram: Trigram) -> Option<f64> {
        self.0.get(&trigram).copied()
    }

    pub fn value(&self, trigram: Trigram) -> f64 {
        self.get(trigram).unwrap_or(0.0)
    }

    pub fn set(&mut self, trigram: Trigram, value: f64) {
        self.0.insert(trigram, value);
    }

    pub fn iter(&self) -> impl Iterator<Item = (Trigram, f64)> + '_ {
        self.0.iter().map(|(t, v)| (*t, *v))
    }

    /// Indicator trigrams missing from this vector, aggregates excluded.
    pub fn missing_indicators(&self) -> Vec<Trigram> {
        Trigram::indicators()
            .filter(|t| !self.0.contains_key(t))
            .collect()
    }

    /// The vector as indicator codes, the shape used before corrections are applied.
    pub fn to_raw(&self) -> RawImpacts {
        self.0.iter().map(|(t, v)| (t.code().to_string(), *v)).collect()
    }
}

impl FromIterator<(Trigram, f64)> for Impacts {
    fn from_iter<I: IntoIterator<Item = (Trigram, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
