use std::{fmt::Display, str::FromStr};

use eyre::{ensure, Context};
use itertools::Itertools;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

/// Dotted numeric package version, kept exactly as written (`0.1.0` stays
/// `0.1.0`, it is not normalized to `0.1`).
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Version(Vec<u64>);

impl Default for Version {
    fn default() -> Self {
        Version(vec![0, 1, 0])
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        FromStr::from_str(&s).map_err(de::Error::custom)
    }
}

impl Serialize for Version {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.iter().join("."))
    }
}

impl FromStr for Version {
    type Err = eyre::Report;

    fn from_str(version: &str) -> Result<Self, Self::Err> {
        let version = version.trim();
        ensure!(!version.is_empty(), "Empty version string");
        let parts = version
            .split('.')
            .map(|part| {
                part.parse::<u64>()
                    .wrap_err_with(|| format!("Version must consist of numbers: {version}"))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Version(parts))
    }
}
