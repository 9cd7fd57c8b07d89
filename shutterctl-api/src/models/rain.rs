use core::fmt;
use core::str::FromStr;

/// Precipitation level shared by every window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RainLevel {
    #[default]
    None,
    Drizzle,
    Storm,
}

impl RainLevel {
    pub const OPTIONS: [RainLevel; 3] = [RainLevel::None, RainLevel::Drizzle, RainLevel::Storm];

    pub fn as_str(&self) -> &'static str {
        match self {
            RainLevel::None => "none",
            RainLevel::Drizzle => "drizzle",
            RainLevel::Storm => "storm",
        }
    }

    /// Parses a stored level, treating unknown values as no rain.
    pub fn parse_lossy(value: &str) -> Self {
        value.parse().unwrap_or_default()
    }
}

impl fmt::Display for RainLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRainLevel;

impl fmt::Display for UnknownRainLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("unknown rain level")
    }
}

impl FromStr for RainLevel {
    type Err = UnknownRainLevel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        RainLevel::OPTIONS
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(s))
            .ok_or(UnknownRainLevel)
    }
}
