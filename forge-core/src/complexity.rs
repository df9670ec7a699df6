use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Coarse difficulty classification declared by the model on the first reasoning iteration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ComplexityLevel {
    #[default]
    Low,
    Medium,
    High,
    VeryHigh,
}

impl ComplexityLevel {
    pub const ALL: [ComplexityLevel; 4] = [Self::Low, Self::Medium, Self::High, Self::VeryHigh];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::VeryHigh => "very-high",
        }
    }
}

impl fmt::Display for ComplexityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComplexityLevel {
    type Err = String;

    /// Accepts `low`, `medium`, `high`, `very-high`, `very high`, `very_high` and `veryhigh`,
    /// any case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .to_ascii_lowercase()
            .chars()
            .map(|c| if c == ' ' || c == '_' { '-' } else { c })
            .collect();
        match normalized.as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "very-high" | "veryhigh" => Ok(Self::VeryHigh),
            other => Err(format!("unknown complexity level: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_variants() {
        assert_eq!("LOW".parse::<ComplexityLevel>().unwrap(), ComplexityLevel::Low);
        assert_eq!("very high".parse::<ComplexityLevel>().unwrap(), ComplexityLevel::VeryHigh);
        assert_eq!("Very_High".parse::<ComplexityLevel>().unwrap(), ComplexityLevel::VeryHigh);
        assert_eq!("VeryHigh".parse::<ComplexityLevel>().unwrap(), ComplexityLevel::VeryHigh);
        assert!("extreme".parse::<ComplexityLevel>().is_err());
    }

    #[test]
    fn test_ordering_and_default() {
        assert_eq!(ComplexityLevel::default(), ComplexityLevel::Low);
        assert!(ComplexityLevel::Low < ComplexityLevel::Medium);
        assert!(ComplexityLevel::High < ComplexityLevel::VeryHigh);
    }

    #[test]
    fn test_serde_kebab_case() {
        let json = serde_json::to_string(&ComplexityLevel::VeryHigh).unwrap();
        assert_eq!(json, "\"very-high\"");
    }
}
