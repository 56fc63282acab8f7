//! Runtime mode.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Environment the app runs in. Selects the settings overlay file.
///
/// Passed explicitly at construction; only the binary looks at the
/// process environment to pick one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum Mode {
    #[default]
    Development,
    Test,
    Production,
    Custom(String),
}

impl Mode {
    pub fn as_str(&self) -> &str {
        match self {
            Mode::Development => "development",
            Mode::Test => "test",
            Mode::Production => "production",
            Mode::Custom(name) => name,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "development" | "dev" => Mode::Development,
            "test" => Mode::Test,
            "production" | "prod" => Mode::Production,
            _ => Mode::Custom(s.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_and_custom() {
        assert_eq!("prod".parse::<Mode>().unwrap(), Mode::Production);
        assert_eq!("Test".parse::<Mode>().unwrap(), Mode::Test);
        assert_eq!(
            "staging".parse::<Mode>().unwrap(),
            Mode::Custom("staging".into())
        );
        assert_eq!(Mode::Custom("staging".into()).to_string(), "staging");
        assert_eq!(Mode::default().to_string(), "development");
    }
}
