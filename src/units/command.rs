//! Dispatch command strings.

use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// A parsed `<unit>.<method>` command.
///
/// The last dot splits the method from the unit, so unit names may
/// themselves contain dots: `"jobs.mail.send"` addresses method `send`
/// on unit `jobs.mail`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    unit: String,
    method: String,
}

impl Command {
    pub fn unit(&self) -> &str {
        &self.unit
    }

    pub fn method(&self) -> &str {
        &self.method
    }
}

impl FromStr for Command {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.rsplit_once('.') {
            Some((unit, method)) if !unit.is_empty() && !method.is_empty() => Ok(Self {
                unit: unit.to_string(),
                method: method.to_string(),
            }),
            _ => Err(Error::InvalidCommand(s.to_string())),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.unit, self.method)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_last_dot() {
        let cmd: Command = "mailer.send".parse().unwrap();
        assert_eq!((cmd.unit(), cmd.method()), ("mailer", "send"));

        let cmd: Command = "jobs.mail.send".parse().unwrap();
        assert_eq!((cmd.unit(), cmd.method()), ("jobs.mail", "send"));
        assert_eq!(cmd.to_string(), "jobs.mail.send");
    }

    #[test]
    fn rejects_incomplete_commands() {
        for bad in ["send", ".send", "mailer.", ""] {
            let err = bad.parse::<Command>().unwrap_err();
            assert!(matches!(err, Error::InvalidCommand(ref s) if s == bad), "{bad}");
        }
    }
}
