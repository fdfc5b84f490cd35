//! Inbound requests to the application service.
//!
//! These are what producers (fault monitors, host selectors, identify
//! buttons) send in.  The only way to change LED state is to assert or
//! de-assert a named group.
//!
//! The line form accepted by the daemon's request reader is:
//!
//! ```text
//! set <group> <true|false>
//! get <group>
//! ```

use core::fmt;
use core::str::FromStr;

/// Commands that external producers can send into the application core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupCommand {
    /// Write the group's `Asserted` property.
    SetAsserted { group: String, value: bool },

    /// Read the group's last committed `Asserted` value.
    GetAsserted { group: String },
}

impl GroupCommand {
    pub fn group(&self) -> &str {
        match self {
            Self::SetAsserted { group, .. } | Self::GetAsserted { group } => group,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandParseError {
    Empty,
    UnknownVerb(String),
    MissingGroup,
    BadValue(String),
    TrailingInput,
}

impl fmt::Display for CommandParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty command"),
            Self::UnknownVerb(v) => write!(f, "unknown command '{v}'"),
            Self::MissingGroup => write!(f, "missing group name"),
            Self::BadValue(v) => write!(f, "expected true/false, got '{v}'"),
            Self::TrailingInput => write!(f, "unexpected trailing input"),
        }
    }
}

impl std::error::Error for CommandParseError {}

impl FromStr for GroupCommand {
    type Err = CommandParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let verb = words.next().ok_or(CommandParseError::Empty)?;
        let group = words.next().ok_or(CommandParseError::MissingGroup)?.to_owned();

        let command = match verb {
            "set" => {
                let raw = words.next().ok_or_else(|| CommandParseError::BadValue(String::new()))?;
                let value = match raw {
                    "true" | "1" | "on" => true,
                    "false" | "0" | "off" => false,
                    other => return Err(CommandParseError::BadValue(other.to_owned())),
                };
                Self::SetAsserted { group, value }
            }
            "get" => Self::GetAsserted { group },
            other => return Err(CommandParseError::UnknownVerb(other.to_owned())),
        };

        if words.next().is_some() {
            return Err(CommandParseError::TrailingInput);
        }
        Ok(command)
    }
}
