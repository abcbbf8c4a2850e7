use std::fmt;

use crate::ConfigError;

/// Transport flavour selected by the "tls" / "non-tls" step argument.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum TlsMode {
    #[default]
    Tls,
    NonTls,
}

impl TlsMode {
    pub fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "tls" => Ok(Self::Tls),
            "non-tls" => Ok(Self::NonTls),
            other => Err(ConfigError::InvalidTlsMode {
                value: other.to_owned(),
            }),
        }
    }

    #[must_use]
    pub const fn enabled(self) -> bool {
        matches!(self, Self::Tls)
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Tls => "tls",
            Self::NonTls => "non-tls",
        }
    }
}

impl fmt::Display for TlsMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
