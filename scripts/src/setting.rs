use std::{fmt, str::FromStr};

use ethers::types::U256;

/// A numeric transaction field that is either computed by the node or given
/// literally on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Setting<T> {
    Auto,
    Fixed(T),
}

impl<T> Setting<T> {
    pub fn is_auto(&self) -> bool {
        matches!(self, Setting::Auto)
    }
}

impl<T: fmt::Display> fmt::Display for Setting<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Setting::Auto => write!(f, "auto"),
            Setting::Fixed(v) => write!(f, "{}", v),
        }
    }
}

/// Accepts `auto` in any case, a decimal integer or a `0x` prefixed hex one.
impl FromStr for Setting<U256> {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("auto") {
            return Ok(Setting::Auto);
        }
        if s.is_empty() {
            return Err("expected 'auto' or an integer, got an empty value".to_string());
        }
        let value = match s.strip_prefix("0x") {
            Some("") => Err("no digits after '0x'".to_string()),
            Some(hex) => U256::from_str(hex).map_err(|e| e.to_string()),
            None => U256::from_dec_str(s).map_err(|e| e.to_string()),
        };
        value
            .map(Setting::Fixed)
            .map_err(|e| format!("expected 'auto' or an integer, got '{}': {}", s, e))
    }
}
