use std::collections::HashMap;
use std::env;
use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

use cross_xdg::BaseDirs;

use crate::error::ConfigError;

/// What `,` does to the current cell once input is exhausted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EofPolicy {
    #[default]
    SetToZero,
    LeaveUnchanged,
    /// Store the cell's maximum value, i.e. -1 in two's complement.
    SetToMinusOne,
}

impl FromStr for EofPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "zero" | "0" => Ok(EofPolicy::SetToZero),
            "unchanged" | "leave" => Ok(EofPolicy::LeaveUnchanged),
            "max" | "-1" | "minus-one" => Ok(EofPolicy::SetToMinusOne),
            _ => Err(ConfigError::InvalidEofPolicy(s.to_string())),
        }
    }
}

impl fmt::Display for EofPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EofPolicy::SetToZero => write!(f, "zero"),
            EofPolicy::LeaveUnchanged => write!(f, "unchanged"),
            EofPolicy::SetToMinusOne => write!(f, "max"),
        }
    }
}

/// Width of a memory cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CellWidth {
    #[default]
    EightBit,
    ThirtyTwoBit,
}

impl CellWidth {
    pub fn max_value(self) -> u32 {
        match self {
            CellWidth::EightBit => u8::MAX as u32,
            CellWidth::ThirtyTwoBit => u32::MAX,
        }
    }
}

impl FromStr for CellWidth {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "8" => Ok(CellWidth::EightBit),
            "32" => Ok(CellWidth::ThirtyTwoBit),
            _ => Err(ConfigError::InvalidCellWidth(s.to_string())),
        }
    }
}

impl fmt::Display for CellWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellWidth::EightBit => write!(f, "8"),
            CellWidth::ThirtyTwoBit => write!(f, "32"),
        }
    }
}

/// Settings fixed for the lifetime of an [`Engine`](crate::Engine).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    pub eof: EofPolicy,
    pub cell_width: CellWidth,
    pub breakpoint: Option<char>,
    pub record_history: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            eof: EofPolicy::SetToZero,
            cell_width: CellWidth::EightBit,
            breakpoint: None,
            record_history: true,
        }
    }
}

impl EngineConfig {
    pub fn max_value(&self) -> u32 {
        self.cell_width.max_value()
    }

    /// Resolve settings from `bf.toml` in the XDG config home, then
    /// `BF_EOF`, `BF_CELL_WIDTH`, `BF_BREAKPOINT` and `BF_HISTORY`.
    ///
    /// A missing or unreadable file falls back to the defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let mut cfg = match config_path().and_then(|p| fs::read_to_string(p).ok()) {
            Some(content) => Self::from_toml_str(&content)?,
            None => Self::default(),
        };
        cfg.apply_env(|key| env::var(key).ok())?;
        Ok(cfg)
    }

    /// Read the `[engine]` section of a small TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let map = parse_section(content, "engine");
        let mut cfg = Self::default();
        cfg.apply(|key| map.get(key).cloned(), |key| key)?;
        Ok(cfg)
    }

    /// Override fields from environment-style lookups.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        self.apply(lookup, |key| match key {
            "eof" => "BF_EOF",
            "cell_width" => "BF_CELL_WIDTH",
            "breakpoint" => "BF_BREAKPOINT",
            _ => "BF_HISTORY",
        })
    }

    fn apply<F, K>(&mut self, lookup: F, key_name: K) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
        K: Fn(&'static str) -> &'static str,
    {
        if let Some(v) = lookup(key_name("eof")) {
            self.eof = v.parse()?;
        }
        if let Some(v) = lookup(key_name("cell_width")) {
            self.cell_width = v.parse()?;
        }
        if let Some(v) = lookup(key_name("breakpoint")) {
            self.breakpoint = parse_breakpoint(&v)?;
        }
        let history_key = key_name("history");
        if let Some(v) = lookup(history_key) {
            self.record_history = parse_bool(history_key, &v)?;
        }
        Ok(())
    }
}

/// An empty value clears the breakpoint; otherwise exactly one char is required.
pub fn parse_breakpoint(value: &str) -> Result<Option<char>, ConfigError> {
    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (None, _) => Ok(None),
        (Some(c), None) => Ok(Some(c)),
        _ => Err(ConfigError::InvalidBreakpoint(value.to_string())),
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidFlag { key: key.to_string(), value: value.to_string() }),
    }
}

fn config_path() -> Option<PathBuf> {
    // On Linux: resolves to /home/<user>/.config
    // On Windows: resolves to C:\Users\<user>\.config
    // On macOS: resolves to /Users/<user>/.config
    let base_dirs = BaseDirs::new().ok()?;
    let mut path = PathBuf::from(base_dirs.config_home());
    path.push("bf.toml");
    Some(path)
}

/// Collect `key = value` pairs under `[section]`, unquoting `"..."` values.
/// Blank lines, `#` comments and other sections are skipped.
fn parse_section(content: &str, section: &str) -> HashMap<String, String> {
    let mut current: Option<&str> = None;
    let mut pairs = HashMap::new();

    for line in content.lines().map(str::trim) {
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            current = Some(name.trim());
            continue;
        }
        if current != Some(section) {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let value = value.trim();
        let value = value
            .strip_prefix('"')
            .and_then(|v| v.strip_suffix('"'))
            .unwrap_or(value);
        pairs.insert(key.trim().to_string(), value.to_string());
    }
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_engine_section() {
        let cfg = EngineConfig::from_toml_str(
            r##"
# comment
[colors]
eof = "nonsense"

[engine]
eof = "unchanged"
cell_width = 32
breakpoint = "#"
history = false
"##,
        )
        .unwrap();

        assert_eq!(cfg.eof, EofPolicy::LeaveUnchanged);
        assert_eq!(cfg.cell_width, CellWidth::ThirtyTwoBit);
        assert_eq!(cfg.breakpoint, Some('#'));
        assert!(!cfg.record_history);
    }

    #[test]
    fn section_parser_ignores_other_sections_and_unquotes() {
        let map = parse_section("[a]\nk = 1\n[engine]\n  k = \"x = y\"  \nbare=2\n", "engine");
        assert_eq!(map.get("k").map(String::as_str), Some("x = y"));
        assert_eq!(map.get("bare").map(String::as_str), Some("2"));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn empty_document_gives_defaults() {
        assert_eq!(EngineConfig::from_toml_str("").unwrap(), EngineConfig::default());
    }

    #[test]
    fn env_overrides_fields() {
        let mut cfg = EngineConfig::default();
        cfg.apply_env(|key| match key {
            "BF_EOF" => Some("max".to_string()),
            "BF_BREAKPOINT" => Some("@".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(cfg.eof, EofPolicy::SetToMinusOne);
        assert_eq!(cfg.breakpoint, Some('@'));
        assert_eq!(cfg.cell_width, CellWidth::EightBit);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!("sometimes".parse::<EofPolicy>(), Err(ConfigError::InvalidEofPolicy(_))));
        assert!(matches!("16".parse::<CellWidth>(), Err(ConfigError::InvalidCellWidth(_))));
        assert!(matches!(parse_breakpoint("@@"), Err(ConfigError::InvalidBreakpoint(_))));
        assert!(EngineConfig::from_toml_str("[engine]\nhistory = maybe").is_err());
    }

    #[test]
    fn max_value_per_width() {
        assert_eq!(CellWidth::EightBit.max_value(), 255);
        assert_eq!(CellWidth::ThirtyTwoBit.max_value(), 4_294_967_295);
    }
}
