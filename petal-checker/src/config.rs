//! Checker configuration
//!
//! Only the word size affects checking (it picks the targets of `Int` and
//! `UInt`); the remaining switches control tracing output.

use std::env;

/// Target machine word width
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WordSize {
    W32,
    #[default]
    W64,
}

impl WordSize {
    pub fn bits(self) -> u32 {
        match self {
            WordSize::W32 => 32,
            WordSize::W64 => 64,
        }
    }

    pub fn parse(spec: &str) -> Option<Self> {
        match spec.trim() {
            "32" => Some(Self::W32),
            "64" => Some(Self::W64),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub word_size: WordSize,
    /// Open a tracing span per module and per instantiation
    pub trace: bool,
    /// Log every generated instance after each module is checked
    pub dump_instances: bool,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn word_size(mut self, word_size: WordSize) -> Self {
        self.word_size = word_size;
        self
    }

    pub fn trace(mut self, on: bool) -> Self {
        self.trace = on;
        self
    }

    pub fn dump_instances(mut self, on: bool) -> Self {
        self.dump_instances = on;
        self
    }

    /// Reads `PETAL_WORD_SIZE`, `PETAL_TRACE` and `PETAL_DUMP`
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(word_size) = env::var("PETAL_WORD_SIZE")
            .ok()
            .and_then(|v| WordSize::parse(&v))
        {
            config.word_size = word_size;
        }
        config.trace = env_flag("PETAL_TRACE");
        config.dump_instances = env_flag("PETAL_DUMP");
        config
    }
}

fn env_flag(name: &str) -> bool {
    env::var(name)
        .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_size_parse() {
        assert_eq!(WordSize::parse("32"), Some(WordSize::W32));
        assert_eq!(WordSize::parse(" 64 "), Some(WordSize::W64));
        assert_eq!(WordSize::parse("16"), None);
        assert_eq!(WordSize::default().bits(), 64);
    }

    #[test]
    fn test_builder_setters() {
        let config = Config::new().word_size(WordSize::W32).trace(true);
        assert_eq!(config.word_size, WordSize::W32);
        assert!(config.trace);
        assert!(!config.dump_instances);
    }
}
