#![deny(unsafe_code)]

//! Configuration for relay settings runs.
//!
//! [`RelayConfig`] is loaded from TOML and serves rule tables and reference
//! tables through [`relay_model::MappingRuleSource`].

pub mod config;
pub mod defaults;
pub mod error;
mod source;

pub use config::{
    CONFIG_ENV_VAR, ConfigFile, LoggingSection, PatternLists, PatternSection, RelayConfig,
    RetryPolicy, RetrySection, TablesSection,
};
pub use error::ConfigError;
