//! Structured Logging & Tracing
//!
//! Structured logging via the `tracing` crate with:
//! - Level-based filtering (TRACE/DEBUG/INFO/WARN/ERROR)
//! - Per-module filters, overridable through `RUST_LOG`
//! - Spans for operation timing
//! - Idempotent initialization

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Once;
use tracing_subscriber::EnvFilter;

/// Installs the default subscriber. Add before [`crate::engine::DungeonPlugin`]
/// in apps that do not bring their own log plugin.
pub struct LoggingPlugin;

impl Plugin for LoggingPlugin {
    fn build(&self, _app: &mut App) {
        init_tracing_default();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }

    /// Parse a level name, case-insensitively.
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "trace" => Some(LogLevel::Trace),
            "debug" => Some(LogLevel::Debug),
            "info" => Some(LogLevel::Info),
            "warn" | "warning" => Some(LogLevel::Warn),
            "error" => Some(LogLevel::Error),
            _ => None,
        }
    }
}

/// Configuration for tracing initialization
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TracingConfig {
    pub default_level: LogLevel,
    pub module_filters: Vec<(String, LogLevel)>,
    pub show_targets: bool,
    pub show_thread_ids: bool,
    pub show_file_line: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            default_level: LogLevel::Info,
            module_filters: vec![
                ("dungeon_core::generation".to_string(), LogLevel::Info),
                ("dungeon_core::session".to_string(), LogLevel::Info),
                ("dungeon_core::survey".to_string(), LogLevel::Info),
                ("dungeon_core::engine".to_string(), LogLevel::Info),
            ],
            show_targets: true,
            show_thread_ids: false,
            show_file_line: false,
        }
    }
}

impl TracingConfig {
    /// Same filters with every dungeon module raised to `level`.
    pub fn with_core_level(mut self, level: LogLevel) -> Self {
        for (_, module_level) in &mut self.module_filters {
            *module_level = level;
        }
        self
    }

    pub fn to_env_filter_string(&self) -> String {
        let mut parts = vec![self.default_level.as_str().to_string()];
        for (module, level) in &self.module_filters {
            parts.push(format!("{}={}", module, level.as_str()));
        }
        parts.join(",")
    }
}

static TRACING_INIT: Once = Once::new();

/// Initialize tracing with default settings (idempotent)
pub fn init_tracing_default() {
    init_tracing(&TracingConfig::default());
}

/// Initialize tracing with custom config. First call wins; `RUST_LOG`
/// takes precedence over the configured filters.
pub fn init_tracing(config: &TracingConfig) {
    let filter_str = config.to_env_filter_string();
    let config = config.clone();
    TRACING_INIT.call_once(move || {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&filter_str));

        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(config.show_targets)
            .with_thread_ids(config.show_thread_ids)
            .with_file(config.show_file_line)
            .with_line_number(config.show_file_line)
            .compact();

        // A global subscriber may already be set by the host app.
        let _ = subscriber.try_init();
    });
}

/// Span guard for timing a named operation
pub struct TimingSpan {
    _span: tracing::span::EnteredSpan,
}

impl TimingSpan {
    pub fn new(name: &str) -> Self {
        let span = tracing::info_span!("operation", name = name);
        Self {
            _span: span.entered(),
        }
    }
}
