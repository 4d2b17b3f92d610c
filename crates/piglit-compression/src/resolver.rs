//! Compression mode resolution
//!
//! The active mode is chosen from, in order:
//!
//! 1. the `PIGLIT_COMPRESSION` environment variable
//! 2. the `[core] compression` value from `piglit.conf`
//! 3. [`DEFAULT_MODE`]
//!
//! Empty values count as unset. Whatever wins must be registered, otherwise
//! resolution fails with [`Error::InvalidMode`].

use crate::registry::CompressionRegistry;
use piglit_config::PiglitConfig;
use piglit_types::{Error, Mode, ModeSource, Result, COMPRESSION_ENV_VAR, DEFAULT_MODE};
use tracing::debug;

/// Raw inputs to mode resolution
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModeInputs {
    /// Value of `PIGLIT_COMPRESSION`, if set
    pub env: Option<String>,
    /// Value of `[core] compression`, if set
    pub config: Option<String>,
}

impl ModeInputs {
    /// No inputs; resolution falls back to the default
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the environment value
    pub fn with_env<S: Into<String>>(mut self, value: S) -> Self {
        self.env = Some(value.into());
        self
    }

    /// Set the configuration value
    pub fn with_config<S: Into<String>>(mut self, value: S) -> Self {
        self.config = Some(value.into());
        self
    }

    /// Read the process environment and the given configuration
    pub fn from_process(config: &PiglitConfig) -> Self {
        Self {
            env: std::env::var_os(COMPRESSION_ENV_VAR)
                .map(|value| value.to_string_lossy().into_owned()),
            config: config.compression().map(str::to_string),
        }
    }
}

/// Outcome of mode resolution
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ResolvedMode {
    /// The selected mode
    pub mode: Mode,
    /// Which input supplied it
    pub source: ModeSource,
}

/// Resolves the active mode against a registry
#[derive(Debug, Clone, Copy)]
pub struct ModeResolver<'a> {
    registry: &'a CompressionRegistry,
    default: &'a str,
}

impl<'a> ModeResolver<'a> {
    /// Create a resolver using [`DEFAULT_MODE`] as the fallback
    pub fn new(registry: &'a CompressionRegistry) -> Self {
        Self {
            registry,
            default: DEFAULT_MODE,
        }
    }

    /// Use a different fallback mode
    pub fn with_default(mut self, default: &'a str) -> Self {
        self.default = default;
        self
    }

    /// Pick the mode from `inputs`
    pub fn resolve(&self, inputs: &ModeInputs) -> Result<ResolvedMode> {
        let (name, source) = Self::select(inputs, self.default);

        let mode = Mode::new(name).map_err(|_| Error::invalid_mode(name, source))?;
        if !self.registry.contains(mode.as_str()) {
            return Err(Error::invalid_mode(name, source));
        }

        debug!("Compression mode '{}' selected from {}", mode, source);
        Ok(ResolvedMode { mode, source })
    }

    fn select<'i>(inputs: &'i ModeInputs, default: &'i str) -> (&'i str, ModeSource) {
        let non_empty = |value: &'i Option<String>| value.as_deref().filter(|v| !v.is_empty());

        if let Some(env) = non_empty(&inputs.env) {
            (env, ModeSource::Environment)
        } else if let Some(config) = non_empty(&inputs.config) {
            (config, ModeSource::Config)
        } else {
            (default, ModeSource::Default)
        }
    }
}

/// Resolve the mode from `inputs` with the built-in default
pub fn resolve_mode(registry: &CompressionRegistry, inputs: &ModeInputs) -> Result<ResolvedMode> {
    ModeResolver::new(registry).resolve(inputs)
}
