//! JSON output structures for the CLI

use piglit_compression::{CompressionRegistry, ModeInputs, ResolvedMode};
use piglit_types::{Mode, ModeSource, COMPRESSION_ENV_VAR, DEFAULT_MODE};
use serde::Serialize;

/// Output of `piglit-compress mode --json`
#[derive(Debug, Serialize)]
pub struct ModeJson {
    /// Active mode
    pub mode: Mode,
    /// Which input supplied it
    pub source: ModeSource,
    /// File suffix, `null` for `none`
    pub suffix: Option<String>,
    /// Raw inputs that were considered
    pub inputs: InputsJson,
}

/// Raw resolution inputs
#[derive(Debug, Serialize)]
pub struct InputsJson {
    /// Name of the environment variable
    pub env_var: &'static str,
    /// Its value, if set
    pub env: Option<String>,
    /// `[core] compression`, if set
    pub config: Option<String>,
    /// Built-in fallback
    pub default: &'static str,
}

impl ModeJson {
    /// Build from a resolution and its inputs
    pub fn new(resolved: &ResolvedMode, inputs: &ModeInputs) -> Self {
        Self {
            mode: resolved.mode.clone(),
            source: resolved.source,
            suffix: resolved.mode.suffix(),
            inputs: InputsJson {
                env_var: COMPRESSION_ENV_VAR,
                env: inputs.env.clone(),
                config: inputs.config.clone(),
                default: DEFAULT_MODE,
            },
        }
    }
}

/// One entry of `piglit-compress modes --json`
#[derive(Debug, Serialize)]
pub struct ModeEntryJson {
    /// Mode name
    pub mode: Mode,
    /// File suffix, `null` for `none`
    pub suffix: Option<String>,
    /// Whether this is the built-in default
    pub default: bool,
}

/// List every registered mode
pub fn mode_entries(registry: &CompressionRegistry) -> Vec<ModeEntryJson> {
    registry
        .modes()
        .map(|mode| ModeEntryJson {
            mode: mode.clone(),
            suffix: mode.suffix(),
            default: mode.as_str() == DEFAULT_MODE,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use piglit_compression::resolve_mode;

    #[test]
    fn test_mode_json_shape() {
        let registry = CompressionRegistry::with_builtin();
        let inputs = ModeInputs::new().with_config("zst");
        let resolved = resolve_mode(&registry, &inputs).unwrap();

        let value = serde_json::to_value(ModeJson::new(&resolved, &inputs)).unwrap();
        assert_eq!(value["mode"], "zst");
        assert_eq!(value["source"], "config");
        assert_eq!(value["suffix"], ".zst");
        assert_eq!(value["inputs"]["env_var"], "PIGLIT_COMPRESSION");
        assert!(value["inputs"]["env"].is_null());
    }

    #[test]
    fn test_mode_entries_mark_default() {
        let registry = CompressionRegistry::with_builtin();
        let entries = mode_entries(&registry);
        let defaults: Vec<_> = entries.iter().filter(|e| e.default).collect();
        assert_eq!(defaults.len(), 1);
        assert_eq!(defaults[0].mode.as_str(), "gz");
        assert!(entries.iter().any(|e| e.mode.is_none() && e.suffix.is_none()));
    }
}
