//! Ambient runtime configuration, loadable from the environment the
//! way `selftest::test_settings::TestSettings` loads `TESTSYS_SELFTEST_*`
//! via `envy`. Unlike that settings struct, `CoreConfig` isn't a single
//! process-wide static — callers construct one per pipeline run (or via
//! [`CoreConfig::from_env`]) and pass it through explicitly.

use serde::Deserialize;

/// Tunables for the resolve → convert → phase pipeline. None of these
/// reintroduce the CLI/catalog surfaces excluded by spec.md's Non-goals;
/// they govern only how the existing stages behave.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// Appended to the package name when no install namespace is given
    /// explicitly and the bundle's CSV carries no suggested-namespace
    /// annotation either — see `olm_convert::converter::resolve_install_namespace`.
    pub install_namespace_suffix: String,

    /// Forwarded to `ConverterConfig::max_name_length`.
    pub max_name_length: usize,

    /// Forwarded to `ConverterConfig::inject_namespace_watch_rule`.
    pub inject_namespace_watch_rule: bool,

    /// Overrides `olm_revision::phase::PHASE_ORDER` when set, for
    /// callers migrating the rollout order one phase at a time. `None`
    /// uses the built-in order.
    #[serde(skip)]
    pub phase_order_override: Option<Vec<String>>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            install_namespace_suffix: "-system".to_string(),
            max_name_length: 63,
            inject_namespace_watch_rule: true,
            phase_order_override: None,
        }
    }
}

impl CoreConfig {
    /// Loads overrides from `OLM_CORE_*` environment variables, falling
    /// back to [`Default`] for anything unset. `phase_order_override`
    /// has no environment-variable form (there's no clean scalar
    /// encoding for an ordered list via `envy`) and is always `None`
    /// from this path; set it on the returned value directly if needed.
    pub fn from_env() -> Result<Self, envy::Error> {
        envy::prefixed("OLM_CORE_").from_env::<Self>()
    }

    pub fn converter_config(&self) -> olm_convert::ConverterConfig {
        olm_convert::ConverterConfig {
            inject_namespace_watch_rule: self.inject_namespace_watch_rule,
            max_name_length: self.max_name_length,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_converter_defaults() {
        let config = CoreConfig::default();
        let converter = config.converter_config();
        assert!(converter.inject_namespace_watch_rule);
        assert_eq!(converter.max_name_length, 63);
    }
}
