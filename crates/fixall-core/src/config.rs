//! Batch-fix configuration
//!
//! Loaded from TOML or built in code with `with_*` methods. Every field has
//! a default, so an empty document is a valid configuration.

use crate::collaborators::{CachingTreeResolver, TreeResolver};
use crate::error::{FixAllError, Result};
use fixall_composition::PredicateCombinator;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Batch-fix configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FixAllConfig {
    /// Maximum fix invocations running at once
    pub max_concurrent_fixes: usize,
    /// Entries kept by `CachingTreeResolver`
    pub resolver_cache_capacity: u64,
    /// Parameter name for combined predicates with no inline side
    pub fallback_parameter_name: String,
    /// Tracing subscriber settings
    pub logging: LoggingConfig,
}

impl Default for FixAllConfig {
    fn default() -> Self {
        Self {
            max_concurrent_fixes: 16,
            resolver_cache_capacity: 10_000,
            fallback_parameter_name: fixall_composition::DEFAULT_FALLBACK_PARAMETER.to_owned(),
            logging: LoggingConfig::default(),
        }
    }
}

impl FixAllConfig {
    /// Parse from a TOML document
    ///
    /// # Errors
    /// Returns `FixAllError::Config` if the document is malformed or invalid
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: Self = toml::from_str(source).map_err(|e| FixAllError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML file
    ///
    /// # Errors
    /// Returns `FixAllError::Config` if the file cannot be read or parsed
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .map_err(|e| FixAllError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&source)
    }

    /// Check value ranges
    ///
    /// # Errors
    /// Returns `FixAllError::Config` naming the first invalid field
    pub fn validate(&self) -> Result<()> {
        if self.max_concurrent_fixes == 0 {
            return Err(FixAllError::Config(
                "max_concurrent_fixes must be at least 1".into(),
            ));
        }
        if self.fallback_parameter_name.trim().is_empty() {
            return Err(FixAllError::Config(
                "fallback_parameter_name must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// Predicate combinator using the configured fallback name
    #[must_use]
    pub fn predicate_combinator(&self) -> PredicateCombinator {
        PredicateCombinator::new(&self.fallback_parameter_name)
    }

    /// Wrap `inner` in a cache sized by `resolver_cache_capacity`
    #[must_use]
    pub fn caching_resolver<R: TreeResolver>(&self, inner: R) -> CachingTreeResolver<R> {
        CachingTreeResolver::new(inner, self.resolver_cache_capacity)
    }

    /// With concurrency bound
    #[inline]
    #[must_use]
    pub fn with_max_concurrent_fixes(mut self, max: usize) -> Self {
        self.max_concurrent_fixes = max;
        self
    }

    /// With resolver cache capacity
    #[inline]
    #[must_use]
    pub fn with_resolver_cache_capacity(mut self, capacity: u64) -> Self {
        self.resolver_cache_capacity = capacity;
        self
    }

    /// With fallback predicate parameter name
    #[inline]
    #[must_use]
    pub fn with_fallback_parameter_name(mut self, name: impl Into<String>) -> Self {
        self.fallback_parameter_name = name.into();
        self
    }

    /// With logging settings
    #[inline]
    #[must_use]
    pub fn with_logging(mut self, logging: LoggingConfig) -> Self {
        self.logging = logging;
        self
    }
}

/// Tracing subscriber settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default `EnvFilter` directive, overridden by `RUST_LOG`
    pub filter: String,
    /// Emit JSON lines instead of compact text
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_owned(),
            json: false,
        }
    }
}
