//! The [`TemplateEngine`] and its render modes.

use std::io::Write;
use std::sync::Arc;

use log::debug;
use trellis_cache::{CacheConfig, CacheStats, TierCache};
use trellis_config::{EngineConfig, MissingData};
use trellis_source::Locator;
use trellis_template::{
    ArtifactId, CompiledArtifact, Compiler, Data, DefaultCompiler, DefaultExecutor, Executor,
    MissingPolicy,
};

use crate::error::RenderError;

/// How a single render obtains its compiled artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode<'a> {
    /// Fetch the artifact from the cache by layout name, compiling the
    /// production source on a miss.
    Production,
    /// Compile the given development source fresh, bypassing the cache.
    Development(&'a Locator),
}

/// Renders named layouts against per-call data.
///
/// All methods take `&self`; share an engine across threads with `Arc`.
pub struct TemplateEngine {
    compiler: Arc<dyn Compiler>,
    executor: Arc<dyn Executor>,
    cache: Option<TierCache>,
}

impl TemplateEngine {
    /// Creates a caching engine with the default compiler and executor.
    pub fn new(config: CacheConfig) -> Self {
        Self::with_components(
            Arc::new(DefaultCompiler::new()),
            Arc::new(DefaultExecutor::default()),
            config,
        )
    }

    /// Creates a caching engine with the given compiler and executor.
    pub fn with_components(
        compiler: Arc<dyn Compiler>,
        executor: Arc<dyn Executor>,
        config: CacheConfig,
    ) -> Self {
        Self {
            compiler,
            executor,
            cache: Some(TierCache::new(config)),
        }
    }

    /// Creates an engine without a cache. Production renders compile the
    /// layout on every call.
    pub fn uncached(compiler: Arc<dyn Compiler>, executor: Arc<dyn Executor>) -> Self {
        Self {
            compiler,
            executor,
            cache: None,
        }
    }

    /// Creates an engine with the default compiler and an executor and cache
    /// configured from `config`.
    pub fn from_config(config: &EngineConfig) -> Self {
        let policy = match config.engine.missing {
            MissingData::Error => MissingPolicy::Error,
            MissingData::Empty => MissingPolicy::Empty,
        };
        let compiler: Arc<dyn Compiler> = Arc::new(DefaultCompiler::new());
        let executor: Arc<dyn Executor> = Arc::new(DefaultExecutor::new(policy));
        if config.cache.enabled {
            Self::with_components(
                compiler,
                executor,
                CacheConfig {
                    fast_tier_entries: config.cache.fast_tier_entries,
                    overflow_tier_bytes: config.cache.overflow_tier_size,
                },
            )
        } else {
            Self::uncached(compiler, executor)
        }
    }

    /// Renders the layout `name` into `sink`.
    ///
    /// In [`RenderMode::Production`], `source` is compiled on the first
    /// request for `name` and the cached artifact is reused afterwards, so
    /// `name` must identify the same layout on every call. In
    /// [`RenderMode::Development`], the development source is compiled on
    /// every call and neither `source` nor the cache is consulted.
    ///
    /// On failure the sink may hold partial output.
    pub fn render(
        &self,
        name: &str,
        source: &Locator,
        data: &Data,
        sink: &mut dyn Write,
        mode: RenderMode<'_>,
    ) -> Result<(), RenderError> {
        let artifact = match mode {
            RenderMode::Development(dev_source) => {
                debug!("rendering '{name}' from development source {dev_source}");
                self.compile_uncached(name, dev_source)?
            }
            RenderMode::Production => self.fetch(name, source)?,
        };
        self.executor
            .execute(&artifact, data, sink)
            .map_err(|source| RenderError::Execution {
                layout: name.to_string(),
                source,
            })
    }

    /// Renders into a new `String`.
    pub fn render_to_string(
        &self,
        name: &str,
        source: &Locator,
        data: &Data,
        mode: RenderMode<'_>,
    ) -> Result<String, RenderError> {
        let mut out = Vec::new();
        self.render(name, source, data, &mut out, mode)?;
        Ok(String::from_utf8_lossy(&out).into_owned())
    }

    /// Compiles `source` into the cache under `name` unless it is already
    /// resident, and returns the artifact's id.
    ///
    /// Without a cache this only checks that `source` compiles.
    pub fn precompile(&self, name: &str, source: &Locator) -> Result<ArtifactId, RenderError> {
        Ok(self.fetch(name, source)?.id())
    }

    /// Drops the cached artifact for `name`. Returns `true` if one was resident.
    pub fn invalidate(&self, name: &str) -> bool {
        self.cache
            .as_ref()
            .is_some_and(|cache| cache.invalidate(name))
    }

    /// Drops every cached artifact.
    pub fn clear_cache(&self) {
        if let Some(cache) = &self.cache {
            cache.clear();
        }
    }

    /// Returns cache counters, or `None` for an uncached engine.
    pub fn cache_stats(&self) -> Option<CacheStats> {
        self.cache.as_ref().map(TierCache::stats)
    }

    /// Returns `true` if an artifact for `name` is resident in the cache.
    pub fn is_cached(&self, name: &str) -> bool {
        self.cache.as_ref().is_some_and(|cache| cache.contains(name))
    }

    fn fetch(&self, name: &str, source: &Locator) -> Result<Arc<CompiledArtifact>, RenderError> {
        match &self.cache {
            Some(cache) => Ok(cache.get_or_compile(name, source, self.compiler.as_ref())?),
            None => self.compile_uncached(name, source),
        }
    }

    fn compile_uncached(
        &self,
        name: &str,
        source: &Locator,
    ) -> Result<Arc<CompiledArtifact>, RenderError> {
        self.compiler
            .compile(source)
            .map(Arc::new)
            .map_err(|source| RenderError::Compilation {
                layout: name.to_string(),
                source,
            })
    }
}

impl Default for TemplateEngine {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use trellis_config::load_config_from_str;

    fn data(value: serde_json::Value) -> Data {
        match value {
            serde_json::Value::Object(map) => map,
            _ => panic!("test data must be an object"),
        }
    }

    #[test]
    fn production_render_caches() {
        let engine = TemplateEngine::default();
        let src = Locator::memory("home", "Hi {{ name }}");
        let out = engine
            .render_to_string("home", &src, &data(json!({"name": "Ann"})), RenderMode::Production)
            .unwrap();
        assert_eq!(out, "Hi Ann");
        assert!(engine.is_cached("home"));
        assert_eq!(engine.cache_stats().unwrap().compilations, 1);
    }

    #[test]
    fn development_render_skips_cache() {
        let engine = TemplateEngine::default();
        let src = Locator::memory("home", "prod");
        let dev = Locator::memory("home-dev", "dev");
        let out = engine
            .render_to_string("home", &src, &Data::new(), RenderMode::Development(&dev))
            .unwrap();
        assert_eq!(out, "dev");
        assert!(!engine.is_cached("home"));
        assert_eq!(engine.cache_stats().unwrap().misses, 0);
    }

    #[test]
    fn uncached_engine_has_no_stats() {
        let engine = TemplateEngine::uncached(
            Arc::new(DefaultCompiler::new()),
            Arc::new(DefaultExecutor::default()),
        );
        let src = Locator::memory("home", "x");
        engine.precompile("home", &src).unwrap();
        assert!(engine.cache_stats().is_none());
        assert!(!engine.is_cached("home"));
        assert!(!engine.invalidate("home"));
    }

    #[test]
    fn precompile_warms_cache() {
        let engine = TemplateEngine::default();
        let src = Locator::memory("home", "{{ a }}");
        let id = engine.precompile("home", &src).unwrap();
        assert!(engine.is_cached("home"));
        assert_eq!(engine.precompile("home", &src).unwrap(), id);
        assert_eq!(engine.cache_stats().unwrap().hits, 1);
    }

    #[test]
    fn compile_error_names_layout() {
        let engine = TemplateEngine::default();
        let src = Locator::memory("broken", "{{#if x}}never closed");
        let err = engine
            .render_to_string("broken", &src, &Data::new(), RenderMode::Production)
            .unwrap_err();
        assert!(matches!(err, RenderError::Compilation { ref layout, .. } if layout == "broken"));
        assert!(!engine.is_cached("broken"));
    }

    #[test]
    fn execution_error_keeps_artifact_cached() {
        let engine = TemplateEngine::default();
        let src = Locator::memory("home", "{{ name }}");
        let err = engine
            .render_to_string("home", &src, &Data::new(), RenderMode::Production)
            .unwrap_err();
        assert!(matches!(err, RenderError::Execution { .. }));
        assert!(engine.is_cached("home"));
    }

    #[test]
    fn invalidate_and_clear() {
        let engine = TemplateEngine::default();
        let src = Locator::memory("home", "x");
        engine.precompile("home", &src).unwrap();
        assert!(engine.invalidate("home"));
        assert!(!engine.is_cached("home"));
        engine.precompile("home", &src).unwrap();
        engine.clear_cache();
        assert!(!engine.is_cached("home"));
        assert_eq!(engine.cache_stats().unwrap().epoch, 1);
    }

    #[test]
    fn from_config_applies_missing_policy() {
        let config = load_config_from_str("[engine]\nmissing = \"empty\"").unwrap();
        let engine = TemplateEngine::from_config(&config);
        let src = Locator::memory("home", "[{{ absent }}]");
        let out = engine
            .render_to_string("home", &src, &Data::new(), RenderMode::Production)
            .unwrap();
        assert_eq!(out, "[]");
    }

    #[test]
    fn from_config_can_disable_cache() {
        let config = load_config_from_str("[cache]\nenabled = false").unwrap();
        let engine = TemplateEngine::from_config(&config);
        assert!(engine.cache_stats().is_none());
    }

    #[test]
    fn from_config_uses_cache_bounds() {
        let config =
            load_config_from_str("[cache]\nfast_tier_entries = 1\noverflow_tier_size = 0")
                .unwrap();
        let engine = TemplateEngine::from_config(&config);
        engine.precompile("a", &Locator::memory("a", "a")).unwrap();
        engine.precompile("b", &Locator::memory("b", "b")).unwrap();
        assert!(!engine.is_cached("a"));
        assert!(engine.is_cached("b"));
    }
}
