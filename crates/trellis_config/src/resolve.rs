//! Layout resolution: turning configured paths into source locators.

use crate::error::ConfigError;
use crate::types::{EngineConfig, LayoutDef};
use std::path::Path;
use trellis_source::Locator;

/// A named layout with its sources resolved against the project directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLayout {
    /// The layout name, used as the cache key.
    pub name: String,
    /// The production source.
    pub source: Locator,
    /// The development source, if one is configured.
    pub dev_source: Option<Locator>,
}

impl ResolvedLayout {
    /// Returns the source to compile in development mode: the development
    /// source when configured, otherwise the production one.
    pub fn dev_locator(&self) -> &Locator {
        self.dev_source.as_ref().unwrap_or(&self.source)
    }
}

/// Resolves a named layout from the configuration.
///
/// Relative paths are joined to `base_dir`; absolute paths are kept as is.
pub fn resolve_layout(
    config: &EngineConfig,
    base_dir: &Path,
    name: &str,
) -> Result<ResolvedLayout, ConfigError> {
    let def = config
        .layouts
        .get(name)
        .ok_or_else(|| ConfigError::UnknownLayout(name.to_string()))?;
    Ok(resolve_def(base_dir, name, def))
}

/// Resolves every configured layout, in name order.
pub fn resolve_all(config: &EngineConfig, base_dir: &Path) -> Vec<ResolvedLayout> {
    config
        .layouts
        .iter()
        .map(|(name, def)| resolve_def(base_dir, name, def))
        .collect()
}

fn resolve_def(base_dir: &Path, name: &str, def: &LayoutDef) -> ResolvedLayout {
    ResolvedLayout {
        name: name.to_string(),
        source: Locator::file(base_dir.join(&def.source)),
        dev_source: def
            .dev_source
            .as_ref()
            .map(|dev| Locator::file(base_dir.join(dev))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::load_config_from_str;
    use std::path::PathBuf;

    fn config() -> EngineConfig {
        load_config_from_str(
            r#"
[layouts.home]
source = "layouts/home.html"
dev_source = "dev/home.html"

[layouts.login]
source = "/srv/login.html"
"#,
        )
        .unwrap()
    }

    #[test]
    fn joins_relative_paths() {
        let layout = resolve_layout(&config(), Path::new("/proj"), "home").unwrap();
        assert_eq!(layout.name, "home");
        assert_eq!(
            layout.source,
            Locator::file(PathBuf::from("/proj/layouts/home.html"))
        );
        assert_eq!(
            layout.dev_locator(),
            &Locator::file(PathBuf::from("/proj/dev/home.html"))
        );
    }

    #[test]
    fn keeps_absolute_paths() {
        let layout = resolve_layout(&config(), Path::new("/proj"), "login").unwrap();
        assert_eq!(layout.source, Locator::file(PathBuf::from("/srv/login.html")));
        assert_eq!(layout.dev_locator(), &layout.source);
    }

    #[test]
    fn unknown_layout() {
        let err = resolve_layout(&config(), Path::new("/proj"), "checkout").unwrap_err();
        assert!(matches!(err, ConfigError::UnknownLayout(name) if name == "checkout"));
    }

    #[test]
    fn resolve_all_in_name_order() {
        let names: Vec<_> = resolve_all(&config(), Path::new("/proj"))
            .into_iter()
            .map(|l| l.name)
            .collect();
        assert_eq!(names, vec!["home", "login"]);
    }
}
