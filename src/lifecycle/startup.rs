//! Startup orchestration.
//!
//! # Responsibilities
//! - Build the template registry from config and parse it eagerly
//! - Build a router wired to that registry and the configured limits
//!
//! # Design Decisions
//! - Any template parse error is fatal; nothing is served from a broken namespace

use std::sync::Arc;

use crate::config::RouterConfig;
use crate::routing::Router;
use crate::templates::{TemplateError, TemplateRegistry};

/// Create the registry described by `config` and parse it now.
pub fn prepare_templates(config: &RouterConfig) -> Result<Arc<TemplateRegistry>, TemplateError> {
    let registry = TemplateRegistry::from_config(&config.templates);
    registry.parse_glob()?;

    tracing::info!(
        root = %registry.root().display(),
        templates = ?registry.names(),
        "Template namespace ready"
    );
    Ok(Arc::new(registry))
}

/// An empty router using `templates` and the configured body limit.
pub fn build_router(config: &RouterConfig, templates: Arc<TemplateRegistry>) -> Router {
    Router::new(templates).with_max_body_size(config.limits.max_body_size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_prepare_fails_fast_on_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = RouterConfig::default();
        config.templates.root = dir.path().display().to_string();

        assert!(matches!(prepare_templates(&config), Err(TemplateError::NoMatch(_))));
    }

    #[test]
    fn test_prepare_parses_configured_patterns() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("views")).unwrap();
        fs::create_dir_all(dir.path().join("layout")).unwrap();
        fs::write(dir.path().join("views/home.html"), "home").unwrap();
        fs::write(dir.path().join("layout/main.html"), "{{ content }}").unwrap();

        let mut config = RouterConfig::default();
        config.templates.root = dir.path().display().to_string();
        config.limits.max_body_size = 16;

        let registry = prepare_templates(&config).unwrap();
        assert!(registry.is_parsed());
        assert_eq!(registry.names(), vec!["layout/main", "views/home"]);

        let router = build_router(&config, registry);
        assert_eq!(router.max_body_size(), 16);
        assert!(router.table().is_empty());
    }
}
