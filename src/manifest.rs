//! Route manifests: a list of routes kept in a YAML or TOML file.
//!
//! ```yaml
//! routes:
//!   - name: lead-get
//!     methods: [GET]
//!     pattern: /lead/:id
//!   - name: files
//!     pattern: /files/:path+
//! ```
//!
//! Every route is registered with the echo handler, in file order.

use anyhow::{anyhow, bail, Context, Result};
use http::Method;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

use crate::app::App;
use crate::echo::echo_handler;
use crate::router::RouteDefinition;
use crate::runtime_config::RuntimeConfig;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteManifest {
    #[serde(default)]
    pub routes: Vec<ManifestRoute>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestRoute {
    pub name: String,
    /// Method tokens, case-insensitive; empty means `GET`
    #[serde(default)]
    pub methods: Vec<String>,
    pub pattern: String,
}

impl ManifestRoute {
    /// Uppercased methods; an unparseable token is an error.
    pub fn parsed_methods(&self) -> Result<Vec<Method>> {
        self.methods
            .iter()
            .map(|m| {
                let token = m.trim().to_ascii_uppercase();
                Method::from_bytes(token.as_bytes())
                    .map_err(|_| anyhow!("route `{}`: invalid method `{m}`", self.name))
            })
            .collect()
    }
}

impl RouteManifest {
    pub fn parse_yaml(text: &str) -> Result<Self> {
        serde_yaml::from_str(text).context("Failed to parse YAML route manifest")
    }

    pub fn parse_toml(text: &str) -> Result<Self> {
        toml::from_str(text).context("Failed to parse TOML route manifest")
    }

    /// Build an [`App`] with every route bound to the echo handler.
    pub fn into_app(self) -> Result<App> {
        self.into_app_with_config(RuntimeConfig::default())
    }

    pub fn into_app_with_config(self, config: RuntimeConfig) -> Result<App> {
        let mut app = App::with_config(config);
        for route in self.routes {
            let methods = route.parsed_methods()?;
            let mut definition = RouteDefinition::new(&methods, &route.pattern)
                .with_context(|| format!("route `{}`", route.name))?
                .with_name(route.name.as_str());
            definition.set_handler(echo_handler(&route.name));
            app.add(definition, None);
        }
        info!(routes_count = app.table().len(), "Route manifest loaded");
        Ok(app)
    }
}

/// Load a manifest, picking the format from the file extension
/// (`.yaml`, `.yml` or `.toml`).
pub fn load_manifest(path: &Path) -> Result<RouteManifest> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read manifest {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("yaml" | "yml") => RouteManifest::parse_yaml(&text),
        Some("toml") => RouteManifest::parse_toml(&text),
        _ => bail!(
            "Unsupported manifest extension for {} (expected .yaml, .yml or .toml)",
            path.display()
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_methods_are_uppercased() {
        let route = ManifestRoute {
            name: "r".into(),
            methods: vec!["get".into(), " Post ".into()],
            pattern: "/r".into(),
        };
        assert_eq!(route.parsed_methods().unwrap(), vec![Method::GET, Method::POST]);
    }

    #[test]
    fn test_invalid_method_is_rejected() {
        let route = ManifestRoute {
            name: "r".into(),
            methods: vec!["GE T".into()],
            pattern: "/r".into(),
        };
        let err = route.parsed_methods().unwrap_err();
        assert!(err.to_string().contains("invalid method"));
    }

    #[test]
    fn test_bad_pattern_names_the_route() {
        let manifest = RouteManifest::parse_yaml("routes:\n  - name: broken\n    pattern: /a)\n").unwrap();
        let err = manifest.into_app().err().unwrap();
        assert!(format!("{err:#}").contains("broken"));
    }
}
