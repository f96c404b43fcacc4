//! Template registry: glob discovery, lazy parsing and named execution.
//!
//! # Responsibilities
//! - Record a root directory and an ordered list of glob patterns
//! - Parse every matching file into a single namespace, once
//! - Look templates up by logical name and render them into a sink
//!
//! # Design Decisions
//! - A failed parse keeps what was parsed so far visible but leaves the
//!   registry unbuilt, so the next `parse_glob` starts over
//! - Render data is JSON; objects become the template's top-level variables,
//!   any other value is exposed as `value`
//! - Trusted HTML (a rendered view inside its layout) goes through a copy of
//!   the namespace with escaping off, after every other string variable has
//!   been escaped up front
//!
//! # Blocking
//! `parse_glob` reads the filesystem while holding a `std::sync::Mutex`. Call
//! it before serving (see `lifecycle::startup::prepare_templates`); otherwise
//! the first request that renders pays for it on a runtime worker.

use std::fmt;
use std::io::Write;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex};

use arc_swap::ArcSwap;
use serde_json::{Map, Value};
use tera::{Context, Tera};

use crate::config::TemplateConfig;
use crate::templates::error::{describe, TemplateError};

/// Variable holding render data that is not a JSON object.
pub const VALUE_KEY: &str = "value";

/// Named template collection backed by Tera.
pub struct TemplateRegistry {
    root: PathBuf,
    patterns: Vec<String>,
    autoescape: bool,
    namespace: ArcSwap<Namespace>,
    built: Mutex<bool>,
}

/// Parsed templates, published as one unit.
struct Namespace {
    tera: Tera,
    /// Same templates with escaping off; only present when autoescape is on.
    unescaped: Option<Tera>,
}

impl Namespace {
    fn new(tera: Tera, autoescape: bool) -> Self {
        let unescaped = autoescape.then(|| {
            let mut raw = tera.clone();
            raw.autoescape_on(vec![]);
            raw
        });
        Self { tera, unescaped }
    }
}

impl TemplateRegistry {
    /// Create an empty registry rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            patterns: Vec::new(),
            autoescape: true,
            namespace: ArcSwap::from_pointee(Namespace::new(empty_namespace(true), true)),
            built: Mutex::new(false),
        }
    }

    /// Create a registry from the `[templates]` config section. Nothing is parsed yet.
    pub fn from_config(config: &TemplateConfig) -> Self {
        let mut registry = Self::new(&config.root);
        registry.set_autoescape(config.autoescape);
        for pattern in &config.patterns {
            registry.add_path(pattern.clone());
        }
        registry
    }

    /// Set the base directory for subsequent glob resolution. Not validated.
    pub fn set_root(&mut self, root: impl Into<PathBuf>) {
        self.root = root.into();
    }

    /// Append a glob pattern, relative to the root.
    pub fn add_path(&mut self, pattern: impl Into<String>) {
        self.patterns.push(pattern.into());
    }

    /// Toggle HTML escaping for every template parsed afterwards.
    pub fn set_autoescape(&mut self, enabled: bool) {
        self.autoescape = enabled;
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Whether a full parse has completed.
    pub fn is_parsed(&self) -> bool {
        *self.built.lock().expect("template registry mutex poisoned")
    }

    /// Parse every pattern into the namespace.
    ///
    /// Idempotent: once a parse has succeeded this returns `Ok(())` without
    /// touching the filesystem. Patterns are applied in order and the first
    /// failure aborts the parse. Blocks on file I/O.
    pub fn parse_glob(&self) -> Result<(), TemplateError> {
        let mut built = self.built.lock().expect("template registry mutex poisoned");
        if *built {
            return Ok(());
        }

        let mut tera = empty_namespace(self.autoescape);
        let result = self.parse_into(&mut tera);
        let count = tera.get_template_names().count();
        self.namespace.store(Arc::new(Namespace::new(tera, self.autoescape)));

        match result {
            Ok(()) => {
                *built = true;
                tracing::info!(
                    root = %self.root.display(),
                    patterns = self.patterns.len(),
                    templates = count,
                    "Templates parsed"
                );
                Ok(())
            }
            Err(e) => {
                tracing::error!(
                    root = %self.root.display(),
                    templates = count,
                    error = %e,
                    "Template parse failed"
                );
                Err(e)
            }
        }
    }

    fn parse_into(&self, tera: &mut Tera) -> Result<(), TemplateError> {
        for pattern in &self.patterns {
            let full = self.root.join(pattern);
            let full = full.to_string_lossy();

            let entries = glob::glob(&full).map_err(|source| TemplateError::Pattern {
                pattern: full.to_string(),
                source,
            })?;

            let mut files = Vec::new();
            for entry in entries {
                let path = entry?;
                if path.is_file() {
                    let name = self.template_name(&path);
                    files.push((path, Some(name)));
                }
            }

            if files.is_empty() {
                return Err(TemplateError::NoMatch(full.to_string()));
            }

            let matched = files.len();
            tera.add_template_files(files)
                .map_err(|e| TemplateError::Parse {
                    pattern: full.to_string(),
                    detail: describe(&e),
                })?;

            tracing::debug!(pattern = %full, files = matched, "Parsed template pattern");
        }
        Ok(())
    }

    /// Logical name for a template file: path relative to the root,
    /// `/`-separated, final extension dropped.
    fn template_name(&self, path: &Path) -> String {
        let root = normalize(&self.root);
        let path = normalize(path);

        let relative = match path.strip_prefix(&root) {
            Ok(relative) => relative.with_extension(""),
            Err(_) => PathBuf::from(path.file_stem().unwrap_or_default()),
        };

        relative
            .iter()
            .map(|part| part.to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Find a template by name. Never parses and never fails.
    pub fn lookup(&self, name: &str) -> Option<Template> {
        let namespace = self.namespace.load_full();
        if namespace.tera.get_template_names().any(|n| n == name) {
            Some(Template {
                name: name.to_string(),
                namespace,
            })
        } else {
            None
        }
    }

    /// Render the named template against `data` into `sink`.
    pub fn execute<W: Write>(&self, name: &str, data: &Value, sink: W) -> Result<(), TemplateError> {
        self.lookup(name)
            .ok_or_else(|| TemplateError::NotFound(name.to_string()))?
            .execute(data, sink)
    }

    /// All template names currently in the namespace, sorted.
    pub fn names(&self) -> Vec<String> {
        let namespace = self.namespace.load();
        let mut names: Vec<String> = namespace
            .tera
            .get_template_names()
            .map(str::to_string)
            .collect();
        names.sort();
        names
    }
}

impl fmt::Debug for TemplateRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateRegistry")
            .field("root", &self.root)
            .field("patterns", &self.patterns)
            .field("autoescape", &self.autoescape)
            .field("parsed", &self.is_parsed())
            .finish()
    }
}

/// A resolved template, pinned to the namespace it was found in.
#[derive(Clone)]
pub struct Template {
    name: String,
    namespace: Arc<Namespace>,
}

impl Template {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Render against `data` into `sink`.
    ///
    /// An object's keys become variables, null is an empty context, and any
    /// other value is available as `{{ value }}`.
    pub fn execute<W: Write>(&self, data: &Value, sink: W) -> Result<(), TemplateError> {
        self.render_in(&self.namespace.tera, data, sink)
    }

    /// Render with `vars` plus `html` under `key`, emitted without escaping.
    ///
    /// With autoescape on, every string in `vars` is escaped before rendering,
    /// so `{{ key }}` and `{{ key | safe }}` both produce `html` unchanged.
    pub fn execute_with_html<W: Write>(
        &self,
        mut vars: Map<String, Value>,
        key: &str,
        html: String,
        sink: W,
    ) -> Result<(), TemplateError> {
        let tera = match &self.namespace.unescaped {
            Some(unescaped) => {
                vars.values_mut().for_each(escape_strings);
                unescaped
            }
            None => &self.namespace.tera,
        };
        vars.insert(key.to_string(), Value::String(html));
        self.render_in(tera, &Value::Object(vars), sink)
    }

    fn render_in<W: Write>(&self, tera: &Tera, data: &Value, sink: W) -> Result<(), TemplateError> {
        let context = match data {
            Value::Null => Context::new(),
            Value::Object(_) => Context::from_serialize(data).map_err(|e| TemplateError::Render {
                name: self.name.clone(),
                detail: describe(&e),
            })?,
            other => {
                let mut context = Context::new();
                context.insert(VALUE_KEY, other);
                context
            }
        };

        tera.render_to(&self.name, &context, sink)
            .map_err(|e| TemplateError::Render {
                name: self.name.clone(),
                detail: describe(&e),
            })
    }
}

impl fmt::Debug for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Template").field("name", &self.name).finish()
    }
}

fn empty_namespace(autoescape: bool) -> Tera {
    let mut tera = Tera::default();
    if autoescape {
        // Template names carry no extension, so escape by matching every name.
        tera.autoescape_on(vec![""]);
    } else {
        tera.autoescape_on(vec![]);
    }
    tera
}

fn escape_strings(value: &mut Value) {
    match value {
        Value::String(s) => *s = tera::escape_html(s),
        Value::Array(items) => items.iter_mut().for_each(escape_strings),
        Value::Object(map) => map.values_mut().for_each(escape_strings),
        _ => {}
    }
}

fn normalize(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}
