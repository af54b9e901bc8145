//! Template renderer for generated Motus artifacts.
//!
//! Templates are addressed by a logical name `"<category>/<identifier>"`,
//! e.g. `agent/data-fetcher-agent.md`. A file at
//! `<templates_dir>/<category>/<identifier>.hbs` overrides the bundled copy
//! of the same name. Compiled templates are cached for the lifetime of the
//! engine. Output is never HTML-escaped since every artifact is Markdown or
//! source code.

pub mod bundled;
pub mod helpers;
pub mod schema;

use chrono::{Datelike, SecondsFormat, Utc};
use handlebars::Handlebars;
use motus_types::ValidationReport;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Directory under the templates root holding context schemas.
const SCHEMAS_DIR: &str = "schemas";

#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("Template not found: {0}")]
    NotFound(String),
    #[error("Invalid template name '{0}': expected <category>/<identifier>")]
    InvalidName(String),
    #[error("Failed to compile template {name}: {message}")]
    Compile { name: String, message: String },
    #[error("Failed to render template {name}: {message}")]
    Render { name: String, message: String },
    #[error("Invalid schema {path}: {message}")]
    Schema { path: PathBuf, message: String },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type TemplateResult<T> = Result<T, TemplateError>;

/// Where a listed template comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateSource {
    Bundled,
    Disk(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateInfo {
    /// Logical name, `<category>/<identifier>`.
    pub name: String,
    pub category: String,
    pub source: TemplateSource,
}

/// Split a logical name into `(category, identifier)`.
fn split_name(name: &str) -> TemplateResult<(&str, &str)> {
    let invalid = || TemplateError::InvalidName(name.to_string());
    let (category, identifier) = name.split_once('/').ok_or_else(invalid)?;
    let bad = |part: &str| part.is_empty() || part.contains('/') || part.contains("..");
    if bad(category) || bad(identifier) {
        return Err(invalid());
    }
    Ok((category, identifier))
}

pub struct TemplateEngine {
    registry: Handlebars<'static>,
    templates_dir: Option<PathBuf>,
}

impl Default for TemplateEngine {
    fn default() -> Self {
        Self::new(None)
    }
}

impl TemplateEngine {
    /// Create an engine. `templates_dir` holds optional on-disk overrides.
    pub fn new(templates_dir: Option<PathBuf>) -> Self {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(false);
        registry.register_escape_fn(handlebars::no_escape);
        helpers::register_all(&mut registry);
        Self {
            registry,
            templates_dir,
        }
    }

    pub fn templates_dir(&self) -> Option<&Path> {
        self.templates_dir.as_deref()
    }

    /// Path an on-disk override for `name` would live at.
    pub fn override_path(&self, name: &str) -> TemplateResult<Option<PathBuf>> {
        let (category, identifier) = split_name(name)?;
        Ok(self
            .templates_dir
            .as_ref()
            .map(|dir| dir.join(category).join(format!("{identifier}.hbs"))))
    }

    pub fn is_cached(&self, name: &str) -> bool {
        self.registry.has_template(name)
    }

    /// Drop every compiled template. The next render reloads from disk.
    pub fn clear_cache(&mut self) {
        self.registry.clear_templates();
    }

    async fn load_source(&self, name: &str) -> TemplateResult<String> {
        if let Some(path) = self.override_path(name)? {
            if tokio::fs::try_exists(&path).await? {
                debug!(template = name, path = %path.display(), "Loading template from disk");
                return Ok(tokio::fs::read_to_string(&path).await?);
            }
        }
        bundled::get(name)
            .map(str::to_string)
            .ok_or_else(|| TemplateError::NotFound(name.to_string()))
    }

    async fn ensure_compiled(&mut self, name: &str) -> TemplateResult<()> {
        if self.registry.has_template(name) {
            return Ok(());
        }
        let source = self.load_source(name).await?;
        self.registry
            .register_template_string(name, source)
            .map_err(|e| TemplateError::Compile {
                name: name.to_string(),
                message: e.to_string(),
            })
    }

    /// Render `name` with `context` layered over `{timestamp, year}`.
    pub async fn render(&mut self, name: &str, context: &Value) -> TemplateResult<String> {
        self.ensure_compiled(name).await?;
        let full = with_defaults(context);
        self.registry
            .render(name, &full)
            .map_err(|e| TemplateError::Render {
                name: name.to_string(),
                message: e.to_string(),
            })
    }

    /// Render and write to `path`, creating parent directories. Existing files
    /// are overwritten.
    pub async fn render_to_file(
        &mut self,
        name: &str,
        context: &Value,
        path: &Path,
    ) -> TemplateResult<PathBuf> {
        let rendered = self.render(name, context).await?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, rendered).await?;
        debug!(template = name, path = %path.display(), "Rendered template to file");
        Ok(path.to_path_buf())
    }

    /// Render a template string that is not registered under any name.
    pub fn render_inline(&self, template: &str, context: &Value) -> TemplateResult<String> {
        self.registry
            .render_template(template, &with_defaults(context))
            .map_err(|e| TemplateError::Render {
                name: "<inline>".to_string(),
                message: e.to_string(),
            })
    }

    /// Bundled and on-disk templates, deduplicated by name and sorted.
    pub async fn list_templates(&self, category: Option<&str>) -> TemplateResult<Vec<TemplateInfo>> {
        let mut found: BTreeMap<String, TemplateInfo> = BTreeMap::new();

        for (name, _) in bundled::bundled_templates() {
            let Ok((cat, _)) = split_name(name) else {
                continue;
            };
            if category.is_some_and(|c| c != cat) {
                continue;
            }
            found.insert(
                name.to_string(),
                TemplateInfo {
                    name: name.to_string(),
                    category: cat.to_string(),
                    source: TemplateSource::Bundled,
                },
            );
        }

        if let Some(dir) = &self.templates_dir {
            let categories = match category {
                Some(c) => vec![c.to_string()],
                None => subdirectories(dir).await?,
            };
            for cat in categories {
                if cat == SCHEMAS_DIR {
                    continue;
                }
                let cat_dir = dir.join(&cat);
                if !tokio::fs::try_exists(&cat_dir).await? {
                    continue;
                }
                let mut entries = tokio::fs::read_dir(&cat_dir).await?;
                while let Some(entry) = entries.next_entry().await? {
                    let file_name = entry.file_name().to_string_lossy().to_string();
                    let Some(identifier) = file_name.strip_suffix(".hbs") else {
                        continue;
                    };
                    let name = format!("{cat}/{identifier}");
                    found.insert(
                        name.clone(),
                        TemplateInfo {
                            name,
                            category: cat.clone(),
                            source: TemplateSource::Disk(entry.path()),
                        },
                    );
                }
            }
        }

        Ok(found.into_values().collect())
    }

    /// Check `context` against `<templates_dir>/schemas/<category>/<identifier>-schema.json`.
    ///
    /// Advisory only. A template without a schema is always valid.
    pub async fn validate_context(
        &self,
        name: &str,
        context: &Value,
    ) -> TemplateResult<ValidationReport> {
        let (category, identifier) = split_name(name)?;
        let Some(dir) = &self.templates_dir else {
            return Ok(ValidationReport::new(vec![], vec![]));
        };
        let path = dir
            .join(SCHEMAS_DIR)
            .join(category)
            .join(format!("{identifier}-schema.json"));
        if !tokio::fs::try_exists(&path).await? {
            return Ok(ValidationReport::new(vec![], vec![]));
        }
        let raw = tokio::fs::read_to_string(&path).await?;
        let schema: Value = serde_json::from_str(&raw).map_err(|e| TemplateError::Schema {
            path: path.clone(),
            message: e.to_string(),
        })?;
        Ok(schema::check_context(&schema, context))
    }
}

async fn subdirectories(dir: &Path) -> TemplateResult<Vec<String>> {
    let mut out = Vec::new();
    if !tokio::fs::try_exists(dir).await? {
        return Ok(out);
    }
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        if entry.file_type().await?.is_dir() {
            out.push(entry.file_name().to_string_lossy().to_string());
        }
    }
    out.sort();
    Ok(out)
}

/// `{timestamp, year}` with the caller's keys layered on top.
fn with_defaults(context: &Value) -> Value {
    let now = Utc::now();
    let mut full = Map::new();
    full.insert(
        "timestamp".to_string(),
        json!(now.to_rfc3339_opts(SecondsFormat::Millis, true)),
    );
    full.insert("year".to_string(), json!(now.year()));
    if let Value::Object(map) = context {
        for (k, v) in map {
            full.insert(k.clone(), v.clone());
        }
    }
    Value::Object(full)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_malformed_names() {
        assert!(split_name("agent").is_err());
        assert!(split_name("/x").is_err());
        assert!(split_name("agent/").is_err());
        assert!(split_name("a/b/c").is_err());
        assert!(split_name("../etc").is_err());
        assert_eq!(
            split_name("agent/specialist-agent.md").unwrap(),
            ("agent", "specialist-agent.md")
        );
    }

    #[tokio::test]
    async fn renders_bundled_template_and_caches_it() {
        let mut engine = TemplateEngine::default();
        let ctx = json!({
            "name": "budget-tracker",
            "displayName": "Budget Tracker",
            "description": "Tracks monthly budget usage",
            "department": "finance",
            "type": "specialist",
            "tools": ["Read", "Write"],
            "model": "sonnet",
            "frontmatter": {"name": "budget-tracker", "model": "sonnet"}
        });
        let out = engine.render("agent/specialist-agent.md", &ctx).await.unwrap();
        assert!(out.starts_with("---\n"));
        assert!(out.contains("\nname: budget-tracker\n"));
        assert!(out.contains("# Budget Tracker"));
        assert!(engine.is_cached("agent/specialist-agent.md"));

        engine.clear_cache();
        assert!(!engine.is_cached("agent/specialist-agent.md"));
    }

    #[tokio::test]
    async fn unknown_template_is_not_found() {
        let mut engine = TemplateEngine::default();
        let err = engine.render("agent/generic-agent.md", &json!({})).await.unwrap_err();
        assert!(matches!(err, TemplateError::NotFound(ref n) if n == "agent/generic-agent.md"));
    }

    #[tokio::test]
    async fn disk_template_overrides_bundled() {
        let dir = tempfile::tempdir().unwrap();
        let agent_dir = dir.path().join("agent");
        std::fs::create_dir_all(&agent_dir).unwrap();
        std::fs::write(agent_dir.join("specialist-agent.md.hbs"), "custom {{name}}").unwrap();

        let mut engine = TemplateEngine::new(Some(dir.path().to_path_buf()));
        let out = engine
            .render("agent/specialist-agent.md", &json!({"name": "x"}))
            .await
            .unwrap();
        assert_eq!(out, "custom x");
    }

    #[tokio::test]
    async fn caller_context_wins_over_defaults() {
        let engine = TemplateEngine::default();
        let out = engine
            .render_inline("{{timestamp}}|{{year}}", &json!({"timestamp": "fixed"}))
            .unwrap();
        let (ts, year) = out.split_once('|').unwrap();
        assert_eq!(ts, "fixed");
        assert_eq!(year, Utc::now().year().to_string());
    }

    #[test]
    fn output_is_not_html_escaped() {
        let engine = TemplateEngine::default();
        let out = engine
            .render_inline("{{code}}", &json!({"code": "if (a < b && c > d) {}"}))
            .unwrap();
        assert_eq!(out, "if (a < b && c > d) {}");
    }

    #[tokio::test]
    async fn render_to_file_creates_parents_and_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deep/nested/out.md");
        assert!(!dir.path().join("deep").exists());

        let mut engine = TemplateEngine::default();
        let ctx = json!({
            "name": "fetch-weather",
            "displayName": "Fetch Weather",
            "description": "Fetch the forecast",
            "timestamp": "2026-02-23T10:00:00.000Z"
        });
        engine
            .render_to_file("agent/data-fetcher-script.js", &ctx, &path)
            .await
            .unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("fetchWeather"));

        std::fs::write(&path, "old").unwrap();
        engine
            .render_to_file("agent/data-fetcher-script.js", &ctx, &path)
            .await
            .unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), written);
    }

    #[test]
    fn list_templates_merges_disk_and_bundled() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("workflow")).unwrap();
        std::fs::create_dir_all(dir.path().join("schemas/agent")).unwrap();
        std::fs::write(dir.path().join("workflow/runner.sh.hbs"), "#!/bin/sh").unwrap();
        std::fs::write(dir.path().join("workflow/notes.txt"), "ignored").unwrap();
        std::fs::create_dir_all(dir.path().join("agent")).unwrap();
        std::fs::write(dir.path().join("agent/specialist-agent.md.hbs"), "x").unwrap();

        let engine = TemplateEngine::new(Some(dir.path().to_path_buf()));
        let all = tokio_test::block_on(engine.list_templates(None)).unwrap();
        let names: Vec<&str> = all.iter().map(|t| t.name.as_str()).collect();
        assert!(names.contains(&"workflow/runner.sh"));
        assert!(names.contains(&"department/department-agent.md"));
        assert!(!names.iter().any(|n| n.starts_with("schemas/")));
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);

        let specialist = all
            .iter()
            .find(|t| t.name == "agent/specialist-agent.md")
            .unwrap();
        assert!(matches!(specialist.source, TemplateSource::Disk(_)));

        let agents = tokio_test::block_on(engine.list_templates(Some("agent"))).unwrap();
        assert!(agents.iter().all(|t| t.category == "agent"));
        assert_eq!(agents.len(), 4);
    }

    #[tokio::test]
    async fn validate_context_reads_schema() {
        let dir = tempfile::tempdir().unwrap();
        let schema_dir = dir.path().join("schemas/agent");
        std::fs::create_dir_all(&schema_dir).unwrap();
        std::fs::write(
            schema_dir.join("specialist-agent.md-schema.json"),
            r#"{"required": ["name"], "properties": {"name": {"type": "string", "minLength": 3}}}"#,
        )
        .unwrap();

        let engine = TemplateEngine::new(Some(dir.path().to_path_buf()));
        let report = engine
            .validate_context("agent/specialist-agent.md", &json!({"name": "ab"}))
            .await
            .unwrap();
        assert!(!report.valid);
        assert_eq!(report.errors, vec!["Field name must be at least 3 characters"]);

        let no_schema = engine
            .validate_context("agent/orchestrator-agent.md", &json!({}))
            .await
            .unwrap();
        assert!(no_schema.valid);
    }
}
