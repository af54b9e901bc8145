//! Handlebars helpers available to every template.
//!
//! String helpers write directly to the output. Predicates (`contains`,
//! `notEmpty`) return booleans so they can be used as subexpressions:
//! `{{#if (contains tools "Bash")}}`.

use chrono::{DateTime, SecondsFormat, Utc};
use handlebars::{
    handlebars_helper, Context, Handlebars, Helper, HelperResult, Output, RenderContext,
};
use motus_types::naming;
use serde_json::Value;

pub fn register_all(registry: &mut Handlebars<'static>) {
    registry.register_helper("kebabCase", Box::new(kebab_case_helper));
    registry.register_helper("pascalCase", Box::new(pascal_case_helper));
    registry.register_helper("camelCase", Box::new(camel_case_helper));
    registry.register_helper("capitalize", Box::new(capitalize_helper));
    registry.register_helper("uppercase", Box::new(uppercase_helper));
    registry.register_helper("lowercase", Box::new(lowercase_helper));
    registry.register_helper("join", Box::new(join_helper));
    registry.register_helper("contains", Box::new(contains));
    registry.register_helper("notEmpty", Box::new(not_empty));
    registry.register_helper("pluralize", Box::new(pluralize_helper));
    registry.register_helper("indent", Box::new(indent_helper));
    registry.register_helper("commentHeader", Box::new(comment_header_helper));
    registry.register_helper("agentList", Box::new(agent_list_helper));
    registry.register_helper("toolsList", Box::new(tools_list_helper));
    registry.register_helper("frontmatter", Box::new(frontmatter_helper));
    registry.register_helper("stepNumber", Box::new(step_number_helper));
    registry.register_helper("formatDate", Box::new(format_date_helper));
    registry.register_helper("timestamp", Box::new(timestamp_helper));
}

handlebars_helper!(contains: |list: Json, value: Json| {
    list.as_array().is_some_and(|items| items.contains(value))
});

handlebars_helper!(not_empty: |value: Json| is_not_empty(value));

fn is_not_empty(value: &Value) -> bool {
    match value {
        Value::Array(items) => !items.is_empty(),
        Value::String(s) => !s.trim().is_empty(),
        Value::Object(map) => !map.is_empty(),
        _ => false,
    }
}

fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// The root context's `timestamp` when set, otherwise the current time.
fn render_timestamp(ctx: &Context) -> String {
    match ctx.data().get("timestamp").filter(|v| !v.is_null()) {
        Some(value) => display(value),
        None => now_iso(),
    }
}

fn str_param<'a>(h: &'a Helper, idx: usize) -> &'a str {
    h.param(idx).and_then(|v| v.value().as_str()).unwrap_or("")
}

/// Plain text form of a scalar; strings are not quoted.
fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Array(items) => items.iter().map(display).collect::<Vec<_>>().join(", "),
        other => other.to_string(),
    }
}

fn string_items(value: Option<&Value>) -> Option<Vec<String>> {
    value
        .and_then(Value::as_array)
        .map(|items| items.iter().map(display).collect())
}

fn kebab_case_helper(
    h: &Helper,
    _: &Handlebars,
    _: &Context,
    _: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    out.write(&naming::kebab_case(str_param(h, 0)))?;
    Ok(())
}

fn pascal_case_helper(
    h: &Helper,
    _: &Handlebars,
    _: &Context,
    _: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    out.write(&naming::pascal_case(str_param(h, 0)))?;
    Ok(())
}

fn camel_case_helper(
    h: &Helper,
    _: &Handlebars,
    _: &Context,
    _: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    out.write(&naming::camel_case(str_param(h, 0)))?;
    Ok(())
}

fn capitalize_helper(
    h: &Helper,
    _: &Handlebars,
    _: &Context,
    _: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    out.write(&naming::capitalize(str_param(h, 0)))?;
    Ok(())
}

fn uppercase_helper(
    h: &Helper,
    _: &Handlebars,
    _: &Context,
    _: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    out.write(&str_param(h, 0).to_uppercase())?;
    Ok(())
}

fn lowercase_helper(
    h: &Helper,
    _: &Handlebars,
    _: &Context,
    _: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    out.write(&str_param(h, 0).to_lowercase())?;
    Ok(())
}

/// `{{join list ", "}}`. Non-arrays render as nothing.
fn join_helper(
    h: &Helper,
    _: &Handlebars,
    _: &Context,
    _: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    let Some(items) = string_items(h.param(0).map(|p| p.value())) else {
        return Ok(());
    };
    let sep = h
        .param(1)
        .and_then(|v| v.value().as_str())
        .unwrap_or(", ");
    out.write(&items.join(sep))?;
    Ok(())
}

/// `{{pluralize count "agent"}}` -> `agent` or `agents`.
fn pluralize_helper(
    h: &Helper,
    _: &Handlebars,
    _: &Context,
    _: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    let count = h.param(0).and_then(|v| v.value().as_f64());
    let singular = str_param(h, 1);
    if count == Some(1.0) {
        out.write(singular)?;
    } else {
        match h.param(2).and_then(|v| v.value().as_str()) {
            Some(plural) => out.write(plural)?,
            None => out.write(&format!("{singular}s"))?,
        }
    }
    Ok(())
}

fn indent_helper(
    h: &Helper,
    _: &Handlebars,
    _: &Context,
    _: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    let text = str_param(h, 0);
    if text.is_empty() {
        return Ok(());
    }
    let width = h
        .param(1)
        .and_then(|v| v.value().as_u64())
        .unwrap_or(2) as usize;
    let pad = " ".repeat(width);
    let indented: Vec<String> = text.split('\n').map(|line| format!("{pad}{line}")).collect();
    out.write(&indented.join("\n"))?;
    Ok(())
}

fn comment_header_helper(
    h: &Helper,
    _: &Handlebars,
    ctx: &Context,
    _: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    let rule = "*".repeat(70);
    out.write(&format!(
        "/**\n * {}\n * Generated: {}\n * {rule}\n */",
        str_param(h, 0),
        render_timestamp(ctx)
    ))?;
    Ok(())
}

/// One `   - name` line per agent. Accepts names or objects with a `name`.
fn agent_list_helper(
    h: &Helper,
    _: &Handlebars,
    _: &Context,
    _: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    let Some(items) = h.param(0).and_then(|v| v.value().as_array()) else {
        return Ok(());
    };
    let lines: Vec<String> = items
        .iter()
        .map(|item| match item.get("name") {
            Some(name) => format!("   - {}", display(name)),
            None => format!("   - {}", display(item)),
        })
        .collect();
    out.write(&lines.join("\n"))?;
    Ok(())
}

fn tools_list_helper(
    h: &Helper,
    _: &Handlebars,
    _: &Context,
    _: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    if let Some(items) = string_items(h.param(0).map(|p| p.value())) {
        out.write(&items.join(", "))?;
    }
    Ok(())
}

/// YAML-ish block delimited by `---`. Null values are skipped.
fn frontmatter_helper(
    h: &Helper,
    _: &Handlebars,
    _: &Context,
    _: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    let mut lines = vec!["---".to_string()];
    if let Some(map) = h.param(0).and_then(|v| v.value().as_object()) {
        for (key, value) in map {
            if value.is_null() {
                continue;
            }
            lines.push(format!("{key}: {}", display(value)));
        }
    }
    lines.push("---".to_string());
    out.write(&lines.join("\n"))?;
    Ok(())
}

fn step_number_helper(
    h: &Helper,
    _: &Handlebars,
    _: &Context,
    _: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    let index = h.param(0).and_then(|v| v.value().as_u64()).unwrap_or(0);
    out.write(&(index + 1).to_string())?;
    Ok(())
}

/// ISO-8601 form of a date string; the current time when absent.
fn format_date_helper(
    h: &Helper,
    _: &Handlebars,
    _: &Context,
    _: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    let raw = str_param(h, 0);
    if raw.is_empty() {
        out.write(&now_iso())?;
        return Ok(());
    }
    match DateTime::parse_from_rfc3339(raw) {
        Ok(parsed) => out.write(
            &parsed
                .with_timezone(&Utc)
                .to_rfc3339_opts(SecondsFormat::Millis, true),
        )?,
        Err(_) => out.write(raw)?,
    }
    Ok(())
}

fn timestamp_helper(
    _: &Helper,
    _: &Handlebars,
    ctx: &Context,
    _: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    out.write(&render_timestamp(ctx))?;
    Ok(())
}
