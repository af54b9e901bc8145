//! Advisory context checks against a small JSON-schema subset:
//! `required`, `properties.<field>.type`, `pattern` and `minLength`.

use motus_types::ValidationReport;
use regex_lite::Regex;
use serde_json::Value;

pub fn check_context(schema: &Value, context: &Value) -> ValidationReport {
    let mut report = ValidationReport::new(vec![], vec![]);

    if let Some(required) = schema.get("required").and_then(Value::as_array) {
        for field in required.iter().filter_map(Value::as_str) {
            match context.get(field) {
                None | Some(Value::Null) => {
                    report.error(format!("Missing required field: {field}"));
                }
                Some(_) => {}
            }
        }
    }

    let Some(properties) = schema.get("properties").and_then(Value::as_object) else {
        return report;
    };

    for (field, field_schema) in properties {
        let Some(value) = context.get(field) else {
            continue;
        };
        let expected = field_schema.get("type").and_then(Value::as_str);
        let type_ok = match expected {
            Some("array") => value.is_array(),
            Some("string") => value.is_string(),
            Some("number") => value.is_number(),
            Some("boolean") => value.is_boolean(),
            _ => true,
        };
        if !type_ok {
            report.error(format!(
                "Field {field} must be {} {}",
                article(expected.unwrap_or_default()),
                expected.unwrap_or_default()
            ));
            continue;
        }

        let Some(text) = value.as_str().filter(|_| expected == Some("string")) else {
            continue;
        };

        if let Some(pattern) = field_schema.get("pattern").and_then(Value::as_str) {
            match Regex::new(pattern) {
                Ok(re) if re.is_match(text) => {}
                Ok(_) => report.error(format!("Field {field} doesn't match pattern: {pattern}")),
                Err(e) => report.warn(format!("Field {field} has an invalid pattern: {e}")),
            }
        }

        if let Some(min) = field_schema.get("minLength").and_then(Value::as_u64) {
            if (text.chars().count() as u64) < min {
                report.error(format!("Field {field} must be at least {min} characters"));
            }
        }
    }

    report
}

fn article(kind: &str) -> &'static str {
    if kind.starts_with('a') {
        "an"
    } else {
        "a"
    }
}
