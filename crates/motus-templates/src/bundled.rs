//! Compile-time embedded templates.

/// All bundled templates as (logical name, source).
pub fn bundled_templates() -> Vec<(&'static str, &'static str)> {
    vec![
        (
            "department/department-agent.md",
            include_str!("../templates/department/department-agent.md.hbs"),
        ),
        (
            "agent/data-fetcher-agent.md",
            include_str!("../templates/agent/data-fetcher-agent.md.hbs"),
        ),
        (
            "agent/orchestrator-agent.md",
            include_str!("../templates/agent/orchestrator-agent.md.hbs"),
        ),
        (
            "agent/specialist-agent.md",
            include_str!("../templates/agent/specialist-agent.md.hbs"),
        ),
        (
            "agent/data-fetcher-script.js",
            include_str!("../templates/agent/data-fetcher-script.js.hbs"),
        ),
        (
            "docs/commands-reference.md",
            include_str!("../templates/docs/commands-reference.md.hbs"),
        ),
        (
            "docs/department.md",
            include_str!("../templates/docs/department.md.hbs"),
        ),
    ]
}

/// Source of the bundled template called `name`.
pub fn get(name: &str) -> Option<&'static str> {
    bundled_templates()
        .into_iter()
        .find(|(n, _)| *n == name)
        .map(|(_, source)| source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use handlebars::Handlebars;

    #[test]
    fn bundled_templates_count() {
        assert_eq!(bundled_templates().len(), 7);
    }

    #[test]
    fn every_bundled_template_compiles() {
        let mut hb = Handlebars::new();
        crate::helpers::register_all(&mut hb);
        for (name, source) in bundled_templates() {
            assert!(
                hb.register_template_string(name, source).is_ok(),
                "{name} failed to compile"
            );
        }
    }

    #[test]
    fn lookup_by_name() {
        assert!(get("agent/specialist-agent.md").is_some());
        assert!(get("agent/generic-agent.md").is_none());
    }
}
