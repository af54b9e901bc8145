use super::{or_exit, runtime, Context};
use crate::ui;
use motus_templates::{TemplateEngine, TemplateSource};

pub fn cmd_templates_list(ctx: &Context, category: Option<&str>) {
    let config = ctx.registry_config();
    let engine = TemplateEngine::new(config.templates_path());
    let rt = runtime();
    let templates = or_exit(rt.block_on(engine.list_templates(category)));

    if templates.is_empty() {
        ui::empty("No templates found.");
        return;
    }
    println!("{:<36} {:<12} {}", "NAME", "CATEGORY", "SOURCE");
    println!("{}", "-".repeat(70));
    for t in templates {
        let source = match &t.source {
            TemplateSource::Bundled => "bundled".to_string(),
            TemplateSource::Disk(path) => path.display().to_string(),
        };
        println!("{:<36} {:<12} {}", t.name, t.category, source);
    }
}
