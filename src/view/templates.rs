use anyhow::{Context as _, Result};
use minijinja::Environment;
use serde::Serialize;
use std::path::Path;

use super::model::ListViewModel;

const TASK_LIST_TEMPLATE: &str = "task-list-view.html";
const DEFAULT_FORM_TEMPLATE: &str = "task-form-default.html";

const TASK_LIST_SOURCE: &str = include_str!("../../templates/task-list-view.html");
const DEFAULT_FORM_SOURCE: &str = include_str!("../../templates/task-form-default.html");

/// The compiled view templates. Built once at startup; a configured
/// default-form override that cannot be read or compiled aborts startup.
#[derive(Debug)]
pub struct Templates {
    env: Environment<'static>,
}

impl Templates {
    pub fn load(default_form_override: Option<&Path>) -> Result<Self> {
        let mut env = Environment::new();
        env.add_template(TASK_LIST_TEMPLATE, TASK_LIST_SOURCE)
            .context("compiling task list template")?;

        match default_form_override {
            Some(path) => {
                let source = std::fs::read_to_string(path).with_context(|| {
                    format!("reading task form template {}", path.display())
                })?;
                env.add_template_owned(DEFAULT_FORM_TEMPLATE.to_string(), source)
                    .context("compiling task form template")?;
            }
            None => {
                env.add_template(DEFAULT_FORM_TEMPLATE, DEFAULT_FORM_SOURCE)
                    .context("compiling task form template")?;
            }
        }

        Ok(Self { env })
    }

    /// Render the full task list page.
    pub fn render_list(&self, model: &ListViewModel) -> Result<String, minijinja::Error> {
        self.env.get_template(TASK_LIST_TEMPLATE)?.render(model)
    }

    /// Render the default task form with a prepared context.
    pub fn render_default_form<S: Serialize>(&self, ctx: &S) -> Result<String, minijinja::Error> {
        self.env.get_template(DEFAULT_FORM_TEMPLATE)?.render(ctx)
    }

    /// Compile and render a task's custom form source in one pass.
    pub fn render_custom<S: Serialize>(
        &self,
        source: &str,
        ctx: &S,
    ) -> Result<String, minijinja::Error> {
        self.env.render_str(source, ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::model::{ListViewModel, TaskDto};

    fn dto(key: i64, name: &str) -> TaskDto {
        TaskDto {
            key,
            name: name.to_string(),
            description: format!("{name} description"),
            created: "few seconds".to_string(),
            active: false,
        }
    }

    #[test]
    fn list_page_renders_tasks_and_pagination() {
        let templates = Templates::load(None).unwrap();
        let model = ListViewModel::new(vec![dto(1, "first"), dto(2, "second")], 30, 1, 10);
        let html = templates.render_list(&model).unwrap();

        assert!(html.contains("first"));
        assert!(html.contains("/views/tasks/2"));
        assert!(html.contains("page=0"), "prev link missing: {html}");
        assert!(html.contains("page=2"), "next link missing: {html}");
        // No selection — no detail panel.
        assert!(!html.contains("<section class=\"task-detail\">"));
    }

    #[test]
    fn selected_task_panel_embeds_form_html() {
        let templates = Templates::load(None).unwrap();
        let mut model = ListViewModel::new(vec![dto(1, "first")], 1, 0, 10);
        model.task = Some(dto(1, "first"));
        model.task_form = Some("<form id=\"custom\"></form>".to_string());
        let html = templates.render_list(&model).unwrap();

        assert!(html.contains("<section class=\"task-detail\">"));
        // The rendered form is embedded unescaped.
        assert!(html.contains("<form id=\"custom\"></form>"));
    }

    #[test]
    fn override_template_is_loaded_from_disk() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("form.html");
        std::fs::write(&path, "<p>{{ variables|length }} variables</p>").unwrap();

        let templates = Templates::load(Some(&path)).unwrap();
        let ctx = serde_json::json!({ "variables": [1, 2, 3], "form_fields": [] });
        let html = templates.render_default_form(&ctx).unwrap();
        assert_eq!(html, "<p>3 variables</p>");
    }

    #[test]
    fn missing_override_is_a_startup_error() {
        let err = Templates::load(Some(Path::new("/nonexistent/form.html"))).unwrap_err();
        assert!(err.to_string().contains("reading task form template"));
    }

    #[test]
    fn malformed_override_is_a_startup_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("form.html");
        std::fs::write(&path, "{% for x in %}").unwrap();
        assert!(Templates::load(Some(&path)).is_err());
    }
}
