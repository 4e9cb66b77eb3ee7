use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::error;

use super::model::FormField;
use super::templates::Templates;
use crate::storage::TaskRow;

/// Fixed text shown in the form slot when rendering fails for any reason.
pub const RENDER_FAILURE_MESSAGE: &str = "⚠ Failure while rendering task form.";

#[derive(Debug, Error)]
pub enum FormRenderError {
    #[error("malformed task payload: {0}")]
    Payload(#[source] serde_json::Error),
    #[error("malformed form field schema: {0}")]
    FieldSchema(#[source] serde_json::Error),
    #[error("template rendering failed: {0}")]
    Template(#[from] minijinja::Error),
}

/// One payload variable as shown by the default form.
#[derive(Debug, Serialize)]
struct VariableEntry {
    name: String,
    value: String,
}

#[derive(Debug, Serialize)]
struct DefaultFormContext {
    variables: Vec<VariableEntry>,
    form_fields: Vec<FormField>,
}

/// Render a task's form to HTML.
///
/// Tasks carrying a custom form template get their payload variables
/// flattened directly into the template namespace. Tasks without one get the
/// default form: the payload as a `variables` list plus, when a field schema
/// is stored, `form_fields` with HTML input types.
///
/// A failure anywhere (payload JSON, field schema, template) is logged and
/// replaced with [`RENDER_FAILURE_MESSAGE`] — the caller always gets HTML.
pub fn render_task_form(templates: &Templates, task: &TaskRow) -> String {
    match try_render(templates, task) {
        Ok(html) => html,
        Err(err) => {
            error!(key = task.key, err = %err, "task form rendering failed");
            RENDER_FAILURE_MESSAGE.to_string()
        }
    }
}

fn try_render(templates: &Templates, task: &TaskRow) -> Result<String, FormRenderError> {
    let payload: serde_json::Map<String, Value> =
        serde_json::from_str(&task.payload).map_err(FormRenderError::Payload)?;

    if let Some(source) = task.task_form.as_deref() {
        // Custom form: variables addressable directly by name.
        return Ok(templates.render_custom(source, &payload)?);
    }

    let variables = payload
        .iter()
        .map(|(name, value)| VariableEntry {
            name: name.clone(),
            value: display_value(value),
        })
        .collect();

    let form_fields = match task.form_fields.as_deref() {
        Some(raw) => serde_json::from_str::<Vec<FormField>>(raw)
            .map_err(FormRenderError::FieldSchema)?
            .into_iter()
            .map(FormField::into_input)
            .collect(),
        None => Vec::new(),
    };

    let ctx = DefaultFormContext {
        variables,
        form_fields,
    };
    Ok(templates.render_default_form(&ctx)?)
}

/// Strings render bare; everything else renders as its JSON representation.
fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(payload: &str, task_form: Option<&str>, form_fields: Option<&str>) -> TaskRow {
        TaskRow {
            key: 1,
            payload: payload.to_string(),
            timestamp: 0,
            name: "pay invoice".to_string(),
            description: String::new(),
            task_form: task_form.map(str::to_string),
            form_fields: form_fields.map(str::to_string),
        }
    }

    fn templates() -> Templates {
        Templates::load(None).unwrap()
    }

    #[test]
    fn default_form_lists_every_variable() {
        let html = render_task_form(
            &templates(),
            &task(r#"{"orderId":"A-17","amount":249.5}"#, None, None),
        );
        assert!(html.contains("orderId"));
        assert!(html.contains("A-17"));
        assert!(html.contains("amount"));
        assert!(html.contains("249.5"));
        assert!(html.contains("<li>"));
    }

    #[test]
    fn default_form_maps_field_types() {
        let fields = r#"[
            {"name":"approver","type":"string"},
            {"name":"amount","type":"number"},
            {"name":"urgent","type":"boolean"},
            {"name":"due","type":"date"}
        ]"#;
        let html = render_task_form(&templates(), &task("{}", None, Some(fields)));
        assert!(html.contains(r#"type="text" id="approver""#));
        assert!(html.contains(r#"type="number" id="amount""#));
        assert!(html.contains(r#"type="checkbox" id="urgent""#));
        assert!(html.contains(r#"type="text" id="due""#));
    }

    #[test]
    fn custom_form_flattens_payload_variables() {
        let html = render_task_form(
            &templates(),
            &task(
                r#"{"customer":"ACME","total":12}"#,
                Some("<p>{{ customer }} owes {{ total }}</p>"),
                None,
            ),
        );
        assert_eq!(html, "<p>ACME owes 12</p>");
    }

    #[test]
    fn malformed_payload_renders_warning() {
        let html = render_task_form(&templates(), &task("{not json", None, None));
        assert_eq!(html, RENDER_FAILURE_MESSAGE);
    }

    #[test]
    fn non_object_payload_renders_warning() {
        let html = render_task_form(&templates(), &task("[1,2,3]", None, None));
        assert_eq!(html, RENDER_FAILURE_MESSAGE);
    }

    #[test]
    fn malformed_field_schema_renders_warning() {
        let html = render_task_form(&templates(), &task("{}", None, Some("{broken")));
        assert_eq!(html, RENDER_FAILURE_MESSAGE);
    }

    #[test]
    fn malformed_custom_template_renders_warning() {
        let html = render_task_form(
            &templates(),
            &task("{}", Some("{% for x in %}"), None),
        );
        assert_eq!(html, RENDER_FAILURE_MESSAGE);
    }
}
