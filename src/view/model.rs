use crate::storage::TaskRow;
use serde::{Deserialize, Serialize};

/// Page-ready projection of a task row. Built fresh per request.
#[derive(Debug, Clone, Serialize)]
pub struct TaskDto {
    pub key: i64,
    pub name: String,
    pub description: String,
    /// Coarsened relative age, e.g. "2 days" or "few seconds".
    pub created: String,
    /// Whether this is the task selected in the current render.
    pub active: bool,
}

impl TaskDto {
    pub fn from_row(row: &TaskRow, now_ms: i64) -> Self {
        Self {
            key: row.key,
            name: row.name.clone(),
            description: row.description.clone(),
            created: relative_age(row.timestamp, now_ms),
            active: false,
        }
    }
}

/// Bucket an age into the coarsest non-zero unit.
pub fn relative_age(timestamp_ms: i64, now_ms: i64) -> String {
    let elapsed_secs = (now_ms - timestamp_ms).max(0) / 1000;
    let days = elapsed_secs / 86_400;
    let hours = elapsed_secs / 3_600;
    let minutes = elapsed_secs / 60;

    if days > 0 {
        format!("{days} days")
    } else if hours > 0 {
        format!("{hours} hours")
    } else if minutes > 0 {
        format!("{minutes} minutes")
    } else {
        "few seconds".to_string()
    }
}

// ─── Form fields ──────────────────────────────────────────────────────────────

/// One input descriptor of a task's default-rendered form, parsed from the
/// stored `form_fields` JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormField {
    pub name: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(rename = "type")]
    pub field_type: String,
}

impl FormField {
    /// Remap the declared type to an HTML input type and default the label
    /// to the field name.
    pub fn into_input(mut self) -> Self {
        self.field_type = html_input_type(&self.field_type).to_string();
        if self.label.is_none() {
            self.label = Some(self.name.clone());
        }
        self
    }
}

/// HTML input type for a declared field type. Unknown types render as text.
pub fn html_input_type(declared: &str) -> &'static str {
    match declared {
        "string" => "text",
        "number" => "number",
        "boolean" => "checkbox",
        _ => "text",
    }
}

// ─── List view model ──────────────────────────────────────────────────────────

/// Everything the task-list-view template needs for one render.
#[derive(Debug, Serialize)]
pub struct ListViewModel {
    pub tasks: Vec<TaskDto>,
    pub count: u64,
    pub current_page: i64,
    /// 1-based page number for display.
    pub page: i64,
    pub prev_page: Option<i64>,
    pub next_page: Option<i64>,
    /// Projection of the selected task, when one is selected and exists.
    pub task: Option<TaskDto>,
    /// Rendered form HTML of the selected task.
    pub task_form: Option<String>,
}

impl ListViewModel {
    pub fn new(tasks: Vec<TaskDto>, count: u64, current_page: i64, size: i64) -> Self {
        let prev_page = (current_page > 0).then(|| current_page - 1);
        let next_page = (count as i64 > (current_page + 1) * size).then(|| current_page + 1);
        Self {
            tasks,
            count,
            current_page,
            page: current_page + 1,
            prev_page,
            next_page,
            task: None,
            task_form: None,
        }
    }
}
