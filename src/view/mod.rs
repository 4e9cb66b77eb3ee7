//! Task list view layer: row projections, form rendering, and the compiled
//! template environment.

pub mod form;
pub mod model;
pub mod templates;

pub use model::{FormField, ListViewModel, TaskDto};
pub use templates::Templates;
