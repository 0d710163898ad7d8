//! UI widgets for the slot editor.

pub mod confirm;
pub mod help;
pub mod settings;
pub mod slot_table;
pub mod status_bar;

pub use confirm::render_confirm;
pub use help::render_help;
pub use settings::render_settings;
pub use slot_table::render_slot_table;
pub use status_bar::{render_compact, render_status_bar};
