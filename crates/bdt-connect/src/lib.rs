//! Connection lifecycle tracking, pipeline statistics and outreach email
//! generation.

pub mod lifecycle;
pub mod outreach;
pub mod stats;

pub use lifecycle::{
    add_note, append_note, append_note_text, filter_by_status, initiate, next_actions,
    parse_notes, schedule_follow_up, transition, update_status, NoteEntry,
};
pub use outreach::{RenderedEmail, TemplateError, TemplateName};
pub use stats::{companies_by_sector, connection_statistics, ConnectionStats};

pub const CRATE_NAME: &str = "bdt-connect";
