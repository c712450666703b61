//! Entity structs for all Crew domain objects.
//!
//! Each entity maps to a table in the libSQL database. All structs derive
//! `Serialize`, `Deserialize`, and `JsonSchema` so the HTTP layer can return
//! them as-is and tests can validate them against their schema.

mod comment;
mod project;
mod task;
mod user;

pub use comment::Comment;
pub use project::Project;
pub use task::Task;
pub use user::User;
