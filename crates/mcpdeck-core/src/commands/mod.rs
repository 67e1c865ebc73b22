//! Command implementations shared by every front end.
//!
//! Each command borrows the `AppContext` and a loaded `DefinitionStore`,
//! takes an explicit `Environment` snapshot and an `EnvPrompter`, and returns
//! a report for the caller to print.

pub mod add;
pub mod docs;
pub mod export;
pub mod prepare;
pub mod run;
pub mod setup;

pub use add::{AddCommand, AddOptions, AddReport, MemberAdd};
pub use docs::render_markdown;
pub use export::{export_json, list_json};
pub use prepare::{EnvPrompter, NoPrompt, PreparedServer, prepare_server};
pub use run::{GROUP_LAUNCH_DELAY, MemberRun, RunCommand, RunOptions, RunReport};
pub use setup::{SetupCommand, SetupReport};
