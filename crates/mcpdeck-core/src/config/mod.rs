//! Configuration input and output
//!
//! - Definitions and groups: read-only input (`servers.*`, `groups.*`)
//! - Secrets: local `KEY=value` file of previously entered values
//! - Managed JSON: third-party client files that servers are merged into

pub mod managed_json;
pub mod parser;
pub mod paths;
pub mod schema;
pub mod secrets;
pub mod store;

pub use managed_json::{MergeReport, Recovery, merge_server_entry};
pub use parser::{DefinitionFormat, parse_file, parse_str};
pub use schema::{DefinitionsFile, GroupDefinition, GroupsFile, ServerDefinition};
pub use secrets::SecretsStore;
pub use store::{DefinitionStore, Target};
