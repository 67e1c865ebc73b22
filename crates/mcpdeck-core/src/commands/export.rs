//! JSON views of the store for `json` and `list --json`.

use serde_json::{Map, Value, json};

use crate::config::{DefinitionStore, ServerDefinition, Target};
use crate::error::{DeckError, MergeError};

/// Raw definition of a server, or an array of member definitions for a group.
///
/// Group members carry their `name`; undefined members are skipped with a warning.
pub fn export_json(store: &DefinitionStore, name: &str) -> Result<Value, DeckError> {
    match store.lookup(name)? {
        Target::Server(server) => Ok(definition_value(server)?),
        Target::Group(group) => {
            let mut items = Vec::with_capacity(group.members.len());
            for member in &group.members {
                let Some(server) = store.server(member) else {
                    tracing::warn!("Group '{}': member '{}' is not defined", group.name, member);
                    continue;
                };
                let mut value = definition_value(server)?;
                if let Value::Object(map) = &mut value {
                    map.insert("name".to_string(), Value::String(server.name.clone()));
                }
                items.push(value);
            }
            Ok(Value::Array(items))
        }
    }
}

/// `{"servers": [{name, description}], "groups": {name: [members]}}`
pub fn list_json(store: &DefinitionStore) -> Value {
    let servers: Vec<Value> = store
        .servers()
        .map(|server| {
            json!({
                "name": server.name,
                "description": server.description,
            })
        })
        .collect();
    let groups: Map<String, Value> = store
        .groups()
        .map(|group| (group.name.clone(), json!(group.members)))
        .collect();
    json!({ "servers": servers, "groups": groups })
}

fn definition_value(server: &ServerDefinition) -> Result<Value, DeckError> {
    serde_json::to_value(server).map_err(|e| DeckError::Merge(MergeError::Serialize(e)))
}
