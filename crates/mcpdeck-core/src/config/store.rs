//! Definition store: servers and groups loaded once, looked up by name.

use std::collections::BTreeMap;
use std::path::Path;

use crate::error::DeckError;

use super::parser;
use super::schema::{DefinitionsFile, GroupDefinition, GroupsFile, ServerDefinition};

/// A name resolved against the store.
#[derive(Debug, Clone, Copy)]
pub enum Target<'a> {
    Server(&'a ServerDefinition),
    Group(&'a GroupDefinition),
}

impl<'a> Target<'a> {
    pub fn name(&self) -> &'a str {
        match self {
            Target::Server(server) => &server.name,
            Target::Group(group) => &group.name,
        }
    }
}

/// Read-only view of the definitions and groups files.
#[derive(Debug, Clone, Default)]
pub struct DefinitionStore {
    servers: BTreeMap<String, ServerDefinition>,
    groups: BTreeMap<String, GroupDefinition>,
}

impl DefinitionStore {
    /// Load definitions (required) and groups (optional: a missing file means no groups).
    pub fn load(servers_path: &Path, groups_path: Option<&Path>) -> Result<Self, DeckError> {
        if !servers_path.exists() {
            return Err(DeckError::io(
                servers_path,
                std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "definitions file does not exist",
                ),
            ));
        }
        let servers: DefinitionsFile = parser::parse_file(servers_path)?;

        let groups: GroupsFile = match groups_path {
            Some(path) if path.exists() => parser::parse_file(path)?,
            _ => GroupsFile::new(),
        };

        let store = Self::from_parts(servers, groups);
        for warning in store.lint() {
            tracing::warn!("{}", warning);
        }
        tracing::debug!(
            servers = store.servers.len(),
            groups = store.groups.len(),
            "Loaded definitions from {}",
            servers_path.display()
        );
        Ok(store)
    }

    /// Build a store from already-parsed maps; names are taken from the keys.
    pub fn from_parts(servers: DefinitionsFile, groups: GroupsFile) -> Self {
        let servers = servers
            .into_iter()
            .map(|(name, mut def)| {
                def.name = name.clone();
                (name, def)
            })
            .collect();
        let groups = groups
            .into_iter()
            .map(|(name, members)| {
                (
                    name.clone(),
                    GroupDefinition {
                        name,
                        members,
                    },
                )
            })
            .collect();
        Self { servers, groups }
    }

    pub fn servers(&self) -> impl Iterator<Item = &ServerDefinition> {
        self.servers.values()
    }

    pub fn groups(&self) -> impl Iterator<Item = &GroupDefinition> {
        self.groups.values()
    }

    pub fn server(&self, name: &str) -> Option<&ServerDefinition> {
        self.servers.get(name)
    }

    pub fn group(&self, name: &str) -> Option<&GroupDefinition> {
        self.groups.get(name)
    }

    /// Resolve a name to a server or group. Servers shadow groups of the same name.
    pub fn lookup(&self, name: &str) -> Result<Target<'_>, DeckError> {
        if let Some(server) = self.servers.get(name) {
            return Ok(Target::Server(server));
        }
        if let Some(group) = self.groups.get(name) {
            return Ok(Target::Group(group));
        }
        Err(DeckError::NotFound {
            name: name.to_string(),
        })
    }

    /// Look up a server and check that it is usable.
    pub fn validated_server(&self, name: &str) -> Result<&ServerDefinition, DeckError> {
        let server = self.servers.get(name).ok_or_else(|| DeckError::NotFound {
            name: name.to_string(),
        })?;
        server
            .validate()
            .map_err(|message| DeckError::Validation {
                name: name.to_string(),
                message,
            })?;
        Ok(server)
    }

    /// Names a target expands to: itself for a server, its members for a group.
    pub fn expand<'a>(&self, target: Target<'a>) -> Vec<&'a str> {
        match target {
            Target::Server(server) => vec![server.name.as_str()],
            Target::Group(group) => group.members.iter().map(String::as_str).collect(),
        }
    }

    /// Non-fatal consistency findings.
    pub fn lint(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        for server in self.servers.values() {
            if let Err(message) = server.validate() {
                warnings.push(format!("Server '{}': {}", server.name, message));
            }
            for name in server.required_without_template() {
                warnings.push(format!(
                    "Server '{}': required variable '{}' has no entry in env",
                    server.name, name
                ));
            }
        }

        for group in self.groups.values() {
            if self.servers.contains_key(&group.name) {
                warnings.push(format!(
                    "Group '{}' is shadowed by a server with the same name",
                    group.name
                ));
            }
            for member in &group.members {
                if !self.servers.contains_key(member) {
                    warnings.push(format!(
                        "Group '{}': member '{}' is not defined",
                        group.name, member
                    ));
                }
            }
        }

        warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DefinitionStore {
        let mut servers = DefinitionsFile::new();
        servers.insert("echo".to_string(), ServerDefinition::new("", "echo"));
        servers.insert(
            "broken".to_string(),
            ServerDefinition::default().with_required("TOKEN"),
        );
        let mut groups = GroupsFile::new();
        groups.insert(
            "dev".to_string(),
            vec!["echo".to_string(), "ghost".to_string()],
        );
        DefinitionStore::from_parts(servers, groups)
    }

    #[test]
    fn names_come_from_keys() {
        let store = sample();
        assert_eq!(store.server("echo").unwrap().name, "echo");
        assert_eq!(store.group("dev").unwrap().name, "dev");
    }

    #[test]
    fn lookup_distinguishes_servers_and_groups() {
        let store = sample();
        assert!(matches!(store.lookup("echo"), Ok(Target::Server(_))));
        assert!(matches!(store.lookup("dev"), Ok(Target::Group(_))));
        assert!(matches!(
            store.lookup("missing"),
            Err(DeckError::NotFound { .. })
        ));
    }

    #[test]
    fn validated_server_rejects_missing_command() {
        let store = sample();
        assert!(matches!(
            store.validated_server("broken"),
            Err(DeckError::Validation { .. })
        ));
        assert!(store.validated_server("echo").is_ok());
    }

    #[test]
    fn expand_group_keeps_member_order() {
        let store = sample();
        let target = store.lookup("dev").unwrap();
        assert_eq!(store.expand(target), vec!["echo", "ghost"]);
    }

    #[test]
    fn lint_reports_all_findings() {
        let warnings = sample().lint();
        assert!(warnings.iter().any(|w| w.contains("missing 'command'")));
        assert!(warnings.iter().any(|w| w.contains("'TOKEN' has no entry")));
        assert!(warnings.iter().any(|w| w.contains("member 'ghost'")));
    }
}
