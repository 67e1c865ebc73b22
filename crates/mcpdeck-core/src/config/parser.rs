//! Definition file parsing with helpful error messages
//!
//! Definitions and groups may be written as JSON, YAML or TOML; the format is
//! picked from the file extension.

use std::path::Path;

use serde::de::DeserializeOwned;

use crate::error::DeckError;

/// Structured-text format of a definitions or groups file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefinitionFormat {
    Json,
    Yaml,
    Toml,
}

impl DefinitionFormat {
    /// Pick a format by extension; anything unrecognized is read as JSON.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .as_deref()
        {
            Some("yaml") | Some("yml") => DefinitionFormat::Yaml,
            Some("toml") => DefinitionFormat::Toml,
            _ => DefinitionFormat::Json,
        }
    }
}

/// Read and parse a definitions-style file.
pub fn parse_file<T: DeserializeOwned + Default>(path: &Path) -> Result<T, DeckError> {
    let content = std::fs::read_to_string(path).map_err(|e| DeckError::io(path, e))?;
    parse_str(&content, DefinitionFormat::from_path(path)).map_err(|message| DeckError::Parse {
        path: path.to_path_buf(),
        message,
    })
}

/// Parse file content in the given format. Blank content yields `T::default()`.
pub fn parse_str<T: DeserializeOwned + Default>(
    content: &str,
    format: DefinitionFormat,
) -> Result<T, String> {
    if content.trim().is_empty() {
        return Ok(T::default());
    }

    match format {
        DefinitionFormat::Json => {
            serde_json::from_str(content).map_err(|e| format_json_error(e, content))
        }
        DefinitionFormat::Yaml => {
            serde_yaml::from_str(content).map_err(|e| format_yaml_error(e, content))
        }
        DefinitionFormat::Toml => toml::from_str(content).map_err(|e| format_toml_error(e, content)),
    }
}

fn format_json_error(error: serde_json::Error, content: &str) -> String {
    with_line_context(error.line(), content, &error.to_string())
}

fn format_yaml_error(error: serde_yaml::Error, content: &str) -> String {
    match error.location() {
        Some(location) => with_line_context(location.line(), content, &error.to_string()),
        None => error.to_string(),
    }
}

fn format_toml_error(error: toml::de::Error, content: &str) -> String {
    let message = error.message().to_string();
    match error.span() {
        Some(span) => {
            let line = content[..span.start.min(content.len())].lines().count().max(1);
            with_line_context(line, content, &message)
        }
        None => message,
    }
}

fn with_line_context(line_num: usize, content: &str, message: &str) -> String {
    if line_num == 0 {
        return message.to_string();
    }
    format!(
        "error at line {}:\n{}\n\n{}",
        line_num,
        get_line_context(content, line_num),
        message
    )
}

/// Get context lines around an error
fn get_line_context(content: &str, line_num: usize) -> String {
    let lines: Vec<&str> = content.lines().collect();
    let start = line_num.saturating_sub(2).min(lines.len());
    let end = (line_num + 1).min(lines.len());

    lines[start..end]
        .iter()
        .enumerate()
        .map(|(i, line)| {
            let num = start + i + 1;
            let marker = if num == line_num { ">>>" } else { "   " };
            format!("{} {:4} | {}", marker, num, line)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{DefinitionsFile, GroupsFile};
    use std::path::PathBuf;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(
            DefinitionFormat::from_path(&PathBuf::from("servers.yaml")),
            DefinitionFormat::Yaml
        );
        assert_eq!(
            DefinitionFormat::from_path(&PathBuf::from("servers.YML")),
            DefinitionFormat::Yaml
        );
        assert_eq!(
            DefinitionFormat::from_path(&PathBuf::from("servers.toml")),
            DefinitionFormat::Toml
        );
        assert_eq!(
            DefinitionFormat::from_path(&PathBuf::from("servers")),
            DefinitionFormat::Json
        );
    }

    #[test]
    fn test_parse_json_definitions() {
        let defs: DefinitionsFile = parse_str(
            r#"{"foo": {"command": "echo", "args": ["hi"], "env": {}, "required_env": []}}"#,
            DefinitionFormat::Json,
        )
        .unwrap();
        assert_eq!(defs["foo"].command, "echo");
        assert_eq!(defs["foo"].args, vec!["hi".to_string()]);
    }

    #[test]
    fn test_parse_yaml_definitions() {
        let yaml = r#"
github:
  command: npx
  args: ["-y", "server-github"]
  env:
    GITHUB_TOKEN: "${GITHUB_TOKEN}"
  required_env: [GITHUB_TOKEN]
  description: GitHub access
"#;
        let defs: DefinitionsFile = parse_str(yaml, DefinitionFormat::Yaml).unwrap();
        let github = &defs["github"];
        assert_eq!(github.command, "npx");
        assert_eq!(github.env["GITHUB_TOKEN"], "${GITHUB_TOKEN}");
        assert_eq!(github.description.as_deref(), Some("GitHub access"));
    }

    #[test]
    fn test_parse_toml_groups() {
        let toml = r#"
dev = ["github", "filesystem"]
empty = []
"#;
        let groups: GroupsFile = parse_str(toml, DefinitionFormat::Toml).unwrap();
        assert_eq!(groups["dev"], vec!["github", "filesystem"]);
        assert!(groups["empty"].is_empty());
    }

    #[test]
    fn test_blank_content_is_empty() {
        let defs: DefinitionsFile = parse_str("  \n", DefinitionFormat::Json).unwrap();
        assert!(defs.is_empty());
    }

    #[test]
    fn test_json_error_has_line_context() {
        let content = "{\n  \"foo\": {\n    \"command\": \n}\n";
        let err = parse_str::<DefinitionsFile>(content, DefinitionFormat::Json).unwrap_err();
        assert!(err.contains("error at line"));
        assert!(err.contains(">>>"));
    }
}
