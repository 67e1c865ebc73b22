//! `docs`: a Markdown reference of every definition and group.

use std::fmt::Write;

use crate::config::{DefinitionStore, GroupDefinition, ServerDefinition};
use crate::runtime::format_command_line;

pub fn render_markdown(store: &DefinitionStore) -> String {
    let mut out = String::new();
    out.push_str("# MCP servers\n");

    let mut any = false;
    for server in store.servers() {
        any = true;
        render_server(&mut out, server);
    }
    if !any {
        out.push_str("\n_No servers defined._\n");
    }

    let groups: Vec<&GroupDefinition> = store.groups().collect();
    if !groups.is_empty() {
        out.push_str("\n# Groups\n");
        for group in groups {
            render_group(&mut out, store, group);
        }
    }

    out
}

fn render_server(out: &mut String, server: &ServerDefinition) {
    let _ = writeln!(out, "\n## {}\n", server.name);
    if let Some(description) = &server.description {
        let _ = writeln!(out, "{}\n", description.trim());
    }
    let _ = writeln!(
        out,
        "```sh\n{}\n```",
        format_command_line(&server.command, &server.args)
    );

    if !server.env.is_empty() {
        out.push_str("\n| Variable | Value | Required |\n|---|---|---|\n");
        for (key, template) in &server.env {
            let required = if server.required_env.contains(key) {
                "yes"
            } else {
                ""
            };
            let _ = writeln!(
                out,
                "| `{}` | `{}` | {} |",
                key,
                template.replace('|', "\\|"),
                required
            );
        }
    }

    let orphans = server.required_without_template();
    if !orphans.is_empty() {
        let _ = writeln!(
            out,
            "\nAlso requires: {}",
            orphans
                .iter()
                .map(|name| format!("`{name}`"))
                .collect::<Vec<_>>()
                .join(", ")
        );
    }
}

fn render_group(out: &mut String, store: &DefinitionStore, group: &GroupDefinition) {
    let _ = writeln!(out, "\n## {}\n", group.name);
    if group.members.is_empty() {
        out.push_str("_Empty group._\n");
        return;
    }
    for member in &group.members {
        match store.server(member) {
            Some(_) => {
                let _ = writeln!(out, "- [{member}](#{})", anchor(member));
            }
            None => {
                let _ = writeln!(out, "- {member} (not defined)");
            }
        }
    }
}

/// GitHub-style heading anchor.
fn anchor(heading: &str) -> String {
    heading
        .to_lowercase()
        .chars()
        .filter_map(|c| match c {
            ' ' => Some('-'),
            c if c.is_alphanumeric() || c == '-' || c == '_' => Some(c),
            _ => None,
        })
        .collect()
}
