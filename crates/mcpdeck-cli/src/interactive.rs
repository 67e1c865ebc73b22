//! Interactive menu and secret prompts.
//!
//! Uses dialoguer for terminal UI prompts. The menu collects one action at a
//! time; `main` dispatches it through the same code paths as the subcommands.

use std::io::{self, Write};

use anyhow::Result;
use console::style;
use dialoguer::{Input, Password, Select, theme::ColorfulTheme};

use mcpdeck_core::client::ClientTarget;
use mcpdeck_core::commands::EnvPrompter;

/// Asks for missing variables with hidden input.
pub struct DialoguerPrompter {
    enabled: bool,
    theme: ColorfulTheme,
}

impl DialoguerPrompter {
    /// A disabled prompter behaves like `NoPrompt`.
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            theme: ColorfulTheme::default(),
        }
    }
}

impl EnvPrompter for DialoguerPrompter {
    fn ask(&mut self, server: &str, variable: &str) -> Option<String> {
        if !self.enabled {
            return None;
        }
        match Password::with_theme(&self.theme)
            .with_prompt(format!("{server}: value for {variable}"))
            .allow_empty_password(true)
            .interact()
        {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::warn!("Could not read {}: {}", variable, err);
                None
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    List,
    Info,
    Run,
    Add,
    Json,
    Docs,
    Setup,
    Quit,
}

impl MenuAction {
    const ALL: [MenuAction; 8] = [
        MenuAction::List,
        MenuAction::Info,
        MenuAction::Run,
        MenuAction::Add,
        MenuAction::Json,
        MenuAction::Docs,
        MenuAction::Setup,
        MenuAction::Quit,
    ];

    fn label(self) -> &'static str {
        match self {
            MenuAction::List => "List      - show servers and groups",
            MenuAction::Info => "Info      - describe one server or group",
            MenuAction::Run => "Run       - launch a server or group",
            MenuAction::Add => "Add       - write into a client config",
            MenuAction::Json => "JSON      - print a raw definition",
            MenuAction::Docs => "Docs      - Markdown reference",
            MenuAction::Setup => "Setup     - store missing variables",
            MenuAction::Quit => "Quit",
        }
    }

    fn needs_name(self) -> bool {
        matches!(
            self,
            MenuAction::Info
                | MenuAction::Run
                | MenuAction::Add
                | MenuAction::Json
                | MenuAction::Setup
        )
    }
}

/// Pre-filled values that skip prompts.
#[derive(Debug, Clone, Default)]
pub struct PrefilledChoice {
    pub action: Option<MenuAction>,
    pub name: Option<String>,
    pub target: Option<ClientTarget>,
}

#[derive(Debug, Clone)]
pub struct MenuChoice {
    pub action: MenuAction,
    pub name: Option<String>,
    pub target: Option<ClientTarget>,
}

/// One pass through the menu.
pub struct InteractiveFlow<W: Write = io::Stdout> {
    /// Server names followed by group names
    names: Vec<String>,
    prefilled: PrefilledChoice,
    writer: W,
    theme: ColorfulTheme,
}

impl InteractiveFlow<io::Stdout> {
    pub fn new(names: Vec<String>, prefilled: PrefilledChoice) -> Self {
        Self {
            names,
            prefilled,
            writer: io::stdout(),
            theme: ColorfulTheme::default(),
        }
    }
}

impl<W: Write> InteractiveFlow<W> {
    /// Create a flow with a custom writer (for testing).
    #[cfg(test)]
    pub fn with_writer(names: Vec<String>, prefilled: PrefilledChoice, writer: W) -> Self {
        Self {
            names,
            prefilled,
            writer,
            theme: ColorfulTheme::default(),
        }
    }

    pub fn collect(&mut self) -> Result<MenuChoice> {
        self.print_header()?;

        let action = self.prompt_action()?;
        let name = if action.needs_name() {
            Some(self.prompt_name()?)
        } else {
            None
        };
        let target = if action == MenuAction::Add {
            Some(self.prompt_target()?)
        } else {
            None
        };

        if let Some(name) = &name {
            writeln!(self.writer, "  {} {}", style("Selected:").dim(), style(name).green())?;
        }
        if let Some(target) = &target {
            writeln!(self.writer, "  {} {}", style("Target:").dim(), style(target).green())?;
        }

        Ok(MenuChoice {
            action,
            name,
            target,
        })
    }

    fn print_header(&mut self) -> Result<()> {
        writeln!(self.writer)?;
        writeln!(self.writer, "{}", style("  mcpdeck").bold().cyan())?;
        writeln!(self.writer)?;
        Ok(())
    }

    fn prompt_action(&self) -> Result<MenuAction> {
        if let Some(action) = self.prefilled.action {
            return Ok(action);
        }

        let labels: Vec<_> = MenuAction::ALL.iter().map(|a| a.label()).collect();
        let selection = Select::with_theme(&self.theme)
            .with_prompt("What do you want to do?")
            .items(&labels)
            .default(0)
            .interact()?;

        Ok(MenuAction::ALL[selection])
    }

    fn prompt_name(&self) -> Result<String> {
        if let Some(name) = &self.prefilled.name {
            return Ok(name.clone());
        }
        if self.names.is_empty() {
            anyhow::bail!("No servers or groups are defined");
        }

        let selection = Select::with_theme(&self.theme)
            .with_prompt("Server or group")
            .items(&self.names)
            .default(0)
            .interact()?;

        Ok(self.names[selection].clone())
    }

    fn prompt_target(&self) -> Result<ClientTarget> {
        if let Some(target) = &self.prefilled.target {
            return Ok(target.clone());
        }

        let options = vec![
            "claude   - Claude Code",
            "cursor   - Cursor",
            "vscode   - VS Code (project)",
            "file     - Any .json path",
        ];
        let selection = Select::with_theme(&self.theme)
            .with_prompt("Add to")
            .items(&options)
            .default(0)
            .interact()?;

        let keyword = match selection {
            0 => "claude".to_string(),
            1 => "cursor".to_string(),
            2 => "vscode".to_string(),
            _ => Input::<String>::with_theme(&self.theme)
                .with_prompt("Path to .json file")
                .interact_text()?,
        };

        Ok(ClientTarget::parse(&keyword)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names() -> Vec<String> {
        vec!["github".to_string(), "fs".to_string(), "dev".to_string()]
    }

    #[test]
    fn test_prefilled_skips_prompts() {
        let prefilled = PrefilledChoice {
            action: Some(MenuAction::Add),
            name: Some("github".to_string()),
            target: Some(ClientTarget::Cursor),
        };

        let mut output = Vec::new();
        let mut flow = InteractiveFlow::with_writer(names(), prefilled, &mut output);
        let choice = flow.collect().unwrap();

        assert_eq!(choice.action, MenuAction::Add);
        assert_eq!(choice.name.as_deref(), Some("github"));
        assert_eq!(choice.target, Some(ClientTarget::Cursor));

        let output_str = String::from_utf8(output).unwrap();
        assert!(output_str.contains("mcpdeck"));
        assert!(output_str.contains("github"));
        assert!(output_str.contains("cursor"));
    }

    #[test]
    fn test_actions_without_name_skip_name_prompt() {
        for action in [MenuAction::List, MenuAction::Docs, MenuAction::Quit] {
            let prefilled = PrefilledChoice {
                action: Some(action),
                ..Default::default()
            };
            let mut output = Vec::new();
            let mut flow = InteractiveFlow::with_writer(Vec::new(), prefilled, &mut output);
            let choice = flow.collect().unwrap();

            assert_eq!(choice.action, action);
            assert!(choice.name.is_none());
            assert!(choice.target.is_none());
        }
    }

    #[test]
    fn test_target_only_for_add() {
        let prefilled = PrefilledChoice {
            action: Some(MenuAction::Run),
            name: Some("fs".to_string()),
            target: None,
        };
        let mut output = Vec::new();
        let mut flow = InteractiveFlow::with_writer(names(), prefilled, &mut output);
        let choice = flow.collect().unwrap();

        assert_eq!(choice.name.as_deref(), Some("fs"));
        assert!(choice.target.is_none());
    }

    #[test]
    fn test_disabled_prompter_never_answers() {
        let mut prompter = DialoguerPrompter::new(false);
        assert_eq!(prompter.ask("github", "GITHUB_TOKEN"), None);
    }

    #[test]
    fn test_every_action_has_a_label() {
        for action in MenuAction::ALL {
            assert!(!action.label().is_empty());
        }
        assert!(!MenuAction::Quit.needs_name());
        assert!(MenuAction::Setup.needs_name());
    }
}
