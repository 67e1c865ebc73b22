//! mcpdeck - run MCP servers and add them to client configs
//!
//! Usage:
//!   mcpdeck list                  # Show servers and groups
//!   mcpdeck run github            # Resolve env and launch
//!   mcpdeck add github claude     # Merge into ~/.claude.json
//!   mcpdeck interactive           # Menu over everything above

mod interactive;

use std::fmt::Write as _;
use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mcpdeck_core::client::ClientTarget;
use mcpdeck_core::commands::{
    AddCommand, AddOptions, AddReport, RunCommand, RunOptions, RunReport, SetupCommand,
    SetupReport, export_json, list_json, render_markdown,
};
use mcpdeck_core::config::{DefinitionStore, Recovery, Target};
use mcpdeck_core::context::AppContext;
use mcpdeck_core::env::Environment;
use mcpdeck_core::runtime::{LaunchOutcome, format_command_line};
use mcpdeck_core::types::TargetScope;

use crate::interactive::{DialoguerPrompter, InteractiveFlow, MenuAction, PrefilledChoice};

#[derive(Parser, Debug)]
#[command(name = "mcpdeck")]
#[command(about = "Run MCP servers and add them to client configs", long_about = None)]
#[command(arg_required_else_help = true)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug)]
struct GlobalArgs {
    /// Server definitions file (JSON, YAML or TOML)
    #[arg(long, global = true, env = "MCPDECK_SERVERS", value_name = "PATH")]
    servers: Option<PathBuf>,

    /// Groups file (JSON, YAML or TOML)
    #[arg(long, global = true, env = "MCPDECK_GROUPS", value_name = "PATH")]
    groups: Option<PathBuf>,

    /// Secrets file with saved KEY=value lines
    #[arg(long, global = true, env = "MCPDECK_SECRETS", value_name = "PATH")]
    secrets: Option<PathBuf>,

    /// Never prompt for missing variables
    #[arg(long, global = true)]
    no_input: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List servers and groups
    #[command(alias = "ls")]
    List {
        /// Print names and groups as JSON
        #[arg(long)]
        json: bool,
    },

    /// Resolve a server (or every member of a group) and launch it
    Run {
        /// Server or group name
        name: String,

        /// Detach and write output to a log file
        #[arg(long, visible_alias = "bg")]
        background: bool,
    },

    /// Describe a server or group
    Info {
        /// Server or group name
        name: String,

        /// Include env templates and required variables
        #[arg(short, long)]
        verbose: bool,
    },

    /// Print the raw definition as JSON
    Json {
        /// Server or group name
        name: String,
    },

    /// Add a server (or every member of a group) to a client config
    Add(AddArgs),

    /// Print a Markdown reference of all definitions
    Docs,

    /// Ask for missing variables and save them to the secrets file
    Setup {
        /// Server or group name
        name: String,
    },

    /// Menu-driven mode
    #[command(alias = "i")]
    Interactive,
}

#[derive(Args, Debug)]
struct AddArgs {
    /// Server or group name
    name: String,

    /// claude, cursor, vscode, or a path ending in .json
    target: String,

    /// Write to the project config
    #[arg(long, conflicts_with = "user")]
    project: bool,

    /// Write to the user config
    #[arg(long)]
    user: bool,

    /// Replace the target file instead of merging into it
    #[arg(long)]
    overwrite: bool,
}

impl AddArgs {
    fn scope(&self) -> Option<TargetScope> {
        if self.project {
            Some(TargetScope::Project)
        } else if self.user {
            Some(TargetScope::User)
        } else {
            None
        }
    }
}

fn main() -> Result<()> {
    // Logs go to stderr so `json` and `docs` output stays clean
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mcpdeck=info,mcpdeck_core=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let code = run_cli(&cli.global, cli.command)?;
    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}

/// Shared state for one invocation.
struct Session {
    ctx: AppContext,
    store: DefinitionStore,
    environment: Environment,
    prompter: DialoguerPrompter,
}

impl Session {
    fn open(global: &GlobalArgs) -> Result<Self> {
        let ctx = AppContext::with_defaults()?
            .with_servers_path(global.servers.clone())
            .with_groups_path(global.groups.clone())
            .with_secrets_path(global.secrets.clone());
        let store = ctx
            .load_store()
            .with_context(|| format!("Failed to load {}", ctx.servers_path().display()))?;
        let environment = ctx.environment()?;
        let interactive = !global.no_input && std::io::stdin().is_terminal();

        Ok(Self {
            ctx,
            store,
            environment,
            prompter: DialoguerPrompter::new(interactive),
        })
    }
}

fn run_cli(global: &GlobalArgs, command: Commands) -> Result<i32> {
    let mut session = Session::open(global)?;

    match command {
        Commands::List { json } => run_list(&session, json),
        Commands::Run { name, background } => run_run(&mut session, &name, background),
        Commands::Info { name, verbose } => run_info(&session, &name, verbose),
        Commands::Json { name } => run_json(&session, &name),
        Commands::Add(args) => {
            let target = ClientTarget::parse(&args.target)?;
            run_add(&mut session, &args.name, target, args.scope(), args.overwrite)
        }
        Commands::Docs => {
            print!("{}", render_markdown(&session.store));
            Ok(0)
        }
        Commands::Setup { name } => run_setup(&mut session, &name),
        Commands::Interactive => {
            if global.no_input {
                anyhow::bail!("interactive mode cannot be used with --no-input");
            }
            run_interactive(&mut session)
        }
    }
}

fn run_list(session: &Session, json: bool) -> Result<i32> {
    let store = &session.store;
    if json {
        println!("{}", serde_json::to_string_pretty(&list_json(store))?);
    } else {
        print!("{}", list_text(store));
    }
    Ok(0)
}

/// Plain listing. Lint warnings are not repeated here; loading already logged them.
fn list_text(store: &DefinitionStore) -> String {
    let mut out = String::from("Servers:\n");
    let mut any = false;
    for server in store.servers() {
        any = true;
        let description = server.description.as_deref().unwrap_or("");
        let _ = writeln!(out, "  {:<20} {}", server.name, description);
    }
    if !any {
        out.push_str("  (none)\n");
    }

    let groups: Vec<_> = store.groups().collect();
    if !groups.is_empty() {
        out.push_str("\nGroups:\n");
        for group in groups {
            let _ = writeln!(out, "  {:<20} {}", group.name, group.members.join(", "));
        }
    }
    out
}

fn run_run(session: &mut Session, name: &str, background: bool) -> Result<i32> {
    let options = RunOptions::new(name).with_background(background);
    let report = RunCommand::new(&session.ctx, &session.store).execute(
        &options,
        &mut session.environment,
        &mut session.prompter,
    )?;
    print_run_result(&report);
    Ok(report.exit_code())
}

fn print_run_result(report: &RunReport) {
    for member in &report.members {
        match &member.result {
            Ok(LaunchOutcome::Exited { code }) => {
                if *code != 0 {
                    eprintln!("'{}' exited with code {}", member.name, code);
                }
            }
            Ok(LaunchOutcome::Detached { pid, log_path, .. }) => {
                println!("✓ Started '{}' (pid {})", member.name, pid);
                println!("  Log: {}", log_path.display());
            }
            Err(err) => println!("✗ '{}': {}", member.name, err),
        }
    }

    if report.is_group {
        let failed = report.failures().count();
        let total = report.members.len();
        if failed == 0 {
            println!("Summary: started all {} members of '{}'", total, report.name);
        } else {
            println!(
                "Summary: {} of {} members of '{}' failed",
                failed, total, report.name
            );
        }
    }
}

fn run_info(session: &Session, name: &str, verbose: bool) -> Result<i32> {
    match session.store.lookup(name)? {
        Target::Server(server) => {
            println!("{}", server.name);
            if let Some(description) = &server.description {
                println!("  {}", description);
            }
            println!(
                "  Command: {}",
                format_command_line(&server.command, &server.args)
            );
            if verbose {
                if !server.env.is_empty() {
                    println!("  Env:");
                    for (key, template) in &server.env {
                        println!("    {}={}", key, template);
                    }
                }
                if !server.required_env.is_empty() {
                    println!("  Required: {}", server.required_env.join(", "));
                }
            }
        }
        Target::Group(group) => {
            println!("{} (group)", group.name);
            for member in &group.members {
                let description = session
                    .store
                    .server(member)
                    .map(|s| s.description.as_deref().unwrap_or(""))
                    .unwrap_or("(not defined)");
                println!("  {:<20} {}", member, description);
            }
        }
    }
    Ok(0)
}

fn run_json(session: &Session, name: &str) -> Result<i32> {
    let value = export_json(&session.store, name)?;
    println!("{}", serde_json::to_string(&value)?);
    Ok(0)
}

fn run_add(
    session: &mut Session,
    name: &str,
    target: ClientTarget,
    scope: Option<TargetScope>,
    overwrite: bool,
) -> Result<i32> {
    let mut options = AddOptions::new(name, target).with_overwrite(overwrite);
    if let Some(scope) = scope {
        options = options.with_scope(scope);
    }

    let report = AddCommand::new(&session.ctx, &session.store).execute(
        &options,
        &mut session.environment,
        &mut session.prompter,
    )?;
    print_add_result(&report);
    Ok(if report.succeeded() { 0 } else { 1 })
}

fn print_add_result(report: &AddReport) {
    for member in &report.members {
        match &member.result {
            Ok(merge) => {
                let verb = if merge.replaced_existing {
                    "Updated"
                } else {
                    "Added"
                };
                println!(
                    "✓ {} '{}' in {}",
                    verb,
                    member.name,
                    merge.path.display()
                );
                if let Some(legacy) = &merge.migrated_from {
                    println!("  Moved existing entries from '{}'", legacy);
                }
                if let Some(recovery) = &merge.recovery {
                    println!("  ⚠ {}", describe_recovery(recovery));
                }
            }
            Err(err) => println!("✗ '{}': {}", member.name, err),
        }
    }

    if report.is_group {
        let failed = report.members.iter().filter(|m| m.result.is_err()).count();
        println!(
            "Summary: {} of {} members of '{}' added to {}",
            report.members.len() - failed,
            report.members.len(),
            report.name,
            report.target
        );
    }
}

fn describe_recovery(recovery: &Recovery) -> String {
    match recovery {
        Recovery::Salvaged { backup } => format!(
            "File was not valid JSON; kept existing servers, backup at {}",
            backup.display()
        ),
        Recovery::Reset { backup } => format!(
            "File was not valid JSON; started fresh, backup at {}",
            backup.display()
        ),
        Recovery::ContainerReplaced { backup } => format!(
            "Server section was not an object; replaced it, backup at {}",
            backup.display()
        ),
    }
}

fn run_setup(session: &mut Session, name: &str) -> Result<i32> {
    let report = SetupCommand::new(&session.ctx, &session.store).execute(
        name,
        &mut session.environment,
        &mut session.prompter,
    )?;
    print_setup_result(&report, &session.ctx);
    Ok(if report.is_complete() { 0 } else { 1 })
}

fn print_setup_result(report: &SetupReport, ctx: &AppContext) {
    if !report.saved.is_empty() {
        println!(
            "✓ Saved {} to {}",
            report.saved.join(", "),
            ctx.secrets_path().display()
        );
    }
    for (server, names) in &report.incomplete {
        println!("  ⚠ '{}' still needs {}", server, names.join(", "));
    }
    for (server, err) in &report.failed {
        println!("✗ '{}': {}", server, err);
    }
    if report.saved.is_empty() && report.is_complete() {
        println!("✓ '{}' has everything it needs", report.name);
    }
}

fn run_interactive(session: &mut Session) -> Result<i32> {
    let names: Vec<String> = session
        .store
        .servers()
        .map(|s| s.name.clone())
        .chain(session.store.groups().map(|g| g.name.clone()))
        .collect();

    loop {
        let choice = InteractiveFlow::new(names.clone(), PrefilledChoice::default()).collect()?;
        let name = choice.name.unwrap_or_default();

        let result = match choice.action {
            MenuAction::Quit => return Ok(0),
            MenuAction::List => run_list(session, false),
            MenuAction::Info => run_info(session, &name, true),
            MenuAction::Run => run_run(session, &name, false),
            MenuAction::Add => match choice.target {
                Some(target) => run_add(session, &name, target, None, false),
                None => continue,
            },
            MenuAction::Json => run_json(session, &name),
            MenuAction::Docs => {
                print!("{}", render_markdown(&session.store));
                Ok(0)
            }
            MenuAction::Setup => run_setup(session, &name),
        };

        if let Err(err) = result {
            println!("✗ {:#}", err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Cli, Commands, list_text};
    use clap::Parser;
    use mcpdeck_core::config::{DefinitionStore, DefinitionsFile, GroupsFile, ServerDefinition};

    #[test]
    fn add_with_scope_flags_parses() {
        let cli = Cli::try_parse_from(["mcpdeck", "add", "github", "claude", "--project"]).unwrap();
        match cli.command {
            Commands::Add(args) => {
                assert_eq!(args.name, "github");
                assert_eq!(args.target, "claude");
                assert_eq!(
                    args.scope(),
                    Some(mcpdeck_core::types::TargetScope::Project)
                );
                assert!(!args.overwrite);
            }
            _ => panic!("expected add"),
        }
    }

    #[test]
    fn project_and_user_conflict() {
        let result =
            Cli::try_parse_from(["mcpdeck", "add", "github", "claude", "--project", "--user"]);
        assert!(result.is_err());
    }

    #[test]
    fn bg_alias_and_global_flags() {
        let cli = Cli::try_parse_from([
            "mcpdeck",
            "run",
            "dev",
            "--bg",
            "--no-input",
            "--servers",
            "/tmp/defs.yaml",
        ])
        .unwrap();
        assert!(cli.global.no_input);
        assert_eq!(
            cli.global.servers.as_deref(),
            Some(std::path::Path::new("/tmp/defs.yaml"))
        );
        match cli.command {
            Commands::Run { name, background } => {
                assert_eq!(name, "dev");
                assert!(background);
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn info_verbose_and_list_json() {
        let cli = Cli::try_parse_from(["mcpdeck", "info", "fs", "-v"]).unwrap();
        assert!(matches!(cli.command, Commands::Info { verbose: true, .. }));

        let cli = Cli::try_parse_from(["mcpdeck", "list", "--json"]).unwrap();
        assert!(matches!(cli.command, Commands::List { json: true }));
    }

    #[test]
    fn missing_subcommand_is_an_error() {
        assert!(Cli::try_parse_from(["mcpdeck"]).is_err());
    }

    #[test]
    fn help_subcommand_is_available() {
        let err = Cli::try_parse_from(["mcpdeck", "help", "add"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn list_text_leaves_lint_warnings_to_the_log() {
        let mut servers = DefinitionsFile::new();
        servers.insert(
            "gh".to_string(),
            ServerDefinition::new("", "gh-server")
                .with_description("GitHub")
                .with_required("TOKEN"),
        );
        let mut groups = GroupsFile::new();
        groups.insert("dev".to_string(), vec!["gh".to_string(), "ghost".to_string()]);
        let store = DefinitionStore::from_parts(servers, groups);
        assert!(!store.lint().is_empty());

        let text = list_text(&store);

        assert!(text.contains("gh"));
        assert!(text.contains("GitHub"));
        assert!(text.contains("gh, ghost"));
        assert!(!text.contains('⚠'));
        assert!(!text.contains("has no entry"));
    }
}
