//! cmdtree-console: type commands, see how the tree resolves them

use std::io::{self, BufRead, IsTerminal, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use cmdtree::{init_subscriber_with_config, CommandManager, ManagerSettings, TracingConfig, TracingFormat};
use cmdtree_console::{demo_manager, render, render_suggestions, run_line, ConsoleSender, Report};

#[derive(Parser, Debug)]
#[command(name = "cmdtree-console")]
#[command(about = "Resolve and execute commands against a demo command tree", long_about = None)]
#[command(version)]
struct Cli {
    /// Manager settings file (JSON)
    #[arg(long, env = "CMDTREE_SETTINGS")]
    config: Option<PathBuf>,

    /// Log filter directive
    #[arg(long, env = "RUST_LOG", default_value = "warn")]
    log_level: String,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Compact)]
    log_format: LogFormat,

    /// Match literals regardless of case
    #[arg(long)]
    case_insensitive: bool,

    /// Run as an administrator
    #[arg(long)]
    admin: bool,

    /// Print completions for LINE and exit
    #[arg(long, value_name = "LINE")]
    complete: Option<String>,

    /// Print results as JSON
    #[arg(long)]
    json: bool,

    /// Execute this line and exit instead of reading stdin
    #[arg(trailing_var_arg = true)]
    line: Vec<String>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormat {
    Pretty,
    Compact,
    Json,
}

impl From<LogFormat> for TracingFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Pretty => TracingFormat::Pretty,
            LogFormat::Compact => TracingFormat::Compact,
            LogFormat::Json => TracingFormat::Json,
        }
    }
}

fn load_settings(cli: &Cli) -> Result<ManagerSettings> {
    let settings = match &cli.config {
        Some(path) => ManagerSettings::load(path)
            .with_context(|| format!("Failed to load settings from {}", path.display()))?,
        None => ManagerSettings::default(),
    };
    Ok(if cli.case_insensitive {
        settings.with_case_sensitive(false)
    } else {
        settings
    })
}

fn print_report(report: &Report, json: bool, styled: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(report)?);
        return Ok(());
    }
    let text = render(report, styled);
    match report {
        Report::Error { .. } => eprintln!("{}", text),
        _ if text.is_empty() => {}
        _ => println!("{}", text),
    }
    Ok(())
}

fn print_suggestions(suggestions: &[String], json: bool, styled: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(suggestions)?);
    } else if !suggestions.is_empty() {
        println!("{}", render_suggestions(suggestions, styled));
    }
    Ok(())
}

/// Read lines until EOF; `?partial` lists completions instead of executing
fn repl(manager: &CommandManager<ConsoleSender>, sender: &ConsoleSender, json: bool) -> Result<()> {
    let interactive = io::stdin().is_terminal();
    let styled = io::stdout().is_terminal();
    let mut stdout = io::stdout();

    if interactive {
        println!("Type 'help' for commands, '?<text>' for completions, Ctrl-D to quit.");
    }

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        if interactive {
            print!("> ");
            stdout.flush()?;
        }
        let Some(line) = lines.next() else {
            break;
        };
        let line = line.context("Failed to read from stdin")?;
        if line.trim().is_empty() {
            continue;
        }

        if let Some(partial) = line.strip_prefix('?') {
            let suggestions = manager.suggest(sender.clone(), partial);
            print_suggestions(&suggestions, json, styled)?;
        } else {
            print_report(&run_line(manager, sender, &line), json, styled)?;
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_subscriber_with_config(&TracingConfig {
        level: Some(cli.log_level.clone()),
        format: cli.log_format.into(),
        timestamps: false,
        stderr: true,
        ..Default::default()
    });

    let settings = load_settings(&cli)?;
    let manager = demo_manager(settings).context("Failed to register demo commands")?;
    let sender = ConsoleSender::new(
        if cli.admin { "admin" } else { "console" },
        cli.admin,
    );
    let styled = io::stdout().is_terminal();

    if let Some(partial) = &cli.complete {
        let suggestions = manager.suggest(sender, partial);
        return print_suggestions(&suggestions, cli.json, styled);
    }

    if !cli.line.is_empty() {
        let report = run_line(&manager, &sender, &cli.line.join(" "));
        print_report(&report, cli.json, styled)?;
        let code = report.exit_code();
        if code != 0 {
            std::process::exit(code);
        }
        return Ok(());
    }

    repl(&manager, &sender, cli.json)
}
