//! Console sender and demo command set
//!
//! The binary in `main.rs` reads lines from stdin and feeds them to the
//! manager built here. Output lines produced by handlers are collected in the
//! command context and rendered by [`render`].

use std::sync::Arc;

use anstyle::{AnsiColor, Style};
use cmdtree::{
    BooleanParser, ByteParser, Command, CommandContext, CommandError, CommandManager,
    CommandPermission, ExecutionOutcome, IntegerParser, ManagerSettings, ServiceResult,
    StringParser, TreeError,
};
use serde::Serialize;

const OUTPUT: &str = "console.output";
const CATALOG: &str = "console.catalog";

type Catalog = Arc<Vec<Arc<Command<ConsoleSender>>>>;

const ERROR: Style = AnsiColor::Red.on_default().bold();
const NOTICE: Style = AnsiColor::Yellow.on_default();
const SUGGESTION: Style = AnsiColor::Cyan.on_default();

/// The person at the console
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleSender {
    pub name: String,
    pub admin: bool,
}

impl ConsoleSender {
    pub fn new(name: impl Into<String>, admin: bool) -> Self {
        Self {
            name: name.into(),
            admin,
        }
    }
}

/// Result of one console line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Report {
    Ok { command: String, output: Vec<String> },
    Cancelled { command: String, reason: String },
    Error { message: String, exit_code: i32 },
}

impl Report {
    pub fn exit_code(&self) -> i32 {
        match self {
            Report::Error { exit_code, .. } => *exit_code,
            _ => 0,
        }
    }
}

fn emit(ctx: &mut CommandContext<ConsoleSender>, line: impl Into<String>) {
    let mut lines = ctx
        .remove_stored(OUTPUT)
        .and_then(|value| value.downcast_ref::<Vec<String>>().cloned())
        .unwrap_or_default();
    lines.push(line.into());
    ctx.store(OUTPUT, lines);
}

/// Manager with the demo commands registered
pub fn demo_manager(settings: ManagerSettings) -> Result<CommandManager<ConsoleSender>, TreeError> {
    let manager = CommandManager::new(settings);
    let admin = CommandPermission::predicate("admin", |sender: &ConsoleSender| sender.admin);

    let commands = [
        Command::builder("byte")
            .required("value", ByteParser::new())
            .description("Echo a number between -128 and 127")
            .handler(|ctx| {
                let value = ctx.get::<i8>("value").copied().unwrap_or_default();
                emit(ctx, format!("byte {}", value));
                Ok(())
            })
            .build(),
        Command::builder("cmd")
            .required("a", IntegerParser::new())
            .optional_with_default("b", IntegerParser::new(), "5")
            .description("Add two integers, b defaults to 5")
            .handler(|ctx| {
                let a = ctx.get::<i32>("a").copied().unwrap_or_default();
                let b = ctx.get::<i32>("b").copied().unwrap_or_default();
                emit(ctx, format!("{} + {} = {}", a, b, i64::from(a) + i64::from(b)));
                Ok(())
            })
            .build(),
        Command::builder("group")
            .literal("one")
            .required("x", IntegerParser::new())
            .handler(|ctx| {
                let x = ctx.get::<i32>("x").copied().unwrap_or_default();
                emit(ctx, format!("group one x={}", x));
                Ok(())
            })
            .build(),
        Command::builder("group")
            .literal("two")
            .required("y", IntegerParser::new())
            .handler(|ctx| {
                let y = ctx.get::<i32>("y").copied().unwrap_or_default();
                emit(ctx, format!("group two y={}", y));
                Ok(())
            })
            .build(),
        Command::builder("echo")
            .alias("say")
            .required("text", StringParser::greedy())
            .description("Repeat the text back")
            .handler(|ctx| {
                let text = ctx.get::<String>("text").cloned().unwrap_or_default();
                emit(ctx, text);
                Ok(())
            })
            .build(),
        Command::builder("toggle")
            .required("state", BooleanParser::liberal())
            .handler(|ctx| {
                let state = ctx.get::<bool>("state").copied().unwrap_or_default();
                emit(ctx, if state { "enabled" } else { "disabled" });
                Ok(())
            })
            .build(),
        Command::builder("admin")
            .literal("reload")
            .permission(admin)
            .description("Reload settings (administrators only)")
            .handler(|ctx| {
                let name = ctx.sender().name.clone();
                emit(ctx, format!("Settings reloaded by {}", name));
                Ok(())
            })
            .build(),
        Command::builder("help")
            .description("List available commands")
            .handler(help)
            .build(),
    ];

    for command in commands {
        manager.register(command?)?;
    }

    let catalog: Catalog = Arc::new(manager.commands());
    manager.register_execution_service("catalog", 0, move |execution| {
        execution.context_mut().store(CATALOG, Arc::clone(&catalog));
        Ok(ServiceResult::Continue)
    });
    Ok(manager)
}

fn help(ctx: &mut CommandContext<ConsoleSender>) -> anyhow::Result<()> {
    let catalog = ctx.stored::<Catalog>(CATALOG).cloned().unwrap_or_default();
    let lines: Vec<String> = catalog
        .iter()
        .filter(|command| command.has_permission(ctx.sender()))
        .map(|command| match command.description() {
            Some(description) => format!("{:<24} {}", command.syntax(), description),
            None => command.syntax(),
        })
        .collect();
    for line in lines {
        emit(ctx, line);
    }
    Ok(())
}

/// Execute one line and describe what happened
pub fn run_line(manager: &CommandManager<ConsoleSender>, sender: &ConsoleSender, line: &str) -> Report {
    match manager.execute(sender.clone(), line) {
        Ok(done) => {
            let command = done.command().syntax();
            match done.outcome() {
                ExecutionOutcome::Cancelled { reason } => Report::Cancelled {
                    command,
                    reason: reason.clone(),
                },
                ExecutionOutcome::Completed => Report::Ok {
                    command,
                    output: done
                        .context()
                        .stored::<Vec<String>>(OUTPUT)
                        .cloned()
                        .unwrap_or_default(),
                },
            }
        }
        Err(err) => report_error(&err),
    }
}

fn report_error(err: &CommandError) -> Report {
    if !err.is_user_error() {
        tracing::error!(error = %err, "Command failed");
    }
    Report::Error {
        message: err.to_string(),
        exit_code: err.exit_code(),
    }
}

/// Render a report for the terminal
pub fn render(report: &Report, styled: bool) -> String {
    let paint = |style: Style, text: &str| {
        if styled {
            format!("{style}{text}{style:#}")
        } else {
            text.to_string()
        }
    };
    match report {
        Report::Ok { output, .. } => output.join("\n"),
        Report::Cancelled { command, reason } => {
            format!("{} {}: {}", paint(NOTICE, "cancelled"), command, reason)
        }
        Report::Error { message, .. } => format!("{} {}", paint(ERROR, "error:"), message),
    }
}

/// Render completions, one per line
pub fn render_suggestions(suggestions: &[String], styled: bool) -> String {
    suggestions
        .iter()
        .map(|suggestion| {
            if styled {
                format!("{SUGGESTION}{suggestion}{SUGGESTION:#}")
            } else {
                suggestion.clone()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
