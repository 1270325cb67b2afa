//! # cmdtree: sender-agnostic command trees
//!
//! Register commands as sequences of literals and typed arguments, then
//! resolve raw input against them for any sender type you like.
//!
//! ## Core Principles
//!
//! - **Typed arguments**: parsers produce real values and report structured errors
//! - **Composable permissions**: predicates over the sender, combined with AND/OR
//! - **Predictable resolution**: literals before arguments, deepest failure reported
//! - **Interceptable execution**: priority-ordered services around every handler
//!
//! ## Quick Start
//!
//! ```rust
//! use cmdtree::{Command, CommandError, CommandManager, CommandPermission, IntegerParser, ManagerSettings};
//!
//! #[derive(Clone)]
//! struct Player {
//!     name: String,
//!     operator: bool,
//! }
//!
//! let manager = CommandManager::<Player>::new(ManagerSettings::default());
//! manager
//!     .register(
//!         Command::builder("kick")
//!             .required("slot", IntegerParser::range(0, 63))
//!             .permission(CommandPermission::predicate("operator", |p: &Player| p.operator))
//!             .handler(|ctx| {
//!                 let slot = ctx.get::<i32>("slot").copied().unwrap_or_default();
//!                 println!("{} kicked slot {}", ctx.sender().name, slot);
//!                 Ok(())
//!             })
//!             .build()
//!             .unwrap(),
//!     )
//!     .unwrap();
//!
//! let guest = Player { name: "guest".into(), operator: false };
//! assert!(matches!(
//!     manager.execute(guest, "kick 3"),
//!     Err(CommandError::NoPermission { .. })
//! ));
//!
//! let op = Player { name: "op".into(), operator: true };
//! assert!(manager.execute(op.clone(), "kick 3").is_ok());
//! assert!(matches!(
//!     manager.execute(op, "kick 99"),
//!     Err(CommandError::ArgumentParse { .. })
//! ));
//! ```

pub mod arguments;
pub mod command;
pub mod context;
pub mod error;
pub mod execution;
pub mod manager;
pub mod permission;
pub mod settings;
pub mod tree;

#[cfg(feature = "subscriber")]
pub mod tracing_support;

pub use arguments::registry::keys as parser_keys;
pub use arguments::standard::{
    BooleanParser, ByteParser, DoubleParser, FloatParser, IntegerParser, LongParser,
    NumberParser, RangedNumber, ShortParser, StringMode, StringParser,
};
pub use arguments::{
    ArgumentBuilder, ArgumentParseError, ArgumentParseResult, ArgumentParser, CommandArgument,
    CommandInput, ErasedParser, NumberParseError, ParserParameters, ParserRegistry, SharedParser,
};
pub use command::{Command, CommandBuilder, CommandComponent, CommandHandler};
pub use context::{ArgValue, CommandContext};
pub use error::{CommandError, CommandResult, TreeError};
pub use execution::{CommandExecution, CommandPostprocessingContext, ExecutionOutcome};
pub use manager::CommandManager;
pub use permission::CommandPermission;
pub use settings::{AmbiguityPolicy, ManagerSettings, SettingsError};
pub use tree::{CommandId, CommandTree, NodeId};

pub use cmdtree_services::{PipelineError, ServicePipeline, ServiceResult};

#[cfg(feature = "subscriber")]
pub use tracing_support::{
    init_subscriber, init_subscriber_with_config, try_init_subscriber, TracingConfig,
    TracingFormat,
};
