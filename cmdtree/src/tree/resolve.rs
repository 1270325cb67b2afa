//! Resolution of input tokens to a command
//!
//! Depth-first walk with backtracking. Children are tried literals first,
//! then arguments in insertion order; the first branch that reaches an
//! executable node wins. When every branch fails, the failure that consumed
//! the most tokens is reported, the earlier branch winning ties.
//!
//! A literal that matches but is denied ends the walk at that node. A
//! context-free parser that rejected the input at one depth is not asked
//! again for a sibling sharing it; its failure is reused.

use std::sync::Arc;

use super::{CommandTree, NodeId, NodeKind};
use crate::arguments::{ArgumentParseError, CommandInput, SharedParser};
use crate::command::Command;
use crate::context::CommandContext;
use crate::error::{CommandError, CommandResult};

struct Failure {
    depth: usize,
    error: CommandError,
}

impl Failure {
    fn at(depth: usize, error: CommandError) -> Self {
        Self { depth, error }
    }
}

fn keep_deepest(best: &mut Option<Failure>, candidate: Failure) {
    if best
        .as_ref()
        .map_or(true, |current| candidate.depth > current.depth)
    {
        *best = Some(candidate);
    }
}

impl<S> CommandTree<S> {
    /// Resolve `input` to a command, binding argument values into `ctx`
    ///
    /// On failure the bindings in `ctx` are left as they were.
    pub fn resolve(
        &self,
        ctx: &mut CommandContext<S>,
        mut input: CommandInput,
    ) -> CommandResult<Arc<Command<S>>> {
        if input.is_empty() {
            return Err(CommandError::EmptyInput);
        }
        let mark = ctx.mark();
        match self.walk(self.root(), ctx, &mut input, 0) {
            Ok(node) => {
                let command = self
                    .node(node)
                    .command
                    .and_then(|id| self.command(id))
                    .cloned()
                    .ok_or_else(|| CommandError::InvalidSyntax {
                        syntax: self.usage(node),
                    })?;
                tracing::debug!(
                    command = %command.syntax(),
                    bindings = ?ctx.binding_names(),
                    "Command resolved"
                );
                Ok(command)
            }
            Err(failure) => {
                ctx.rewind(mark);
                tracing::debug!(depth = failure.depth, error = %failure.error, "Resolution failed");
                Err(failure.error)
            }
        }
    }

    /// Walk below `id`, whose own token (if any) is already consumed and bound
    fn walk(
        &self,
        id: NodeId,
        ctx: &mut CommandContext<S>,
        input: &mut CommandInput,
        depth: usize,
    ) -> Result<NodeId, Failure> {
        if input.is_empty() {
            return self.finish(id, ctx, depth);
        }

        let node = self.node(id);
        let mut best: Option<Failure> = None;
        let mut rejected: Vec<(SharedParser<S>, ArgumentParseError)> = Vec::new();

        for &child_id in &node.children {
            let child = self.node(child_id);
            let snapshot = input.clone();
            let mark = ctx.mark();

            let consumed = match &child.kind {
                NodeKind::Literal { .. } => {
                    let Some(token) = input.front() else { break };
                    if !self.literal_matches(child, token) {
                        continue;
                    }
                    // a matched literal is unambiguous, so siblings are not tried
                    if !child.permits(ctx.sender()) {
                        return Err(self.denied(child_id, depth));
                    }
                    input.pop_front();
                    1
                }
                NodeKind::Argument(argument) => {
                    if !child.permits(ctx.sender()) {
                        keep_deepest(&mut best, self.denied(child_id, depth));
                        continue;
                    }
                    let parser = argument.parser();
                    if let Some((_, source)) = rejected.iter().find(|(seen, _)| seen.same_as(parser)) {
                        tracing::trace!(argument = argument.name(), "Reusing rejected parse");
                        keep_deepest(
                            &mut best,
                            Failure::at(depth, CommandError::parse_error(argument.name(), source.clone())),
                        );
                        continue;
                    }
                    let before = input.len();
                    match parser.parse_value(ctx, input) {
                        Ok(value) => {
                            ctx.bind(argument.name(), value);
                            before - input.len()
                        }
                        Err(source) => {
                            tracing::trace!(argument = argument.name(), error = %source, "Argument did not parse");
                            if parser.is_context_free() {
                                rejected.push((parser.clone(), source.clone()));
                            }
                            keep_deepest(
                                &mut best,
                                Failure::at(depth, CommandError::parse_error(argument.name(), source)),
                            );
                            continue;
                        }
                    }
                }
                NodeKind::Root => continue,
            };

            match self.walk(child_id, ctx, input, depth + consumed) {
                Ok(found) => return Ok(found),
                Err(failure) => {
                    *input = snapshot;
                    ctx.rewind(mark);
                    keep_deepest(&mut best, failure);
                }
            }
        }

        if let Some(failure) = best {
            return Err(failure);
        }
        let error = if node.command.is_some() {
            CommandError::TooManyArguments {
                extra: input.iter().cloned().collect(),
                syntax: self.usage(id),
            }
        } else {
            CommandError::UnrecognizedCommand {
                token: input.front().cloned().unwrap_or_default(),
            }
        };
        Err(Failure::at(depth, error))
    }

    /// Input ran out at `id`
    fn finish(&self, id: NodeId, ctx: &mut CommandContext<S>, depth: usize) -> Result<NodeId, Failure> {
        let node = self.node(id);
        if let Some(command) = node.command.and_then(|c| self.command(c)) {
            if !command.has_permission(ctx.sender()) {
                return Err(self.denied(id, depth));
            }
            return Ok(id);
        }
        if matches!(node.kind, NodeKind::Root) {
            return Err(Failure::at(depth, CommandError::EmptyInput));
        }

        let mut arguments = node
            .children
            .iter()
            .filter_map(|&child| self.node(child).argument().map(|arg| (child, arg)));

        if let Some((child_id, argument)) = arguments.find(|(_, arg)| !arg.is_required()) {
            if !self.node(child_id).permits(ctx.sender()) {
                return Err(self.denied(child_id, depth));
            }
            let mark = ctx.mark();
            if let Some(parsed) = argument.parse_default(ctx) {
                let value = parsed.map_err(|source| {
                    Failure::at(depth, CommandError::parse_error(argument.name(), source))
                })?;
                ctx.bind(argument.name(), value);
            }
            let result = self.finish(child_id, ctx, depth);
            if result.is_err() {
                ctx.rewind(mark);
            }
            return result;
        }

        let required = node
            .children
            .iter()
            .find_map(|&child| self.node(child).argument().map(|arg| (child, arg)));
        let error = match required {
            Some((child_id, argument)) => CommandError::MissingArgument {
                argument: argument.name().to_string(),
                syntax: self.usage(child_id),
            },
            None => CommandError::InvalidSyntax {
                syntax: self.usage(id),
            },
        };
        Err(Failure::at(depth, error))
    }

    fn denied(&self, id: NodeId, depth: usize) -> Failure {
        Failure::at(
            depth,
            CommandError::NoPermission {
                path: self.path(id),
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;

    use crate::arguments::standard::{ByteParser, IntegerParser, StringParser};
    use crate::arguments::{
        ArgumentParseError, ArgumentParseResult, ArgumentParser, CommandArgument, CommandInput,
        SharedParser,
    };
    use crate::command::Command;
    use crate::context::CommandContext;
    use crate::error::CommandError;
    use crate::permission::CommandPermission;
    use crate::settings::AmbiguityPolicy;
    use crate::tree::CommandTree;

    #[derive(Debug, Clone, Copy, Default)]
    struct Sender {
        admin: bool,
    }

    fn tokens(line: &str) -> crate::arguments::CommandInput {
        line.split(' ').map(str::to_string).collect()
    }

    fn ok(_: &mut CommandContext<Sender>) -> anyhow::Result<()> {
        Ok(())
    }

    fn resolve(
        tree: &CommandTree<Sender>,
        sender: Sender,
        line: &str,
    ) -> (Result<String, CommandError>, CommandContext<Sender>) {
        let mut ctx = CommandContext::new(sender);
        let result = tree.resolve(&mut ctx, tokens(line)).map(|c| c.syntax());
        (result, ctx)
    }

    #[test]
    fn test_byte_range() {
        let mut tree = CommandTree::new();
        tree.insert(
            Command::builder("byte")
                .required("value", ByteParser::new())
                .handler(ok)
                .build()
                .unwrap(),
        )
        .unwrap();

        let (result, _) = resolve(&tree, Sender::default(), "byte 200");
        match result.unwrap_err() {
            CommandError::ArgumentParse {
                argument,
                source: ArgumentParseError::Number(err),
            } => {
                assert_eq!(argument, "value");
                assert_eq!(err.input, "200");
                assert_eq!(err.min, "-128");
                assert_eq!(err.max, "127");
            }
            other => panic!("Expected parse failure, got {:?}", other),
        }

        let (result, ctx) = resolve(&tree, Sender::default(), "byte 42");
        assert_eq!(result.unwrap(), "byte <value>");
        assert_eq!(ctx.get::<i8>("value"), Some(&42));
    }

    #[test]
    fn test_optional_default_binding() {
        let mut tree = CommandTree::new();
        tree.insert(
            Command::builder("cmd")
                .required("a", IntegerParser::new())
                .optional_with_default("b", IntegerParser::new(), "5")
                .handler(ok)
                .build()
                .unwrap(),
        )
        .unwrap();

        let (result, ctx) = resolve(&tree, Sender::default(), "cmd 1");
        assert!(result.is_ok());
        assert_eq!(ctx.get::<i32>("a"), Some(&1));
        assert_eq!(ctx.get::<i32>("b"), Some(&5));

        let (result, ctx) = resolve(&tree, Sender::default(), "cmd 1 2");
        assert!(result.is_ok());
        assert_eq!(ctx.binding_names(), vec!["a", "b"]);
        assert_eq!(ctx.get::<i32>("b"), Some(&2));
    }

    #[test]
    fn test_optional_without_default_is_omitted() {
        let mut tree = CommandTree::new();
        tree.insert(
            Command::builder("say")
                .optional("text", StringParser::greedy())
                .handler(ok)
                .build()
                .unwrap(),
        )
        .unwrap();

        let (result, ctx) = resolve(&tree, Sender::default(), "say");
        assert!(result.is_ok());
        assert!(!ctx.contains("text"));
    }

    #[test]
    fn test_missing_required_argument() {
        let mut tree = CommandTree::new();
        tree.insert(
            Command::builder("cmd")
                .required("a", IntegerParser::new())
                .handler(ok)
                .build()
                .unwrap(),
        )
        .unwrap();

        let (result, _) = resolve(&tree, Sender::default(), "cmd");
        match result.unwrap_err() {
            CommandError::MissingArgument { argument, syntax } => {
                assert_eq!(argument, "a");
                assert_eq!(syntax, "cmd <a>");
            }
            other => panic!("Expected missing argument, got {:?}", other),
        }
    }

    fn group_tree(group_checked: &'static AtomicBool) -> CommandTree<Sender> {
        let mut tree = CommandTree::new();
        let admin = CommandPermission::predicate("admin", move |s: &Sender| {
            group_checked.store(true, Ordering::SeqCst);
            s.admin
        });
        for (branch, argument) in [("one", "x"), ("two", "y")] {
            tree.insert(
                Command::builder("group")
                    .literal(branch)
                    .required(argument, IntegerParser::new())
                    .permission(admin.clone())
                    .handler(ok)
                    .build()
                    .unwrap(),
            )
            .unwrap();
        }
        tree
    }

    #[test]
    fn test_group_routing() {
        static CHECKED: AtomicBool = AtomicBool::new(false);
        let tree = group_tree(&CHECKED);

        let (result, ctx) = resolve(&tree, Sender { admin: true }, "group one 3");
        assert_eq!(result.unwrap(), "group one <x>");
        assert_eq!(ctx.get::<i32>("x"), Some(&3));
        assert!(!ctx.contains("y"));

        let (result, _) = resolve(&tree, Sender { admin: true }, "group three 3");
        assert!(matches!(
            result.unwrap_err(),
            CommandError::UnrecognizedCommand { token } if token == "three"
        ));

        let (result, _) = resolve(&tree, Sender { admin: true }, "group");
        assert!(matches!(
            result.unwrap_err(),
            CommandError::InvalidSyntax { syntax } if syntax == "group one|two"
        ));
    }

    #[test]
    fn test_permission_denial_stops_at_group() {
        static CHECKED: AtomicBool = AtomicBool::new(false);
        let tree = group_tree(&CHECKED);

        let (result, ctx) = resolve(&tree, Sender { admin: false }, "group one 3");
        assert!(CHECKED.load(Ordering::SeqCst));
        match result.unwrap_err() {
            CommandError::NoPermission { path } => assert_eq!(path, "group"),
            other => panic!("Expected permission failure, got {:?}", other),
        }
        assert!(ctx.bindings().next().is_none());
    }

    #[test]
    fn test_too_many_vs_unrecognized() {
        let mut tree = CommandTree::new();
        tree.insert(
            Command::builder("cmd")
                .required("a", IntegerParser::new())
                .handler(ok)
                .build()
                .unwrap(),
        )
        .unwrap();

        let (result, _) = resolve(&tree, Sender::default(), "cmd 1 2 3");
        match result.unwrap_err() {
            CommandError::TooManyArguments { extra, syntax } => {
                assert_eq!(extra, vec!["2", "3"]);
                assert_eq!(syntax, "cmd <a>");
            }
            other => panic!("Expected too many arguments, got {:?}", other),
        }

        let (result, _) = resolve(&tree, Sender::default(), "nope 1");
        assert!(matches!(
            result.unwrap_err(),
            CommandError::UnrecognizedCommand { token } if token == "nope"
        ));
    }

    #[test]
    fn test_literal_preferred_over_argument() {
        let mut tree = CommandTree::new();
        tree.insert(
            Command::builder("give")
                .literal("all")
                .handler(ok)
                .build()
                .unwrap(),
        )
        .unwrap();
        tree.insert(
            Command::builder("give")
                .required("target", StringParser::single())
                .handler(ok)
                .build()
                .unwrap(),
        )
        .unwrap();

        let (result, ctx) = resolve(&tree, Sender::default(), "give all");
        assert_eq!(result.unwrap(), "give all");
        assert!(!ctx.contains("target"));

        let (result, ctx) = resolve(&tree, Sender::default(), "give steve");
        assert_eq!(result.unwrap(), "give <target>");
        assert_eq!(ctx.get::<String>("target").map(String::as_str), Some("steve"));
    }

    #[test]
    fn test_denied_literal_does_not_fall_back_to_argument() {
        let mut tree = CommandTree::new();
        tree.insert(
            Command::builder("give")
                .literal("all")
                .permission(CommandPermission::predicate("admin", |s: &Sender| s.admin))
                .handler(ok)
                .build()
                .unwrap(),
        )
        .unwrap();
        tree.insert(
            Command::builder("give")
                .required("target", StringParser::single())
                .handler(ok)
                .build()
                .unwrap(),
        )
        .unwrap();

        let (result, ctx) = resolve(&tree, Sender { admin: false }, "give all");
        match result.unwrap_err() {
            CommandError::NoPermission { path } => assert_eq!(path, "give all"),
            other => panic!("Expected permission failure, got {:?}", other),
        }
        assert!(!ctx.contains("target"));

        let (result, _) = resolve(&tree, Sender { admin: true }, "give all");
        assert_eq!(result.unwrap(), "give all");

        let (result, ctx) = resolve(&tree, Sender { admin: false }, "give steve");
        assert_eq!(result.unwrap(), "give <target>");
        assert_eq!(ctx.get::<String>("target").map(String::as_str), Some("steve"));
    }

    #[test]
    fn test_backtracking_rewinds_bindings() {
        let mut tree = CommandTree::with_options(true, AmbiguityPolicy::Permissive);
        tree.insert(
            Command::builder("set")
                .required("count", IntegerParser::new())
                .literal("times")
                .handler(ok)
                .build()
                .unwrap(),
        )
        .unwrap();
        tree.insert(
            Command::builder("set")
                .required("label", StringParser::single())
                .required("value", IntegerParser::new())
                .handler(ok)
                .build()
                .unwrap(),
        )
        .unwrap();

        let (result, ctx) = resolve(&tree, Sender::default(), "set 3 4");
        assert_eq!(result.unwrap(), "set <label> <value>");
        assert_eq!(ctx.binding_names(), vec!["label", "value"]);
        assert_eq!(ctx.get::<String>("label").map(String::as_str), Some("3"));
    }

    struct Counting {
        calls: Arc<AtomicUsize>,
        context_free: bool,
    }

    impl ArgumentParser<Sender> for Counting {
        type Output = i32;

        fn parse(&self, _ctx: &CommandContext<Sender>, input: &mut CommandInput) -> ArgumentParseResult<i32> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let token = input.front().ok_or(ArgumentParseError::NoInput)?;
            let value = token
                .parse()
                .map_err(|_| ArgumentParseError::invalid(token.clone(), "not a number"))?;
            input.pop_front();
            Ok(value)
        }

        fn is_context_free(&self) -> bool {
            self.context_free
        }
    }

    fn shared_parser_tree(context_free: bool) -> (CommandTree<Sender>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let parser = SharedParser::new(Counting {
            calls: Arc::clone(&calls),
            context_free,
        });
        let mut tree = CommandTree::with_options(true, AmbiguityPolicy::Permissive);
        for (name, colour) in [("a", "red"), ("b", "blue")] {
            let argument = CommandArgument::builder(name)
                .shared_parser(parser.clone())
                .build()
                .unwrap();
            tree.insert(
                Command::builder("pick")
                    .argument(argument)
                    .literal(colour)
                    .handler(ok)
                    .build()
                    .unwrap(),
            )
            .unwrap();
        }
        (tree, calls)
    }

    #[test]
    fn test_context_free_rejection_is_reused_by_siblings() {
        let (tree, calls) = shared_parser_tree(true);
        let (result, _) = resolve(&tree, Sender::default(), "pick x blue");
        match result.unwrap_err() {
            CommandError::ArgumentParse { argument, source } => {
                assert_eq!(argument, "a");
                assert_eq!(source.input(), Some("x"));
            }
            other => panic!("Expected parse failure, got {:?}", other),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let (result, ctx) = resolve(&tree, Sender::default(), "pick 3 blue");
        assert_eq!(result.unwrap(), "pick <b> blue");
        assert_eq!(ctx.get::<i32>("b"), Some(&3));
    }

    #[test]
    fn test_context_dependent_parser_is_asked_again() {
        let (tree, calls) = shared_parser_tree(false);
        let (result, _) = resolve(&tree, Sender::default(), "pick x blue");
        assert!(matches!(result, Err(CommandError::ArgumentParse { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_deepest_failure_is_reported() {
        let mut tree = CommandTree::with_options(true, AmbiguityPolicy::Permissive);
        tree.insert(
            Command::builder("tp")
                .required("x", IntegerParser::new())
                .required("y", IntegerParser::new())
                .handler(ok)
                .build()
                .unwrap(),
        )
        .unwrap();
        tree.insert(
            Command::builder("tp")
                .required("target", ByteParser::new())
                .handler(ok)
                .build()
                .unwrap(),
        )
        .unwrap();

        let (result, _) = resolve(&tree, Sender::default(), "tp 1000 oops");
        match result.unwrap_err() {
            CommandError::ArgumentParse { argument, .. } => assert_eq!(argument, "y"),
            other => panic!("Expected failure on y, got {:?}", other),
        }
    }

    #[test]
    fn test_case_insensitive_and_aliases() {
        let mut tree = CommandTree::with_options(false, AmbiguityPolicy::default());
        tree.insert(
            Command::builder("teleport")
                .alias("tp")
                .handler(ok)
                .build()
                .unwrap(),
        )
        .unwrap();

        assert!(resolve(&tree, Sender::default(), "TP").0.is_ok());
        assert!(resolve(&tree, Sender::default(), "Teleport").0.is_ok());

        let mut strict = CommandTree::new();
        strict
            .insert(Command::builder("teleport").handler(ok).build().unwrap())
            .unwrap();
        assert!(resolve(&strict, Sender::default(), "TELEPORT").0.is_err());
    }

    #[test]
    fn test_command_permission_checked_at_terminal() {
        let mut tree = CommandTree::new();
        tree.insert(
            Command::builder("admin")
                .permission(CommandPermission::predicate("admin", |s: &Sender| s.admin))
                .handler(ok)
                .build()
                .unwrap(),
        )
        .unwrap();
        tree.insert(Command::builder("admin").literal("help").handler(ok).build().unwrap())
            .unwrap();

        let (result, _) = resolve(&tree, Sender::default(), "admin help");
        assert_eq!(result.unwrap(), "admin help");

        let (result, _) = resolve(&tree, Sender::default(), "admin");
        assert!(matches!(result.unwrap_err(), CommandError::NoPermission { .. }));

        let (result, _) = resolve(&tree, Sender { admin: true }, "admin");
        assert!(result.is_ok());
    }

    #[test]
    fn test_empty_input() {
        let tree = CommandTree::<Sender>::new();
        let mut ctx = CommandContext::new(Sender::default());
        let err = tree.resolve(&mut ctx, Default::default()).unwrap_err();
        assert!(matches!(err, CommandError::EmptyInput));
    }
}
