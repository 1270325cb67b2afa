//! Command tree
//!
//! Nodes live in one arena and refer to each other by [`NodeId`]. Index 0 is
//! a hidden root whose children are the root literals of every command.
//!
//! Insertion runs a validation pass over the whole command before touching
//! the arena, so a rejected command leaves the tree exactly as it was.

mod resolve;
mod suggest;

use std::borrow::Cow;
use std::sync::Arc;

use crate::arguments::{compare_components, CommandArgument};
use crate::command::{Command, CommandComponent};
use crate::error::TreeError;
use crate::permission::CommandPermission;
use crate::settings::{AmbiguityPolicy, ManagerSettings};

/// Index of a node in the tree arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// Index of a command registered in the tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CommandId(usize);

pub(crate) enum NodeKind<S> {
    Root,
    Literal { name: String, aliases: Vec<String> },
    Argument(CommandArgument<S>),
}

pub(crate) struct Node<S> {
    kind: NodeKind<S>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    /// OR of the permissions of every command through this node; `None` is unrestricted
    permission: Option<CommandPermission<S>>,
    command: Option<CommandId>,
}

impl<S> Node<S> {
    fn literal_name(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Literal { name, .. } => Some(name),
            _ => None,
        }
    }

    fn argument(&self) -> Option<&CommandArgument<S>> {
        match &self.kind {
            NodeKind::Argument(argument) => Some(argument),
            _ => None,
        }
    }

    fn names(&self) -> impl Iterator<Item = &str> {
        let (name, aliases): (Option<&str>, &[String]) = match &self.kind {
            NodeKind::Literal { name, aliases } => (Some(name.as_str()), aliases.as_slice()),
            _ => (None, &[][..]),
        };
        name.into_iter().chain(aliases.iter().map(String::as_str))
    }

    fn syntax(&self) -> String {
        match &self.kind {
            NodeKind::Root => String::new(),
            NodeKind::Literal { name, .. } => name.clone(),
            NodeKind::Argument(argument) => argument.syntax(),
        }
    }

    fn permits(&self, sender: &S) -> bool {
        self.permission
            .as_ref()
            .map_or(true, |permission| permission.has_permission(sender))
    }
}

/// Where each component of a command being inserted will go
enum Placement {
    Existing(NodeId),
    New,
}

struct InsertPlan {
    placements: Vec<Placement>,
    aliases: Vec<(NodeId, Vec<String>)>,
}

/// Arena-backed command tree
pub struct CommandTree<S> {
    nodes: Vec<Node<S>>,
    commands: Vec<Arc<Command<S>>>,
    case_sensitive: bool,
    policy: AmbiguityPolicy,
}

impl<S> Default for CommandTree<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> std::fmt::Debug for CommandTree<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandTree")
            .field("nodes", &self.nodes.len())
            .field("commands", &self.commands)
            .field("case_sensitive", &self.case_sensitive)
            .field("policy", &self.policy)
            .finish()
    }
}

impl<S> CommandTree<S> {
    /// Empty tree with case-sensitive literals and literal precedence
    pub fn new() -> Self {
        Self::with_options(true, AmbiguityPolicy::default())
    }

    /// Empty tree with explicit matching options
    pub fn with_options(case_sensitive: bool, policy: AmbiguityPolicy) -> Self {
        let root = Node {
            kind: NodeKind::Root,
            parent: None,
            children: Vec::new(),
            permission: None,
            command: None,
        };
        Self {
            nodes: vec![root],
            commands: Vec::new(),
            case_sensitive,
            policy,
        }
    }

    /// Empty tree configured from manager settings
    pub fn from_settings(settings: &ManagerSettings) -> Self {
        Self::with_options(settings.case_sensitive, settings.ambiguity_policy)
    }

    /// Ambiguity policy in force
    pub fn policy(&self) -> AmbiguityPolicy {
        self.policy
    }

    /// Whether literals are matched case-sensitively
    pub fn is_case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    /// Number of registered commands
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Whether no command is registered
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Number of nodes, the hidden root excluded
    pub fn node_count(&self) -> usize {
        self.nodes.len() - 1
    }

    /// Registered commands in insertion order
    pub fn commands(&self) -> impl Iterator<Item = &Arc<Command<S>>> {
        self.commands.iter()
    }

    /// Command registered under `id`
    pub fn command(&self, id: CommandId) -> Option<&Arc<Command<S>>> {
        self.commands.get(id.0)
    }

    /// Names of the root literals
    pub fn root_names(&self) -> Vec<&str> {
        self.children(self.root())
            .iter()
            .filter_map(|&child| self.node(child).literal_name())
            .collect()
    }

    pub(crate) fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub(crate) fn node(&self, id: NodeId) -> &Node<S> {
        &self.nodes[id.0]
    }

    pub(crate) fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    fn fold<'a>(&self, text: &'a str) -> Cow<'a, str> {
        if self.case_sensitive {
            Cow::Borrowed(text)
        } else {
            Cow::Owned(text.to_ascii_lowercase())
        }
    }

    pub(crate) fn literal_matches(&self, node: &Node<S>, token: &str) -> bool {
        let token = self.fold(token);
        node.names().any(|name| self.fold(name) == token)
    }

    /// Syntax of the path from the root to `id`
    pub(crate) fn path(&self, id: NodeId) -> String {
        let mut parts = Vec::new();
        let mut current = Some(id);
        while let Some(node_id) = current {
            let node = self.node(node_id);
            if !matches!(node.kind, NodeKind::Root) {
                parts.push(node.syntax());
            }
            current = node.parent;
        }
        parts.reverse();
        parts.join(" ")
    }

    /// Usage string for input that stopped at `id`
    ///
    /// The owning command's syntax when exactly one command is reachable,
    /// otherwise the path followed by the alternatives, e.g. `group one|two`.
    pub(crate) fn usage(&self, id: NodeId) -> String {
        if let Some(command) = self.node(id).command.and_then(|c| self.command(c)) {
            return command.syntax();
        }
        let mut reachable = Vec::new();
        self.collect_commands(id, &mut reachable);
        if let [only] = reachable.as_slice() {
            if let Some(command) = self.command(*only) {
                return command.syntax();
            }
        }

        let alternatives = self
            .children(id)
            .iter()
            .map(|&child| self.node(child).syntax())
            .collect::<Vec<_>>()
            .join("|");
        let path = self.path(id);
        if path.is_empty() {
            alternatives
        } else {
            format!("{} {}", path, alternatives)
        }
    }

    fn collect_commands(&self, id: NodeId, out: &mut Vec<CommandId>) {
        let node = self.node(id);
        out.extend(node.command);
        for &child in &node.children {
            self.collect_commands(child, out);
        }
    }

    // ========================================================================
    // Insertion
    // ========================================================================

    /// Insert a command
    ///
    /// Fails without modifying the tree when the command duplicates an
    /// existing path, collides with a sibling literal, or introduces an
    /// ambiguity the policy does not allow.
    pub fn insert(&mut self, command: Command<S>) -> Result<CommandId, TreeError> {
        crate::command::validate_components(command.components())?;
        let plan = self.plan(&command)?;

        let id = CommandId(self.commands.len());
        let permission = command.permission().cloned();
        let mut parent = self.root();
        for (component, placement) in command.components().iter().zip(&plan.placements) {
            parent = match placement {
                Placement::Existing(node) => {
                    self.widen_permission(*node, permission.as_ref());
                    *node
                }
                Placement::New => self.attach(parent, component, permission.clone()),
            };
        }
        for (node, aliases) in plan.aliases {
            if let NodeKind::Literal { aliases: existing, .. } = &mut self.nodes[node.0].kind {
                existing.extend(aliases);
            }
        }
        self.nodes[parent.0].command = Some(id);

        tracing::info!(
            command = %command.syntax(),
            permission = ?command.permission().map(ToString::to_string),
            "Command registered"
        );
        self.commands.push(Arc::new(command));
        Ok(id)
    }

    fn plan(&self, command: &Command<S>) -> Result<InsertPlan, TreeError> {
        let mut placements = Vec::with_capacity(command.components().len());
        let mut aliases = Vec::new();
        let mut parent = Some(self.root());

        for component in command.components() {
            let Some(parent_id) = parent else {
                placements.push(Placement::New);
                continue;
            };
            match self.find_existing(parent_id, component)? {
                Some((node, extra_aliases)) => {
                    if !extra_aliases.is_empty() {
                        aliases.push((node, extra_aliases));
                    }
                    placements.push(Placement::Existing(node));
                    parent = Some(node);
                }
                None => {
                    self.check_new_sibling(parent_id, component)?;
                    placements.push(Placement::New);
                    parent = None;
                }
            }
        }

        if let Some(terminal) = parent {
            if self.node(terminal).command.is_some() {
                return Err(TreeError::DuplicateCommand(command.syntax()));
            }
        }
        Ok(InsertPlan {
            placements,
            aliases,
        })
    }

    /// Existing child of `parent` that `component` maps onto, with aliases to merge
    fn find_existing(
        &self,
        parent: NodeId,
        component: &CommandComponent<S>,
    ) -> Result<Option<(NodeId, Vec<String>)>, TreeError> {
        match component {
            CommandComponent::Literal { name, aliases } => {
                let folded = self.fold(name);
                let Some(existing) = self.children(parent).iter().copied().find(|&child| {
                    self.node(child)
                        .literal_name()
                        .is_some_and(|existing| self.fold(existing) == folded)
                }) else {
                    return Ok(None);
                };

                let mut merged = Vec::new();
                for alias in aliases {
                    if self.literal_matches(self.node(existing), alias)
                        || merged.iter().any(|m: &String| self.fold(m) == self.fold(alias))
                    {
                        continue;
                    }
                    if self.name_taken(parent, alias, Some(existing)) {
                        return Err(TreeError::LiteralCollision {
                            parent: self.parent_label(parent),
                            name: alias.clone(),
                        });
                    }
                    merged.push(alias.clone());
                }
                Ok(Some((existing, merged)))
            }
            CommandComponent::Argument(argument) => Ok(self
                .children(parent)
                .iter()
                .copied()
                .find(|&child| self.node(child).argument() == Some(argument))
                .map(|child| (child, Vec::new()))),
        }
    }

    fn name_taken(&self, parent: NodeId, name: &str, except: Option<NodeId>) -> bool {
        self.children(parent)
            .iter()
            .filter(|&&child| Some(child) != except)
            .any(|&child| self.literal_matches(self.node(child), name))
    }

    fn parent_label(&self, parent: NodeId) -> String {
        let path = self.path(parent);
        if path.is_empty() {
            "<root>".to_string()
        } else {
            path
        }
    }

    fn check_new_sibling(&self, parent: NodeId, component: &CommandComponent<S>) -> Result<(), TreeError> {
        let siblings = self.children(parent);
        match component {
            CommandComponent::Literal { name, aliases } => {
                let mut seen: Vec<Cow<'_, str>> = Vec::new();
                for literal in std::iter::once(name).chain(aliases) {
                    let folded = self.fold(literal);
                    if self.name_taken(parent, literal, None) || seen.contains(&folded) {
                        return Err(TreeError::LiteralCollision {
                            parent: self.parent_label(parent),
                            name: literal.clone(),
                        });
                    }
                    seen.push(folded);
                }
                if self.policy == AmbiguityPolicy::Strict {
                    if let Some(&argument) = siblings.iter().find(|&&s| self.node(s).argument().is_some()) {
                        return Err(self.ambiguity(parent, argument, component));
                    }
                }
            }
            CommandComponent::Argument(_) => {
                let conflict = match self.policy {
                    AmbiguityPolicy::Strict => siblings.first(),
                    AmbiguityPolicy::LiteralPrecedence => siblings
                        .iter()
                        .find(|&&s| self.node(s).argument().is_some()),
                    AmbiguityPolicy::Permissive => None,
                };
                if let Some(&existing) = conflict {
                    return Err(self.ambiguity(parent, existing, component));
                }
            }
        }
        Ok(())
    }

    fn ambiguity(&self, parent: NodeId, existing: NodeId, new: &CommandComponent<S>) -> TreeError {
        TreeError::AmbiguousPath {
            parent: self.parent_label(parent),
            existing: self.node(existing).syntax(),
            new: new.syntax(),
        }
    }

    fn attach(
        &mut self,
        parent: NodeId,
        component: &CommandComponent<S>,
        permission: Option<CommandPermission<S>>,
    ) -> NodeId {
        let kind = match component {
            CommandComponent::Literal { name, aliases } => NodeKind::Literal {
                name: name.clone(),
                aliases: aliases.clone(),
            },
            CommandComponent::Argument(argument) => NodeKind::Argument(argument.clone()),
        };
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            kind,
            parent: Some(parent),
            children: Vec::new(),
            permission,
            command: None,
        });

        let mut children = std::mem::take(&mut self.nodes[parent.0].children);
        children.push(id);
        children.sort_by(|&a, &b| {
            compare_components(self.node(a).literal_name(), self.node(b).literal_name())
        });
        self.nodes[parent.0].children = children;

        tracing::trace!(node = id.0, parent = parent.0, syntax = %component.syntax(), "Node created");
        id
    }

    fn widen_permission(&mut self, id: NodeId, permission: Option<&CommandPermission<S>>) {
        let node = &mut self.nodes[id.0];
        node.permission = match (node.permission.take(), permission) {
            (Some(existing), Some(added)) => Some(existing.or(added.clone())),
            _ => None,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arguments::standard::{IntegerParser, StringParser};
    use crate::context::CommandContext;

    fn ok(_: &mut CommandContext<()>) -> anyhow::Result<()> {
        Ok(())
    }

    fn literal(path: &[&str]) -> Command<()> {
        let (root, rest) = path.split_first().unwrap();
        rest.iter()
            .fold(Command::builder(*root), |builder, name| builder.literal(*name))
            .handler(ok)
            .build()
            .unwrap()
    }

    fn with_argument(root: &str, name: &str) -> Command<()> {
        Command::builder(root)
            .required(name, StringParser::single())
            .handler(ok)
            .build()
            .unwrap()
    }

    #[test]
    fn test_shared_prefix_reuses_nodes() {
        let mut tree = CommandTree::new();
        tree.insert(literal(&["group", "one"])).unwrap();
        tree.insert(literal(&["group", "two"])).unwrap();

        assert_eq!(tree.len(), 2);
        assert_eq!(tree.node_count(), 3);
        assert_eq!(tree.root_names(), vec!["group"]);
    }

    #[test]
    fn test_duplicate_is_rejected_without_mutation() {
        let mut tree = CommandTree::new();
        tree.insert(literal(&["group", "one"])).unwrap();
        let nodes = tree.node_count();

        let err = tree.insert(literal(&["group", "one"])).unwrap_err();
        assert_eq!(err, TreeError::DuplicateCommand("group one".into()));
        assert_eq!(tree.node_count(), nodes);
        assert_eq!(tree.len(), 1);

        tree.insert(literal(&["group", "two"])).unwrap();
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn test_rejected_insert_leaves_no_partial_nodes() {
        let mut tree = CommandTree::with_options(true, AmbiguityPolicy::LiteralPrecedence);
        tree.insert(with_argument("give", "target")).unwrap();
        let nodes = tree.node_count();

        let command = Command::builder("give")
            .required("item", IntegerParser::new())
            .literal("now")
            .handler(ok)
            .build()
            .unwrap();
        assert!(matches!(
            tree.insert(command).unwrap_err(),
            TreeError::AmbiguousPath { .. }
        ));
        assert_eq!(tree.node_count(), nodes);
    }

    #[test]
    fn test_literal_precedence_policy() {
        let mut tree = CommandTree::new();
        tree.insert(literal(&["give", "all"])).unwrap();
        tree.insert(with_argument("give", "target")).unwrap();

        let err = tree.insert(with_argument("give", "other")).unwrap_err();
        assert_eq!(
            err,
            TreeError::AmbiguousPath {
                parent: "give".into(),
                existing: "<target>".into(),
                new: "<other>".into(),
            }
        );
    }

    #[test]
    fn test_strict_policy() {
        let mut tree = CommandTree::with_options(true, AmbiguityPolicy::Strict);
        tree.insert(literal(&["give", "all"])).unwrap();
        assert!(matches!(
            tree.insert(with_argument("give", "target")).unwrap_err(),
            TreeError::AmbiguousPath { .. }
        ));

        let mut tree = CommandTree::with_options(true, AmbiguityPolicy::Strict);
        tree.insert(with_argument("give", "target")).unwrap();
        assert!(matches!(
            tree.insert(literal(&["give", "all"])).unwrap_err(),
            TreeError::AmbiguousPath { .. }
        ));
    }

    #[test]
    fn test_permissive_policy() {
        let mut tree = CommandTree::with_options(true, AmbiguityPolicy::Permissive);
        tree.insert(with_argument("give", "target")).unwrap();
        tree.insert(with_argument("give", "other")).unwrap();
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn test_same_argument_is_shared() {
        let mut tree = CommandTree::with_options(true, AmbiguityPolicy::Strict);
        tree.insert(with_argument("give", "target")).unwrap();
        let command = Command::builder("give")
            .required("target", StringParser::single())
            .literal("now")
            .handler(ok)
            .build()
            .unwrap();
        tree.insert(command).unwrap();
        assert_eq!(tree.node_count(), 3);
    }

    #[test]
    fn test_alias_collisions() {
        let mut tree = CommandTree::new();
        tree.insert(
            Command::builder("teleport")
                .alias("tp")
                .handler(ok)
                .build()
                .unwrap(),
        )
        .unwrap();

        let err = tree.insert(literal(&["tp"])).unwrap_err();
        assert_eq!(
            err,
            TreeError::LiteralCollision {
                parent: "<root>".into(),
                name: "tp".into(),
            }
        );

        let err = tree
            .insert(Command::builder("trade").alias("teleport").handler(ok).build().unwrap())
            .unwrap_err();
        assert!(matches!(err, TreeError::LiteralCollision { .. }));
    }

    #[test]
    fn test_aliases_merge_on_shared_literal() {
        let mut tree = CommandTree::new();
        tree.insert(
            Command::builder("teleport")
                .alias("tp")
                .literal("here")
                .handler(ok)
                .build()
                .unwrap(),
        )
        .unwrap();
        tree.insert(
            Command::builder("teleport")
                .alias("tele")
                .literal("back")
                .handler(ok)
                .build()
                .unwrap(),
        )
        .unwrap();

        let root = tree.children(tree.root())[0];
        let names: Vec<_> = tree.node(root).names().collect();
        assert_eq!(names, vec!["teleport", "tp", "tele"]);
    }

    #[test]
    fn test_case_insensitive_collision() {
        let mut tree = CommandTree::with_options(false, AmbiguityPolicy::default());
        tree.insert(literal(&["Reload"])).unwrap();
        let err = tree.insert(literal(&["reload"])).unwrap_err();
        assert_eq!(err, TreeError::DuplicateCommand("reload".into()));
    }

    #[test]
    fn test_children_keep_literals_first() {
        let mut tree = CommandTree::with_options(true, AmbiguityPolicy::Permissive);
        tree.insert(with_argument("give", "target")).unwrap();
        tree.insert(literal(&["give", "zeta"])).unwrap();
        tree.insert(literal(&["give", "alpha"])).unwrap();

        let give = tree.children(tree.root())[0];
        let order: Vec<_> = tree
            .children(give)
            .iter()
            .map(|&child| tree.node(child).syntax())
            .collect();
        assert_eq!(order, vec!["alpha", "zeta", "<target>"]);
    }

    #[test]
    fn test_usage_and_path() {
        let mut tree = CommandTree::new();
        tree.insert(literal(&["group", "one"])).unwrap();
        tree.insert(literal(&["group", "two"])).unwrap();

        let group = tree.children(tree.root())[0];
        assert_eq!(tree.path(group), "group");
        assert_eq!(tree.usage(group), "group one|two");
    }
}
