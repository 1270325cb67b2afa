//! Permission model
//!
//! A [`CommandPermission`] is either a predicate over the sender or an
//! AND/OR composite of other permissions. Predicates are evaluated on every
//! check; nothing is cached.

use std::fmt;
use std::sync::Arc;

type PredicateFn<S> = Arc<dyn Fn(&S) -> bool + Send + Sync>;

/// Requirement a sender must meet to use a node or command
///
/// # Example
///
/// ```rust
/// use cmdtree::CommandPermission;
///
/// struct User { admin: bool, moderator: bool }
///
/// let admin = CommandPermission::predicate("admin", |u: &User| u.admin);
/// let moderator = CommandPermission::predicate("moderator", |u: &User| u.moderator);
/// let staff = admin.or(moderator);
///
/// assert!(staff.has_permission(&User { admin: false, moderator: true }));
/// assert_eq!(staff.to_string(), "(admin | moderator)");
/// ```
pub enum CommandPermission<S> {
    /// Labelled predicate over the sender
    Predicate(String, PredicateFn<S>),
    /// Every child must grant; an empty list grants
    All(Vec<CommandPermission<S>>),
    /// Some child must grant; an empty list denies
    Any(Vec<CommandPermission<S>>),
}

impl<S> CommandPermission<S> {
    /// Permission backed by `check`
    pub fn predicate<F>(label: impl Into<String>, check: F) -> Self
    where
        F: Fn(&S) -> bool + Send + Sync + 'static,
    {
        Self::Predicate(label.into(), Arc::new(check))
    }

    /// Conjunction of `permissions`
    pub fn all(permissions: impl IntoIterator<Item = CommandPermission<S>>) -> Self {
        Self::All(permissions.into_iter().collect())
    }

    /// Disjunction of `permissions`
    pub fn any(permissions: impl IntoIterator<Item = CommandPermission<S>>) -> Self {
        Self::Any(permissions.into_iter().collect())
    }

    /// `self` AND `other`
    pub fn and(self, other: CommandPermission<S>) -> Self {
        match self {
            Self::All(mut children) => {
                children.push(other);
                Self::All(children)
            }
            this => Self::All(vec![this, other]),
        }
    }

    /// `self` OR `other`
    pub fn or(self, other: CommandPermission<S>) -> Self {
        match self {
            Self::Any(mut children) => {
                children.push(other);
                Self::Any(children)
            }
            this => Self::Any(vec![this, other]),
        }
    }

    /// Whether `sender` meets the requirement, short-circuiting left to right
    pub fn has_permission(&self, sender: &S) -> bool {
        match self {
            Self::Predicate(_, check) => check(sender),
            Self::All(children) => children.iter().all(|child| child.has_permission(sender)),
            Self::Any(children) => children.iter().any(|child| child.has_permission(sender)),
        }
    }

    /// Leaf permissions this one is built from; a predicate is its own leaf
    pub fn permissions(&self) -> Vec<&CommandPermission<S>> {
        match self {
            Self::Predicate(..) => vec![self],
            Self::All(children) | Self::Any(children) => {
                children.iter().flat_map(|child| child.permissions()).collect()
            }
        }
    }

    /// Label of a predicate, `None` for composites
    pub fn label(&self) -> Option<&str> {
        match self {
            Self::Predicate(label, _) => Some(label),
            _ => None,
        }
    }
}

impl<S> Clone for CommandPermission<S> {
    fn clone(&self) -> Self {
        match self {
            Self::Predicate(label, check) => Self::Predicate(label.clone(), Arc::clone(check)),
            Self::All(children) => Self::All(children.clone()),
            Self::Any(children) => Self::Any(children.clone()),
        }
    }
}

impl<S> fmt::Display for CommandPermission<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (children, op) = match self {
            Self::Predicate(label, _) => return f.write_str(label),
            Self::All(children) => (children, " & "),
            Self::Any(children) => (children, " | "),
        };
        f.write_str("(")?;
        for (i, child) in children.iter().enumerate() {
            if i > 0 {
                f.write_str(op)?;
            }
            write!(f, "{}", child)?;
        }
        f.write_str(")")
    }
}

impl<S> fmt::Debug for CommandPermission<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CommandPermission({})", self)
    }
}
