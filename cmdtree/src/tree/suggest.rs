//! Suggestion generation
//!
//! Complete tokens are walked like resolution, except that every matching
//! branch is followed instead of the first. The last, partial token is
//! completed by every child reachable at that depth.

use super::{CommandTree, NodeId, NodeKind};
use crate::arguments::CommandInput;
use crate::context::CommandContext;

impl<S> CommandTree<S> {
    /// Completions for the last token of `tokens`
    ///
    /// `tokens` is the split input; a trailing empty token asks for
    /// completions of the next position. Results are deduplicated and keep
    /// tree order.
    pub fn suggest(&self, ctx: &mut CommandContext<S>, tokens: &[String]) -> Vec<String> {
        let Some((partial, complete)) = tokens.split_last() else {
            return Vec::new();
        };
        let mut input: CommandInput = complete.iter().cloned().collect();
        let mut out = Vec::new();
        let mark = ctx.mark();
        self.suggest_below(self.root(), ctx, &mut input, partial, &mut out);
        ctx.rewind(mark);

        tracing::trace!(partial = %partial, count = out.len(), "Suggestions generated");
        out
    }

    fn suggest_below(
        &self,
        id: NodeId,
        ctx: &mut CommandContext<S>,
        input: &mut CommandInput,
        partial: &str,
        out: &mut Vec<String>,
    ) {
        for &child_id in self.children(id) {
            let child = self.node(child_id);
            if !child.permits(ctx.sender()) {
                continue;
            }

            if input.is_empty() {
                match &child.kind {
                    NodeKind::Literal { .. } => {
                        let folded = self.fold(partial);
                        let names = child
                            .names()
                            .filter(|name| self.fold(name).starts_with(folded.as_ref()));
                        push_unique(out, names.map(str::to_string));
                    }
                    NodeKind::Argument(argument) => {
                        push_unique(out, argument.parser().suggestions(ctx, partial));
                    }
                    NodeKind::Root => {}
                }
                continue;
            }

            let snapshot = input.clone();
            let mark = ctx.mark();
            let matched = match &child.kind {
                NodeKind::Literal { .. } => match input.front() {
                    Some(token) if self.literal_matches(child, token) => {
                        input.pop_front();
                        true
                    }
                    _ => false,
                },
                NodeKind::Argument(argument) => match argument.parser().parse_value(ctx, input) {
                    Ok(value) => {
                        ctx.bind(argument.name(), value);
                        true
                    }
                    Err(_) => false,
                },
                NodeKind::Root => false,
            };
            if matched {
                self.suggest_below(child_id, ctx, input, partial, out);
            }
            *input = snapshot;
            ctx.rewind(mark);
        }
    }
}

fn push_unique(out: &mut Vec<String>, candidates: impl IntoIterator<Item = String>) {
    for candidate in candidates {
        if !out.contains(&candidate) {
            out.push(candidate);
        }
    }
}
