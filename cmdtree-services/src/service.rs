//! Service trait and per-service outcome

/// Outcome of a single service invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceResult<O> {
    /// Stop the chain and return this value to the caller
    Terminate(O),
    /// Hand the input to the next service in line
    Continue,
}

impl<O> ServiceResult<O> {
    /// Whether this outcome ends the chain
    pub fn is_terminal(&self) -> bool {
        matches!(self, ServiceResult::Terminate(_))
    }
}

/// An interceptor accepting `I` and possibly producing `O`
///
/// Returning `Err` is an unexpected failure and is wrapped into a
/// [`PipelineError`](crate::PipelineError) by the pipeline. Declared
/// short-circuits go through [`ServiceResult::Terminate`] instead.
///
/// # Example
///
/// ```rust
/// use cmdtree_services::{Service, ServiceResult};
///
/// struct RejectEmpty;
///
/// impl Service<String, &'static str> for RejectEmpty {
///     fn handle(&self, input: &mut String) -> anyhow::Result<ServiceResult<&'static str>> {
///         if input.is_empty() {
///             Ok(ServiceResult::Terminate("empty"))
///         } else {
///             Ok(ServiceResult::Continue)
///         }
///     }
/// }
/// ```
pub trait Service<I, O>: Send + Sync {
    /// Handle the input
    fn handle(&self, input: &mut I) -> anyhow::Result<ServiceResult<O>>;
}

impl<I, O, F> Service<I, O> for F
where
    F: Fn(&mut I) -> anyhow::Result<ServiceResult<O>> + Send + Sync,
{
    fn handle(&self, input: &mut I) -> anyhow::Result<ServiceResult<O>> {
        self(input)
    }
}
