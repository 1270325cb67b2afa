//! cmdtree-services: priority-ordered service pipelines
//!
//! A [`ServicePipeline`] holds chains of [`Service`]s, one chain per
//! `(input, output)` type pair. Pumping an input through a chain runs the
//! services in ascending priority until one of them terminates; if none does,
//! a caller-supplied default handler produces the result.
//!
//! Declared short-circuits travel through [`ServiceResult::Terminate`].
//! Anything else that goes wrong, an `Err` from a service or a panic, comes
//! back as a single [`PipelineError`] carrying the original cause.
//!
//! ```rust
//! use cmdtree_services::{ServicePipeline, ServiceResult};
//!
//! let pipeline = ServicePipeline::new();
//! pipeline.register::<String, usize, _>(10, |input: &mut String| -> anyhow::Result<ServiceResult<usize>> {
//!     if input.is_empty() {
//!         Ok(ServiceResult::Terminate(0))
//!     } else {
//!         Ok(ServiceResult::Continue)
//!     }
//! });
//!
//! let mut input = String::from("hello");
//! let len = pipeline.pump(&mut input).through(|s| Ok(s.len())).unwrap();
//! assert_eq!(len, 5);
//! ```

pub mod error;
pub mod pipeline;
pub mod service;

pub use error::{PipelineError, DEFAULT_HANDLER_STAGE};
pub use pipeline::{Pump, ServiceDescriptor, ServicePipeline};
pub use service::{Service, ServiceResult};
