//! Service registry and pipeline execution
//!
//! Services are grouped by their `(input, output)` type pair. Within a group
//! they run in ascending priority, ties broken by registration order.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use crate::error::{PipelineError, DEFAULT_HANDLER_STAGE};
use crate::service::{Service, ServiceResult};

type RepositoryKey = (TypeId, TypeId);

/// Registration details of one service, for introspection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceDescriptor {
    /// Service name
    pub name: String,
    /// Priority (lower runs first)
    pub priority: i32,
    /// Registration sequence number, used to break priority ties
    pub sequence: u64,
}

struct ServiceEntry<I, O> {
    descriptor: ServiceDescriptor,
    service: Arc<dyn Service<I, O>>,
}

impl<I, O> Clone for ServiceEntry<I, O> {
    fn clone(&self) -> Self {
        Self {
            descriptor: self.descriptor.clone(),
            service: Arc::clone(&self.service),
        }
    }
}

struct ServiceRepository<I, O> {
    entries: Vec<ServiceEntry<I, O>>,
}

impl<I, O> ServiceRepository<I, O> {
    fn insert(&mut self, entry: ServiceEntry<I, O>) {
        self.entries.push(entry);
        self.entries
            .sort_by_key(|e| (e.descriptor.priority, e.descriptor.sequence));
    }
}

/// A thread-safe registry of service chains
///
/// Registration and pumping may happen from different threads. A pump works
/// on a snapshot of the chain taken when it starts.
#[derive(Default)]
pub struct ServicePipeline {
    repositories: RwLock<HashMap<RepositoryKey, Box<dyn Any + Send + Sync>>>,
    sequence: AtomicU64,
}

impl std::fmt::Debug for ServicePipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let groups = self
            .repositories
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len();
        f.debug_struct("ServicePipeline")
            .field("groups", &groups)
            .finish_non_exhaustive()
    }
}

impl ServicePipeline {
    /// Create an empty pipeline
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a service, naming it after its type
    pub fn register<I, O, T>(&self, priority: i32, service: T) -> &Self
    where
        I: 'static,
        O: 'static,
        T: Service<I, O> + 'static,
    {
        self.register_named(std::any::type_name::<T>(), priority, service)
    }

    /// Register a service under an explicit name
    pub fn register_named<I, O, T>(&self, name: impl Into<String>, priority: i32, service: T) -> &Self
    where
        I: 'static,
        O: 'static,
        T: Service<I, O> + 'static,
    {
        let descriptor = ServiceDescriptor {
            name: name.into(),
            priority,
            sequence: self.sequence.fetch_add(1, Ordering::Relaxed),
        };
        tracing::debug!(
            service = %descriptor.name,
            priority,
            input = std::any::type_name::<I>(),
            output = std::any::type_name::<O>(),
            "Service registered"
        );

        let mut repositories = self
            .repositories
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let repository = repositories
            .entry((TypeId::of::<I>(), TypeId::of::<O>()))
            .or_insert_with(|| {
                Box::new(ServiceRepository::<I, O> {
                    entries: Vec::new(),
                }) as Box<dyn Any + Send + Sync>
            });
        if let Some(repository) = repository.downcast_mut::<ServiceRepository<I, O>>() {
            repository.insert(ServiceEntry {
                descriptor,
                service: Arc::new(service),
            });
        }
        self
    }

    /// Registered services for the `(I, O)` pair, in execution order
    pub fn services<I: 'static, O: 'static>(&self) -> Vec<ServiceDescriptor> {
        self.snapshot::<I, O>()
            .into_iter()
            .map(|entry| entry.descriptor)
            .collect()
    }

    /// Start a pipeline run over `input`
    pub fn pump<'a, I: 'static>(&'a self, input: &'a mut I) -> Pump<'a, I> {
        Pump {
            pipeline: self,
            input,
        }
    }

    fn snapshot<I: 'static, O: 'static>(&self) -> Vec<ServiceEntry<I, O>> {
        let repositories = self
            .repositories
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        repositories
            .get(&(TypeId::of::<I>(), TypeId::of::<O>()))
            .and_then(|repository| repository.downcast_ref::<ServiceRepository<I, O>>())
            .map(|repository| repository.entries.clone())
            .unwrap_or_default()
    }
}

/// A pending pipeline run, see [`ServicePipeline::pump`]
pub struct Pump<'a, I> {
    pipeline: &'a ServicePipeline,
    input: &'a mut I,
}

impl<'a, I: 'static> Pump<'a, I> {
    /// Run the `(I, O)` chain, falling back to `default` if no service terminates
    ///
    /// Errors and panics from any service or from `default` are reported as
    /// [`PipelineError`].
    pub fn through<O, F>(self, default: F) -> Result<O, PipelineError>
    where
        O: 'static,
        F: FnOnce(&mut I) -> anyhow::Result<O>,
    {
        let Pump { pipeline, input } = self;

        for entry in pipeline.snapshot::<I, O>() {
            let name = entry.descriptor.name.as_str();
            let outcome = catch_unwind(AssertUnwindSafe(|| entry.service.handle(input)));
            match outcome {
                Ok(Ok(ServiceResult::Terminate(output))) => {
                    tracing::trace!(service = %name, "Service terminated pipeline");
                    return Ok(output);
                }
                Ok(Ok(ServiceResult::Continue)) => {}
                Ok(Err(cause)) => {
                    tracing::warn!(service = %name, error = %cause, "Service failed");
                    return Err(PipelineError::at_stage(name, cause));
                }
                Err(payload) => {
                    tracing::warn!(service = %name, "Service panicked");
                    return Err(PipelineError::from_panic(name, payload));
                }
            }
        }

        match catch_unwind(AssertUnwindSafe(|| default(input))) {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(cause)) => {
                tracing::warn!(error = %cause, "Default handler failed");
                Err(PipelineError::at_stage(DEFAULT_HANDLER_STAGE, cause))
            }
            Err(payload) => {
                tracing::warn!("Default handler panicked");
                Err(PipelineError::from_panic(DEFAULT_HANDLER_STAGE, payload))
            }
        }
    }
}
