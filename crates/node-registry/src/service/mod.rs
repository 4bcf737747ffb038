//! # Registry Service
//!
//! The message-dispatch and node-lifecycle engine.
//!
//! ## Architecture
//!
//! This service:
//! 1. Implements `MessageDispatchApi` (topic routing, `dispatcher.rs`)
//! 2. Reconciles presentations against the node directory (`presentation.rs`)
//! 3. Routes telemetry to the per-type store (`data.rs`)
//! 4. Derives and publishes per-node options (`options.rs`)
//!
//! All collaborators are injected through `RegistryDependencies`; the
//! service holds no other state, so every decision is re-derived from
//! storage.

mod data;
mod dispatcher;
mod options;
mod presentation;

use crate::domain::errors::{RegistryError, RepositoryError};
use crate::domain::outcome::Discard;
use crate::domain::payloads::FieldError;
use crate::ports::outbound::{
    Clock, NodeDirectory, OptionsPublisher, OptionsStore, TelemetryStore, TypeRegistry,
};
use shared_types::PublishError;

/// The Registry Service.
pub struct RegistryService<ND, TR, OS, TS, P, C>
where
    ND: NodeDirectory,
    TR: TypeRegistry,
    OS: OptionsStore,
    TS: TelemetryStore,
    P: OptionsPublisher,
    C: Clock,
{
    pub(crate) directory: ND,
    pub(crate) types: TR,
    pub(crate) options: OS,
    pub(crate) telemetry: TS,
    pub(crate) publisher: P,
    pub(crate) clock: C,
}

/// Dependencies for RegistryService
pub struct RegistryDependencies<ND, TR, OS, TS, P, C> {
    pub directory: ND,
    pub types: TR,
    pub options: OS,
    pub telemetry: TS,
    pub publisher: P,
    pub clock: C,
}

impl<ND, TR, OS, TS, P, C> RegistryService<ND, TR, OS, TS, P, C>
where
    ND: NodeDirectory,
    TR: TypeRegistry,
    OS: OptionsStore,
    TS: TelemetryStore,
    P: OptionsPublisher,
    C: Clock,
{
    pub fn new(deps: RegistryDependencies<ND, TR, OS, TS, P, C>) -> Self {
        Self {
            directory: deps.directory,
            types: deps.types,
            options: deps.options,
            telemetry: deps.telemetry,
            publisher: deps.publisher,
            clock: deps.clock,
        }
    }

    pub fn directory(&self) -> &ND {
        &self.directory
    }

    pub fn types(&self) -> &TR {
        &self.types
    }

    pub fn options_store(&self) -> &OS {
        &self.options
    }

    pub fn telemetry_store(&self) -> &TS {
        &self.telemetry
    }

    pub fn publisher(&self) -> &P {
        &self.publisher
    }
}

/// Internal result of a handler step.
///
/// Lets handlers use `?` for both rejections and faults; the dispatcher
/// splits them back apart at the API boundary.
#[derive(Debug)]
pub(crate) enum HandlerError {
    Discard(Discard),
    Fault(RegistryError),
}

pub(crate) type HandlerResult<T> = Result<T, HandlerError>;

impl From<Discard> for HandlerError {
    fn from(discard: Discard) -> Self {
        HandlerError::Discard(discard)
    }
}

impl From<FieldError> for HandlerError {
    fn from(error: FieldError) -> Self {
        HandlerError::Discard(Discard::MissingField(error))
    }
}

impl From<RegistryError> for HandlerError {
    fn from(error: RegistryError) -> Self {
        HandlerError::Fault(error)
    }
}

impl From<RepositoryError> for HandlerError {
    fn from(error: RepositoryError) -> Self {
        HandlerError::Fault(RegistryError::Repository(error))
    }
}

impl From<PublishError> for HandlerError {
    fn from(error: PublishError) -> Self {
        HandlerError::Fault(RegistryError::Publish(error))
    }
}

impl From<serde_json::Error> for HandlerError {
    fn from(error: serde_json::Error) -> Self {
        HandlerError::Fault(RegistryError::Serialization(error))
    }
}
