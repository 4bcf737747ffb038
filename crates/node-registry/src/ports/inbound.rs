//! # Inbound Ports (Driving Ports)
//!
//! The API the ingest loop calls once per inbound message.

use crate::domain::entities::{NodeId, TypeId};
use crate::domain::errors::RegistryError;
use crate::domain::outcome::DispatchOutcome;
use crate::domain::payloads::OptionsPayload;
use shared_types::TransportMessage;
use tracing::info_span;

/// Message dispatch and node lifecycle reconciliation.
///
/// Calls are strictly sequential: the caller does not deliver the next
/// message before `dispatch` returns.
pub trait MessageDispatchApi {
    /// Route one inbound message to its handler.
    ///
    /// ## Errors
    ///
    /// Only collaborator faults are errors. Rejected messages come back as
    /// `Ok(DispatchOutcome::Discarded(_))`.
    fn dispatch(&mut self, topic: &str, payload: &[u8]) -> Result<DispatchOutcome, RegistryError>;

    /// The options payload currently stored for a node, if exactly one exists.
    ///
    /// ## Errors
    ///
    /// - `Repository`: the options store failed
    fn current_options(
        &self,
        node_id: NodeId,
        type_id: TypeId,
    ) -> Result<Option<OptionsPayload>, RegistryError>;

    /// Dispatch a transport message inside a span carrying its topic and id.
    fn dispatch_message(
        &mut self,
        message: &TransportMessage,
    ) -> Result<DispatchOutcome, RegistryError> {
        let span = info_span!("dispatch", topic = %message.topic, message_id = %message.id);
        let _guard = span.enter();
        self.dispatch(&message.topic, &message.payload)
    }
}
