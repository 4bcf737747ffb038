//! Options Provider: reads the stored options of a node and publishes them
//! to `options/<address>`.

use super::{HandlerError, HandlerResult, RegistryService};
use crate::domain::entities::{NodeId, TypeId};
use crate::domain::identifier::HardwareAddress;
use crate::domain::node_type::NodeType;
use crate::domain::outcome::Discard;
use crate::domain::payloads::OptionsPayload;
use crate::ports::outbound::{
    Clock, NodeDirectory, OptionsPublisher, OptionsStore, TelemetryStore, TypeRegistry,
};
use shared_types::options_topic;

impl<ND, TR, OS, TS, P, C> RegistryService<ND, TR, OS, TS, P, C>
where
    ND: NodeDirectory,
    TR: TypeRegistry,
    OS: OptionsStore,
    TS: TelemetryStore,
    P: OptionsPublisher,
    C: Clock,
{
    /// Look up the single options record of a node.
    ///
    /// An unknown type or a record count other than one is a `Discard` the
    /// caller turns into "no options".
    pub(crate) fn lookup_options(
        &self,
        node_id: NodeId,
        type_id: TypeId,
    ) -> HandlerResult<Option<OptionsPayload>> {
        let node_type =
            NodeType::from_id(type_id).ok_or(Discard::UnsupportedType { type_id })?;

        let records = self.options.find_options(node_id, node_type)?;
        if records.len() != 1 {
            tracing::warn!(
                node_id = %node_id,
                node_type = %node_type,
                found = records.len(),
                "[registry] Expected exactly one options record"
            );
            return Ok(None);
        }

        Ok(records
            .first()
            .map(|record| OptionsPayload::from_options(&record.options)))
    }

    /// Publish the node's options if they exist. Returns whether a publish
    /// was attempted.
    pub(crate) fn publish_options(
        &self,
        address: &HardwareAddress,
        node_id: NodeId,
        type_id: TypeId,
    ) -> HandlerResult<bool> {
        let payload = match self.lookup_options(node_id, type_id) {
            Ok(Some(payload)) => payload,
            Ok(None) => return Ok(false),
            Err(HandlerError::Discard(discard)) => {
                tracing::warn!(node_id = %node_id, reason = %discard, "[registry] No options to publish");
                return Ok(false);
            }
            Err(fault) => return Err(fault),
        };

        let topic = options_topic(address.as_str());
        self.publisher.publish(&topic, payload.to_bytes()?)?;

        tracing::info!(topic = %topic, node_id = %node_id, "[registry] Options published");
        Ok(true)
    }
}
