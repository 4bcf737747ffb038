//! Data Router: resolves the owning node and appends one telemetry record.

use super::{HandlerResult, RegistryService};
use crate::domain::entities::TelemetryRecord;
use crate::domain::identifier::HardwareAddress;
use crate::domain::lifecycle::NodeState;
use crate::domain::node_type::NodeType;
use crate::domain::outcome::{Discard, DispatchOutcome};
use crate::domain::payloads::Document;
use crate::ports::outbound::{
    Clock, NodeDirectory, OptionsPublisher, OptionsStore, TelemetryStore, TypeRegistry,
};

impl<ND, TR, OS, TS, P, C> RegistryService<ND, TR, OS, TS, P, C>
where
    ND: NodeDirectory,
    TR: TypeRegistry,
    OS: OptionsStore,
    TS: TelemetryStore,
    P: OptionsPublisher,
    C: Clock,
{
    pub(crate) fn handle_data(
        &mut self,
        address: &HardwareAddress,
        document: &Document,
    ) -> HandlerResult<DispatchOutcome> {
        let record = match NodeState::from_records(self.directory.find_by_address(address)?) {
            NodeState::Present(record) => record,
            NodeState::Absent => return Err(Discard::UnknownNode.into()),
            NodeState::Duplicate(count) => return Err(Discard::DuplicateNode { count }.into()),
        };

        let node_type = NodeType::from_id(record.type_id).ok_or(Discard::UnsupportedType {
            type_id: record.type_id,
        })?;

        let reading = node_type.reading_from_payload(document)?;

        let telemetry = TelemetryRecord {
            timestamp: self.clock.now(),
            node_id: record.id,
            reading,
        };
        let appended = self.telemetry.append(&telemetry)?;
        if appended != 1 {
            tracing::warn!(node_id = %record.id, appended, "[registry] Unexpected telemetry row count");
        }

        Ok(DispatchOutcome::TelemetryStored {
            node_id: record.id,
            node_type,
        })
    }
}
