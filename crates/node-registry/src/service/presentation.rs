//! Presentation Reconciler.
//!
//! | State     | Directory records | Action                                   |
//! |-----------|-------------------|------------------------------------------|
//! | Absent    | 0                 | register node + options, no publish      |
//! | Present   | 1                 | update if diverged, then publish options |
//! | Duplicate | 2+                | reject, no mutation, no publish          |

use super::{HandlerResult, RegistryService};
use crate::domain::entities::{NewNode, NodeRecord, OptionsRecord, TypeId};
use crate::domain::identifier::HardwareAddress;
use crate::domain::lifecycle::NodeState;
use crate::domain::node_type::NodeType;
use crate::domain::outcome::{Discard, DispatchOutcome};
use crate::domain::payloads::{Document, Presentation};
use crate::ports::outbound::{
    Clock, NodeDirectory, OptionsPublisher, OptionsStore, TelemetryStore, TypeRegistry,
};
use std::net::IpAddr;

impl<ND, TR, OS, TS, P, C> RegistryService<ND, TR, OS, TS, P, C>
where
    ND: NodeDirectory,
    TR: TypeRegistry,
    OS: OptionsStore,
    TS: TelemetryStore,
    P: OptionsPublisher,
    C: Clock,
{
    pub(crate) fn handle_presentation(
        &mut self,
        address: &HardwareAddress,
        document: &Document,
    ) -> HandlerResult<DispatchOutcome> {
        let Presentation {
            network_address,
            node_type,
        } = Presentation::from_document(document, address)?;

        match NodeState::from_records(self.directory.find_by_address(address)?) {
            NodeState::Absent => {
                self.register(address, network_address, node_type, document)
            }
            NodeState::Present(record) => {
                self.reconcile(address, record, network_address, node_type)
            }
            NodeState::Duplicate(count) => Err(Discard::DuplicateNode { count }.into()),
        }
    }

    fn require_known_type(&self, type_id: TypeId) -> HandlerResult<()> {
        if self.types.find_by_id(type_id)?.len() != 1 {
            return Err(Discard::UnknownType { type_id }.into());
        }
        Ok(())
    }

    fn register(
        &mut self,
        address: &HardwareAddress,
        network_address: IpAddr,
        type_id: TypeId,
        document: &Document,
    ) -> HandlerResult<DispatchOutcome> {
        self.require_known_type(type_id)?;

        let node = NewNode {
            hardware_address: address.clone(),
            type_id,
            network_address,
        };
        let inserted = self.directory.insert(&node)?;
        if inserted.affected != 1 {
            return Err(Discard::InsertFailed {
                affected: inserted.affected,
            }
            .into());
        }

        // The assigned id is read back rather than trusted from the insert.
        let record = match NodeState::from_records(self.directory.find_by_address(address)?) {
            NodeState::Present(record) => record,
            NodeState::Absent => return Err(Discard::InsertNotVisible { found: 0 }.into()),
            NodeState::Duplicate(found) => return Err(Discard::InsertNotVisible { found }.into()),
        };

        let options_created = self.create_options(&record, document)?;

        Ok(DispatchOutcome::Registered {
            node_id: record.id,
            options_created,
        })
    }

    /// Store the initial options of a new node. The node stays registered
    /// when this fails.
    fn create_options(&mut self, record: &NodeRecord, document: &Document) -> HandlerResult<bool> {
        let Some(node_type) = NodeType::from_id(record.type_id) else {
            tracing::warn!(
                node_id = %record.id,
                type_id = %record.type_id,
                "[registry] Node type has no options schema"
            );
            return Ok(false);
        };

        let options = match node_type.options_from_presentation(document) {
            Ok(options) => options,
            Err(error) => {
                tracing::error!(
                    node_id = %record.id,
                    reason = %Discard::MissingField(error),
                    "[registry] Options NOT created"
                );
                return Ok(false);
            }
        };

        let affected = self.options.insert_options(&OptionsRecord {
            node_id: record.id,
            options,
        })?;
        if affected != 1 {
            tracing::error!(node_id = %record.id, affected, "[registry] Options NOT inserted");
            return Ok(false);
        }
        Ok(true)
    }

    fn reconcile(
        &mut self,
        address: &HardwareAddress,
        record: NodeRecord,
        network_address: IpAddr,
        type_id: TypeId,
    ) -> HandlerResult<DispatchOutcome> {
        let updated = if record.matches_declaration(network_address, type_id) {
            false
        } else {
            self.require_known_type(type_id)?;

            let affected = self.directory.update(address, type_id, network_address)?;
            if affected != 1 {
                return Err(Discard::UpdateFailed { affected }.into());
            }
            tracing::info!(
                hardware_address = %address,
                node_id = %record.id,
                previous_ip = %record.network_address,
                ip = %network_address,
                previous_type = %record.type_id,
                type_id = %type_id,
                "[registry] Node updated"
            );
            true
        };

        let options_published = self.publish_options(address, record.id, type_id)?;

        Ok(DispatchOutcome::Reconciled {
            node_id: record.id,
            updated,
            options_published,
        })
    }
}
