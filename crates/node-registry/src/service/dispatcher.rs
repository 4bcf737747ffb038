//! Topic routing: the `MessageDispatchApi` entry point.

use super::{HandlerError, HandlerResult, RegistryService};
use crate::domain::entities::{NodeId, TypeId};
use crate::domain::errors::RegistryError;
use crate::domain::identifier::HardwareAddress;
use crate::domain::outcome::{Discard, DispatchOutcome};
use crate::domain::payloads::{decode_document, OptionsPayload};
use crate::domain::topic::{split_topic, Category};
use crate::ports::inbound::MessageDispatchApi;
use crate::ports::outbound::{
    Clock, NodeDirectory, OptionsPublisher, OptionsStore, TelemetryStore, TypeRegistry,
};

impl<ND, TR, OS, TS, P, C> MessageDispatchApi for RegistryService<ND, TR, OS, TS, P, C>
where
    ND: NodeDirectory,
    TR: TypeRegistry,
    OS: OptionsStore,
    TS: TelemetryStore,
    P: OptionsPublisher,
    C: Clock,
{
    fn dispatch(&mut self, topic: &str, payload: &[u8]) -> Result<DispatchOutcome, RegistryError> {
        match self.route(topic, payload) {
            Ok(outcome) => {
                log_outcome(topic, &outcome);
                Ok(outcome)
            }
            Err(HandlerError::Discard(discard)) => {
                log_discard(topic, &discard);
                Ok(DispatchOutcome::Discarded(discard))
            }
            Err(HandlerError::Fault(error)) => {
                tracing::error!(topic, error = %error, "[registry] Collaborator fault");
                Err(error)
            }
        }
    }

    fn current_options(
        &self,
        node_id: NodeId,
        type_id: TypeId,
    ) -> Result<Option<OptionsPayload>, RegistryError> {
        match self.lookup_options(node_id, type_id) {
            Ok(options) => Ok(options),
            Err(HandlerError::Fault(error)) => Err(error),
            Err(HandlerError::Discard(discard)) => {
                tracing::warn!(node_id = %node_id, reason = %discard, "[registry] No options");
                Ok(None)
            }
        }
    }
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
    fn route(&mut self, topic: &str, payload: &[u8]) -> HandlerResult<DispatchOutcome> {
        let (category, identifier) = split_topic(topic).ok_or_else(|| Discard::MalformedTopic {
            topic: topic.to_string(),
        })?;

        let document = decode_document(payload).ok_or(Discard::MalformedPayload)?;

        let address =
            HardwareAddress::parse(identifier).ok_or_else(|| Discard::InvalidIdentifier {
                identifier: identifier.to_string(),
            })?;

        let category = Category::from_segment(category).ok_or_else(|| Discard::UnknownCategory {
            category: category.to_string(),
        })?;

        tracing::debug!(topic, category = %category, "[registry] Routing message");

        match category {
            Category::Presentation => self.handle_presentation(&address, &document),
            Category::Data => self.handle_data(&address, &document),
        }
    }
}

fn log_outcome(topic: &str, outcome: &DispatchOutcome) {
    match outcome {
        DispatchOutcome::Registered {
            node_id,
            options_created,
        } => tracing::info!(
            topic,
            node_id = %node_id,
            options_created,
            "[registry] New node registered"
        ),
        DispatchOutcome::Reconciled {
            node_id,
            updated,
            options_published,
        } => tracing::info!(
            topic,
            node_id = %node_id,
            updated,
            options_published,
            "[registry] Node reconciled"
        ),
        DispatchOutcome::TelemetryStored { node_id, node_type } => tracing::debug!(
            topic,
            node_id = %node_id,
            node_type = %node_type,
            "[registry] Telemetry stored"
        ),
        DispatchOutcome::Discarded(discard) => log_discard(topic, discard),
    }
}

fn log_discard(topic: &str, discard: &Discard) {
    let class = discard.class();
    if class.is_warning() {
        tracing::warn!(topic, class = %class, reason = %discard, "[registry] Message discarded");
    } else {
        tracing::error!(topic, class = %class, reason = %discard, "[registry] Message discarded");
    }
}
