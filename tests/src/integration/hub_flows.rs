//! # Hub Flows
//!
//! Drives the runtime wiring (`build_registry` + `IngestLoop`) with messages
//! injected into the in-process broker, the way nodes would publish them.
//!
//! ## Flows Tested:
//!
//! 1. **Register → report → re-present**: node created, telemetry stored,
//!    options pushed back on `options/<address>`
//! 2. **Changed address**: node updated, then options pushed
//! 3. **Subscription scope**: only `presentation/+` and `data/+` reach the registry
//! 4. **Single broker**: replies travel over the same bus the hub listens on

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::timeout;

    use hub_runtime::{build_registry, HubRegistry, HubRuntime, HubStorage, IngestLoop, IngestStats};
    use node_registry::{default_type_descriptors, InMemoryNodeStore, NodeOptions, TypeId};
    use shared_bus::{InMemoryBroker, Subscription, TopicFilter};
    use shared_types::TransportMessage;

    const MAC: &str = "aa:bb:cc:dd:ee:ff";

    fn presentation(ip: &str, mac: &str, node_type: i64) -> String {
        format!(r#"{{"ip":"{ip}","mac":"{mac}","nodeType":{node_type},"sketchTimeToWait":60}}"#)
    }

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    /// Nodes publish on `nodes`; the hub answers on its own outbound bus.
    struct Hub {
        nodes: InMemoryBroker,
        inbound: Subscription,
        outbound: Arc<InMemoryBroker>,
        replies: Subscription,
        store: InMemoryNodeStore,
        registry: HubRegistry,
    }

    /// What is left once the node side has been drained. The outbound
    /// broker must outlive `replies`, or `try_recv` reports `Closed`.
    struct Drained {
        stats: IngestStats,
        replies: Subscription,
        store: InMemoryNodeStore,
        _outbound: Arc<InMemoryBroker>,
    }

    fn hub() -> Hub {
        let nodes = InMemoryBroker::new();
        let inbound = nodes
            .subscribe_many(["presentation/+", "data/+"])
            .unwrap();

        let outbound = Arc::new(InMemoryBroker::new());
        let replies = outbound.subscribe(TopicFilter::parse("options/#").unwrap());

        let (storage, store) = HubStorage::in_memory(&default_type_descriptors());
        let registry = build_registry(storage, outbound.clone());

        Hub {
            nodes,
            inbound,
            outbound,
            replies,
            store,
            registry,
        }
    }

    impl Hub {
        fn send(&self, topic: &str, payload: &str) {
            self.nodes.inject(TransportMessage::new(topic, payload));
        }

        /// Close the node side and process everything already sent.
        async fn drain(self) -> Drained {
            let Hub {
                nodes,
                inbound,
                outbound,
                replies,
                store,
                registry,
            } = self;
            drop(nodes);

            let mut ingest = IngestLoop::new(inbound, registry);
            let stats = timeout(Duration::from_secs(5), ingest.run_to_end())
                .await
                .expect("ingest loop did not finish");
            Drained {
                stats,
                replies,
                store,
                _outbound: outbound,
            }
        }
    }

    // =============================================================================
    // INTEGRATION TESTS: NODE LIFECYCLE OVER THE BUS
    // =============================================================================

    #[tokio::test]
    async fn test_register_report_and_represent() {
        let hub = hub();
        let topic = format!("presentation/{MAC}");

        hub.send(&topic, &presentation("10.0.0.5", MAC, 0));
        hub.send(
            &format!("data/{MAC}"),
            r#"{"temperature":21.5,"humidity":40,"rssi":-60}"#,
        );
        hub.send(&topic, &presentation("10.0.0.5", MAC, 0));

        let Drained {
            stats,
            mut replies,
            store,
            _outbound,
        } = hub.drain().await;

        assert_eq!(stats.received, 3);
        assert_eq!(stats.registered, 1);
        assert_eq!(stats.telemetry_stored, 1);
        assert_eq!(stats.reconciled, 1);

        let node = &store.nodes()[0];
        assert_eq!(store.telemetry_records()[0].node_id, node.id);

        let reply = replies.try_recv().unwrap().expect("options reply");
        assert_eq!(reply.topic, format!("options/{MAC}"));
        assert_eq!(
            serde_json::from_slice::<serde_json::Value>(&reply.payload).unwrap(),
            serde_json::json!({"timeToWait": 60})
        );
        assert_eq!(replies.try_recv(), Ok(None));
    }

    #[tokio::test]
    async fn test_changed_address_updates_then_replies() {
        let hub = hub();
        let topic = format!("presentation/{MAC}");

        hub.send(&topic, &presentation("10.0.0.5", MAC, 0));
        hub.send(&topic, &presentation("10.0.0.77", MAC, 0));

        let Drained {
            stats,
            mut replies,
            store,
            _outbound,
        } = hub.drain().await;

        assert_eq!(stats.registered, 1);
        assert_eq!(stats.reconciled, 1);
        assert_eq!(store.nodes()[0].network_address.to_string(), "10.0.0.77");
        assert_eq!(store.mutations().node_updates, 1);
        assert!(replies.try_recv().unwrap().is_some());
    }

    #[tokio::test]
    async fn test_reply_topic_keeps_address_spelling() {
        let hub = hub();
        let mac = "AA-BB-CC-DD-EE-FF";
        let topic = format!("presentation/{mac}");

        hub.send(&topic, &presentation("10.0.0.5", mac, 0));
        hub.send(&topic, &presentation("10.0.0.5", mac, 0));

        let mut drained = hub.drain().await;
        let reply = drained.replies.try_recv().unwrap().expect("options reply");
        assert_eq!(reply.topic, "options/AA-BB-CC-DD-EE-FF");
        assert_eq!(drained.replies.try_recv(), Ok(None));
    }

    #[tokio::test]
    async fn test_unknown_type_is_absorbed() {
        let hub = hub();
        let topic = format!("presentation/{MAC}");

        hub.send(&topic, &presentation("10.0.0.5", MAC, 0));
        hub.send(&topic, &presentation("10.0.0.5", MAC, 1));

        let Drained {
            stats,
            mut replies,
            store,
            _outbound,
        } = hub.drain().await;

        assert_eq!(stats.discarded, 1);
        assert_eq!(store.nodes()[0].type_id, TypeId(0));
        assert!(matches!(
            store.options_records()[0].options,
            NodeOptions::Dht22(o) if o.time_between_reads == 60
        ));
        assert_eq!(replies.try_recv(), Ok(None));
    }

    #[tokio::test]
    async fn test_only_subscribed_categories_reach_registry() {
        let hub = hub();

        hub.send(&format!("options/{MAC}"), r#"{"timeToWait":5}"#);
        hub.send(&format!("status/{MAC}"), "{}");
        hub.send(&format!("presentation/{MAC}/extra"), &presentation("10.0.0.5", MAC, 0));

        let Drained { stats, store, .. } = hub.drain().await;

        assert_eq!(stats, IngestStats::default());
        assert!(store.nodes().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_traffic_between_valid_messages() {
        let hub = hub();
        let topic = format!("presentation/{MAC}");

        hub.send(&topic, "{\"ip\":");
        hub.send("presentation/not-a-mac", &presentation("10.0.0.5", MAC, 0));
        hub.send(&topic, &presentation("10.0.0.5", MAC, 0));
        hub.send(&format!("data/{MAC}"), r#"{"temperature":"warm"}"#);
        hub.send(&format!("data/{MAC}"), r#"{"temperature":1,"humidity":2,"rssi":3}"#);

        let Drained { stats, store, .. } = hub.drain().await;

        assert_eq!(stats.received, 5);
        assert_eq!(stats.discarded, 3);
        assert_eq!(stats.registered, 1);
        assert_eq!(stats.telemetry_stored, 1);
        assert_eq!(stats.faults, 0);
        assert_eq!(store.telemetry_records().len(), 1);
    }

    // =============================================================================
    // INTEGRATION TESTS: SINGLE BROKER
    // =============================================================================

    #[tokio::test]
    async fn test_runtime_replies_on_shared_broker() {
        let broker = Arc::new(InMemoryBroker::new());
        let inbound = broker
            .subscribe_many(["presentation/+", "data/+"])
            .unwrap();
        let mut replies = broker.subscribe(TopicFilter::parse("options/+").unwrap());

        let (storage, store) = HubStorage::in_memory(&default_type_descriptors());
        let registry = build_registry(storage, broker.clone());
        let runtime = HubRuntime::new();

        let topic = format!("presentation/{MAC}");
        broker.inject(TransportMessage::new(topic.as_str(), presentation("10.0.0.5", MAC, 0)));
        broker.inject(TransportMessage::new(topic.as_str(), presentation("10.0.0.5", MAC, 0)));

        let shutdown = runtime.shutdown_handle();
        let watcher = tokio::spawn(async move {
            let reply = replies.recv().await;
            let _ = shutdown.send(true);
            reply
        });

        let stats = timeout(Duration::from_secs(5), runtime.run(inbound, registry))
            .await
            .expect("runtime did not stop");
        let reply = watcher.await.unwrap().expect("options reply");

        assert_eq!(reply.topic, format!("options/{MAC}"));
        assert_eq!(stats.registered, 1);
        assert_eq!(stats.reconciled, 1);
        assert_eq!(store.options_records().len(), 1);
    }
}
