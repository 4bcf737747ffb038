//! # Node Lifecycle Properties
//!
//! Long message sequences against the in-memory registry, checking the
//! properties that must hold whatever the traffic looks like:
//!
//! - at most one node record per hardware address
//! - a repeated identical presentation mutates nothing and replies once
//! - a divergent presentation leaves the stored values equal to the declared ones
//! - duplicate records are never repaired and never answered
//! - telemetry for unknown or duplicated nodes is never persisted

#[cfg(test)]
mod tests {
    use std::collections::{HashMap, HashSet};

    use node_registry::{
        in_memory_service, DispatchOutcome, Discard, FixedClock, HardwareAddress,
        InMemoryNodeStore, InMemoryRegistryService, LocationId, MessageDispatchApi, NodeId,
        NodeRecord, RecordingPublisher, TypeId,
    };
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    const INGESTED_AT: u64 = 1_717_000_000;

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    struct Registry {
        store: InMemoryNodeStore,
        publisher: RecordingPublisher,
        service: InMemoryRegistryService,
    }

    fn registry() -> Registry {
        let store = InMemoryNodeStore::with_default_types();
        let publisher = RecordingPublisher::new();
        let service = in_memory_service(&store, &publisher, &FixedClock::new(INGESTED_AT));
        Registry {
            store,
            publisher,
            service,
        }
    }

    fn presentation(ip: &str, mac: &str, node_type: i64) -> Vec<u8> {
        format!(r#"{{"ip":"{ip}","mac":"{mac}","nodeType":{node_type},"sketchTimeToWait":30}}"#)
            .into_bytes()
    }

    fn reading() -> &'static [u8] {
        br#"{"temperature":19.0,"humidity":55.5,"rssi":-71}"#
    }

    fn mac(index: u8) -> String {
        format!("02:00:00:00:00:{index:02x}")
    }

    fn seeded(mac: &str, id: u64) -> NodeRecord {
        NodeRecord {
            id: NodeId(id),
            hardware_address: HardwareAddress::parse(mac).unwrap(),
            network_address: "10.0.0.5".parse().unwrap(),
            type_id: TypeId(0),
            location_id: LocationId(1),
        }
    }

    // =============================================================================
    // PROPERTIES
    // =============================================================================

    #[test]
    fn test_repeated_presentation_is_idempotent() {
        let mut r = registry();
        let topic = format!("presentation/{}", mac(1));
        let payload = presentation("10.0.0.5", &mac(1), 0);

        r.service.dispatch(&topic, &payload).unwrap();
        let after_registration = r.store.mutations();

        for round in 1..=10 {
            let outcome = r.service.dispatch(&topic, &payload).unwrap();
            assert!(matches!(
                outcome,
                DispatchOutcome::Reconciled {
                    updated: false,
                    options_published: true,
                    ..
                }
            ));
            assert_eq!(r.store.mutations(), after_registration);
            assert_eq!(r.publisher.published().len(), round);
        }
    }

    #[test]
    fn test_divergent_presentation_converges() {
        let mut r = registry();
        let topic = format!("presentation/{}", mac(2));

        r.service
            .dispatch(&topic, &presentation("10.0.0.5", &mac(2), 0))
            .unwrap();
        for ip in ["10.0.0.6", "192.168.1.20", "fe80::2"] {
            r.service
                .dispatch(&topic, &presentation(ip, &mac(2), 0))
                .unwrap();
            let node = &r.store.nodes()[0];
            assert_eq!(node.network_address, ip.parse::<std::net::IpAddr>().unwrap());
            assert_eq!(node.type_id, TypeId(0));
        }

        assert_eq!(r.store.mutations().node_updates, 3);
        assert_eq!(r.publisher.published().len(), 3);
    }

    #[test]
    fn test_duplicates_are_left_alone() {
        let mut r = registry();
        let address = mac(3);
        r.store.seed_node(seeded(&address, 40));
        r.store.seed_node(seeded(&address, 41));

        let presented = r
            .service
            .dispatch(
                &format!("presentation/{address}"),
                &presentation("10.0.0.99", &address, 0),
            )
            .unwrap();
        let reported = r
            .service
            .dispatch(&format!("data/{address}"), reading())
            .unwrap();

        assert_eq!(presented, DispatchOutcome::Discarded(Discard::DuplicateNode { count: 2 }));
        assert_eq!(reported, DispatchOutcome::Discarded(Discard::DuplicateNode { count: 2 }));
        assert_eq!(r.store.mutations().total(), 0);
        assert!(r.publisher.published().is_empty());
        assert_eq!(r.store.nodes().len(), 2);
    }

    #[test]
    fn test_telemetry_needs_exactly_one_node() {
        let mut r = registry();

        let outcome = r
            .service
            .dispatch(&format!("data/{}", mac(4)), reading())
            .unwrap();
        assert_eq!(outcome, DispatchOutcome::Discarded(Discard::UnknownNode));
        assert!(r.store.telemetry_records().is_empty());
    }

    /// Random traffic from a small fleet: presentations with drifting
    /// addresses, unknown types, bad identifiers, and readings.
    #[test]
    fn test_random_traffic_keeps_one_record_per_address() {
        let mut rng = StdRng::seed_from_u64(0x5EED);
        let mut r = registry();
        let mut presented: HashSet<String> = HashSet::new();
        let mut expected_replies = 0usize;
        let mut expected_readings: HashMap<String, usize> = HashMap::new();

        for _ in 0..500 {
            let address = mac(rng.gen_range(0..8));
            match rng.gen_range(0..6) {
                0..=2 => {
                    let ip = format!("10.0.0.{}", rng.gen_range(1..4));
                    let outcome = r
                        .service
                        .dispatch(
                            &format!("presentation/{address}"),
                            &presentation(&ip, &address, 0),
                        )
                        .unwrap();
                    if presented.insert(address.clone()) {
                        assert!(matches!(outcome, DispatchOutcome::Registered { .. }));
                    } else {
                        assert!(matches!(outcome, DispatchOutcome::Reconciled { .. }));
                        expected_replies += 1;
                    }
                }
                3 => {
                    let outcome = r
                        .service
                        .dispatch(
                            &format!("presentation/{address}"),
                            &presentation("10.0.0.1", &address, rng.gen_range(1..10)),
                        )
                        .unwrap();
                    if presented.contains(&address) {
                        assert!(matches!(
                            outcome,
                            DispatchOutcome::Discarded(Discard::UnknownType { .. })
                        ));
                    } else {
                        assert!(outcome.is_discarded());
                    }
                }
                4 => {
                    let outcome = r
                        .service
                        .dispatch(&format!("data/{address}"), reading())
                        .unwrap();
                    if presented.contains(&address) {
                        assert!(matches!(outcome, DispatchOutcome::TelemetryStored { .. }));
                        *expected_readings.entry(address).or_default() += 1;
                    } else {
                        assert_eq!(outcome, DispatchOutcome::Discarded(Discard::UnknownNode));
                    }
                }
                _ => {
                    let outcome = r
                        .service
                        .dispatch("presentation/02:00:00:00:00", &presentation("10.0.0.1", &address, 0))
                        .unwrap();
                    assert!(outcome.is_discarded());
                }
            }
        }

        let nodes = r.store.nodes();
        let addresses: HashSet<_> = nodes.iter().map(|n| n.hardware_address.to_string()).collect();
        assert_eq!(addresses.len(), nodes.len());
        assert_eq!(addresses, presented);
        assert!(nodes.iter().all(|n| n.type_id == TypeId(0)));
        assert_eq!(r.store.options_records().len(), presented.len());
        assert_eq!(r.publisher.published().len(), expected_replies);

        for node in &nodes {
            let stored = r
                .store
                .telemetry_records()
                .iter()
                .filter(|t| t.node_id == node.id)
                .count();
            let expected = expected_readings
                .get(node.hardware_address.as_str())
                .copied()
                .unwrap_or(0);
            assert_eq!(stored, expected);
        }
        assert!(r
            .store
            .telemetry_records()
            .iter()
            .all(|t| t.timestamp == INGESTED_AT));
    }
}
