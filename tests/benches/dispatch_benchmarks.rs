//! # Sensor Hub Dispatch Benchmarks
//!
//! | Path | Work per message |
//! |------|------------------|
//! | Identifier validation | one pass over ≤ 17 bytes |
//! | Telemetry routing | decode, one directory lookup, one append |
//! | Reconcile (unchanged) | decode, one lookup, one options lookup, one publish |
//! | Discard (bad topic) | topic split only |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use node_registry::{
    in_memory_service, is_valid_hardware_address, FixedClock, InMemoryNodeStore,
    MessageDispatchApi, RecordingPublisher,
};
use rand::Rng;
use std::time::Duration;

fn random_mac(rng: &mut impl Rng) -> String {
    (0..6)
        .map(|_| format!("{:02x}", rng.gen::<u8>()))
        .collect::<Vec<_>>()
        .join(":")
}

fn presentation(mac: &str) -> Vec<u8> {
    format!(r#"{{"ip":"10.0.0.5","mac":"{mac}","nodeType":0,"sketchTimeToWait":60}}"#).into_bytes()
}

fn bench_identifier_validation(c: &mut Criterion) {
    let mut group = c.benchmark_group("identifier-validation");
    let candidates = [
        "aa:bb:cc:dd:ee:ff",
        "AA-BB-CC-DD-EE-FF",
        "aabbccddeeff",
        "aa:bb-cc:dd:ee:ff",
        "not-a-hardware-address",
    ];

    for candidate in candidates {
        group.bench_with_input(BenchmarkId::from_parameter(candidate), candidate, |b, s| {
            b.iter(|| black_box(is_valid_hardware_address(black_box(s))))
        });
    }
    group.finish();
}

fn bench_dispatch(c: &mut Criterion) {
    let mut group = c.benchmark_group("dispatch");
    group.measurement_time(Duration::from_secs(5));

    for fleet in [10usize, 100, 1_000] {
        let store = InMemoryNodeStore::with_default_types();
        let publisher = RecordingPublisher::new();
        let mut service = in_memory_service(&store, &publisher, &FixedClock::new(0));

        let mut rng = rand::thread_rng();
        let macs: Vec<String> = (0..fleet).map(|_| random_mac(&mut rng)).collect();
        for mac in &macs {
            let _ = service.dispatch(&format!("presentation/{mac}"), &presentation(mac));
        }

        let data_topic = format!("data/{}", macs[fleet / 2]);
        let reading = br#"{"temperature":21.5,"humidity":40,"rssi":-60}"#;

        group.throughput(Throughput::Elements(1));
        group.bench_with_input(BenchmarkId::new("telemetry", fleet), &fleet, |b, _| {
            b.iter(|| black_box(service.dispatch(&data_topic, reading).is_ok()))
        });
    }

    let store = InMemoryNodeStore::with_default_types();
    let publisher = RecordingPublisher::new();
    let mut service = in_memory_service(&store, &publisher, &FixedClock::new(0));
    let mac = "aa:bb:cc:dd:ee:ff";
    let topic = format!("presentation/{mac}");
    let payload = presentation(mac);
    let _ = service.dispatch(&topic, &payload);

    // RecordingPublisher keeps every reply; bounded by criterion's sample count.
    group.bench_function("reconcile_unchanged", |b| {
        b.iter(|| black_box(service.dispatch(&topic, &payload).is_ok()))
    });

    group.bench_function("discard_malformed_topic", |b| {
        b.iter(|| black_box(service.dispatch("presentation", &payload).is_ok()))
    });

    group.finish();
}

criterion_group!(benches, bench_identifier_validation, bench_dispatch);
criterion_main!(benches);
