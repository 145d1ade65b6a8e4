/// Benchmarks for inbound subscription frame parsing.
///
/// Data frames arrive every few seconds per home; the handshake frames are included for
/// comparison.
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use tibber_client_sdk::live::{InboundFrame, LiveMeasurement, Profile};
use tibber_client_sdk::ws::MessageParser as _;

const FULL_NEXT: &str = r#"{
    "id": "0",
    "type": "next",
    "payload": {"data": {"liveMeasurement": {
        "timestamp": "2024-03-01T10:15:30.000+01:00",
        "power": 1543,
        "lastMeterConsumption": 12345.678,
        "lastMeterProduction": 0,
        "accumulatedConsumption": 8.512,
        "accumulatedCost": 11.42,
        "accumulatedProduction": 0,
        "accumulatedReward": null,
        "minPower": 210,
        "averagePower": 987.3,
        "maxPower": 6210,
        "powerProduction": 0,
        "minPowerProduction": 0,
        "maxPowerProduction": 0,
        "voltagePhase1": 231.2,
        "voltagePhase2": 230.8,
        "voltagePhase3": 232.0,
        "currentPhase1": 4.1,
        "currentPhase2": 1.2,
        "currentPhase3": 0.9
    }}}
}"#;

const SPARSE_NEXT: &str = r#"{
    "id": "0",
    "type": "next",
    "payload": {"data": {"liveMeasurement": {
        "timestamp": "2024-03-01T10:15:32.000+01:00",
        "power": 1551,
        "accumulatedConsumption": 8.513
    }}}
}"#;

const LEGACY_DATA: &str = r#"{
    "id": 1,
    "type": "subscription_data",
    "payload": {"data": {"liveMeasurement": {
        "timestamp": "2024-03-01T10:15:30+01:00",
        "power": 1543,
        "accumulatedConsumption": 8.512,
        "accumulatedCost": 11.42,
        "currency": "NOK",
        "minPower": 210,
        "averagePower": 987.3,
        "maxPower": 6210
    }}}
}"#;

fn bench_data_frames(c: &mut Criterion) {
    let mut group = c.benchmark_group("live/data_frame");

    for (name, profile, frame) in [
        ("graphql_transport_ws/full", Profile::GraphqlTransportWs, FULL_NEXT),
        ("graphql_transport_ws/sparse", Profile::GraphqlTransportWs, SPARSE_NEXT),
        ("legacy", Profile::Legacy, LEGACY_DATA),
    ] {
        group.throughput(Throughput::Bytes(frame.len() as u64));
        group.bench_with_input(BenchmarkId::new("Profile::parse", name), frame, |b, frame| {
            b.iter(|| {
                let parsed = profile
                    .parse(std::hint::black_box(frame))
                    .expect("Parsing should succeed");
                assert!(matches!(parsed, InboundFrame::Data(_)), "data frame");
            });
        });
    }

    group.finish();
}

fn bench_control_frames(c: &mut Criterion) {
    let mut group = c.benchmark_group("live/control_frame");
    let profile = Profile::GraphqlTransportWs;

    for (name, frame) in [
        ("connection_ack", r#"{"type":"connection_ack"}"#),
        ("ping", r#"{"type":"ping"}"#),
        (
            "error",
            r#"{"id":"0","type":"error","payload":[{"message":"unauthorized"}]}"#,
        ),
    ] {
        group.bench_function(name, |b| {
            b.iter(|| {
                profile
                    .parse(std::hint::black_box(frame))
                    .expect("Parsing should succeed")
            });
        });
    }

    group.finish();
}

fn bench_measurement(c: &mut Criterion) {
    let mut group = c.benchmark_group("live/measurement");

    let body = serde_json::from_str::<serde_json::Value>(FULL_NEXT)
        .expect("valid JSON")["payload"]["data"]["liveMeasurement"]
        .to_string();
    group.throughput(Throughput::Bytes(body.len() as u64));
    group.bench_function("LiveMeasurement", |b| {
        b.iter(|| {
            let _: LiveMeasurement = serde_json::from_str(std::hint::black_box(&body))
                .expect("Deserialization should succeed");
        });
    });

    let measurement: LiveMeasurement = serde_json::from_str(&body).expect("valid measurement");
    group.bench_function("LiveMeasurement::as_float_map", |b| {
        b.iter(|| std::hint::black_box(&measurement).as_float_map());
    });

    group.finish();
}

criterion_group!(
    frame_benches,
    bench_data_frames,
    bench_control_frames,
    bench_measurement
);
criterion_main!(frame_benches);
