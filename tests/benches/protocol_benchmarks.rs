//! # Cross-Shard Protocol Benchmarks
//!
//! | Path | What is measured |
//! |------|------------------|
//! | Wire codec | Encoding and decoding a mint request with a full proof |
//! | Mint verification | Replica-side proof check for 1..4 responsible shards |
//! | Receipt check | Client-side ed25519 receipt verification |
//! | Full transaction | In-process burn → mint through the coordinator |

use bytes::BytesMut;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use shared_types::burn_signing_message;
use std::time::Duration;
use tokio_util::codec::{Decoder, Encoder};
use xs_01_wire_codec::{FrameCodec, Message, MintRequest};
use xs_02_replica::{CredentialProvider, ReplicaApi};
use xs_03_client::{verify_receipt, ClientConfig, ReceiptKind};
use xs_tests::harness::{tx_on, Driver, LocalCluster};

fn mint_request(local: &LocalCluster, shards: &[u32], salt: u8) -> MintRequest {
    let tx = tx_on(shards, salt);
    MintRequest {
        seq: 0,
        client_id: 0,
        proof: local.proof(shards, &tx),
        tx,
    }
}

fn bench_wire_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("xs-01-wire-codec");
    let local = LocalCluster::new(4, 4, 1);
    let message = Message::MintRequest(mint_request(&local, &[0, 1, 2, 3], 1));

    let mut encoded = BytesMut::new();
    FrameCodec::default()
        .encode(message.to_frame().unwrap(), &mut encoded)
        .unwrap();
    group.throughput(Throughput::Bytes(encoded.len() as u64));

    group.bench_function("encode_mint_request", |b| {
        b.iter(|| {
            let mut buf = BytesMut::new();
            FrameCodec::default()
                .encode(black_box(&message).to_frame().unwrap(), &mut buf)
                .unwrap();
            buf
        })
    });

    group.bench_function("decode_mint_request", |b| {
        b.iter(|| {
            let mut buf = encoded.clone();
            let frame = FrameCodec::default().decode(&mut buf).unwrap().unwrap();
            Message::from_frame(black_box(&frame)).unwrap()
        })
    });
    group.finish();
}

fn bench_mint_verification(c: &mut Criterion) {
    let mut group = c.benchmark_group("xs-02-mint-verification");
    let local = LocalCluster::new(4, 4, 1);
    let replica = local.replica(0, 0);

    for shards in 1..=4u32 {
        let covered: Vec<u32> = (0..shards).collect();
        let request = mint_request(&local, &covered, shards as u8);
        group.throughput(Throughput::Elements(shards as u64));
        // The first call mints; later calls stop at the anti-replay check,
        // after the proof has been verified.
        group.bench_with_input(BenchmarkId::new("verify_proof", shards), &request, |b, r| {
            b.iter(|| {
                let mut request = r.clone();
                request.seq += 1;
                replica.handle_mint(black_box(&request)).is_ok()
            })
        });
    }
    group.finish();
}

fn bench_receipt_check(c: &mut Criterion) {
    let mut group = c.benchmark_group("xs-03-receipts");
    let local = LocalCluster::new(4, 4, 1);
    let signers = local.cluster.signer_directory().unwrap();
    let tx_hash = tx_on(&[1], 1).tx_hash().unwrap();
    let signature = local
        .credentials(1, 2)
        .sign(&burn_signing_message(1, &tx_hash));

    group.bench_function("verify_burn_receipt", |b| {
        b.iter(|| {
            verify_receipt(
                &signers,
                ReceiptKind::Burn,
                1,
                2,
                black_box(&tx_hash),
                black_box(&signature),
            )
        })
    });
    group.finish();
}

fn bench_full_transaction(c: &mut Criterion) {
    let mut group = c.benchmark_group("xs-e2e");
    group.measurement_time(Duration::from_secs(10));
    group.sample_size(20);

    group.bench_function("burn_mint_two_shards", |b| {
        b.iter(|| {
            let local = LocalCluster::new(4, 4, 1);
            let mut driver =
                Driver::new(&local, ClientConfig::for_testing(0, 1), vec![tx_on(&[1, 2], 1)]);
            driver.run().unwrap().completed
        })
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_wire_codec,
    bench_mint_verification,
    bench_receipt_check,
    bench_full_transaction
);
criterion_main!(benches);
