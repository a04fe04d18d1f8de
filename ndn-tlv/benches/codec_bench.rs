use bytes::Bytes;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ndn_tlv::{
    decode_data, decode_interest, encode_data, encode_interest, ContentType, Data, Exclude,
    Interest, KeyLocator, Name, NameComponent, Sha256WithRsaSignature, Signature,
};
use std::time::Duration;

fn sample_interest() -> Interest {
    let mut exclude = Exclude::new();
    exclude.append_component("alpha");
    exclude.append_any();
    exclude.append_component("omega");

    Interest::new(Name::from_uri("/bench/interest/payload").unwrap())
        .with_min_suffix_components(1)
        .with_max_suffix_components(8)
        .with_key_locator(KeyLocator::Name(Name::from_uri("/bench/key").unwrap()))
        .with_exclude(exclude)
        .with_child_selector(1)
        .with_must_be_fresh(true)
        .with_lifetime(Duration::from_secs(4))
        .with_nonce(Bytes::from_static(&[1, 2, 3, 4]))
}

fn sample_data() -> Data {
    Data::new(
        Name::from_uri("/bench/data/payload/segment").unwrap(),
        vec![0xAB; 1024],
    )
    .with_content_type(ContentType::Blob)
    .with_freshness_period(Duration::from_secs(10))
    .with_final_block_id(NameComponent::from("segment99"))
    .with_signature(Signature::Sha256WithRsa(
        Sha256WithRsaSignature::new()
            .with_key_locator(KeyLocator::Name(Name::from_uri("/bench/key").unwrap())),
    ))
}

fn benchmark_encode(c: &mut Criterion) {
    let mut rng = rand::thread_rng();

    c.bench_function("interest_encode", |b| {
        let interest = sample_interest();
        b.iter(|| encode_interest(black_box(&interest), &mut rng))
    });

    c.bench_function("data_encode", |b| {
        let data = sample_data();
        b.iter(|| encode_data(black_box(&data)).unwrap())
    });
}

fn benchmark_decode(c: &mut Criterion) {
    let mut rng = rand::thread_rng();

    c.bench_function("interest_decode", |b| {
        let bytes = encode_interest(&sample_interest(), &mut rng).bytes;
        b.iter(|| decode_interest(black_box(&bytes)).unwrap())
    });

    c.bench_function("data_decode", |b| {
        let bytes = encode_data(&sample_data()).unwrap().bytes;
        b.iter(|| decode_data(black_box(&bytes)).unwrap())
    });
}

criterion_group!(benches, benchmark_encode, benchmark_decode);
criterion_main!(benches);
