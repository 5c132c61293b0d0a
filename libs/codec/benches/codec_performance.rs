//! Codec throughput for a representative request payload

use codec::{Codec, JsonCodec, MsgpackCodec, YamlCodec};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use types::{list, map, Value};

fn payload() -> Value {
    let entries: Vec<Value> = (0..64)
        .map(|i| {
            Value::from(map! {
                "id" => i,
                "owner" => format!("account-{i}"),
                "balance" => f64::from(i) * 10.5,
                "tags" => list!["active", i % 2 == 0],
            })
        })
        .collect();
    Value::from(entries)
}

fn bench_codecs(c: &mut Criterion) {
    let value = payload();
    let codecs: [&dyn Codec; 3] = [&JsonCodec, &YamlCodec, &MsgpackCodec];

    for codec in codecs {
        let encoded = codec.encode(&value).unwrap();
        let mut group = c.benchmark_group(codec.name());
        group.bench_function("encode", |b| {
            b.iter(|| black_box(codec.encode(black_box(&value)).unwrap()));
        });
        group.bench_function("decode", |b| {
            b.iter(|| black_box(codec.decode(black_box(&encoded)).unwrap()));
        });
        group.finish();
    }
}

criterion_group!(benches, bench_codecs);
criterion_main!(benches);
