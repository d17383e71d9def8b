use criterion::{black_box, criterion_group, Criterion};
use ip2location::lookup::interpret_response;
use ip2location::validator::{IpList, MAX_IPS};
use serde_json::{json, Value};

criterion_group!(benches_pipeline, bench_validator, bench_normalizer);

pub fn bench_validator(c: &mut Criterion) {
    let text = (0..MAX_IPS)
        .map(|i| format!("  192.0.2.{i} \r\n\n"))
        .collect::<String>();
    c.bench_function("IpList::parse", |b| {
        b.iter(|| IpList::parse(black_box(&text)))
    });
}

pub fn bench_normalizer(c: &mut Criterion) {
    let batch: Value = (0..MAX_IPS)
        .map(|i| {
            if i % 10 == 0 {
                json!({"country_name": "no ip"})
            } else {
                let country_name = if i % 3 == 0 { Value::Null } else { "Iran".into() };
                json!({
                    "ip": format!("192.0.2.{i}"),
                    "continent_name": "Europe",
                    "country_name": country_name,
                    "city": "",
                    "latitude": 35.69,
                    "longitude": null,
                    "connection": {"isp": "Example ISP"},
                    "security": {"is_proxy": true, "threat_types": ["tor"]},
                })
            }
        })
        .collect();
    c.bench_function("interpret_response", |b| {
        b.iter(|| interpret_response(black_box(batch.clone())))
    });
}
