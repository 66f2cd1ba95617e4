//! 身份令牌编解码性能基准测试

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use linkvault::identity::IdentityCodec;
use std::hint::black_box;

fn bench_mint(c: &mut Criterion) {
    let codec = IdentityCodec::new("bench-secret-key").unwrap();
    let mut group = c.benchmark_group("identity/mint");

    group.bench_function("named_owner", |b| {
        b.iter(|| codec.mint_at(black_box("user-42"), 1_700_000_000).unwrap());
    });

    group.bench_function("anonymous", |b| {
        b.iter(|| codec.mint_anonymous());
    });

    group.finish();
}

fn bench_verify(c: &mut Criterion) {
    let codec = IdentityCodec::new("bench-secret-key").unwrap();
    let mut group = c.benchmark_group("identity/verify");

    for owner_len in [8, 36, 128] {
        let owner = "o".repeat(owner_len);
        let token = codec.mint_at(&owner, 1_700_000_000).unwrap().value;

        group.bench_with_input(BenchmarkId::new("valid", owner_len), &token, |b, token| {
            b.iter(|| codec.verify(black_box(token)).unwrap());
        });
    }

    // 签名不匹配的路径同样要走完整的 HMAC 计算
    let forged = IdentityCodec::new("other-secret")
        .unwrap()
        .mint_at("user-42", 1_700_000_000)
        .unwrap()
        .value;
    group.bench_function("forged", |b| {
        b.iter(|| codec.verify(black_box(&forged)).is_err());
    });

    group.bench_function("garbage", |b| {
        b.iter(|| codec.verify(black_box("not a token!")).is_err());
    });

    group.finish();
}

criterion_group!(benches, bench_mint, bench_verify);
criterion_main!(benches);
