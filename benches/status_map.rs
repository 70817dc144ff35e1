//! 状态映射与状态机基准测试

use criterion::{Criterion, criterion_group, criterion_main};

use afftrack::services::StatusLabelMap;
use afftrack::storage::ConversionStatus;

fn bench_label_translate(c: &mut Criterion) {
    let map = StatusLabelMap::from_request_labels("wait", "ok", "bad", "payout");

    c.bench_function("status/translate_hit", |b| {
        b.iter(|| map.translate(std::hint::black_box("ok")).unwrap());
    });

    c.bench_function("status/translate_miss", |b| {
        b.iter(|| map.translate(std::hint::black_box("confirmed")).is_err());
    });
}

fn bench_transition_check(c: &mut Criterion) {
    c.bench_function("status/can_transition", |b| {
        b.iter(|| {
            std::hint::black_box(ConversionStatus::Pending)
                .can_transition_to(std::hint::black_box(ConversionStatus::Approved))
        });
    });
}

criterion_group!(benches, bench_label_translate, bench_transition_check);
criterion_main!(benches);
