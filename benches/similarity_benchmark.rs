use criterion::{Criterion, black_box, criterion_group, criterion_main};
use device_vision::{MockScreen, similarity};

fn benchmark_similarity(c: &mut Criterion) {
    let reference = MockScreen::with_color(1080, 1920, [32, 32, 32]).to_image();
    let mut changed = MockScreen::with_color(1080, 1920, [32, 32, 32]);
    changed.draw_rect(0, 0, 1080, 200, [200, 0, 0]);
    let capture = changed.to_image();

    c.bench_function("similarity_1080x1920", |b| {
        b.iter(|| similarity(black_box(&capture), black_box(&reference)))
    });
}

criterion_group!(benches, benchmark_similarity);
criterion_main!(benches);
