use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use drumkit::audio::mixer::MasterBus;
use drumkit::audio::parameters::AtomicF32;
use drumkit::synth::effect::{FxParams, Signal};
use drumkit::synth::instruments::Instrument;
use drumkit::synth::kit::DrumKit;

const SAMPLE_RATE: f32 = 48000.0;
const BUFFER_SIZE: usize = 512;

fn kit() -> DrumKit {
    DrumKit::new(SAMPLE_RATE, 1.0, FxParams::default())
}

/// Render one buffer of a freshly triggered voice, per instrument
fn bench_voice_render(c: &mut Criterion) {
    let kit = kit();

    for fx in [false, true] {
        let name = if fx { "voice_fx" } else { "voice_dry" };
        let mut group = c.benchmark_group(name);

        for instrument in Instrument::ALL {
            group.bench_with_input(
                BenchmarkId::from_parameter(instrument.id()),
                &instrument,
                |b, &instrument| {
                    b.iter(|| {
                        let Some(mut voice) = kit.voice(instrument, 0.0, fx) else {
                            return;
                        };
                        for i in 0..BUFFER_SIZE {
                            let time = i as f64 / SAMPLE_RATE as f64;
                            black_box(voice.next_sample(time));
                        }
                    });
                },
            );
        }
        group.finish();
    }
}

/// Building a voice from its patch happens on every hit
fn bench_voice_instantiation(c: &mut Criterion) {
    let kit = kit();

    c.bench_function("voice_from_patch_snare_fx", |b| {
        b.iter(|| black_box(kit.voice(Instrument::Snare, 0.0, true)));
    });
}

/// Master bus with many overlapping voices
fn bench_master_bus(c: &mut Criterion) {
    let mut group = c.benchmark_group("master_bus");
    let kit = kit();

    for voice_count in [1, 8, 32, 64] {
        group.bench_with_input(
            BenchmarkId::from_parameter(voice_count),
            &voice_count,
            |b, &count| {
                let mut bus = MasterBus::new(AtomicF32::new(0.85), SAMPLE_RATE);
                for i in 0..count {
                    let instrument = Instrument::ALL[i % Instrument::ALL.len()];
                    if let Some(voice) = kit.voice(instrument, 0.0, i % 2 == 0) {
                        bus.add_voice(Box::new(voice));
                    }
                }
                let mut buffer = vec![0.0f32; BUFFER_SIZE];

                b.iter(|| {
                    bus.render(&mut buffer, 0.0, SAMPLE_RATE);
                    black_box(&buffer);
                });
            },
        );
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_voice_render,
    bench_voice_instantiation,
    bench_master_bus
);
criterion_main!(benches);
