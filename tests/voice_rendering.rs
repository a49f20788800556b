//! Rendering tests: overlapping voices, FX flag timing and output sanity

use drumkit::audio::output::OfflineOutput;
use drumkit::{
    AudioOutput, DrumMachine, EngineConfig, FeatureFlags, Instrument, ManualClock,
    create_notification_channel,
};
use std::sync::{Arc, Mutex};

const SAMPLE_RATE: f32 = 48000.0;

fn offline_machine(
    flags: FeatureFlags,
) -> (DrumMachine<OfflineOutput, ManualClock>, ManualClock) {
    let config = EngineConfig::default();
    let clock = ManualClock::new(0.0);
    let (tx, rx) = create_notification_channel(config.notification_capacity);
    let machine = DrumMachine::new(
        OfflineOutput::new(SAMPLE_RATE),
        clock.clone(),
        &config,
        flags,
        Arc::new(Mutex::new(tx)),
        rx,
    );
    (machine, clock)
}

fn render_kicks(times: &[f64], seconds: f64) -> Vec<f32> {
    let (mut machine, _) = offline_machine(FeatureFlags::default());
    for &t in times {
        machine
            .trigger(Instrument::Kick, Some(t))
            .expect("offline output is available");
    }
    machine.output_mut().render_until(seconds).to_vec()
}

#[test]
fn test_rapid_retrigger_stacks_voices() {
    let (mut machine, _) = offline_machine(FeatureFlags::default());
    assert!(machine.trigger(Instrument::Kick, Some(0.010)).is_ok());
    assert!(machine.trigger(Instrument::Kick, Some(0.018)).is_ok());
    assert_eq!(machine.output().scheduled().len(), 2);
    assert_eq!(machine.output().live_voices(), 2);

    // Still both alive while overlapping
    machine.output_mut().render_until(0.1);
    assert_eq!(machine.output().live_voices(), 2);
}

#[test]
fn test_second_kick_fully_audible() {
    let single = render_kicks(&[0.0], 0.3);
    let double = render_kicks(&[0.0, 0.008], 0.3);

    let split = (0.008 * SAMPLE_RATE as f64) as usize;
    // Identical until the second hit starts
    assert_eq!(&single[..split], &double[..split]);

    // Afterwards the difference is a whole second kick, not a retriggered one
    let second_only = render_kicks(&[0.008], 0.3);
    for i in split..single.len() {
        let expected = single[i] + second_only[i];
        assert!(
            (double[i] - expected).abs() < 1e-4,
            "frame {}: {} vs {}",
            i,
            double[i],
            expected
        );
    }
}

#[test]
fn test_fx_flag_read_at_fire_time_for_live_hits() {
    let flags = FeatureFlags::default();
    let (mut machine, _) = offline_machine(flags.clone());

    assert!(machine.trigger(Instrument::Tom, Some(1.0)).is_ok());
    flags.set_fx_enabled(true);
    assert!(machine.trigger(Instrument::Tom, Some(1.0)).is_ok());

    let scheduled = machine.output().scheduled();
    // Dry tom ends at its stop time, the FX one carries the delay tail
    assert!((scheduled[0].end_time - 1.32).abs() < 1e-9);
    assert!((scheduled[1].end_time - 2.32).abs() < 1e-9);
}

#[test]
fn test_fx_flag_read_at_fire_time_for_scheduled_hits() {
    let flags = FeatureFlags::default();
    let (mut machine, clock) = offline_machine(flags.clone());

    machine.start_recording();
    clock.set(100.0);
    assert!(machine.trigger(Instrument::Kick, Some(0.0)).is_ok());
    clock.set(300.0);
    assert!(machine.trigger(Instrument::Kick, Some(0.0)).is_ok());
    machine.stop_recording();

    clock.set(1000.0);
    assert!(machine.play().is_ok());
    assert!(machine.tick().is_ok());
    // Flag flipped after play() but before the second hit fires
    flags.set_fx_enabled(true);
    clock.set(1200.0);
    assert!(machine.tick().is_ok());

    let scheduled = machine.output().scheduled();
    assert_eq!(scheduled.len(), 4);
    let dry = scheduled[2];
    let wet = scheduled[3];
    assert!((dry.end_time - dry.start_time - 0.25).abs() < 1e-9);
    assert!((wet.end_time - wet.start_time - 1.25).abs() < 1e-9);
}

#[test]
fn test_every_instrument_renders_bounded() {
    for fx in [false, true] {
        let (mut machine, _) = offline_machine(FeatureFlags::new(fx, false));
        for (i, instrument) in Instrument::ALL.into_iter().enumerate() {
            assert!(machine.trigger(instrument, Some(i as f64 * 0.05)).is_ok());
        }
        let rendered = machine.output_mut().render_until(4.0).to_vec();
        assert!(rendered.iter().all(|s| s.is_finite()));
        assert!(rendered.iter().any(|s| s.abs() > 0.01));
        assert!(rendered.iter().all(|s| s.abs() < 10.0));
        assert_eq!(machine.output().live_voices(), 0);
    }
}

#[test]
fn test_audio_time_advances_with_rendering() {
    let (mut machine, _) = offline_machine(FeatureFlags::default());
    machine.output_mut().render(4800);
    assert!(machine.trigger(Instrument::Clap, None).is_ok());
    let start = machine.output().scheduled()[0].start_time;
    assert!((start - (0.1 + 0.0005)).abs() < 1e-9);
    assert!((machine.output().current_time() - 0.1).abs() < 1e-12);
}
