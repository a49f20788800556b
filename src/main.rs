use drumkit::{
    AudioEngine, DrumMachine, EngineConfig, FeatureFlags, Instrument, MonotonicClock,
    create_notification_channel,
};
use ringbuf::HeapRb;
use ringbuf::traits::{Consumer, Producer, Split};
use std::io::BufRead;
use std::sync::{Arc, Mutex};
use std::time::Duration;

// Lines typed faster than the control loop drains them
const INPUT_RINGBUFFER_CAPACITY: usize = 64;
const CONTROL_LOOP_PERIOD: Duration = Duration::from_millis(1);

fn print_help() {
    println!("Pads:");
    for instrument in Instrument::ALL {
        println!("  {}  {}", instrument.key(), instrument.name());
    }
    println!("Transport: r record/stop, p play, x stop, c clear, m metronome");
    println!("Add-ons:   fx toggle FX, q toggle quantize");
    println!("Other:     e enable audio, status, h help, quit\n");
}

fn main() {
    env_logger::init();

    println!("=== Drumkit ===\n");

    let config = EngineConfig::load_or_default();

    let (notification_tx, notification_rx) =
        create_notification_channel(config.notification_capacity);
    let notification_tx = Arc::new(Mutex::new(notification_tx));

    let engine = match AudioEngine::new(
        config.master_gain,
        config.command_capacity,
        notification_tx.clone(),
    ) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            std::process::exit(1);
        }
    };

    let flags = FeatureFlags::default();
    let mut machine = DrumMachine::new(
        engine,
        MonotonicClock::new(),
        &config,
        flags.clone(),
        notification_tx,
        notification_rx,
    );

    // stdin is blocking: read it on its own thread and hand lines over
    let (mut line_tx, mut line_rx) = HeapRb::<String>::new(INPUT_RINGBUFFER_CAPACITY).split();
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if line_tx.try_push(line).is_err() {
                log::warn!("Input queue full, dropping line");
            }
        }
    });

    print_help();

    'control: loop {
        while let Some(line) = line_rx.try_pop() {
            let command = line.trim();
            let result = match command {
                "quit" | "exit" => break 'control,
                "r" => {
                    machine.toggle_recording();
                    Ok(())
                }
                "p" => {
                    // The empty-take warning arrives as a notification
                    let _ = machine.play();
                    Ok(())
                }
                "x" => {
                    machine.stop();
                    Ok(())
                }
                "c" => {
                    machine.clear();
                    Ok(())
                }
                "m" => {
                    let enabled = !machine.metronome_enabled();
                    machine.set_metronome_enabled(enabled);
                    println!("Metronome {}", if enabled { "on" } else { "off" });
                    Ok(())
                }
                "fx" => {
                    println!("FX {}", if flags.toggle_fx() { "on" } else { "off" });
                    Ok(())
                }
                "q" => {
                    println!("Quantize {}", if flags.toggle_quantize() { "on" } else { "off" });
                    Ok(())
                }
                "e" => machine.enable_audio(),
                "status" => {
                    println!("Audio {}", machine.output().status.get());
                    Ok(())
                }
                "h" | "help" => {
                    print_help();
                    Ok(())
                }
                // Several pad keys on one line play together
                pads => pads
                    .chars()
                    .filter_map(Instrument::from_key)
                    .try_for_each(|instrument| machine.trigger(instrument, None)),
            };

            if let Err(e) = result {
                eprintln!("ERROR: {}", e);
            }
        }

        if let Err(e) = machine.tick() {
            eprintln!("ERROR: {}", e);
        }

        for notification in machine.drain_notifications() {
            println!("{}", notification);
        }

        std::thread::sleep(CONTROL_LOOP_PERIOD);
    }

    machine.teardown();
    println!("Bye.");
}
