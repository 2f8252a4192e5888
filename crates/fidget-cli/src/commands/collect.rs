//! `fidget collect` — interactive entropy collection and generation.
//!
//! Drives the collector through its lifecycle: start, poll status with a
//! single-line ticker while the user wiggles the mouse, generate once the
//! sufficiency gate opens, then an interactive generate-on-Enter loop.
//! Ctrl-C at any point triggers an orderly stop before exit.

use std::io::{BufRead, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use fidget_core::{Collector, CollectorConfig, Error, StartOptions};

/// Status poll cadence, independent of any collection cadence.
const TICK: Duration = Duration::from_millis(100);

pub struct CollectOptions {
    pub audio: bool,
    pub count: usize,
    pub batch: bool,
    pub required_seconds: Option<f64>,
    pub min_pointer_samples: Option<usize>,
    pub output_path: Option<String>,
}

pub fn run(options: CollectOptions) {
    let mut config = CollectorConfig::default();
    if let Some(secs) = options.required_seconds {
        config.required_active_duration = Duration::from_secs_f64(secs);
    }
    if let Some(min) = options.min_pointer_samples {
        config.min_pointer_samples = min;
    }
    let required_secs = config.required_active_duration.as_secs_f64();

    let collector = Arc::new(Collector::new(config));
    let interrupted = Arc::new(AtomicBool::new(false));
    {
        let interrupted = Arc::clone(&interrupted);
        if let Err(e) = ctrlc::set_handler(move || interrupted.store(true, Ordering::Relaxed)) {
            log::warn!("could not install Ctrl-C handler: {e}");
        }
    }

    println!("fidget — entropy-based random numbers in [0, 2048)");
    println!("{}", "=".repeat(50));
    println!("Starting entropy collection...");
    collector.start_collection(StartOptions {
        audio_enabled: options.audio,
    });
    spawn_pointer_feed(Arc::clone(&collector));

    println!("\n*** ENTROPY COLLECTION PHASE ***");
    println!("Move your mouse randomly and continuously for {required_secs:.0} seconds.");
    println!("If you stop moving, the countdown pauses. Scheduler entropy is");
    println!("collected automatically in the background.\n");

    // Status ticker until the sufficiency gate opens.
    while !collector.is_sufficient() {
        if interrupted.load(Ordering::Relaxed) {
            println!("\n\nInterrupted.");
            collector.stop_collection();
            return;
        }
        print_ticker(&collector, required_secs);
        std::thread::sleep(TICK);
    }
    let status = collector.status();
    println!("\n\n*** ENTROPY COLLECTION COMPLETE ***");
    println!(
        "Collected {} pointer samples over {:.1}s of active movement ({} total samples)",
        status.pointer_samples, status.active_duration_seconds, status.total_samples
    );

    println!("\nGenerating random numbers...");
    println!("{}", "-".repeat(30));
    let mut generated = generate(&collector, options.count, options.batch);

    // Interactive mode: Enter for another number, q to quit.
    println!("\n{}", "=".repeat(50));
    println!("Interactive mode - press Enter for a new number, 'q' to quit");
    let stdin = std::io::stdin();
    loop {
        if interrupted.load(Ordering::Relaxed) {
            break;
        }
        print!("\n> ");
        let _ = std::io::stdout().flush();
        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => break,
            Ok(_) if line.trim().eq_ignore_ascii_case("q") => break,
            Ok(_) => match collector.generate_one() {
                Ok(value) => {
                    generated.push(value);
                    println!("Random number: {value}");
                }
                Err(e) => println!("Error: {e}"),
            },
            Err(_) => break,
        }
    }

    if let Some(path) = &options.output_path {
        let body: String = generated.iter().map(|v| format!("{v}\n")).collect();
        match std::fs::write(path, body) {
            Ok(()) => println!("Wrote {} numbers to {path}", generated.len()),
            Err(e) => eprintln!("Failed to write {path}: {e}"),
        }
    }

    println!("Stopping entropy collection...");
    collector.stop_collection();
    println!("Done.");
}

fn print_ticker(collector: &Collector, required_secs: f64) {
    let status = collector.status();
    let remaining = (required_secs - status.active_duration_seconds).max(0.0);
    if status.active_duration_seconds == 0.0 {
        print!("\rWaiting for mouse movement to begin... move your mouse!      ");
    } else if status.is_pointer_active {
        print!(
            "\rMouse ACTIVE   | active {:5.1}s | remaining {:5.1}s | pointer {} | scheduler {} | audio {}   ",
            status.active_duration_seconds,
            remaining,
            status.pointer_samples,
            status.scheduler_samples,
            status.audio_samples
        );
    } else {
        print!(
            "\rMOUSE STOPPED! keep moving | active {:5.1}s | remaining {:5.1}s | pointer {} | scheduler {} | audio {}   ",
            status.active_duration_seconds,
            remaining,
            status.pointer_samples,
            status.scheduler_samples,
            status.audio_samples
        );
    }
    let _ = std::io::stdout().flush();
}

fn generate(collector: &Collector, count: usize, batch: bool) -> Vec<u16> {
    if batch {
        match collector.generate_many(count) {
            Ok(values) => {
                for (i, v) in values.iter().enumerate() {
                    println!("Random number {}: {v}", i + 1);
                }
                values
            }
            Err(e) => {
                println!("Error generating batch: {e}");
                Vec::new()
            }
        }
    } else {
        let mut values = Vec::with_capacity(count);
        for i in 0..count {
            match collector.generate_one() {
                Ok(v) => {
                    println!("Random number {}: {v}", i + 1);
                    values.push(v);
                }
                Err(e @ Error::InsufficientEntropy(_)) => {
                    println!("Error generating number: {e}");
                    break;
                }
                Err(e) => {
                    println!("Error: {e}");
                    break;
                }
            }
        }
        values
    }
}

/// Feed pointer motion into the collector from the system mouse device.
///
/// Linux: reads 3-byte PS/2 packets from /dev/input/mice and integrates the
/// relative deltas into absolute coordinates. The reader thread parks on a
/// blocking read and is detached; it quits with the process. On open failure
/// (permissions, no device) collection continues without pointer events.
fn spawn_pointer_feed(collector: Arc<Collector>) {
    #[cfg(target_os = "linux")]
    {
        use std::io::Read;
        let file = match std::fs::File::open("/dev/input/mice") {
            Ok(f) => f,
            Err(e) => {
                eprintln!(
                    "warning: cannot read /dev/input/mice ({e}); pointer entropy unavailable"
                );
                return;
            }
        };
        std::thread::spawn(move || {
            let mut reader = std::io::BufReader::new(file);
            let mut packet = [0u8; 3];
            let (mut x, mut y) = (0i32, 0i32);
            while reader.read_exact(&mut packet).is_ok() {
                let dx = packet[1] as i8 as i32;
                let dy = packet[2] as i8 as i32;
                if dx != 0 || dy != 0 {
                    x = x.wrapping_add(dx);
                    y = y.wrapping_add(dy);
                    collector.record_pointer_motion(x, y);
                }
            }
        });
    }
    #[cfg(not(target_os = "linux"))]
    {
        let _ = collector;
        eprintln!("warning: no pointer device backend on this platform; pointer entropy unavailable");
    }
}
