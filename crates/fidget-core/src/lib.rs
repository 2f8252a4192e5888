//! # fidget-core
//!
//! **Your mouse hand is a hardware noise source.**
//!
//! `fidget-core` turns unpredictable physical and system signals — pointer
//! motion, scheduler/process statistics, and optionally microphone audio —
//! into uniformly distributed integers in `[0, 2048)`.
//!
//! ## Quick Start
//!
//! ```no_run
//! use fidget_core::{Collector, StartOptions};
//!
//! let collector = Collector::with_defaults();
//! collector.start_collection(StartOptions::default());
//!
//! // Feed pointer motion from your event loop:
//! collector.record_pointer_motion(412, 317);
//!
//! // Poll progress at any rate:
//! let status = collector.status();
//! println!("{} samples, {:.1}s active", status.total_samples, status.active_duration_seconds);
//!
//! // Once the sufficiency gate passes:
//! if collector.is_sufficient() {
//!     let n = collector.generate_one().unwrap();
//!     assert!(n < 2048);
//! }
//!
//! collector.stop_collection();
//! ```
//!
//! ## Architecture
//!
//! Sources → per-source pools (bounded FIFO) → sufficiency gate → SHA-256
//! mixing → output integer(s).
//!
//! Each enabled source runs as an independent producer appending to its own
//! bounded pool; the pointer source additionally drives the activity-duration
//! tracker that gates generation. Generation hashes a point-in-time snapshot
//! of all pools plus fresh timing jitter — it never consumes samples, a
//! deliberate faithfulness to the reference design (see [`mixer`]).
//!
//! This is not a cryptographically certified RNG: no formal entropy-rate
//! claim is made, and entropy does not persist across process restarts.

pub mod activity;
pub mod collector;
pub mod config;
pub mod error;
pub mod mixer;
pub mod policy;
pub mod pool;
pub mod sources;

pub use activity::ActivityTracker;
pub use collector::{Collector, GeneratedNumber, StartOptions, Status};
pub use config::{AudioConfig, CollectorConfig, OUTPUT_RANGE};
pub use error::{EntropyShortfall, Error};
pub use policy::SufficiencyPolicy;
pub use pool::{Sample, SamplePool, SourceKind};

/// Library version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
