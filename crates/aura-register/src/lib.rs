//! # aura-register: I/O Layer for Aura POS
//!
//! Wraps the pure [`aura_core::PosStore`] with the pieces that need the
//! outside world: configuration, the settings file, the receipt printer and
//! snapshot export.
//!
//! ## Data Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  RegisterConfig::load()  env > register.toml > defaults                 │
//! │          │                                                              │
//! │          ▼                                                              │
//! │  Register::from_config() ──► PosStore (aura-core)                       │
//! │          │                                                              │
//! │          ├── checkout() ──► order ──► receipt text ──► Printer          │
//! │          │                  (printed when autoPrintReceipts is on)      │
//! │          │                                                              │
//! │          ├── settings() / update_settings()  ──► FileSettingsStorage    │
//! │          │                                                              │
//! │          └── export_snapshot() ──► JSON file                            │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! External I/O failures are logged and returned; nothing is retried.

pub mod config;
pub mod error;
pub mod export;
pub mod printer;
pub mod receipt;
pub mod register;
pub mod settings;

pub use config::{PrinterConfig, RegisterConfig};
pub use error::{RegisterError, RegisterResult};
pub use printer::{NetworkPrinter, PrintError, PrintJob, PrintResult, Printer};
pub use register::Register;
pub use settings::FileSettingsStorage;

use tracing_subscriber::EnvFilter;

/// Installs the global tracing subscriber.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages, refusals included
/// - `RUST_LOG=aura_core=trace` - Trace the core only
/// - Default: `info,aura=debug`
///
/// Calling it again is harmless; the first subscriber stays installed.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,aura=debug"));

    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
