//! # Register Configuration
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     AURA_STORE_NAME="Corner Cafe"                                      │
//! │     AURA_TAX_RATE=8.25                                                 │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/aura-pos/register.toml (Linux)                           │
//! │     ~/Library/Application Support/com.aura.pos/register.toml (macOS)   │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     8% tax, "$", two decimals, no printer                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! store_name = "Corner Cafe"
//! store_address = "12 Main St"
//! terminal_id = "t1"
//! terminal_name = "Front Counter"
//! default_tax_rate_bps = 825
//!
//! [receipt_printer]
//! address = "192.168.1.50"
//! port = 9100
//! paper_width = 42
//! ```

use std::path::PathBuf;

use aura_core::validation::validate_tax_rate_bps;
use aura_core::{TaxRate, Terminal};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{RegisterError, RegisterResult};

const CONFIG_FILE: &str = "register.toml";

// =============================================================================
// Printer Configuration
// =============================================================================

/// Network receipt printer (raw TCP, usually port 9100).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrinterConfig {
    /// IP or host name. Names are resolved when a job is sent.
    pub address: String,

    #[serde(default = "default_printer_port")]
    pub port: u16,

    /// Characters per receipt line. 42 fits 80mm paper, 32 fits 58mm.
    #[serde(default = "default_paper_width")]
    pub paper_width: usize,
}

fn default_printer_port() -> u16 {
    9100
}

fn default_paper_width() -> usize {
    42
}

impl PrinterConfig {
    pub fn new(address: impl Into<String>) -> Self {
        PrinterConfig {
            address: address.into(),
            port: default_printer_port(),
            paper_width: default_paper_width(),
        }
    }
}

// =============================================================================
// Register Configuration
// =============================================================================

/// Everything a register needs to know about where it runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegisterConfig {
    pub store_name: String,
    pub store_address: Option<String>,
    pub terminal_id: String,
    pub terminal_name: String,
    pub currency_symbol: String,
    pub currency_decimals: u8,
    pub default_tax_rate_bps: u32,
    /// Where settings and exports are written. Platform data dir if unset.
    pub data_dir: Option<PathBuf>,
    pub receipt_printer: Option<PrinterConfig>,
}

impl Default for RegisterConfig {
    fn default() -> Self {
        RegisterConfig {
            store_name: "Aura POS".to_string(),
            store_address: None,
            terminal_id: "terminal-1".to_string(),
            terminal_name: "Register 1".to_string(),
            currency_symbol: "$".to_string(),
            currency_decimals: 2,
            default_tax_rate_bps: TaxRate::default().bps(),
            data_dir: None,
            receipt_printer: None,
        }
    }
}

impl RegisterConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (register.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> RegisterResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading register config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load register config: {}. Using defaults.", e);
            Self::default()
        })
    }

    pub fn save(&self, config_path: Option<PathBuf>) -> RegisterResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| RegisterError::InvalidConfig("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, "Register config saved");
        Ok(())
    }

    pub fn validate(&self) -> RegisterResult<()> {
        validate_tax_rate_bps(self.default_tax_rate_bps)
            .map_err(|e| RegisterError::InvalidConfig(e.to_string()))?;

        if self.currency_decimals > 4 {
            return Err(RegisterError::InvalidConfig(format!(
                "currency_decimals must be at most 4, got: {}",
                self.currency_decimals
            )));
        }

        if self.terminal_id.trim().is_empty() {
            return Err(RegisterError::InvalidConfig(
                "terminal_id must not be empty".into(),
            ));
        }

        if let Some(printer) = &self.receipt_printer {
            if printer.address.trim().is_empty() || printer.port == 0 {
                return Err(RegisterError::InvalidConfig(format!(
                    "Invalid printer address: {}:{}",
                    printer.address, printer.port
                )));
            }
            if printer.paper_width < 24 {
                return Err(RegisterError::InvalidConfig(format!(
                    "paper_width must be at least 24, got: {}",
                    printer.paper_width
                )));
            }
        }

        Ok(())
    }

    /// Applies overrides from `lookup`, which is `std::env::var` in
    /// production.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(name) = lookup("AURA_STORE_NAME") {
            self.store_name = name;
        }

        if let Some(id) = lookup("AURA_TERMINAL_ID") {
            self.terminal_id = id;
        }

        if let Some(name) = lookup("AURA_TERMINAL_NAME") {
            self.terminal_name = name;
        }

        // Percentage, e.g. "8.25"
        if let Some(rate) = lookup("AURA_TAX_RATE") {
            match rate.trim().parse::<f64>() {
                Ok(pct) if pct.is_finite() && pct >= 0.0 => {
                    let rate = TaxRate::from_percentage(pct);
                    debug!(bps = rate.bps(), "Overriding tax rate from environment");
                    self.default_tax_rate_bps = rate.bps();
                }
                _ => warn!(value = %rate, "Ignoring invalid AURA_TAX_RATE"),
            }
        }

        if let Some(addr) = lookup("AURA_PRINTER_ADDR") {
            debug!(addr = %addr, "Overriding printer address from environment");
            match self.receipt_printer.as_mut() {
                Some(printer) => printer.address = addr,
                None => self.receipt_printer = Some(PrinterConfig::new(addr)),
            }
        }

        if let Some(port) = lookup("AURA_PRINTER_PORT") {
            match (port.parse::<u16>(), self.receipt_printer.as_mut()) {
                (Ok(p), Some(printer)) => printer.port = p,
                (Ok(_), None) => warn!("AURA_PRINTER_PORT set without a printer address"),
                (Err(_), _) => warn!(value = %port, "Ignoring invalid AURA_PRINTER_PORT"),
            }
        }

        if let Some(dir) = lookup("AURA_DATA_DIR") {
            self.data_dir = Some(PathBuf::from(dir));
        }
    }

    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "aura", "pos")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE))
    }

    /// Configured data directory, else the platform one.
    pub fn data_dir(&self) -> Option<PathBuf> {
        self.data_dir.clone().or_else(|| {
            directories::ProjectDirs::from("com", "aura", "pos")
                .map(|dirs| dirs.data_dir().to_path_buf())
        })
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    pub fn tax_rate(&self) -> TaxRate {
        TaxRate::from_bps(self.default_tax_rate_bps)
    }

    pub fn terminal(&self) -> Terminal {
        Terminal::new(self.terminal_id.clone(), self.terminal_name.clone())
    }

    /// Formats cents for display using the configured currency.
    ///
    /// ```rust
    /// use aura_register::RegisterConfig;
    ///
    /// let config = RegisterConfig::default();
    /// assert_eq!(config.format_currency(1234), "$12.34");
    /// assert_eq!(config.format_currency(-1234), "-$12.34");
    /// ```
    pub fn format_currency(&self, cents: i64) -> String {
        let sign = if cents < 0 { "-" } else { "" };
        let abs = cents.unsigned_abs();
        if self.currency_decimals == 0 {
            return format!("{}{}{}", sign, self.currency_symbol, abs / 100);
        }
        // Amounts are always stored in cents; extra decimals pad with zeros.
        let dollars = abs / 100;
        let fraction = format!("{:02}", abs % 100);
        let width = self.currency_decimals as usize;
        format!(
            "{}{}{}.{:0<width$}",
            sign, self.currency_symbol, dollars, fraction
        )
    }

    /// Paper width of the configured printer, or the 80mm default.
    pub fn paper_width(&self) -> usize {
        self.receipt_printer
            .as_ref()
            .map_or_else(default_paper_width, |p| p.paper_width)
    }
}
