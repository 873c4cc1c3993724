//! # Register
//!
//! The async facade a UI front end talks to. Owns the [`PosStore`], the
//! settings storage and the receipt printer.
//!
//! ## Checkout Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  checkout(request)                                                      │
//! │     │                                                                   │
//! │     ├─► PosStore::checkout ──── refused? ──► RegisterError::Core        │
//! │     │         │                              (nothing changed)          │
//! │     │         ▼                                                         │
//! │     │   order created                                                   │
//! │     │         │                                                         │
//! │     ├─► autoPrintReceipts on and printer configured?                    │
//! │     │         │ no ──► Ok(order)                                        │
//! │     │         ▼ yes                                                     │
//! │     └─► render_receipt ──► Printer::print                               │
//! │                  │ ok ──► Ok(order)                                     │
//! │                  └ err ─► RegisterError::Print { order_id }             │
//! │                           (order stays created)                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use aura_core::settings::AppSettingsPatch;
use aura_core::{
    AppSettings, Catalog, CheckoutRequest, CoreError, KeyValueStorage, Order, PosStore,
};
use chrono::Utc;
use tracing::{error, info, warn};

use crate::config::RegisterConfig;
use crate::error::{RegisterError, RegisterResult};
use crate::export;
use crate::printer::{NetworkPrinter, PrintJob, Printer};
use crate::receipt::render_receipt;
use crate::settings::FileSettingsStorage;

pub struct Register<P, S> {
    config: RegisterConfig,
    store: PosStore,
    settings: S,
    printer: Option<P>,
}

impl Register<NetworkPrinter, FileSettingsStorage> {
    /// Builds a register from loaded configuration: the store gets the
    /// configured tax rate, settings live in the data directory and the
    /// network printer is created if one is configured.
    pub fn from_config(config: RegisterConfig, catalog: Catalog) -> RegisterResult<Self> {
        config.validate()?;

        let data_dir = config
            .data_dir()
            .ok_or_else(|| RegisterError::InvalidConfig("No data directory available".into()))?;

        let printer = config
            .receipt_printer
            .as_ref()
            .map(|p| NetworkPrinter::new(&p.address, p.port))
            .transpose()?;

        info!(
            store = %config.store_name,
            terminal = %config.terminal_id,
            printer = printer.is_some(),
            "register ready"
        );

        let store = PosStore::with_tax_rate(catalog, config.tax_rate());
        Ok(Register::new(
            config,
            store,
            FileSettingsStorage::new(data_dir),
            printer,
        ))
    }
}

impl<P: Printer, S: KeyValueStorage> Register<P, S> {
    pub fn new(config: RegisterConfig, store: PosStore, settings: S, printer: Option<P>) -> Self {
        Register {
            config,
            store,
            settings,
            printer,
        }
    }

    pub fn config(&self) -> &RegisterConfig {
        &self.config
    }

    pub fn store(&self) -> &PosStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut PosStore {
        &mut self.store
    }

    // =========================================================================
    // Settings
    // =========================================================================

    pub fn settings(&self) -> RegisterResult<AppSettings> {
        AppSettings::load(&self.settings).map_err(|e| RegisterError::Settings(e.to_string()))
    }

    pub fn update_settings(&mut self, patch: AppSettingsPatch) -> RegisterResult<AppSettings> {
        let settings = AppSettings::update(&mut self.settings, patch)
            .map_err(|e| RegisterError::Settings(e.to_string()))?;
        info!(?settings, "settings updated");
        Ok(settings)
    }

    // =========================================================================
    // Checkout and printing
    // =========================================================================

    /// Checks out the cart, then prints the receipt if auto-print is on.
    pub async fn checkout(&mut self, request: CheckoutRequest) -> RegisterResult<Order> {
        let order = self.store.checkout(request)?;

        let auto_print = match AppSettings::load(&self.settings) {
            Ok(settings) => settings.auto_print_receipts,
            Err(e) => {
                warn!(error = %e, "could not read settings, skipping auto-print");
                false
            }
        };
        if !auto_print || self.printer.is_none() {
            return Ok(order);
        }

        self.send_receipt(&order).await?;
        Ok(order)
    }

    /// Prints the receipt of any order still held by the store.
    pub async fn print_receipt(&self, order_id: &str) -> RegisterResult<()> {
        let order = self
            .store
            .order(order_id)
            .ok_or_else(|| CoreError::OrderNotFound(order_id.to_string()))?;
        if self.printer.is_none() {
            return Err(RegisterError::NoPrinter);
        }
        self.send_receipt(order).await
    }

    pub async fn printer_online(&self) -> bool {
        match &self.printer {
            Some(printer) => printer.is_online().await,
            None => false,
        }
    }

    async fn send_receipt(&self, order: &Order) -> RegisterResult<()> {
        let Some(printer) = &self.printer else {
            return Err(RegisterError::NoPrinter);
        };
        let (address, port) = match &self.config.receipt_printer {
            Some(target) => (target.address.as_str(), target.port),
            // hand-built printers have no configured target to report
            None => ("", NetworkPrinter::DEFAULT_PORT),
        };
        let job = PrintJob::new(address, port, render_receipt(order, &self.config));
        match job.send_via(printer).await {
            Ok(()) => {
                info!(order_id = %order.id, order_number = order.order_number, "receipt printed");
                Ok(())
            }
            Err(source) => {
                error!(order_id = %order.id, error = %source, "receipt print failed");
                Err(RegisterError::Print {
                    order_id: order.id.clone(),
                    source,
                })
            }
        }
    }

    // =========================================================================
    // Export
    // =========================================================================

    /// Exports a snapshot to `path`, or to a timestamped file under the
    /// data directory's `exports/` folder.
    pub fn export_snapshot(&self, path: Option<PathBuf>) -> RegisterResult<PathBuf> {
        let path = match path {
            Some(path) => path,
            None => self
                .config
                .data_dir()
                .ok_or_else(|| RegisterError::InvalidConfig("No data directory available".into()))?
                .join("exports")
                .join(format!("snapshot-{}.json", Utc::now().format("%Y%m%d-%H%M%S"))),
        };
        export::export_to_file(&self.store.snapshot(), &path)?;
        Ok(path)
    }
}
