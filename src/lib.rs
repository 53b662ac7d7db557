//! # MotorDB - A Fixed-Width Flat-File Record Engine
//!
//! MotorDB is a minimal record-oriented storage engine for vehicle
//! dealership data. Records are stored as fixed-width text slots in flat
//! files, with a sorted key→slot index kept next to each data file, so any
//! engine instance pointed at the same directory reads and writes the exact
//! same bytes.
//!
//! ## Architecture
//!
//! The engine consists of several key components:
//!
//! - **RecordCodec** (`record`): encodes/decodes typed records to/from
//!   fixed-width text slots
//! - **SlotFile**: a flat file of fixed-stride slots addressed by slot number
//! - **IndexStore**: an ordered key→slot mapping mirrored to an index file
//!   on every mutation
//! - **Table**: one SlotFile plus one IndexStore behind a typed CRUD API
//! - **Engine**: three tables (vehicles, models, sales) and the cross-table
//!   operations that join them
//!
//! Data flows strictly downward: Engine → Table → {SlotFile, IndexStore} →
//! RecordCodec.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use motordb::{Engine, Model, Options, Vehicle, VehicleStatus};
//!
//! # fn main() -> Result<(), motordb::Error> {
//! let mut engine = Engine::open("./dealership_data", Options::default())?;
//!
//! engine.add_model(Model {
//!     id: 1,
//!     name: "Vesta".to_string(),
//!     brand: "Lada".to_string(),
//! })?;
//!
//! engine.add_vehicle(Vehicle {
//!     vin: "KNAGM4A77D5316538".to_string(),
//!     model: 1,
//!     price: "2500.99".parse().unwrap(),
//!     date_start: chrono::NaiveDate::from_ymd_opt(2023, 9, 3)
//!         .unwrap()
//!         .and_hms_opt(0, 0, 0)
//!         .unwrap(),
//!     status: VehicleStatus::Available,
//! })?;
//!
//! let available = engine.vehicles_by_status(VehicleStatus::Available)?;
//! println!("{} vehicles available", available.len());
//! # Ok(())
//! # }
//! ```
//!
//! ## Concurrency
//!
//! The engine is single-writer by design: every operation is a sequence of
//! blocking file reads and writes that completes before returning, and the
//! methods take `&mut self`, so the borrow checker enforces serialized
//! access. A caller that needs sharing wraps the engine in its own lock.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

// Module declarations
pub mod config;
pub mod error;
pub mod index;
pub mod record;
pub mod slotfile;
pub mod table;

// Re-exports
pub use config::Options;
pub use error::{Error, Result};
pub use record::{
    Model, ModelSalesStats, Record, Sale, Vehicle, VehicleFullInfo, VehicleStatus,
};

use std::path::{Path, PathBuf};
use table::Table;

/// The main engine handle.
///
/// Owns the three tables and implements every cross-table operation. Each
/// instance owns its own table state; nothing is shared globally.
pub struct Engine {
    /// Data directory holding the six table files.
    dir: PathBuf,

    /// Configuration the engine was opened with.
    options: Options,

    /// Vehicles, keyed by vin.
    vehicles: Table<Vehicle>,

    /// Models, keyed by decimal id.
    models: Table<Model>,

    /// Sales, keyed by the sold vehicle's vin.
    sales: Table<Sale>,
}

impl Engine {
    const VEHICLES: &'static str = "vehicles";
    const MODELS: &'static str = "models";
    const SALES: &'static str = "sales";

    /// Opens an engine over the given data directory.
    ///
    /// If the directory does not exist it is created (unless
    /// `create_if_missing` is disabled). Each table's index file is read
    /// once at startup and cross-checked against its data file.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The options are invalid
    /// - The directory is missing and may not be created
    /// - Any table file is structurally corrupt
    pub fn open<P: AsRef<Path>>(path: P, options: Options) -> Result<Self> {
        let dir = path.as_ref().to_path_buf();

        // Step 1: Validate options
        options.validate()?;

        // Step 2: Create the data directory if needed
        if !dir.exists() {
            if options.create_if_missing {
                std::fs::create_dir_all(&dir)?;
            } else {
                return Err(Error::not_found(format!(
                    "data directory does not exist: {:?}",
                    dir
                )));
            }
        }

        // Step 3: Open the three tables (loads and validates each index)
        let vehicles = Table::open(&dir, Self::VEHICLES, &options)?;
        let models = Table::open(&dir, Self::MODELS, &options)?;
        let sales = Table::open(&dir, Self::SALES, &options)?;

        log::info!(
            "opened engine at {:?}: {} vehicles, {} models, {} sales",
            dir,
            vehicles.len(),
            models.len(),
            sales.len()
        );

        Ok(Self {
            dir,
            options,
            vehicles,
            models,
            sales,
        })
    }

    /// Registers a new model.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::DuplicateKey`] if a model with the same id
    /// already exists.
    pub fn add_model(&mut self, model: Model) -> Result<Model> {
        self.models.insert(&model)?;
        Ok(model)
    }

    /// Registers a new vehicle.
    ///
    /// The model foreign key is advisory and not checked here; a dangling
    /// reference surfaces as [`Error::NotFound`] from the joins that need it.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::DuplicateKey`] if a vehicle with the same vin
    /// already exists.
    pub fn add_vehicle(&mut self, vehicle: Vehicle) -> Result<Vehicle> {
        self.vehicles.insert(&vehicle)?;
        Ok(vehicle)
    }

    /// Records a sale and marks the vehicle sold, returning the updated
    /// vehicle.
    ///
    /// With the default options the vehicle is resolved before the sale is
    /// written, so a failed sale mutates nothing. With
    /// [`Options::allow_orphan_sales`] the sale record is persisted first
    /// and kept even when the vehicle cannot be resolved.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::NotFound`] if the vehicle does not exist and
    /// [`Error::DuplicateKey`] if the vehicle already has a live sale.
    pub fn sell(&mut self, sale: Sale) -> Result<Vehicle> {
        if !self.options.allow_orphan_sales && self.vehicles.get(&sale.vehicle_vin)?.is_none() {
            return Err(Error::not_found(format!("vehicle {}", sale.vehicle_vin)));
        }

        self.sales.insert(&sale)?;

        let Some((mut vehicle, slot)) = self.vehicles.get(&sale.vehicle_vin)? else {
            // Orphan mode: the sale stays behind as an audit entry.
            log::warn!(
                "sale {} kept for unknown vehicle {}",
                sale.sales_number,
                sale.vehicle_vin
            );
            return Err(Error::not_found(format!("vehicle {}", sale.vehicle_vin)));
        };

        vehicle.status = VehicleStatus::Sold;
        self.vehicles.update_in_place(slot, &vehicle)?;

        Ok(vehicle)
    }

    /// Returns every vehicle currently in the given status, in slot order.
    pub fn vehicles_by_status(&mut self, status: VehicleStatus) -> Result<Vec<Vehicle>> {
        let mut matching = Vec::new();
        for vehicle in self.vehicles.scan() {
            let vehicle = vehicle?;
            if vehicle.status == status {
                matching.push(vehicle);
            }
        }
        Ok(matching)
    }

    /// Resolves the full joined view of a vehicle, or `Ok(None)` if the vin
    /// is unknown.
    ///
    /// The model join is required and a dangling model reference is an
    /// error. The sale join is best-effort: a sold vehicle without a sale
    /// record keeps its sale fields empty.
    pub fn full_info(&mut self, vin: &str) -> Result<Option<VehicleFullInfo>> {
        let Some((vehicle, _)) = self.vehicles.get(vin)? else {
            return Ok(None);
        };

        let (model, _) = self
            .models
            .get(&vehicle.model.to_string())?
            .ok_or_else(|| Error::not_found(format!("model {}", vehicle.model)))?;

        let mut sales_date = None;
        let mut sales_cost = None;
        if vehicle.status == VehicleStatus::Sold {
            match self.sales.get(vin)? {
                Some((sale, _)) => {
                    sales_date = Some(sale.sales_date);
                    sales_cost = Some(sale.cost);
                }
                None => log::warn!("vehicle {} is sold but has no sale record", vin),
            }
        }

        Ok(Some(VehicleFullInfo {
            vin: vehicle.vin,
            model_name: model.name,
            model_brand: model.brand,
            price: vehicle.price,
            date_start: vehicle.date_start,
            status: vehicle.status,
            sales_date,
            sales_cost,
        }))
    }

    /// Changes a vehicle's vin, returning the updated vehicle.
    ///
    /// The record keeps its slot; only the index entry moves. Sales
    /// referencing the old vin are not rewritten, since foreign keys are
    /// advisory throughout.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::NotFound`] if no vehicle has the old vin and
    /// [`Error::DuplicateKey`] if the new vin is already taken.
    pub fn rename_vehicle_vin(&mut self, vin: &str, new_vin: &str) -> Result<Vehicle> {
        let Some((mut vehicle, _)) = self.vehicles.get(vin)? else {
            return Err(Error::not_found(format!("vehicle {}", vin)));
        };

        vehicle.vin = new_vin.to_string();
        self.vehicles.rename_key(vin, &vehicle)?;

        Ok(vehicle)
    }

    /// Deletes a sale by its identifier and restores the vehicle to
    /// available, returning the updated vehicle.
    ///
    /// The vehicle vin is parsed from the identifier's `<opaque>#<vin>`
    /// form; the stored sale must carry the same identifier.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::InvalidArgument`] if the identifier has no vin
    /// suffix and [`Error::NotFound`] if no matching sale or vehicle exists.
    pub fn revert_sale(&mut self, sales_number: &str) -> Result<Vehicle> {
        let (_, vin) = sales_number.rsplit_once('#').ok_or_else(|| {
            Error::invalid_argument(format!(
                "sale identifier {:?} has no '#<vin>' suffix",
                sales_number
            ))
        })?;

        // Match the identifier before deleting anything.
        let Some((sale, _)) = self.sales.get(vin)? else {
            return Err(Error::not_found(format!("sale {}", sales_number)));
        };
        if sale.sales_number != sales_number {
            return Err(Error::not_found(format!("sale {}", sales_number)));
        }

        self.sales.delete(vin)?;

        let Some((mut vehicle, slot)) = self.vehicles.get(vin)? else {
            return Err(Error::not_found(format!("vehicle {}", vin)));
        };
        vehicle.status = VehicleStatus::Available;
        self.vehicles.update_in_place(slot, &vehicle)?;

        Ok(vehicle)
    }

    /// Returns the top `n` models by sale count, most sold first.
    ///
    /// Ties keep the order in which the models were first encountered while
    /// scanning the sales table, so the report is deterministic.
    ///
    /// # Errors
    ///
    /// A sale whose vehicle or whose vehicle's model cannot be resolved
    /// fails the whole report with [`Error::NotFound`]; these joins are
    /// required, unlike the best-effort sale join of [`Engine::full_info`].
    pub fn top_selling_models(&mut self, n: usize) -> Result<Vec<ModelSalesStats>> {
        let sales: Vec<Sale> = self.sales.scan().collect::<Result<_>>()?;

        // Count per model id, preserving first-encounter order for the
        // stable tie-break.
        let mut counts: Vec<(i64, u64)> = Vec::new();
        for sale in &sales {
            let (vehicle, _) = self
                .vehicles
                .get(&sale.vehicle_vin)?
                .ok_or_else(|| Error::not_found(format!("vehicle {}", sale.vehicle_vin)))?;

            match counts.iter_mut().find(|(id, _)| *id == vehicle.model) {
                Some((_, count)) => *count += 1,
                None => counts.push((vehicle.model, 1)),
            }
        }

        // Vec::sort_by is stable: equal counts keep encounter order.
        counts.sort_by(|a, b| b.1.cmp(&a.1));
        counts.truncate(n);

        let mut stats = Vec::with_capacity(counts.len());
        for (model_id, sales_count) in counts {
            let (model, _) = self
                .models
                .get(&model_id.to_string())?
                .ok_or_else(|| Error::not_found(format!("model {}", model_id)))?;
            stats.push(ModelSalesStats {
                model_name: model.name,
                brand: model.brand,
                sales_count,
            });
        }

        Ok(stats)
    }

    /// Closes the engine, fsyncing every table.
    pub fn close(mut self) -> Result<()> {
        self.sync_all()?;
        log::info!("closed engine at {:?}", self.dir);
        Ok(())
    }

    fn sync_all(&mut self) -> Result<()> {
        self.vehicles.sync()?;
        self.models.sync()?;
        self.sales.sync()
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// The data directory path.
    pub fn data_dir(&self) -> &Path {
        &self.dir
    }

    /// Number of vehicles stored.
    pub fn vehicle_count(&self) -> usize {
        self.vehicles.len()
    }

    /// Number of models stored.
    pub fn model_count(&self) -> usize {
        self.models.len()
    }

    /// Number of sales stored.
    pub fn sale_count(&self) -> usize {
        self.sales.len()
    }

    /// The configuration the engine was opened with.
    pub fn options(&self) -> &Options {
        &self.options
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        // Best effort sync on drop; errors can't be propagated here.
        if let Err(e) = self.sync_all() {
            log::warn!("error syncing engine during drop: {}", e);
        }
    }
}
