//! Domain record types stored by the engine.
//!
//! Field orders documented here are the on-disk orders; changing one is a
//! format break for every existing data directory.

use super::codec::{expect_fields, parse_decimal, parse_int, parse_timestamp};
use super::{Record, TIMESTAMP_FORMAT};
use crate::error::{Error, Result};
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use std::fmt;

/// Lifecycle status of a vehicle on the lot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VehicleStatus {
    /// On the lot and available for sale.
    Available,
    /// Held for a customer.
    Reserve,
    /// In transit to the lot.
    Delivery,
    /// Sold; a sale record should exist for the vehicle.
    Sold,
}

impl VehicleStatus {
    /// The stable on-disk name of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleStatus::Available => "available",
            VehicleStatus::Reserve => "reserve",
            VehicleStatus::Delivery => "delivery",
            VehicleStatus::Sold => "sold",
        }
    }

    /// Parse a status from its on-disk name.
    pub fn parse(field: &str) -> Result<Self> {
        match field {
            "available" => Ok(VehicleStatus::Available),
            "reserve" => Ok(VehicleStatus::Reserve),
            "delivery" => Ok(VehicleStatus::Delivery),
            "sold" => Ok(VehicleStatus::Sold),
            other => Err(Error::decoding(format!(
                "{:?} is not a vehicle status",
                other
            ))),
        }
    }
}

impl fmt::Display for VehicleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A vehicle on the lot.
///
/// Field order: `vin;model;price;date_start;status`.
#[derive(Debug, Clone, PartialEq)]
pub struct Vehicle {
    /// Vehicle identification number, the table key.
    pub vin: String,
    /// Foreign key to the id of the vehicle's [`Model`].
    pub model: i64,
    /// Sticker price.
    pub price: Decimal,
    /// Date the vehicle entered the lot.
    pub date_start: NaiveDateTime,
    /// Current lifecycle status.
    pub status: VehicleStatus,
}

impl Record for Vehicle {
    fn key(&self) -> String {
        self.vin.clone()
    }

    fn to_fields(&self) -> Vec<String> {
        vec![
            self.vin.clone(),
            self.model.to_string(),
            self.price.to_string(),
            self.date_start.format(TIMESTAMP_FORMAT).to_string(),
            self.status.to_string(),
        ]
    }

    fn from_fields(fields: &[&str]) -> Result<Self> {
        expect_fields(fields, 5, "vehicle")?;
        Ok(Self {
            vin: fields[0].to_string(),
            model: parse_int(fields[1], "model")?,
            price: parse_decimal(fields[2], "price")?,
            date_start: parse_timestamp(fields[3], "date_start")?,
            status: VehicleStatus::parse(fields[4])?,
        })
    }
}

/// A vehicle model.
///
/// Field order: `id;name;brand`. The table key is the id rendered as its
/// decimal string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Model {
    /// Model id, the table key.
    pub id: i64,
    /// Model name.
    pub name: String,
    /// Brand name.
    pub brand: String,
}

impl Record for Model {
    fn key(&self) -> String {
        self.id.to_string()
    }

    fn to_fields(&self) -> Vec<String> {
        vec![self.id.to_string(), self.name.clone(), self.brand.clone()]
    }

    fn from_fields(fields: &[&str]) -> Result<Self> {
        expect_fields(fields, 3, "model")?;
        Ok(Self {
            id: parse_int(fields[0], "id")?,
            name: fields[1].to_string(),
            brand: fields[2].to_string(),
        })
    }
}

/// A completed sale.
///
/// Field order: `sales_number;vehicle_vin;sales_date;cost`. The table key is
/// the sold vehicle's vin, so a vehicle carries at most one live sale.
#[derive(Debug, Clone, PartialEq)]
pub struct Sale {
    /// Sale identifier of the form `<opaque>#<vin>`.
    pub sales_number: String,
    /// Vin of the sold vehicle, the table key.
    pub vehicle_vin: String,
    /// Date of the sale.
    pub sales_date: NaiveDateTime,
    /// Final cost paid.
    pub cost: Decimal,
}

impl Record for Sale {
    fn key(&self) -> String {
        self.vehicle_vin.clone()
    }

    fn to_fields(&self) -> Vec<String> {
        vec![
            self.sales_number.clone(),
            self.vehicle_vin.clone(),
            self.sales_date.format(TIMESTAMP_FORMAT).to_string(),
            self.cost.to_string(),
        ]
    }

    fn from_fields(fields: &[&str]) -> Result<Self> {
        expect_fields(fields, 4, "sale")?;
        Ok(Self {
            sales_number: fields[0].to_string(),
            vehicle_vin: fields[1].to_string(),
            sales_date: parse_timestamp(fields[2], "sales_date")?,
            cost: parse_decimal(fields[3], "cost")?,
        })
    }
}

/// Joined view of a vehicle, its model and (when sold) its sale.
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleFullInfo {
    /// Vehicle identification number.
    pub vin: String,
    /// Name of the vehicle's model.
    pub model_name: String,
    /// Brand of the vehicle's model.
    pub model_brand: String,
    /// Sticker price.
    pub price: Decimal,
    /// Date the vehicle entered the lot.
    pub date_start: NaiveDateTime,
    /// Current lifecycle status.
    pub status: VehicleStatus,
    /// Date of the sale, when the vehicle is sold and a sale record exists.
    pub sales_date: Option<NaiveDateTime>,
    /// Cost paid, when the vehicle is sold and a sale record exists.
    pub sales_cost: Option<Decimal>,
}

/// One row of the top-selling-models report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSalesStats {
    /// Name of the model.
    pub model_name: String,
    /// Brand of the model.
    pub brand: String,
    /// Number of sales counted for the model.
    pub sales_count: u64,
}
