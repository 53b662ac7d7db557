//! Record types and the fixed-width slot codec.
//!
//! Every record stored by the engine occupies exactly one slot: its fields
//! are rendered in a fixed order, joined by [`FIELD_SEPARATOR`] and
//! right-padded with spaces to the table's record width. Decoding is the
//! exact left inverse of encoding for any record that encoded successfully.
//!
//! ## Usage
//!
//! ```rust
//! use motordb::record::{decode_record, encode_record, Model};
//!
//! # fn main() -> Result<(), motordb::Error> {
//! let model = Model { id: 1, name: "Kalina".to_string(), brand: "Lada".to_string() };
//!
//! let slot = encode_record(&model, 500)?;
//! assert_eq!(slot.len(), 500);
//!
//! let decoded: Model = decode_record(&slot)?;
//! assert_eq!(decoded, model);
//! # Ok(())
//! # }
//! ```

pub mod codec;
pub mod types;

pub use codec::{decode_record, encode_record};
pub use types::{Model, ModelSalesStats, Sale, Vehicle, VehicleFullInfo, VehicleStatus};

use crate::error::Result;

/// Separator between fields inside a slot. No field value may contain it.
pub const FIELD_SEPARATOR: char = ';';

/// On-disk timestamp format for all date fields.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A typed record that can occupy one fixed-width slot.
pub trait Record: Sized {
    /// The logical key this record is indexed under, unique per table.
    fn key(&self) -> String;

    /// Field values in their fixed, documented order.
    fn to_fields(&self) -> Vec<String>;

    /// Rebuild a record from decoded field values.
    fn from_fields(fields: &[&str]) -> Result<Self>;
}
