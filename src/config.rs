//! Configuration options for the MotorDB storage engine.

/// Configuration options for opening an engine.
#[derive(Debug, Clone)]
pub struct Options {
    /// Create the data directory if it doesn't exist.
    /// Default: true
    pub create_if_missing: bool,

    /// Width of a data record slot, in bytes, excluding the newline
    /// terminator. Records whose encoding exceeds this width are rejected
    /// with an encoding error rather than truncated.
    /// Default: 500
    pub record_width: usize,

    /// Width of an index entry, in bytes, excluding the newline terminator.
    /// Default: 30
    pub index_record_width: usize,

    /// Fsync data and index files after every mutating operation.
    /// Disabling trades durability for throughput.
    /// Default: true
    pub sync_writes: bool,

    /// Allow `sell` to persist a sale whose vehicle cannot be resolved.
    /// When disabled (the default), the vehicle is resolved before the sale
    /// record is written, so a failed sale mutates nothing. When enabled,
    /// the sale is kept as an append-only audit entry and the missing
    /// vehicle is still reported as an error.
    /// Default: false
    pub allow_orphan_sales: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            create_if_missing: true,
            record_width: 500,
            index_record_width: 30,
            sync_writes: true,
            allow_orphan_sales: false,
        }
    }
}

impl Options {
    /// Creates a new Options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether to create the data directory if it doesn't exist.
    pub fn create_if_missing(mut self, value: bool) -> Self {
        self.create_if_missing = value;
        self
    }

    /// Sets the data record slot width.
    pub fn record_width(mut self, width: usize) -> Self {
        self.record_width = width;
        self
    }

    /// Sets the index entry width.
    pub fn index_record_width(mut self, width: usize) -> Self {
        self.index_record_width = width;
        self
    }

    /// Enables or disables fsync after every mutating operation.
    pub fn sync_writes(mut self, value: bool) -> Self {
        self.sync_writes = value;
        self
    }

    /// Enables or disables orphan sale records.
    pub fn allow_orphan_sales(mut self, value: bool) -> Self {
        self.allow_orphan_sales = value;
        self
    }

    /// Validates the options and returns an error if any are invalid.
    pub fn validate(&self) -> crate::Result<()> {
        if self.record_width == 0 {
            return Err(crate::Error::invalid_argument("record_width must be > 0"));
        }
        // An index entry must hold at least a one-byte key, the separator
        // and one slot digit.
        if self.index_record_width < 3 {
            return Err(crate::Error::invalid_argument(
                "index_record_width must be >= 3",
            ));
        }
        Ok(())
    }
}
