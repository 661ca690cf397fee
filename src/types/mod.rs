pub mod error;
pub mod page;
pub mod tuple;
pub mod value;

// Common type aliases
pub type PageId = u64;
pub type PageIndex = usize;

/// Default number of tuples a page may hold.
pub const DEFAULT_MAX_ROWS_PER_PAGE: usize = 200;

/// Date format used for parsing and printing `Value::Date`.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub const PAGE_FILE_MAGIC: &[u8; 8] = b"TERTIBPG";
pub const CHECKSUM_SIZE: usize = 4; // CRC32 checksum size
