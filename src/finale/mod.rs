//! Finale Inventory upstream client.
//!
//! Finale's bulk endpoints return column-oriented JSON: an object whose
//! values are parallel arrays indexed by row. [`client::FinaleClient`] zips
//! those arrays back into row structs. The alternate pivot-table report API
//! returns ordinary row objects and is normalized into the same structs.

pub mod client;

pub use client::{FinaleClient, FinaleCredentials, FinaleProductRow, FinaleVendorRow};
