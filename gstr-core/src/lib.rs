//! gstr-core: tax record model, jurisdiction resolution, field derivation and
//! transaction classification for GST sales registers.
//!
//! Everything here is synchronous and does no I/O. Records go through
//! [`Engine::process_record`] one at a time:
//! resolve jurisdiction -> derive amounts -> fill place of supply -> classify.

pub mod classifier;
pub mod derivation;
pub mod engine;
pub mod error;
pub mod jurisdiction;
pub mod record;
pub mod resolver;
pub mod supplier;

pub use classifier::{B2CL_INVOICE_THRESHOLD, assign_category, classify};
pub use derivation::{
    Derivation, DerivationCase, Known, Quadruple, Stage, derive, derive_fields, derive_quadruple,
};
pub use engine::Engine;
pub use error::{EngineError, MissingSupplierId, TableError};
pub use jurisdiction::{JurisdictionTable, StateCode, StateEntry};
pub use record::{GstTreatment, PlaceOfSupply, TaxHeads, TaxRecord, TransactionType};
pub use resolver::{ResolvedBy, StateResolver, fill_place_of_supply, resolve_jurisdiction};
pub use supplier::fill_supplier_ids;
