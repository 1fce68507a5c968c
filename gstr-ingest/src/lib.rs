//! gstr-ingest: source column mappings and readers that turn sales exports
//! into canonical `TaxRecord`s.

pub mod mapping;
pub mod parsers;
pub mod types;

pub use mapping::{MappingError, MappingRegistry, SourceMapping};
pub use parsers::{
    merge_forward_reverse, read_source, read_source_csv, read_source_file, read_source_workbook,
};
pub use types::CanonicalField;
