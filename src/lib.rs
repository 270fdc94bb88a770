//! MetaIO Header Engine
//!
//! A schema-driven reader and writer for the tagged text headers that
//! describe scientific objects (images, meshes, tubes), with an optional
//! binary payload after the last header line.
//!
//! ## Features
//!
//! - **Dynamic Schemas**: Read and write passes each assemble an ordered field list
//! - **Dependent Lengths**: Array and matrix sizes resolve from `NDims` at decode time
//! - **Legacy Aliases**: `Position`, `Origin`, `Rotation`, `Orientation` fold into canonical storage
//! - **User Fields**: Callers extend the format at run time with full round-trip symmetry
//! - **Default Elision**: Fields at their default value are left out on write
//! - **Format Tolerance**: Unknown header lines are kept verbatim
//!
//! ## Architecture
//!
//! ```text
//! read:   stream ─▶ scanner ─▶ reader ─▶ compat ─▶ ObjectHeader
//!                                │
//!                                └─▶ additional fields
//!
//! write:  ObjectHeader ─▶ registry (elide defaults) ─▶ writer ─▶ stream
//!
//! FieldRegistry
//! ├── FieldArena          owns every descriptor
//! ├── user read fields    handles into the arena
//! └── user write fields   handles into the arena
//! ```

pub mod codec;
pub mod compat;
pub mod config;
pub mod error;
pub mod field;
pub mod header;
pub mod object;
pub mod reader;
pub mod registry;
pub mod scanner;
pub mod schema;
pub mod units;
pub mod value;
pub mod version;
pub mod writer;

pub use codec::{PayloadCodec, ZlibCodec};
pub use config::MetaIoConfig;
pub use error::{MetaError, Result};
pub use field::{AdditionalField, FieldArena, FieldId, FieldRecord};
pub use header::{ObjectHeader, MAX_DIMS};
pub use object::{MetaObject, ObjectInfo};
pub use reader::ReadOptions;
pub use registry::FieldRegistry;
pub use schema::Schema;
pub use units::{AnatomicalOrientation, DistanceUnits};
pub use value::{MetaValue, ValueType};
pub use version::{ApiVersion, FileFormatVersion};
pub use writer::FieldWriter;
