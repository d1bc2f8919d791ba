//! ---
//! ems_section: "08-energy-models-optimization"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Static engineering catalogs used by the sizing resolver."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
//! Engineering data tables.
//!
//! Conductor values follow IEC 60228 (resistance) and IEC 60364-5-52 Annex B
//! (current ratings and correction factors) for 50 Hz low-voltage cables. The
//! tables are plain constants; the only logic here is keyed selection of the
//! right row or column.

pub mod conductors;
pub mod derating;
pub mod loads;
pub mod short_circuit;

pub use conductors::{CatalogIndex, CONDUCTOR_SIZES_MM2};
