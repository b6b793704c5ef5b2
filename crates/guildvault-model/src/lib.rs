//! # guildvault-model
//!
//! Typed entity records shared by the capture, archive and restore layers.
//!
//! Every struct derives `Serialize` and `Deserialize` with `camelCase`
//! field names, which is the on-disk format inside an archive.  64-bit
//! permission masks are encoded as decimal strings so the payloads survive
//! consumers with 53-bit-safe-integer JSON parsers.

pub mod ids;
pub mod mask;
pub mod models;
pub mod report;
pub mod snapshot;

pub use ids::*;
pub use models::*;
pub use report::*;
pub use snapshot::Snapshot;
