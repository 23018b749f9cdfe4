//! UI-independent engine pieces: parsing, enrichment, scaling, aggregation,
//! scheduling and command encoding.

pub mod candles;
pub mod commands;
pub mod enrich;
pub mod format;
pub mod geometry;
pub mod range;
pub mod scheduler;
pub mod snapshot;
pub mod view;
