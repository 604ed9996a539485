//! Release search abstraction.
//!
//! This module provides the `SearchTransport` trait for querying indexer
//! aggregators (Prowlarr) one indexer group at a time, the grouping of
//! indexers by shared category configuration, and the seams for the ebook
//! archive and audiobook runtime lookups.

mod dedup;
mod grouping;
mod prowlarr;
mod runtime;
mod types;

pub use dedup::deduplicate_candidates;
pub use grouping::{
    effective_categories, group_indexers_by_categories, IndexerGroup, IndexerGrouping,
    SkippedIndexer,
};
pub use prowlarr::ProwlarrSearcher;
pub use runtime::HttpRuntimeLookup;
pub use types::*;
