//! Concrete [`rest2es_core::Feed`] implementations.

mod earthquake;
mod json;

pub use earthquake::{EarthquakeFeed, USGS_QUERY_URL};
pub use json::{JsonFeed, JsonFeedConfig};
