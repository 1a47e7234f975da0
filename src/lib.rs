//! KPI aggregation and trend computation for an operational dashboard.
//!
//! Data flows one way: a loaded [`types::MetricTable`] is narrowed by
//! [`filter::filter`], summarised by [`aggregate`] and [`trend`], rounded by
//! [`format`], and assembled into page reports by [`pages::render_page`].
//! Every stage returns new values; nothing is mutated in place.
pub mod aggregate;
pub mod cache;
pub mod config;
pub mod error;
pub mod filter;
pub mod format;
pub mod loader;
pub mod mock;
pub mod output;
pub mod pages;
pub mod schema;
pub mod source;
pub mod trend;
pub mod types;
pub mod util;

pub use error::{KpiError, Result};
