//! Anomaly Collection
//!
//! Holds the normalized anomaly records of a fetch cycle and answers view
//! queries over them:
//!
//! - location filter, then category filter
//! - per-category counts over the location-filtered set
//! - one-based pagination with page reset on filter change
//! - delete by id

mod filters;
mod store;

pub use filters::{
    delete, filter_by_category, filter_by_location, paginate, total_pages, Category,
    CategoryCounts, LocationFilter, ALL_LOCATIONS,
};
pub use store::{AnomalyCollection, PageView, DEFAULT_PAGE_SIZE};
