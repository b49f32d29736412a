//! Owned anomaly working set for one active view

use serde::Serialize;
use tracing::info;

use super::filters::{
    self, filter_by_category, filter_by_location, paginate, total_pages, Category,
    CategoryCounts, LocationFilter,
};
use crate::classification::RecordNormalizer;
use crate::types::{AnomalyRecord, RawClassificationItem};

/// Default number of records per page.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// The anomaly records of the latest fetch cycle plus the view state
/// (location, category, page) applied to them.
///
/// This is the only owner of the working set. Filter changes are synchronous
/// and always act on the snapshot currently held. The page index returns to
/// 1 whenever the snapshot or a filter changes, and whenever a replace or
/// delete changes the size of the filtered view.
#[derive(Debug, Clone)]
pub struct AnomalyCollection {
    records: Vec<AnomalyRecord>,
    location: LocationFilter,
    category: Category,
    page: usize,
    page_size: usize,
    generation: u64,
}

/// One rendered page of the current view.
#[derive(Debug, Clone, Serialize)]
pub struct PageView {
    pub records: Vec<AnomalyRecord>,
    pub page: usize,
    pub page_size: usize,
    pub total_pages: usize,
    pub total_filtered: usize,
    pub counts: CategoryCounts,
}

impl AnomalyCollection {
    pub fn new(page_size: usize) -> Self {
        Self {
            records: Vec::new(),
            location: LocationFilter::All,
            category: Category::All,
            page: 1,
            page_size,
            generation: 0,
        }
    }

    // ------------------------------------------------------------------
    // Snapshot
    // ------------------------------------------------------------------

    /// Replace the working set with a freshly fetched snapshot.
    pub fn replace_snapshot(&mut self, records: Vec<AnomalyRecord>) {
        self.records = records;
        self.generation += 1;
        self.page = 1;
        info!(
            records = self.records.len(),
            generation = self.generation,
            "Anomaly snapshot replaced"
        );
    }

    /// Normalize raw service items and replace the snapshot with the result.
    pub fn ingest(&mut self, items: &[RawClassificationItem], normalizer: &RecordNormalizer) -> usize {
        let records = normalizer.normalize_all(items);
        let count = records.len();
        self.replace_snapshot(records);
        count
    }

    /// Incremented on every snapshot replacement.
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    pub fn records(&self) -> &[AnomalyRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&AnomalyRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    /// Swap in a wholesale replacement for the record with the same id.
    ///
    /// Returns `false` (and changes nothing) if that id is not held.
    pub fn replace(&mut self, record: AnomalyRecord) -> bool {
        let before = self.filtered().len();
        let Some(slot) = self.records.iter_mut().find(|r| r.id == record.id) else {
            return false;
        };
        *slot = record;
        self.reset_page_if_resized(before);
        true
    }

    pub fn delete(&mut self, id: &str) -> Option<AnomalyRecord> {
        let before = self.filtered().len();
        let removed = filters::delete(&mut self.records, id);
        if removed.is_some() {
            self.reset_page_if_resized(before);
        }
        removed
    }

    fn reset_page_if_resized(&mut self, before: usize) {
        if self.filtered().len() != before {
            self.page = 1;
        }
    }

    // ------------------------------------------------------------------
    // View state
    // ------------------------------------------------------------------

    pub const fn location(&self) -> &LocationFilter {
        &self.location
    }

    pub const fn category(&self) -> Category {
        self.category
    }

    pub const fn page(&self) -> usize {
        self.page
    }

    pub const fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn set_location(&mut self, location: LocationFilter) {
        if self.location != location {
            self.location = location;
            self.page = 1;
        }
    }

    pub fn set_category(&mut self, category: Category) {
        if self.category != category {
            self.category = category;
            self.page = 1;
        }
    }

    pub fn set_page_size(&mut self, page_size: usize) {
        if self.page_size != page_size {
            self.page_size = page_size;
            self.page = 1;
        }
    }

    /// Move to `page` (one-based). Not clamped; see [`paginate`].
    pub fn set_page(&mut self, page: usize) {
        self.page = page;
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Records at the selected location, any category.
    pub fn location_filtered(&self) -> Vec<&AnomalyRecord> {
        filter_by_location(&self.records, &self.location)
    }

    /// Location filter first, category filter second.
    pub fn filtered(&self) -> Vec<&AnomalyRecord> {
        filter_by_category(self.location_filtered(), self.category)
    }

    /// Per-category counts at the selected location.
    pub fn category_counts(&self) -> CategoryCounts {
        CategoryCounts::tally(self.location_filtered())
    }

    pub fn total_pages(&self) -> usize {
        total_pages(self.filtered().len(), self.page_size)
    }

    pub fn has_next_page(&self) -> bool {
        self.page < self.total_pages()
    }

    pub const fn has_prev_page(&self) -> bool {
        self.page > 1
    }

    /// Records on the current page.
    pub fn current_page(&self) -> Vec<&AnomalyRecord> {
        let filtered = self.filtered();
        paginate(&filtered, self.page, self.page_size).to_vec()
    }

    /// Owned snapshot of the current page for rendering.
    pub fn page_view(&self) -> PageView {
        let filtered = self.filtered();
        PageView {
            records: paginate(&filtered, self.page, self.page_size)
                .iter()
                .map(|r| (*r).clone())
                .collect(),
            page: self.page,
            page_size: self.page_size,
            total_pages: total_pages(filtered.len(), self.page_size),
            total_filtered: filtered.len(),
            counts: self.category_counts(),
        }
    }

    /// Distinct location names in the snapshot, sorted.
    pub fn locations(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .records
            .iter()
            .map(|r| r.location_name.clone())
            .collect();
        names.sort();
        names.dedup();
        names
    }

    /// Location selector entries: `all_label` first, then [`Self::locations`].
    pub fn location_options(&self, all_label: &str) -> Vec<String> {
        std::iter::once(all_label.to_string())
            .chain(self.locations())
            .collect()
    }
}

impl Default for AnomalyCollection {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}
