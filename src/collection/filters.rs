//! Pure filter, pagination and delete operations over anomaly records

use serde::Serialize;

use crate::types::{AnomalyRecord, Parameter};

/// Sentinel location label meaning "no location filter".
pub const ALL_LOCATIONS: &str = "Semua Lokasi";

/// Location filter. `All` passes every record through unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LocationFilter {
    #[default]
    All,
    Named(String),
}

impl LocationFilter {
    /// Interpret a selector label, treating `all_label` (and `"all"`) as the sentinel.
    pub fn from_label(label: &str, all_label: &str) -> Self {
        if label == all_label || label.eq_ignore_ascii_case("all") {
            Self::All
        } else {
            Self::Named(label.to_string())
        }
    }

    /// Selector label, the inverse of [`LocationFilter::from_label`].
    pub fn label<'a>(&'a self, all_label: &'a str) -> &'a str {
        match self {
            Self::All => all_label,
            Self::Named(name) => name,
        }
    }

    pub fn matches(&self, record: &AnomalyRecord) -> bool {
        match self {
            Self::All => true,
            Self::Named(name) => record.location_name == *name,
        }
    }
}

/// Anomaly category selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Category {
    #[default]
    All,
    Turbidity,
    Ph,
    Temperature,
}

impl Category {
    pub const fn parameter(self) -> Option<Parameter> {
        match self {
            Self::All => None,
            Self::Turbidity => Some(Parameter::Turbidity),
            Self::Ph => Some(Parameter::Ph),
            Self::Temperature => Some(Parameter::Temperature),
        }
    }

    pub fn matches(self, record: &AnomalyRecord) -> bool {
        self.parameter().map_or(true, |p| record.is_anomalous(p))
    }
}

impl From<Parameter> for Category {
    fn from(parameter: Parameter) -> Self {
        match parameter {
            Parameter::Turbidity => Self::Turbidity,
            Parameter::Ph => Self::Ph,
            Parameter::Temperature => Self::Temperature,
        }
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }
        s.parse::<Parameter>().map(Self::from)
    }
}

/// Keep records at `location`, preserving order.
pub fn filter_by_location<'a, I>(records: I, location: &LocationFilter) -> Vec<&'a AnomalyRecord>
where
    I: IntoIterator<Item = &'a AnomalyRecord>,
{
    records.into_iter().filter(|r| location.matches(r)).collect()
}

/// Keep records whose verdict for `category` is anomalous, preserving order.
pub fn filter_by_category<'a, I>(records: I, category: Category) -> Vec<&'a AnomalyRecord>
where
    I: IntoIterator<Item = &'a AnomalyRecord>,
{
    records.into_iter().filter(|r| category.matches(r)).collect()
}

/// One-based page slice `[(page-1)*size, page*size)`.
///
/// Does not clamp: a page past the end, page `0`, or size `0` yields an
/// empty slice.
pub fn paginate<T>(items: &[T], page: usize, page_size: usize) -> &[T] {
    let Some(start) = page
        .checked_sub(1)
        .and_then(|p| p.checked_mul(page_size))
    else {
        return &[];
    };
    if start >= items.len() {
        return &[];
    }
    let end = start.saturating_add(page_size).min(items.len());
    &items[start..end]
}

/// Number of pages needed for `total` items, `ceil(total / page_size)`.
pub const fn total_pages(total: usize, page_size: usize) -> usize {
    if page_size == 0 {
        0
    } else {
        total.div_ceil(page_size)
    }
}

/// Remove the record with `id`, returning it if present.
pub fn delete(records: &mut Vec<AnomalyRecord>, id: &str) -> Option<AnomalyRecord> {
    let index = records.iter().position(|r| r.id == id)?;
    Some(records.remove(index))
}

/// Anomaly counts per category button.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CategoryCounts {
    pub all: usize,
    pub turbidity: usize,
    pub ph: usize,
    pub temperature: usize,
}

impl CategoryCounts {
    /// Count over an already location-filtered set.
    pub fn tally<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a AnomalyRecord>,
    {
        records.into_iter().fold(Self::default(), |mut acc, r| {
            acc.all += 1;
            acc.turbidity += usize::from(r.is_anomalous(Parameter::Turbidity));
            acc.ph += usize::from(r.is_anomalous(Parameter::Ph));
            acc.temperature += usize::from(r.is_anomalous(Parameter::Temperature));
            acc
        })
    }

    pub const fn get(&self, category: Category) -> usize {
        match category {
            Category::All => self.all,
            Category::Turbidity => self.turbidity,
            Category::Ph => self.ph,
            Category::Temperature => self.temperature,
        }
    }
}
