// 🧭 Dashboard View
// Pure render function: (dataset, selection) → everything the page shows

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::chart::{shape, StackedBar};
use crate::dataset::Dataset;
use crate::demographics::{aggregate, Composition, Demographic};
use crate::risk::{filter_rows, RiskBucket, UnknownBucket};

/// The two user choices. Immutable: a change builds a new `Selection`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub county: String,
    pub bucket: RiskBucket,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectionError {
    #[error("unknown county '{0}'")]
    UnknownCounty(String),

    #[error(transparent)]
    UnknownBucket(#[from] UnknownBucket),

    #[error("dataset has no counties")]
    EmptyDataset,
}

impl Selection {
    pub fn new(county: impl Into<String>, bucket: RiskBucket) -> Self {
        Self { county: county.into(), bucket }
    }

    /// First county of the dataset, lowest bucket
    pub fn default_for(dataset: &Dataset) -> Result<Self, SelectionError> {
        dataset
            .counties()
            .first()
            .map(|c| Self::new(c.county.clone(), RiskBucket::default()))
            .ok_or(SelectionError::EmptyDataset)
    }

    /// Parse free-text county/bucket values (CLI, HTTP query)
    pub fn parse(dataset: &Dataset, county: &str, bucket: &str) -> Result<Self, SelectionError> {
        let bucket: RiskBucket = bucket.parse()?;
        let info = dataset
            .county(county)
            .ok_or_else(|| SelectionError::UnknownCounty(county.to_string()))?;
        Ok(Self::new(info.county.clone(), bucket))
    }

    pub fn with_county(&self, county: impl Into<String>) -> Self {
        Self::new(county, self.bucket)
    }

    pub fn with_bucket(&self, bucket: RiskBucket) -> Self {
        Self::new(self.county.clone(), bucket)
    }
}

/// One legend swatch
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendEntry {
    pub demographic: Demographic,
    pub label: &'static str,
    pub color: &'static str,
}

/// A titled chart plus the composition behind it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPanel {
    pub heading: String,
    /// Tracts aggregated into this chart
    pub rows: usize,
    pub chart: StackedBar,
    #[serde(skip)]
    pub composition: Composition,
}

/// Everything one dashboard page shows for a selection
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub selection: Selection,
    pub state_abbr: String,
    /// "{county}, {state}"
    pub title: String,
    pub legend: Vec<LegendEntry>,
    /// County restricted to the selected risk bucket
    pub bucket_panel: ChartPanel,
    /// All tracts of the county
    pub overall_panel: ChartPanel,
}

pub fn legend() -> Vec<LegendEntry> {
    Demographic::ALL
        .iter()
        .map(|d| LegendEntry { demographic: *d, label: d.label(), color: d.color() })
        .collect()
}

/// Recompute both charts for `selection`.
///
/// An empty bucket produces a blank chart; only an unknown county fails.
pub fn render(dataset: &Dataset, selection: &Selection) -> Result<DashboardView, SelectionError> {
    let info = dataset
        .county(&selection.county)
        .ok_or_else(|| SelectionError::UnknownCounty(selection.county.clone()))?;

    let county_rows = dataset.county_rows(&info.county);
    let bucket_rows = filter_rows(county_rows.iter().copied(), selection.bucket);

    debug!(
        county = %info.county,
        bucket = %selection.bucket,
        county_rows = county_rows.len(),
        bucket_rows = bucket_rows.len(),
        "rendering dashboard"
    );

    let overall = aggregate(county_rows.iter().map(|row| &row.counts));
    let within_bucket = aggregate(bucket_rows.iter().map(|row| &row.counts));

    Ok(DashboardView {
        selection: selection.clone(),
        state_abbr: info.state_abbr.clone(),
        title: format!("{}, {}", info.county, info.state_abbr),
        legend: legend(),
        bucket_panel: ChartPanel {
            heading: format!("{} {} EJ Risk", info.county, selection.bucket),
            rows: bucket_rows.len(),
            chart: shape(&within_bucket),
            composition: within_bucket,
        },
        overall_panel: ChartPanel {
            heading: format!("{} EJ Risk", info.county),
            rows: county_rows.len(),
            chart: shape(&overall),
            composition: overall,
        },
    })
}
