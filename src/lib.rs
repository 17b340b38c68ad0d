// EJ Dashboard - Core Library
// Shared by the terminal dashboard, the CLI and the web server

pub mod config;
pub mod dataset;
pub mod demographics;
pub mod risk;
pub mod chart;
pub mod dashboard;

#[cfg(feature = "server")]
pub mod api;

// Re-export commonly used types
pub use config::{AppConfig, init_logging};
pub use dataset::{Dataset, DatasetError, Row, CountyInfo, load_csv, load_csv_from_reader};
pub use demographics::{Demographic, DemographicCounts, Composition, aggregate};
pub use risk::{RiskBucket, UnknownBucket, filter_rows};
pub use chart::{StackedBar, Segment, Annotation, shape};
pub use dashboard::{Selection, SelectionError, DashboardView, ChartPanel, LegendEntry, render};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
