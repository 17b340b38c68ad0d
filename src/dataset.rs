// 🗂️ Dataset Loader
// CSV → immutable rows + county index, loaded once at startup

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::demographics::{Demographic, DemographicCounts};

/// Columns the input file must provide
pub const REQUIRED_COLUMNS: [&str; 8] = [
    "COUNTY", "StateAbbr", "RPL_EJI", "white", "black", "asian", "latino", "other",
];

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("missing required column(s): {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("line {line}: {field} must be a non-negative number, got {value}")]
    InvalidCount { line: u64, field: &'static str, value: f64 },

    #[error("line {line}: RPL_EJI must be within [0, 1], got {value}")]
    RiskIndexOutOfRange { line: u64, value: f64 },

    #[error("line {line}: empty county name")]
    EmptyCounty { line: u64 },
}

/// Raw CSV record, as written by the upstream EJ export
#[derive(Debug, Deserialize)]
struct CsvRecord {
    #[serde(rename = "COUNTY")]
    county: String,

    #[serde(rename = "StateAbbr")]
    state_abbr: String,

    #[serde(rename = "RPL_EJI")]
    rpl_eji: Option<f64>,

    white: Option<f64>,
    black: Option<f64>,
    asian: Option<f64>,
    latino: Option<f64>,
    other: Option<f64>,
}

/// One geographic sub-unit (census tract) of the dataset
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Row {
    pub county: String,
    pub state_abbr: String,
    /// Composite EJ risk index; `None` when the source cell is empty
    pub risk_index: Option<f64>,
    pub counts: DemographicCounts,
}

/// A selectable county and the state it belongs to
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountyInfo {
    pub county: String,
    pub state_abbr: String,
    pub rows: usize,
}

/// The loaded dataset. Never mutated after `Dataset::new`.
#[derive(Debug, Clone)]
pub struct Dataset {
    rows: Vec<Row>,
    counties: Vec<CountyInfo>,
    // county name → indices into `rows`
    by_county: HashMap<String, Vec<usize>>,
}

impl Dataset {
    /// Build the county index. Counties keep their first-appearance order;
    /// a county's state is the one on its first row.
    pub fn new(rows: Vec<Row>) -> Self {
        let mut counties: Vec<CountyInfo> = Vec::new();
        let mut by_county: HashMap<String, Vec<usize>> = HashMap::new();

        for (i, row) in rows.iter().enumerate() {
            let indices = by_county.entry(row.county.clone()).or_default();
            if indices.is_empty() {
                counties.push(CountyInfo {
                    county: row.county.clone(),
                    state_abbr: row.state_abbr.clone(),
                    rows: 0,
                });
            }
            indices.push(i);
        }

        for info in &mut counties {
            let indices = &by_county[&info.county];
            info.rows = indices.len();

            let conflicting = indices
                .iter()
                .map(|&i| &rows[i].state_abbr)
                .find(|abbr| **abbr != info.state_abbr);
            if let Some(other) = conflicting {
                warn!(
                    county = %info.county,
                    first = %info.state_abbr,
                    other = %other,
                    "county spans more than one state abbreviation, keeping the first"
                );
            }
        }

        Self { rows, counties, by_county }
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Distinct counties in first-appearance order
    pub fn counties(&self) -> &[CountyInfo] {
        &self.counties
    }

    pub fn county(&self, name: &str) -> Option<&CountyInfo> {
        self.counties.iter().find(|c| c.county == name)
    }

    /// All rows of `county` (empty for an unknown county)
    pub fn county_rows(&self, county: &str) -> Vec<&Row> {
        self.by_county
            .get(county)
            .map(|indices| indices.iter().map(|&i| &self.rows[i]).collect())
            .unwrap_or_default()
    }
}

/// Load the dataset from a CSV file
pub fn load_csv(csv_path: &Path) -> Result<Dataset> {
    info!(path = %csv_path.display(), "loading dataset");

    let file = std::fs::File::open(csv_path)
        .with_context(|| format!("Failed to open CSV file: {}", csv_path.display()))?;
    let dataset = load_csv_from_reader(file)
        .with_context(|| format!("Failed to load dataset from {}", csv_path.display()))?;

    info!(
        rows = dataset.len(),
        counties = dataset.counties().len(),
        "dataset loaded"
    );
    Ok(dataset)
}

/// Load the dataset from any CSV source
pub fn load_csv_from_reader<R: Read>(reader: R) -> Result<Dataset> {
    let mut rdr = csv::Reader::from_reader(reader);

    let headers = rdr.headers().context("Failed to read CSV header")?.clone();
    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|col| !headers.iter().any(|h| h == **col))
        .map(|col| col.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(DatasetError::MissingColumns(missing).into());
    }

    let mut rows = Vec::new();
    let mut record = csv::StringRecord::new();
    while rdr.read_record(&mut record).context("Failed to read CSV row")? {
        // physical line, so blank lines and quoted newlines are accounted for
        let line = record.position().map(|pos| pos.line()).unwrap_or_default();
        let parsed: CsvRecord = record
            .deserialize(Some(&headers))
            .with_context(|| format!("Failed to deserialize row at line {}", line))?;
        rows.push(into_row(parsed, line)?);
    }

    debug!(rows = rows.len(), "parsed CSV rows");
    Ok(Dataset::new(rows))
}

fn into_row(record: CsvRecord, line: u64) -> Result<Row, DatasetError> {
    let county = record.county.trim().to_string();
    if county.is_empty() {
        return Err(DatasetError::EmptyCounty { line });
    }

    if let Some(value) = record.rpl_eji {
        if !(0.0..=1.0).contains(&value) {
            return Err(DatasetError::RiskIndexOutOfRange { line, value });
        }
    }

    let count = |field: Demographic, value: Option<f64>| -> Result<f64, DatasetError> {
        let value = value.unwrap_or(0.0);
        if value.is_finite() && value >= 0.0 {
            Ok(value)
        } else {
            Err(DatasetError::InvalidCount { line, field: field.key(), value })
        }
    };

    Ok(Row {
        county,
        state_abbr: record.state_abbr.trim().to_string(),
        risk_index: record.rpl_eji,
        counts: DemographicCounts {
            white: count(Demographic::White, record.white)?,
            black: count(Demographic::Black, record.black)?,
            asian: count(Demographic::Asian, record.asian)?,
            latino: count(Demographic::Latino, record.latino)?,
            other: count(Demographic::Other, record.other)?,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
GEOID,COUNTY,StateAbbr,RPL_EJI,white,black,asian,latino,other
37001020100,Alamance,NC,0.1,100,50,5,20,3
37001020200,Alamance,NC,0.3,80,60,0,40,10
37003040100,Alexander,NC,0.9,200,10,2,8,1
37001020300,Alamance,NC,,10,10,0,0,0
";

    #[test]
    fn test_load_sample() {
        let dataset = load_csv_from_reader(SAMPLE.as_bytes()).unwrap();

        assert_eq!(dataset.len(), 4);
        assert_eq!(dataset.counties().len(), 2);
        assert_eq!(dataset.counties()[0].county, "Alamance");
        assert_eq!(dataset.counties()[0].rows, 3);
        assert_eq!(dataset.counties()[1].county, "Alexander");
        assert_eq!(dataset.county_rows("Alamance").len(), 3);
    }

    #[test]
    fn test_empty_risk_index_is_missing() {
        let dataset = load_csv_from_reader(SAMPLE.as_bytes()).unwrap();

        let last = &dataset.rows()[3];
        assert_eq!(last.risk_index, None);
        assert_eq!(last.counts.white, 10.0);
    }

    #[test]
    fn test_empty_count_is_zero() {
        let csv = "COUNTY,StateAbbr,RPL_EJI,white,black,asian,latino,other\nWake,NC,0.5,10,,1,2,3\n";

        let dataset = load_csv_from_reader(csv.as_bytes()).unwrap();

        assert_eq!(dataset.rows()[0].counts.black, 0.0);
    }

    #[test]
    fn test_missing_columns_are_reported() {
        let csv = "COUNTY,StateAbbr,white,black,asian\nWake,NC,1,2,3\n";

        let err = load_csv_from_reader(csv.as_bytes()).unwrap_err();

        match err.downcast_ref::<DatasetError>() {
            Some(DatasetError::MissingColumns(cols)) => {
                assert_eq!(cols, &vec!["RPL_EJI".to_string(), "latino".to_string(), "other".to_string()]);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_negative_count_is_rejected() {
        let csv = "COUNTY,StateAbbr,RPL_EJI,white,black,asian,latino,other\nWake,NC,0.5,10,-1,1,2,3\n";

        let err = load_csv_from_reader(csv.as_bytes()).unwrap_err();

        assert!(matches!(
            err.downcast_ref::<DatasetError>(),
            Some(DatasetError::InvalidCount { line: 2, field: "black", .. })
        ));
    }

    #[test]
    fn test_error_line_skips_blank_lines() {
        let csv = "COUNTY,StateAbbr,RPL_EJI,white,black,asian,latino,other\n\
                   Wake,NC,0.2,10,5,1,2,3\n\
                   \n\
                   \n\
                   Wake,NC,0.5,10,-1,1,2,3\n";

        let err = load_csv_from_reader(csv.as_bytes()).unwrap_err();

        assert!(matches!(
            err.downcast_ref::<DatasetError>(),
            Some(DatasetError::InvalidCount { line: 5, field: "black", .. })
        ));
    }

    #[test]
    fn test_risk_index_out_of_range_is_rejected() {
        let csv = "COUNTY,StateAbbr,RPL_EJI,white,black,asian,latino,other\nWake,NC,1.5,10,1,1,2,3\n";

        let err = load_csv_from_reader(csv.as_bytes()).unwrap_err();

        assert!(matches!(
            err.downcast_ref::<DatasetError>(),
            Some(DatasetError::RiskIndexOutOfRange { line: 2, .. })
        ));
    }

    #[test]
    fn test_unparseable_number_is_fatal() {
        let csv = "COUNTY,StateAbbr,RPL_EJI,white,black,asian,latino,other\nWake,NC,high,10,1,1,2,3\n";

        assert!(load_csv_from_reader(csv.as_bytes()).is_err());
    }

    #[test]
    fn test_first_state_wins() {
        let csv = "\
COUNTY,StateAbbr,RPL_EJI,white,black,asian,latino,other
Union,NC,0.2,1,1,1,1,1
Union,SC,0.4,1,1,1,1,1
";

        let dataset = load_csv_from_reader(csv.as_bytes()).unwrap();

        assert_eq!(dataset.counties().len(), 1);
        assert_eq!(dataset.county("Union").unwrap().state_abbr, "NC");
        assert_eq!(dataset.county_rows("Union").len(), 2);
    }

    #[test]
    fn test_unknown_county_has_no_rows() {
        let dataset = load_csv_from_reader(SAMPLE.as_bytes()).unwrap();

        assert!(dataset.county("Nowhere").is_none());
        assert!(dataset.county_rows("Nowhere").is_empty());
    }

    #[test]
    fn test_missing_file_is_fatal() {
        let err = load_csv(Path::new("/definitely/not/here.csv")).unwrap_err();

        assert!(err.to_string().contains("Failed to open CSV file"));
    }
}
