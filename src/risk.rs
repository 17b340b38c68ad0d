// 🎯 Risk-Bucket Filter
// Maps the composite EJ risk index (RPL_EJI) onto four named buckets

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::dataset::Row;

/// Named range of the composite risk index.
///
/// Every bucket is `[low, high)` except `High`, which also includes 1.0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskBucket {
    #[default]
    #[serde(rename = "Low")]
    Low,
    #[serde(rename = "Low/Moderate")]
    LowModerate,
    #[serde(rename = "Moderate/High")]
    ModerateHigh,
    #[serde(rename = "High")]
    High,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown risk bucket '{0}' (expected one of: Low, Low/Moderate, Moderate/High, High)")]
pub struct UnknownBucket(pub String);

impl RiskBucket {
    /// All buckets, lowest risk first
    pub const ALL: [RiskBucket; 4] = [
        RiskBucket::Low,
        RiskBucket::LowModerate,
        RiskBucket::ModerateHigh,
        RiskBucket::High,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            RiskBucket::Low => "Low",
            RiskBucket::LowModerate => "Low/Moderate",
            RiskBucket::ModerateHigh => "Moderate/High",
            RiskBucket::High => "High",
        }
    }

    /// Lower (inclusive) and upper bound of the bucket
    pub fn bounds(&self) -> (f64, f64) {
        match self {
            RiskBucket::Low => (0.0, 0.25),
            RiskBucket::LowModerate => (0.25, 0.5),
            RiskBucket::ModerateHigh => (0.5, 0.75),
            RiskBucket::High => (0.75, 1.0),
        }
    }

    /// Whether `risk_index` falls in this bucket
    pub fn contains(&self, risk_index: f64) -> bool {
        let (low, high) = self.bounds();
        match self {
            RiskBucket::High => low <= risk_index && risk_index <= high,
            _ => low <= risk_index && risk_index < high,
        }
    }

    /// The single bucket holding `risk_index`, or `None` outside [0, 1]
    pub fn classify(risk_index: f64) -> Option<RiskBucket> {
        Self::ALL.into_iter().find(|bucket| bucket.contains(risk_index))
    }

    pub fn next(&self) -> Self {
        match self {
            RiskBucket::Low => RiskBucket::LowModerate,
            RiskBucket::LowModerate => RiskBucket::ModerateHigh,
            RiskBucket::ModerateHigh => RiskBucket::High,
            RiskBucket::High => RiskBucket::Low,
        }
    }

    pub fn previous(&self) -> Self {
        match self {
            RiskBucket::Low => RiskBucket::High,
            RiskBucket::LowModerate => RiskBucket::Low,
            RiskBucket::ModerateHigh => RiskBucket::LowModerate,
            RiskBucket::High => RiskBucket::ModerateHigh,
        }
    }
}

impl fmt::Display for RiskBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for RiskBucket {
    type Err = UnknownBucket;

    /// Accepts display names ("Low/Moderate") case-insensitively, plus
    /// URL-friendly slugs ("low-moderate", "moderate_high").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .to_lowercase()
            .chars()
            .map(|c| if c == '-' || c == '_' { '/' } else { c })
            .collect();

        RiskBucket::ALL
            .into_iter()
            .find(|bucket| bucket.name().to_lowercase() == normalized)
            .ok_or_else(|| UnknownBucket(s.to_string()))
    }
}

/// Rows whose risk index falls in `bucket`.
///
/// Rows with no risk index never match a bucket.
pub fn filter_rows<'a, I>(rows: I, bucket: RiskBucket) -> Vec<&'a Row>
where
    I: IntoIterator<Item = &'a Row>,
{
    rows.into_iter()
        .filter(|row| row.risk_index.map_or(false, |x| bucket.contains(x)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demographics::DemographicCounts;

    fn row(county: &str, risk_index: Option<f64>) -> Row {
        Row {
            county: county.to_string(),
            state_abbr: "NC".to_string(),
            risk_index,
            counts: DemographicCounts { white: 10.0, ..Default::default() },
        }
    }

    #[test]
    fn test_boundaries_belong_to_upper_bucket() {
        assert_eq!(RiskBucket::classify(0.0), Some(RiskBucket::Low));
        assert_eq!(RiskBucket::classify(0.25), Some(RiskBucket::LowModerate));
        assert_eq!(RiskBucket::classify(0.5), Some(RiskBucket::ModerateHigh));
        assert_eq!(RiskBucket::classify(0.75), Some(RiskBucket::High));
        assert_eq!(RiskBucket::classify(1.0), Some(RiskBucket::High));
    }

    #[test]
    fn test_just_below_boundaries() {
        assert_eq!(RiskBucket::classify(0.2499999), Some(RiskBucket::Low));
        assert_eq!(RiskBucket::classify(0.4999999), Some(RiskBucket::LowModerate));
        assert_eq!(RiskBucket::classify(0.7499999), Some(RiskBucket::ModerateHigh));
    }

    #[test]
    fn test_out_of_range_has_no_bucket() {
        assert_eq!(RiskBucket::classify(-0.01), None);
        assert_eq!(RiskBucket::classify(1.01), None);
        assert_eq!(RiskBucket::classify(f64::NAN), None);
    }

    #[test]
    fn test_buckets_partition_unit_interval() {
        for step in 0..=10_000 {
            let x = step as f64 / 10_000.0;
            let matches = RiskBucket::ALL.iter().filter(|b| b.contains(x)).count();
            assert_eq!(matches, 1, "risk index {} matched {} buckets", x, matches);
        }
    }

    #[test]
    fn test_buckets_are_contiguous() {
        for pair in RiskBucket::ALL.windows(2) {
            assert_eq!(pair[0].bounds().1, pair[1].bounds().0);
        }
        assert_eq!(RiskBucket::ALL[0].bounds().0, 0.0);
        assert_eq!(RiskBucket::ALL[3].bounds().1, 1.0);
    }

    #[test]
    fn test_filter_low_bucket() {
        let rows = vec![
            row("Alpha", Some(0.1)),
            row("Alpha", Some(0.3)),
            row("Alpha", Some(0.9)),
        ];

        let low = filter_rows(&rows, RiskBucket::Low);

        assert_eq!(low.len(), 1);
        assert_eq!(low[0].risk_index, Some(0.1));
    }

    #[test]
    fn test_filter_skips_missing_index() {
        let rows = vec![row("Alpha", None), row("Alpha", Some(1.0))];

        assert!(filter_rows(&rows, RiskBucket::Low).is_empty());
        assert_eq!(filter_rows(&rows, RiskBucket::High).len(), 1);
    }

    #[test]
    fn test_parse_names_and_slugs() {
        assert_eq!("Low".parse::<RiskBucket>(), Ok(RiskBucket::Low));
        assert_eq!("low/moderate".parse::<RiskBucket>(), Ok(RiskBucket::LowModerate));
        assert_eq!("moderate-high".parse::<RiskBucket>(), Ok(RiskBucket::ModerateHigh));
        assert_eq!(" HIGH ".parse::<RiskBucket>(), Ok(RiskBucket::High));
        assert!("Extreme".parse::<RiskBucket>().is_err());
    }

    #[test]
    fn test_next_previous_cycle() {
        for bucket in RiskBucket::ALL {
            assert_eq!(bucket.next().previous(), bucket);
        }
        assert_eq!(RiskBucket::High.next(), RiskBucket::Low);
    }
}
