// 👥 Demographic Aggregator
// Fixed demographic categories and percentage composition over a set of rows

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// DEMOGRAPHIC CATEGORIES
// ============================================================================

/// Demographic category tracked by the dataset.
///
/// The declaration order is the display order of every chart and legend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Demographic {
    White,
    Black,
    Asian,
    Latino,
    Other,
}

impl Demographic {
    /// All categories in display order
    pub const ALL: [Demographic; 5] = [
        Demographic::White,
        Demographic::Black,
        Demographic::Asian,
        Demographic::Latino,
        Demographic::Other,
    ];

    /// CSV column name / JSON key
    pub fn key(&self) -> &'static str {
        match self {
            Demographic::White => "white",
            Demographic::Black => "black",
            Demographic::Asian => "asian",
            Demographic::Latino => "latino",
            Demographic::Other => "other",
        }
    }

    /// Display label used in legends and annotations
    pub fn label(&self) -> &'static str {
        match self {
            Demographic::White => "White",
            Demographic::Black => "Black",
            Demographic::Asian => "Asian",
            Demographic::Latino => "Latino",
            Demographic::Other => "Other",
        }
    }

    /// Hex color of the chart segment
    pub fn color(&self) -> &'static str {
        match self {
            Demographic::White => "#ffb262",
            Demographic::Black => "#129e56",
            Demographic::Asian => "#e7298a",
            Demographic::Latino => "#7570b3",
            Demographic::Other => "#43a8b5",
        }
    }

    /// Same color as `color()`, as RGB components
    pub fn rgb(&self) -> (u8, u8, u8) {
        match self {
            Demographic::White => (0xff, 0xb2, 0x62),
            Demographic::Black => (0x12, 0x9e, 0x56),
            Demographic::Asian => (0xe7, 0x29, 0x8a),
            Demographic::Latino => (0x75, 0x70, 0xb3),
            Demographic::Other => (0x43, 0xa8, 0xb5),
        }
    }

    fn index(&self) -> usize {
        match self {
            Demographic::White => 0,
            Demographic::Black => 1,
            Demographic::Asian => 2,
            Demographic::Latino => 3,
            Demographic::Other => 4,
        }
    }
}

impl fmt::Display for Demographic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

// ============================================================================
// COUNTS
// ============================================================================

/// Population counts of one geographic sub-unit
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DemographicCounts {
    pub white: f64,
    pub black: f64,
    pub asian: f64,
    pub latino: f64,
    pub other: f64,
}

impl DemographicCounts {
    pub fn get(&self, demographic: Demographic) -> f64 {
        match demographic {
            Demographic::White => self.white,
            Demographic::Black => self.black,
            Demographic::Asian => self.asian,
            Demographic::Latino => self.latino,
            Demographic::Other => self.other,
        }
    }
}

// ============================================================================
// COMPOSITION
// ============================================================================

/// Percentage breakdown (0..=100) of a population across the fixed categories.
///
/// Sums to 100 when built from a non-zero population and is all-zero otherwise.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Composition {
    percentages: [f64; 5],
}

impl Composition {
    /// Composition of a population where every count is zero
    pub fn zero() -> Self {
        Self::default()
    }

    /// Build from explicit percentages; categories not listed are 0
    pub fn from_percentages(entries: &[(Demographic, f64)]) -> Self {
        let mut composition = Self::zero();
        for (demographic, pct) in entries {
            composition.percentages[demographic.index()] = *pct;
        }
        composition
    }

    pub fn get(&self, demographic: Demographic) -> f64 {
        self.percentages[demographic.index()]
    }

    /// Entries in display order
    pub fn iter(&self) -> impl Iterator<Item = (Demographic, f64)> + '_ {
        Demographic::ALL.iter().map(move |d| (*d, self.get(*d)))
    }

    pub fn total(&self) -> f64 {
        self.percentages.iter().sum()
    }

    pub fn is_zero(&self) -> bool {
        self.percentages.iter().all(|p| *p == 0.0)
    }
}

/// Compute the percentage composition across `counts`.
///
/// A zero grand total (no rows, or rows whose counts are all zero) yields
/// `Composition::zero()` instead of dividing by zero.
pub fn aggregate<'a, I>(counts: I) -> Composition
where
    I: IntoIterator<Item = &'a DemographicCounts>,
{
    let mut sums = [0.0_f64; 5];
    for row in counts {
        for demographic in Demographic::ALL {
            sums[demographic.index()] += row.get(demographic);
        }
    }

    let total: f64 = sums.iter().sum();
    if total <= 0.0 {
        return Composition::zero();
    }

    let mut percentages = [0.0; 5];
    for (pct, sum) in percentages.iter_mut().zip(sums) {
        *pct = sum / total * 100.0;
    }

    Composition { percentages }
}
