// 📊 Chart Data Shaper
// Composition → stacked horizontal bar segments + on-bar annotations

use serde::Serialize;

use crate::demographics::{Composition, Demographic};

/// Segments at or below this percentage get no on-bar annotation
pub const ANNOTATION_THRESHOLD: f64 = 7.0;

/// One stacked-bar segment
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Segment {
    pub demographic: Demographic,
    pub label: &'static str,
    pub color: &'static str,
    /// Unrounded; drives the bar width
    pub percentage: f64,
    pub hover_text: String,
}

/// On-bar text label
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Annotation {
    pub demographic: Demographic,
    /// Horizontal center on the 0..100 axis
    pub x: f64,
    pub text: String,
}

/// Render-ready data for one stacked horizontal bar
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StackedBar {
    pub segments: Vec<Segment>,
    pub annotations: Vec<Annotation>,
}

impl StackedBar {
    /// True when there is nothing to draw (zero population)
    pub fn is_blank(&self) -> bool {
        self.segments.iter().all(|s| s.percentage == 0.0)
    }
}

/// "Label: NN.N%"
pub fn format_share(demographic: Demographic, percentage: f64) -> String {
    format!("{}: {:.1}%", demographic.label(), percentage)
}

/// Shape a composition into stacked-bar segments.
///
/// Segments always follow `Demographic::ALL`. Only segments above
/// `ANNOTATION_THRESHOLD` are annotated, and the running offset used to
/// center an annotation only advances for annotated segments, so small
/// segments do not shift the labels that follow them.
pub fn shape(composition: &Composition) -> StackedBar {
    let mut segments = Vec::with_capacity(Demographic::ALL.len());
    let mut annotations = Vec::new();
    let mut cumulative = 0.0;

    for (demographic, percentage) in composition.iter() {
        segments.push(Segment {
            demographic,
            label: demographic.label(),
            color: demographic.color(),
            percentage,
            hover_text: format_share(demographic, percentage),
        });

        if percentage > ANNOTATION_THRESHOLD {
            annotations.push(Annotation {
                demographic,
                x: cumulative + percentage / 2.0,
                text: format_share(demographic, percentage),
            });
            cumulative += percentage;
        }
    }

    StackedBar { segments, annotations }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_large_segments_are_annotated() {
        let composition = Composition::from_percentages(&[
            (Demographic::White, 5.0),
            (Demographic::Black, 4.0),
            (Demographic::Asian, 91.0),
        ]);

        let bar = shape(&composition);

        assert_eq!(bar.annotations.len(), 1);
        assert_eq!(bar.annotations[0].demographic, Demographic::Asian);
        // small segments do not advance the offset
        assert_eq!(bar.annotations[0].x, 45.5);
        assert_eq!(bar.annotations[0].text, "Asian: 91.0%");
    }

    #[test]
    fn test_running_offset_of_annotated_segments() {
        let composition = Composition::from_percentages(&[
            (Demographic::White, 60.0),
            (Demographic::Black, 3.0),
            (Demographic::Asian, 7.0),
            (Demographic::Latino, 20.0),
            (Demographic::Other, 10.0),
        ]);

        let bar = shape(&composition);

        let positions: Vec<(Demographic, f64)> =
            bar.annotations.iter().map(|a| (a.demographic, a.x)).collect();
        assert_eq!(
            positions,
            vec![
                (Demographic::White, 30.0),
                (Demographic::Latino, 70.0),
                (Demographic::Other, 85.0),
            ]
        );
    }

    #[test]
    fn test_exactly_seven_is_not_annotated() {
        let composition = Composition::from_percentages(&[
            (Demographic::White, 93.0),
            (Demographic::Other, 7.0),
        ]);

        let bar = shape(&composition);

        assert!(bar.annotations.iter().all(|a| a.demographic != Demographic::Other));
    }

    #[test]
    fn test_segments_follow_fixed_order() {
        let composition = Composition::from_percentages(&[
            (Demographic::Other, 50.0),
            (Demographic::Latino, 25.0),
            (Demographic::White, 25.0),
        ]);

        let bar = shape(&composition);

        let order: Vec<Demographic> = bar.segments.iter().map(|s| s.demographic).collect();
        assert_eq!(order, Demographic::ALL.to_vec());
        assert_eq!(bar.segments[0].color, "#ffb262");
        assert_eq!(bar.segments[4].label, "Other");
    }

    #[test]
    fn test_text_is_rounded_width_is_not() {
        let composition = Composition::from_percentages(&[
            (Demographic::White, 66.666_666),
            (Demographic::Black, 33.333_334),
        ]);

        let bar = shape(&composition);

        assert_eq!(bar.segments[0].percentage, 66.666_666);
        assert_eq!(bar.segments[0].hover_text, "White: 66.7%");
        assert_eq!(bar.annotations[1].text, "Black: 33.3%");
    }

    #[test]
    fn test_zero_composition_is_blank() {
        let bar = shape(&Composition::zero());

        assert!(bar.is_blank());
        assert_eq!(bar.segments.len(), 5);
        assert!(bar.annotations.is_empty());
    }

    #[test]
    fn test_shape_is_deterministic() {
        let composition = Composition::from_percentages(&[
            (Demographic::White, 41.2),
            (Demographic::Black, 38.8),
            (Demographic::Latino, 20.0),
        ]);

        assert_eq!(shape(&composition), shape(&composition));
    }
}
