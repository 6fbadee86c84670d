//! Local turning points of a close series

use crate::data::PriceSeries;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurningKind {
    /// Rise followed by a fall
    Peak,
    /// Fall followed by a rise
    Drop,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurningPoint {
    pub date: NaiveDate,
    pub close: f64,
    pub kind: TurningKind,
}

/// Bars where the close-to-close change flips sign.
///
/// A bar is a peak when it closed up and the next bar closed down, and a
/// drop in the reverse case. Flat changes never mark a turn.
pub fn turning_points(series: &PriceSeries) -> Vec<TurningPoint> {
    let bars = series.bars();
    let mut points = Vec::new();

    for t in 1..bars.len().saturating_sub(1) {
        let change = bars[t].close - bars[t - 1].close;
        let next_change = bars[t + 1].close - bars[t].close;

        let kind = if change > 0.0 && next_change < 0.0 {
            TurningKind::Peak
        } else if change < 0.0 && next_change > 0.0 {
            TurningKind::Drop
        } else {
            continue;
        };

        points.push(TurningPoint {
            date: bars[t].date,
            close: bars[t].close,
            kind,
        });
    }

    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{bars_from_closes, Symbol};

    #[test]
    fn test_peaks_and_drops() {
        let closes = [10.0, 11.0, 9.0, 9.0, 10.0, 12.0, 11.0];
        let series =
            PriceSeries::new(Symbol::new("TEST").unwrap(), bars_from_closes(&closes)).unwrap();

        let points = turning_points(&series);
        let kinds: Vec<(f64, TurningKind)> = points.iter().map(|p| (p.close, p.kind)).collect();

        // The flat step at 9.0 hides the drop
        assert_eq!(
            kinds,
            vec![(11.0, TurningKind::Peak), (12.0, TurningKind::Peak)]
        );
        assert_eq!(points[0].date, series.bars()[1].date);
    }

    #[test]
    fn test_short_series_has_no_turns() {
        let series =
            PriceSeries::new(Symbol::new("TEST").unwrap(), bars_from_closes(&[10.0, 11.0])).unwrap();
        assert!(turning_points(&series).is_empty());
    }
}
