//! Outlook and confidence derivations

use crate::data::PriceSeries;
use crate::error::{Error, Result};
use crate::features::{pct_change, sample_std};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Window of the realized volatility fed to the confidence score
pub const VOLATILITY_WINDOW: usize = 5;

/// Minimum directional accuracy for a directional call
const ACCURACY_THRESHOLD: f64 = 0.5;

/// Extra deduction applied to an uncertain outlook
const UNCERTAIN_PENALTY: f64 = 15.0;

/// Short-term directional view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outlook {
    Bullish,
    Bearish,
    Uncertain,
}

impl Outlook {
    /// Classify from the latest realized return and the model's hit rate
    pub fn classify(recent_return: f64, directional_accuracy: f64) -> Self {
        if directional_accuracy > ACCURACY_THRESHOLD {
            if recent_return > 0.0 {
                return Outlook::Bullish;
            }
            if recent_return < 0.0 {
                return Outlook::Bearish;
            }
        }
        Outlook::Uncertain
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Outlook::Bullish => "bullish",
            Outlook::Bearish => "bearish",
            Outlook::Uncertain => "uncertain",
        }
    }

    /// One-line reading of the outlook
    pub fn headline(&self) -> &'static str {
        match self {
            Outlook::Bullish => "The short-term trend looks slightly positive.",
            Outlook::Bearish => "The short-term trend looks slightly negative.",
            Outlook::Uncertain => "The short-term direction is unclear.",
        }
    }
}

impl fmt::Display for Outlook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Deduction keyed by realized volatility
pub fn volatility_penalty(volatility: f64) -> f64 {
    if volatility > 0.03 {
        15.0
    } else if volatility > 0.02 {
        10.0
    } else if volatility > 0.01 {
        5.0
    } else {
        0.0
    }
}

/// Confidence in [0, 100].
///
/// Starts from the directional accuracy in percent, subtracts the volatility
/// penalty and the uncertain-outlook penalty, then rounds half to even and
/// clamps.
pub fn confidence_score(directional_accuracy: f64, volatility: f64, outlook: Outlook) -> u8 {
    let mut score = directional_accuracy * 100.0 - volatility_penalty(volatility);

    if outlook == Outlook::Uncertain {
        score -= UNCERTAIN_PENALTY;
    }

    let score = score.round_ties_even().clamp(0.0, 100.0);
    if score.is_nan() {
        0
    } else {
        score as u8
    }
}

/// Qualitative reading of a confidence score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceBand {
    High,
    Moderate,
    Low,
}

impl ConfidenceBand {
    pub fn from_score(score: u8) -> Self {
        match score {
            70.. => ConfidenceBand::High,
            50..=69 => ConfidenceBand::Moderate,
            _ => ConfidenceBand::Low,
        }
    }

    pub fn caption(&self) -> &'static str {
        match self {
            ConfidenceBand::High => "High confidence in the short-term signal",
            ConfidenceBand::Moderate => "Moderate confidence in the short-term signal",
            ConfidenceBand::Low => "Low confidence due to uncertainty or volatility",
        }
    }
}

/// Latest close-to-close return of the series
pub fn recent_return(series: &PriceSeries) -> Result<f64> {
    let closes = series.closes();
    if closes.len() < 2 {
        return Err(Error::InsufficientHistory {
            quantity: "recent return",
            available: closes.len(),
            required: 2,
        });
    }

    let returns = pct_change(&closes[closes.len() - 2..]);
    Ok(returns[1])
}

/// Sample standard deviation of the last five returns
pub fn latest_volatility(series: &PriceSeries) -> Result<f64> {
    let required = VOLATILITY_WINDOW + 1;
    let closes = series.closes();
    if closes.len() < required {
        return Err(Error::InsufficientHistory {
            quantity: "volatility",
            available: closes.len(),
            required,
        });
    }

    let returns = pct_change(&closes[closes.len() - required..]);
    Ok(sample_std(&returns[1..]))
}

/// Derived signals for one run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Interpretation {
    pub recent_return: f64,
    pub volatility: f64,
    pub outlook: Outlook,
    pub confidence: u8,
}

impl Interpretation {
    /// Combine the scalar inputs into outlook and confidence
    pub fn from_inputs(recent_return: f64, volatility: f64, directional_accuracy: f64) -> Self {
        let outlook = Outlook::classify(recent_return, directional_accuracy);
        let confidence = confidence_score(directional_accuracy, volatility, outlook);

        Self {
            recent_return,
            volatility,
            outlook,
            confidence,
        }
    }

    /// Read the scalar inputs off the raw series, then combine them
    pub fn from_series(series: &PriceSeries, directional_accuracy: f64) -> Result<Self> {
        let recent = recent_return(series)?;
        let volatility = latest_volatility(series)?;
        Ok(Self::from_inputs(recent, volatility, directional_accuracy))
    }

    pub fn band(&self) -> ConfidenceBand {
        ConfidenceBand::from_score(self.confidence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{bars_from_closes, Symbol};

    fn series(closes: &[f64]) -> PriceSeries {
        PriceSeries::new(Symbol::new("TEST").unwrap(), bars_from_closes(closes)).unwrap()
    }

    #[test]
    fn test_outlook_table() {
        assert_eq!(Outlook::classify(0.02, 0.6), Outlook::Bullish);
        assert_eq!(Outlook::classify(-0.01, 0.55), Outlook::Bearish);
        assert_eq!(Outlook::classify(0.02, 0.4), Outlook::Uncertain);
        assert_eq!(Outlook::classify(0.0, 0.9), Outlook::Uncertain);
        assert_eq!(Outlook::classify(-0.03, 0.5), Outlook::Uncertain);
    }

    #[test]
    fn test_volatility_penalty_steps() {
        assert_eq!(volatility_penalty(0.0), 0.0);
        assert_eq!(volatility_penalty(0.01), 0.0);
        assert_eq!(volatility_penalty(0.015), 5.0);
        assert_eq!(volatility_penalty(0.02), 5.0);
        assert_eq!(volatility_penalty(0.025), 10.0);
        assert_eq!(volatility_penalty(0.031), 15.0);
    }

    #[test]
    fn test_confidence_examples() {
        assert_eq!(confidence_score(0.6, 0.025, Outlook::Bullish), 50);
        assert_eq!(confidence_score(0.55, 0.005, Outlook::Uncertain), 40);
        assert_eq!(confidence_score(0.1, 0.05, Outlook::Uncertain), 0);
        assert_eq!(confidence_score(1.0, 0.0, Outlook::Bullish), 100);
        // Half-way values round to even
        assert_eq!(confidence_score(0.625, 0.0, Outlook::Bullish), 62);
    }

    #[test]
    fn test_confidence_stays_in_range() {
        for a in 0..=100 {
            let accuracy = a as f64 / 100.0;
            for v in 0..=60 {
                let volatility = v as f64 / 1000.0;
                for outlook in [Outlook::Bullish, Outlook::Bearish, Outlook::Uncertain] {
                    let score = confidence_score(accuracy, volatility, outlook);
                    assert!(score <= 100);
                }
            }
        }
    }

    #[test]
    fn test_confidence_non_increasing_in_volatility() {
        for a in 0..=100 {
            let accuracy = a as f64 / 100.0;
            let mut previous = u8::MAX;
            for v in 0..=60 {
                let score = confidence_score(accuracy, v as f64 / 1000.0, Outlook::Bullish);
                assert!(score <= previous);
                previous = score;
            }
        }
    }

    #[test]
    fn test_bands() {
        assert_eq!(ConfidenceBand::from_score(70), ConfidenceBand::High);
        assert_eq!(ConfidenceBand::from_score(69), ConfidenceBand::Moderate);
        assert_eq!(ConfidenceBand::from_score(50), ConfidenceBand::Moderate);
        assert_eq!(ConfidenceBand::from_score(49), ConfidenceBand::Low);
    }

    #[test]
    fn test_recent_return_and_volatility_from_series() {
        let closes = [10.0, 11.0, 9.0, 9.5, 10.5, 11.0, 10.0, 12.0];
        let s = series(&closes);

        assert!((recent_return(&s).unwrap() - 0.2).abs() < 1e-12);

        let window: Vec<f64> = closes.windows(2).map(|w| (w[1] - w[0]) / w[0]).collect();
        let expected = sample_std(&window[window.len() - 5..]);
        assert!((latest_volatility(&s).unwrap() - expected).abs() < 1e-12);
    }

    #[test]
    fn test_short_series_is_insufficient_history() {
        assert!(matches!(
            recent_return(&series(&[10.0])),
            Err(Error::InsufficientHistory { required: 2, .. })
        ));
        assert!(matches!(
            latest_volatility(&series(&[10.0, 11.0, 12.0, 13.0, 14.0])),
            Err(Error::InsufficientHistory { required: 6, available: 5, .. })
        ));
        assert!(latest_volatility(&series(&[10.0, 11.0, 12.0, 13.0, 14.0, 15.0])).is_ok());
    }

    #[test]
    fn test_interpretation_from_inputs() {
        let interpretation = Interpretation::from_inputs(-0.01, 0.012, 0.7);
        assert_eq!(interpretation.outlook, Outlook::Bearish);
        assert_eq!(interpretation.confidence, 65);
        assert_eq!(interpretation.band(), ConfidenceBand::Moderate);
    }
}
