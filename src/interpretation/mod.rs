//! Interpretation of a fitted run
//!
//! Turns the latest realized return, recent volatility and the model's
//! directional accuracy into a short-term outlook with a confidence score.

mod signals;
mod trend;

pub use signals::{
    confidence_score, latest_volatility, recent_return, volatility_penalty, ConfidenceBand,
    Interpretation, Outlook, VOLATILITY_WINDOW,
};
pub use trend::{turning_points, TurningKind, TurningPoint};
