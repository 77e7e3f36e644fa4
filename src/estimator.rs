// Bid estimator: pure function from a price window to a margined, rounded bid

use thiserror::Error;

use crate::models::{BidEstimate, PriceObservation};

/// The market accepts bids with 4 decimal places.
const BID_SCALE: f64 = 10_000.0;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EstimateError {
    #[error("cannot estimate a bid from an empty window")]
    InsufficientData,
}

/// Mean price over the window times the margin, rounded to 4 decimal places.
/// Observations must already be in chronological order (the sampler
/// guarantees it); the window bounds are taken from the first and last.
pub fn estimate(
    observations: &[PriceObservation],
    margin_multiplier: f64,
) -> Result<BidEstimate, EstimateError> {
    if observations.is_empty() {
        return Err(EstimateError::InsufficientData);
    }
    let sum: f64 = observations.iter().map(|o| o.price).sum();
    let mean = sum / observations.len() as f64;
    Ok(BidEstimate {
        statistic_value: mean,
        margin_multiplier,
        final_bid: round_bid(mean * margin_multiplier),
        sample_count: observations.len(),
        window_start: observations[0].timestamp,
        window_end: observations[observations.len() - 1].timestamp,
    })
}

/// Round half away from zero to 4 decimal places.
pub fn round_bid(value: f64) -> f64 {
    (value * BID_SCALE).round() / BID_SCALE
}
