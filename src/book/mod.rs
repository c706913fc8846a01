//! Order-book normalization
//!
//! Converts a raw `{side → [[price, volume], …]}` payload into ranked
//! [`OrderBookLevel`] rows. A book is only accepted when both sides are
//! present and non-empty; anything else is a validation error and the
//! caller discards the tick.
//!
//! Ranking does not trust the payload's array order. Feeds disagree on
//! whether levels arrive best-first or worst-first, so each side is sorted
//! by price (asks ascending, bids descending) and then ranked 1..N, which
//! pins rank 1 to the best price on either side.

use rust_decimal::Decimal;
use serde_json::Value;
use thiserror::Error;

use crate::schema::{decimal_from_json, OrderBookLevel, Side};

/// Why a raw book was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BookError {
    #[error("payload is not an object")]
    NotAnObject,

    #[error("unknown side label '{0}'")]
    UnknownSide(String),

    #[error("side '{0}' appears more than once")]
    DuplicateSide(Side),

    #[error("side '{0}' is missing")]
    MissingSide(Side),

    #[error("side '{0}' has no levels")]
    EmptySide(Side),

    #[error("side '{0}' is not a list of levels")]
    SideNotAnArray(Side),

    #[error("invalid level {index} on side '{side}': {reason}")]
    InvalidLevel {
        side: Side,
        index: usize,
        reason: String,
    },
}

/// Normalize a raw book into ranked levels.
///
/// `timestamp_ns` is the request time of the snapshot and tags every
/// emitted row. All ask rows precede all bid rows in the output, but only
/// the per-side ranking is contractual; the store treats the batch as
/// unordered.
pub fn normalize(timestamp_ns: i64, payload: &Value) -> Result<Vec<OrderBookLevel>, BookError> {
    let object = payload.as_object().ok_or(BookError::NotAnObject)?;

    let mut asks: Option<Vec<(Decimal, Decimal)>> = None;
    let mut bids: Option<Vec<(Decimal, Decimal)>> = None;

    for (label, levels) in object {
        let side = Side::from_label(label).ok_or_else(|| BookError::UnknownSide(label.clone()))?;
        let parsed = parse_side(side, levels)?;

        let slot = match side {
            Side::Ask => &mut asks,
            Side::Bid => &mut bids,
        };
        if slot.is_some() {
            return Err(BookError::DuplicateSide(side));
        }
        *slot = Some(parsed);
    }

    let mut asks = asks.ok_or(BookError::MissingSide(Side::Ask))?;
    let mut bids = bids.ok_or(BookError::MissingSide(Side::Bid))?;

    if asks.is_empty() {
        return Err(BookError::EmptySide(Side::Ask));
    }
    if bids.is_empty() {
        return Err(BookError::EmptySide(Side::Bid));
    }

    // Best price first: lowest ask, highest bid.
    asks.sort_by(|a, b| a.0.cmp(&b.0));
    bids.sort_by(|a, b| b.0.cmp(&a.0));

    let mut rows = Vec::with_capacity(asks.len() + bids.len());
    push_ranked(&mut rows, timestamp_ns, Side::Ask, asks);
    push_ranked(&mut rows, timestamp_ns, Side::Bid, bids);

    Ok(rows)
}

fn push_ranked(
    rows: &mut Vec<OrderBookLevel>,
    timestamp_ns: i64,
    side: Side,
    levels: Vec<(Decimal, Decimal)>,
) {
    for (index, (price, volume)) in levels.into_iter().enumerate() {
        rows.push(OrderBookLevel {
            timestamp_ns,
            side,
            level: (index + 1) as i32,
            price,
            volume,
        });
    }
}

fn parse_side(side: Side, levels: &Value) -> Result<Vec<(Decimal, Decimal)>, BookError> {
    let entries = levels.as_array().ok_or(BookError::SideNotAnArray(side))?;

    let mut parsed = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        let pair = entry.as_array().ok_or_else(|| BookError::InvalidLevel {
            side,
            index,
            reason: "level is not an array".to_string(),
        })?;
        if pair.len() < 2 {
            return Err(BookError::InvalidLevel {
                side,
                index,
                reason: format!("expected [price, volume], got {} elements", pair.len()),
            });
        }

        let price = decimal_from_json(&pair[0]).ok_or_else(|| BookError::InvalidLevel {
            side,
            index,
            reason: format!("price '{}' is not numeric", pair[0]),
        })?;
        let volume = decimal_from_json(&pair[1]).ok_or_else(|| BookError::InvalidLevel {
            side,
            index,
            reason: format!("volume '{}' is not numeric", pair[1]),
        })?;

        parsed.push((price, volume));
    }

    Ok(parsed)
}
