use thiserror::Error;

use crate::shared::{CellKind, Currency, GridPos};

/// Expected, recoverable failures of the farm core's operations.
///
/// Every variant leaves the state it was raised from untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FarmError {
    #[error("cell {x},{y} is outside the {width}x{height} grid")]
    OutOfRange {
        x: i32,
        y: i32,
        width: u32,
        height: u32,
    },

    #[error("cannot plant at {cell}: kind {kind:?}, occupied: {occupied}")]
    InvalidPlanting {
        cell: GridPos,
        kind: CellKind,
        occupied: bool,
    },

    #[error("crop at {cell} is not ready to harvest")]
    NotReady { cell: GridPos },

    #[error("cell {cell} is occupied by a crop")]
    CellOccupied { cell: GridPos },

    #[error("cell {cell} cannot change from {from:?} to {to:?}")]
    InvalidTransition {
        cell: GridPos,
        from: CellKind,
        to: CellKind,
    },

    #[error("amount must be positive, got {0}")]
    InvalidAmount(i64),

    #[error("not enough {item_id}: requested {requested}, have {available}")]
    InsufficientQuantity {
        item_id: String,
        requested: u32,
        available: u32,
    },

    #[error("not enough {currency}: requested {requested}, have {available}")]
    InsufficientFunds {
        currency: Currency,
        requested: u64,
        available: u64,
    },

    #[error("{currency} balance would overflow")]
    Overflow { currency: Currency },

    #[error("unknown crop id '{id}'")]
    NotFound { id: String },

    #[error("invalid snapshot: {0}")]
    InvalidSnapshot(String),
}
