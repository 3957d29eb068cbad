use std::error::Error;
use std::fmt;

/// Why a ledger write was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerError {
    /// The room does not exist or is not currently bookable.
    RoomNotFound(u32),
    /// A confirmed booking already overlaps the requested slot.
    RoomUnavailable(u32),
}

impl fmt::Display for LedgerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LedgerError::RoomNotFound(id) => write!(f, "room {id} not found or inactive"),
            LedgerError::RoomUnavailable(id) => {
                write!(f, "room {id} is not available for the requested time")
            }
        }
    }
}

impl Error for LedgerError {}
