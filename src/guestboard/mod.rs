//! Visitor guestboard: remote note store, location lookup and board state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Board state and note placement.
pub mod board;
/// One-time "already signed" marker.
pub mod flag;
/// Coordinates and reverse geocoding.
pub mod geocode;
/// Remote note persistence.
pub mod store;

/// Note position in percent of the board size.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NotePosition {
    pub x: f64,
    pub y: f64,
}

/// A note as stored remotely.
#[derive(Clone, Debug, PartialEq)]
pub struct GuestNote {
    pub id: String,
    pub name: String,
    pub city: String,
    pub message: String,
    pub date: DateTime<Utc>,
    pub position: NotePosition,
}

/// A note about to be written; the store assigns id and date.
#[derive(Clone, Debug, PartialEq)]
pub struct NewNote {
    pub name: String,
    pub city: String,
    pub message: String,
    pub position: NotePosition,
}
