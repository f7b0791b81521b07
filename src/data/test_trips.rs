//! Reference trips used for the single-record prediction

use super::TripRecord;

/// Known fare of [`trip1`]
pub const TRIP1_ACTUAL_FARE: f64 = 29.5;

/// A 10.33 mile cash trip with one passenger on the standard rate
pub fn trip1() -> TripRecord {
    TripRecord::new("VTS", "1", 1, 10.33, "CSH")
}
