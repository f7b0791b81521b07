//! Trip records and the delimited-file loader
//!
//! A [`TripRecord`] is one row of historical taxi data. Records are produced
//! by [`DataLoader`] and consumed by the feature pipeline.

mod loader;
pub mod test_trips;

pub use loader::{DataLoader, LoaderOptions, TripRecords};

use crate::error::{Result, TaxiFareError};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Column names as they appear in the taxi fare CSV header
pub mod columns {
    pub const VENDOR_ID: &str = "vendor_id";
    pub const RATE_CODE: &str = "rate_code";
    pub const PASSENGER_COUNT: &str = "passenger_count";
    pub const TRIP_DISTANCE: &str = "trip_distance";
    pub const PAYMENT_TYPE: &str = "payment_type";
    pub const FARE_AMOUNT: &str = "fare_amount";

    /// Columns every input file must provide, in positional order
    pub const FEATURES: [&str; 5] = [
        VENDOR_ID,
        RATE_CODE,
        PASSENGER_COUNT,
        TRIP_DISTANCE,
        PAYMENT_TYPE,
    ];

    /// Positional layout used when a file has no header
    pub const POSITIONAL: [&str; 6] = [
        VENDOR_ID,
        RATE_CODE,
        PASSENGER_COUNT,
        TRIP_DISTANCE,
        PAYMENT_TYPE,
        FARE_AMOUNT,
    ];
}

/// One row of taxi trip data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripRecord {
    pub vendor_id: String,
    pub rate_code: String,
    pub passenger_count: u32,
    pub trip_distance: f64,
    pub payment_type: String,
    /// Present only in labeled data
    pub fare_amount: Option<f64>,
}

impl TripRecord {
    /// Create an unlabeled record
    pub fn new(
        vendor_id: impl Into<String>,
        rate_code: impl Into<String>,
        passenger_count: u32,
        trip_distance: f64,
        payment_type: impl Into<String>,
    ) -> Self {
        Self {
            vendor_id: vendor_id.into(),
            rate_code: rate_code.into(),
            passenger_count,
            trip_distance,
            payment_type: payment_type.into(),
            fare_amount: None,
        }
    }

    /// Attach a fare amount
    pub fn with_fare(mut self, fare_amount: f64) -> Self {
        self.fare_amount = Some(fare_amount);
        self
    }
}

/// Build a frame of the five feature columns, leaving out any fare
pub fn features_frame(records: &[TripRecord]) -> Result<DataFrame> {
    let vendor: Vec<&str> = records.iter().map(|r| r.vendor_id.as_str()).collect();
    let rate: Vec<&str> = records.iter().map(|r| r.rate_code.as_str()).collect();
    let passengers: Vec<f64> = records.iter().map(|r| r.passenger_count as f64).collect();
    let distance: Vec<f64> = records.iter().map(|r| r.trip_distance).collect();
    let payment: Vec<&str> = records.iter().map(|r| r.payment_type.as_str()).collect();

    Ok(df!(
        columns::VENDOR_ID => vendor,
        columns::RATE_CODE => rate,
        columns::PASSENGER_COUNT => passengers,
        columns::TRIP_DISTANCE => distance,
        columns::PAYMENT_TYPE => payment
    )?)
}

/// Build a column frame from records.
///
/// The fare column is included only when every record carries a fare; a mix
/// of labeled and unlabeled records is rejected.
pub fn records_to_frame(records: &[TripRecord]) -> Result<DataFrame> {
    let labeled = records.iter().filter(|r| r.fare_amount.is_some()).count();
    if labeled != 0 && labeled != records.len() {
        return Err(TaxiFareError::Schema(format!(
            "{} of {} records carry a fare amount; expected all or none",
            labeled,
            records.len()
        )));
    }

    let mut frame = features_frame(records)?;

    if labeled > 0 {
        let fares: Vec<f64> = records.iter().filter_map(|r| r.fare_amount).collect();
        frame.with_column(Series::new(columns::FARE_AMOUNT.into(), fares))?;
    }

    Ok(frame)
}
