//! Conversions from transport errors into domain errors

mod conversions;

pub use conversions::{status_to_error, TransportError};
