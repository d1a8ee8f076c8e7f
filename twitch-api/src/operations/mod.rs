//! Helix operations grouped by API area
//!
//! Each operation is a unit struct with an `execute` function taking the call
//! capability and a request value, mirroring one Helix endpoint.

pub mod eventsub;
pub mod users;
