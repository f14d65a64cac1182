//! Product lot traceability.
//!
//! Lots are consumed by activities that each produce one new lot. Every
//! activity is committed atomically against the quantities it read, and any
//! lot's full ancestry can be rebuilt from the stored activities.

pub mod model;
pub mod query;
pub mod service;
pub mod store;

pub use model::{
    Activity, ActivityTraceability, ConservationViolation, NewActivity, NewProductLot, ProductLot,
    ProductTraceability,
};
pub use service::TraceService;
