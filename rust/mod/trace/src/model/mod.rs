mod activity;
mod audit;
mod product_lot;
mod traceability;

pub use activity::{Activity, NewActivity};
pub use audit::ConservationViolation;
pub use product_lot::{NewProductLot, ProductLot};
pub use traceability::{ActivityTraceability, ProductTraceability};
