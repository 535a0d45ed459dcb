//! Document records and the request envelope sent to the registry.

mod model;
mod request;

pub use model::{Description, Document, Product};
pub use request::{DocumentRequest, DOCUMENT_FORMAT_MANUAL, DOCUMENT_TYPE_LP_INTRODUCE_GOODS};
