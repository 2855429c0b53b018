pub mod model;
pub mod validation;

pub use model::{SYSTEM_ADDRESS, Transfer, TransferRequest};
pub use validation::Rejection;
