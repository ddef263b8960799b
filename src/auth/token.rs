//! Token record and secret wrappers persisted after a successful exchange.

pub mod record;
pub mod secret;
