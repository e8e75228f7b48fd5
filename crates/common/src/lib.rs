pub mod logging;
pub mod notify;
