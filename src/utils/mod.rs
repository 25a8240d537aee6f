pub mod crypto;
pub mod logging;

pub use logging::LoggingHelper;
