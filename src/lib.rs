#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

/// Version of the personars application
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod persona;
pub mod session;
pub mod settings;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod users;
pub mod utils;

/// Re-export commonly used items
pub use error::AppError;
pub use handlers::{configure_services, csrf_token, health, persona_logout, persona_verify};
pub use models::{UserId, UserRecord};
pub use persona::{AuthContext, AuthResponse, IdentityVerifier, RemoteVerifier};
pub use session::{LoginSession, SessionManager};
pub use settings::LoginSettings;
pub use users::{JsonFileUserStore, UserStore};
