//! Shared testing utilities
//!
//! Used by unit tests and, with the `testing` feature, the integration tests
//! under `tests/`.
//!
//! - [`fixtures`] - Pre-built test data (sessions, user stores, settings)
//! - [`mock`] - Fake identity verifiers
//!
//! ```rust,ignore
//! use personars::testing::TestFixtures;
//!
//! let session = TestFixtures::signed_in_session();
//! assert_eq!(session.email(), Some("a@example.com"));
//! ```

pub mod fixtures;
pub mod mock;

pub use fixtures::TestFixtures;
pub use mock::MockVerifier;

/// Common test constants
pub mod constants {
    /// Email of the user present in the fixture user store
    pub const TEST_EMAIL: &str = "a@example.com";

    /// Username stored in the signed-in fixture session
    pub const TEST_USERNAME: &str = "alice";

    /// Audience the fixture verifier expects
    pub const TEST_AUDIENCE: &str = "http://localhost:3000";

    /// Session secret used by the fixture session manager
    pub const TEST_SESSION_SECRET: &[u8] = b"test_session_secret_for_unit_tests";
}
