//! Construction and execution errors.
//!
//! Panics inside test bodies never surface here: the per-test failure
//! boundary turns them into `test_failed` events. These variants cover a
//! malformed suite (reported when it is built) and conditions that abort a
//! run outright.

use crate::context::HookKind;

/// Errors raised while building or running suites.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// A test with the given name is already registered in this suite.
    #[error("duplicate test name: {0}")]
    DuplicateTestName(String),

    /// The registry was modified by someone else between reading the current
    /// bundle and publishing the updated one.
    #[error("test registry modified concurrently while registering '{0}'")]
    ConcurrentRegistration(String),

    /// A run was requested for a test that was never registered.
    #[error("test not found: {0}")]
    UnknownTestName(String),

    /// A `behaves_like` reference matched no shared behavior in its own scope
    /// or any enclosing scope.
    #[error("no shared behavior named '{0}' is visible from the invoking scope")]
    NoSuchSharedBehavior(String),

    /// A shared behavior invokes itself, directly or through other shared
    /// behaviors.
    #[error("shared behavior '{0}' invokes itself")]
    RecursiveSharedBehavior(String),

    /// A scope was given a second hook of the same kind.
    #[error("{hook} was already set in scope '{scope}'")]
    MultipleHook {
        /// Which hook was set twice.
        hook: HookKind,
        /// Display name of the offending scope.
        scope: String,
    },

    /// A configuration value or override list was rejected.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A report event was built without one of its required fields.
    #[error("event is missing required field `{0}`")]
    MissingEventField(&'static str),

    /// A lifecycle hook panicked outside the per-test failure boundary.
    #[error("{hook} failed in scope '{scope}': {message}")]
    HookFailed {
        /// Which hook panicked.
        hook: HookKind,
        /// Display name of the scope owning the hook.
        scope: String,
        /// The panic message.
        message: String,
    },
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
