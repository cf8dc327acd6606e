//! Shared test helpers.

use parking_lot::{Mutex, MutexGuard};

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Serialise tests that read or write `RUNNER_ENV` / the env file; the
/// process environment is global state.
pub(crate) fn env_lock() -> MutexGuard<'static, ()> {
    ENV_LOCK.lock()
}
