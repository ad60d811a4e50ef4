/*!
 * Common test utilities for the bhashantar test suite
 */

use std::sync::Once;

static INIT_LOGGING: Once = Once::new();

/// Route `log` output through env_logger for the whole test binary.
///
/// Quiet by default; run with RUST_LOG=debug to surface pipeline state
/// transitions while debugging a test.
pub fn init_test_logging() {
    INIT_LOGGING.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
    });
}
