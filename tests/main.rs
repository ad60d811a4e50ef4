/*!
 * Main test entry point for bhashantar test suite
 */

// Common test utilities
pub mod common;

// Import integration tests
mod integration {
    // End-to-end translation pipeline tests
    pub mod translation_pipeline_tests;
}
