// bisca-test-utils: shared testing infrastructure for storage adapters.
//
// - `fixtures`: one valid document per collection
// - `TestSuite` / `TestAdapter`: batches of adapter tests and their runner
// - `conformance`: the suites every adapter must pass

pub mod conformance;
pub mod fixtures;
pub mod test_adapter;
pub mod test_suite;

pub use test_adapter::{TestAdapter, TestAdapterConfig};
pub use test_suite::{TestEntry, TestHelpers, TestResult, TestSuite, TestSuiteStats};
