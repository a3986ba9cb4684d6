// Test suite definition: a named batch of adapter tests with timing stats.
//
// Tests are plain `fn` items returning a boxed future, so they can borrow
// the helpers they are given. A test flagged `requires_reset` runs against
// freshly created, empty collections.

use std::error::Error;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;

use bisca_core::db::adapter::Adapter;
use bisca_core::db::schema::DatabaseSchema;
use bisca_core::db::store::Store;
use bisca_core::error::BiscaError;

/// Outcome of one test.
pub type TestResult = Result<(), Box<dyn Error + Send + Sync>>;

/// The future a test function returns.
pub type TestFuture<'a> = Pin<Box<dyn Future<Output = TestResult> + Send + 'a>>;

/// Statistics for a completed test suite.
#[derive(Debug, Clone)]
pub struct TestSuiteStats {
    pub suite_name: String,
    pub test_count: usize,
    pub reset_count: usize,
    pub total_reset_time_ms: f64,
    pub suite_start_time: Instant,
    pub suite_duration_ms: f64,
}

/// A test case entry.
pub struct TestEntry {
    pub name: String,
    pub test_fn: for<'a> fn(&'a TestHelpers) -> TestFuture<'a>,
    /// Drop and recreate every collection before running.
    pub requires_reset: bool,
}

impl TestEntry {
    pub fn new(name: &str, test_fn: for<'a> fn(&'a TestHelpers) -> TestFuture<'a>) -> Self {
        Self {
            name: name.to_string(),
            test_fn,
            requires_reset: true,
        }
    }

    /// Run on whatever the previous test left behind.
    pub fn shared(mut self) -> Self {
        self.requires_reset = false;
        self
    }
}

/// What a test function gets to work with.
pub struct TestHelpers {
    pub adapter: Arc<dyn Adapter>,
    pub schema: DatabaseSchema,
    pub log: TestLogger,
}

impl TestHelpers {
    pub fn store(&self) -> Store {
        Store::new(self.adapter.clone())
    }
}

/// Simple test logger.
pub struct TestLogger {
    pub adapter_name: String,
}

impl TestLogger {
    pub fn new(adapter_name: &str) -> Self {
        Self {
            adapter_name: adapter_name.to_string(),
        }
    }

    pub fn info(&self, msg: &str) {
        tracing::info!("[{}] {}", self.adapter_name, msg);
    }

    pub fn success(&self, msg: &str) {
        tracing::info!("[{}] ✓ {}", self.adapter_name, msg);
    }

    pub fn error(&self, msg: &str) {
        tracing::error!("[{}] {}", self.adapter_name, msg);
    }

    pub fn debug(&self, msg: &str) {
        tracing::debug!("[{}] {}", self.adapter_name, msg);
    }
}

/// A named group of adapter tests.
pub struct TestSuite {
    pub name: String,
    pub tests: Vec<TestEntry>,
    pub stats: TestSuiteStats,
}

impl TestSuite {
    pub fn new(name: &str) -> Self {
        let stats = TestSuiteStats {
            suite_name: name.to_string(),
            test_count: 0,
            reset_count: 0,
            total_reset_time_ms: 0.0,
            suite_start_time: Instant::now(),
            suite_duration_ms: 0.0,
        };

        Self {
            name: name.to_string(),
            tests: Vec::new(),
            stats,
        }
    }

    pub fn add_test(&mut self, entry: TestEntry) {
        self.tests.push(entry);
    }

    /// Builder form of `add_test`.
    pub fn test(mut self, entry: TestEntry) -> Self {
        self.add_test(entry);
        self
    }

    pub fn test_count(&self) -> usize {
        self.tests.len()
    }

    pub fn finalize_stats(&mut self) {
        self.stats.test_count = self.tests.len();
        self.stats.suite_duration_ms =
            self.stats.suite_start_time.elapsed().as_secs_f64() * 1000.0;
    }
}

// ─── Assertions ─────────────────────────────────────────────────────

/// Fail the test with `msg` unless `cond` holds.
pub fn ensure(cond: bool, msg: impl Into<String>) -> TestResult {
    if cond {
        return Ok(());
    }
    let msg: String = msg.into();
    Err(msg.into())
}

/// Expect a validation failure that reports `path`.
pub fn expect_validation<T: std::fmt::Debug>(
    result: Result<T, BiscaError>,
    path: &str,
) -> TestResult {
    match result {
        Err(BiscaError::Validation { errors, .. }) => {
            // Servers that only report an opaque rejection use `$`.
            let reported = errors.iter().any(|e| e.path == path || e.path == "$");
            ensure(reported, format!("expected a violation at `{path}`, got {errors:?}"))
        }
        other => Err(format!("expected validation error at `{path}`, got {other:?}").into()),
    }
}

/// Expect a unique-index violation.
pub fn expect_duplicate<T: std::fmt::Debug>(result: Result<T, BiscaError>) -> TestResult {
    match result {
        Err(BiscaError::DuplicateKey { .. }) => Ok(()),
        other => Err(format!("expected duplicate key error, got {other:?}").into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bisca_core::error::ValidationError;

    fn noop(_: &TestHelpers) -> TestFuture<'_> {
        Box::pin(async { Ok(()) })
    }

    #[test]
    fn test_suite_creation() {
        let suite = TestSuite::new("schema")
            .test(TestEntry::new("first", noop))
            .test(TestEntry::new("second", noop).shared());
        assert_eq!(suite.name, "schema");
        assert_eq!(suite.test_count(), 2);
        assert!(suite.tests[0].requires_reset);
        assert!(!suite.tests[1].requires_reset);
    }

    #[test]
    fn test_suite_stats() {
        let mut suite = TestSuite::new("stats").test(TestEntry::new("only", noop));
        suite.finalize_stats();
        assert_eq!(suite.stats.test_count, 1);
        assert!(suite.stats.suite_duration_ms >= 0.0);
    }

    #[test]
    fn test_expect_validation() {
        let err: Result<(), BiscaError> = Err(BiscaError::Validation {
            collection: "users".into(),
            errors: vec![ValidationError::missing("email")],
        });
        assert!(expect_validation(err, "email").is_ok());

        let err: Result<(), BiscaError> = Err(BiscaError::Validation {
            collection: "users".into(),
            errors: vec![ValidationError::missing("email")],
        });
        assert!(expect_validation(err, "username").is_err());
        assert!(expect_validation(Ok::<(), BiscaError>(()), "email").is_err());
    }

    #[test]
    fn test_expect_duplicate() {
        let err: Result<(), BiscaError> = Err(BiscaError::DuplicateKey {
            collection: "users".into(),
            index: "id_1".into(),
        });
        assert!(expect_duplicate(err).is_ok());
        assert!(expect_duplicate(Ok::<(), BiscaError>(())).is_err());
    }
}
