// Test adapter runner: executes test suites against one storage adapter.
//
// 1. Resets the schema (drop every collection, create_schema)
// 2. Executes each suite, resetting before tests that ask for it
// 3. Drops the collections again
// 4. Reports aggregate statistics

use std::sync::Arc;
use std::time::Instant;

use bisca_core::db::adapter::{Adapter, SchemaOptions};
use bisca_core::db::schema::DatabaseSchema;

use crate::test_suite::{TestHelpers, TestLogger, TestResult, TestSuite, TestSuiteStats};

/// Configuration for the test adapter runner.
pub struct TestAdapterConfig {
    /// Display name for the adapter being tested.
    pub adapter_display_name: String,
    pub adapter: Arc<dyn Adapter>,
    /// Schema created before the suites run.
    pub schema: DatabaseSchema,
    pub test_suites: Vec<TestSuite>,
    /// Prefix to add to test suite names.
    pub prefix_tests: Option<String>,
}

impl TestAdapterConfig {
    /// Run every conformance suite against `adapter`.
    pub fn new(name: &str, adapter: Arc<dyn Adapter>, schema: DatabaseSchema) -> Self {
        Self {
            adapter_display_name: name.to_string(),
            adapter,
            schema,
            test_suites: crate::conformance::all_suites(),
            prefix_tests: None,
        }
    }
}

/// The test adapter runner.
pub struct TestAdapter {
    config: TestAdapterConfig,
    log: TestLogger,
    all_stats: Vec<TestSuiteStats>,
}

impl TestAdapter {
    pub fn new(config: TestAdapterConfig) -> Self {
        let log = TestLogger::new(&config.adapter_display_name);
        Self {
            config,
            log,
            all_stats: Vec::new(),
        }
    }

    /// Drop every collection of the schema and create it again, empty.
    async fn reset(&self) -> TestResult {
        for name in self.config.schema.collection_names() {
            self.config.adapter.drop_collection(name).await?;
        }
        self.config
            .adapter
            .create_schema(&self.config.schema, &SchemaOptions::default())
            .await?;
        Ok(())
    }

    /// Run all test suites, stopping at the first failure.
    pub async fn execute(&mut self) -> TestResult {
        self.log.info("Starting test adapter execution");

        let reset_start = Instant::now();
        self.reset().await?;
        self.log.success(&format!(
            "SCHEMA created ({:.3}ms)",
            reset_start.elapsed().as_secs_f64() * 1000.0
        ));

        let helpers = TestHelpers {
            adapter: self.config.adapter.clone(),
            schema: self.config.schema.clone(),
            log: TestLogger::new(&self.config.adapter_display_name),
        };

        let mut suites = std::mem::take(&mut self.config.test_suites);
        for suite in &mut suites {
            let suite_name = match self.config.prefix_tests {
                Some(ref prefix) => format!("{} > {}", prefix, suite.name),
                None => suite.name.clone(),
            };

            self.log.info(&format!("Running suite: {suite_name}"));
            suite.stats.suite_start_time = Instant::now();

            for test in &suite.tests {
                if test.requires_reset {
                    let start = Instant::now();
                    self.reset().await?;
                    suite.stats.reset_count += 1;
                    suite.stats.total_reset_time_ms += start.elapsed().as_secs_f64() * 1000.0;
                }

                match (test.test_fn)(&helpers).await {
                    Ok(()) => self.log.success(&test.name),
                    Err(e) => {
                        self.log.error(&format!("✗ {suite_name} > {}: {e}", test.name));
                        return Err(format!("{suite_name} > {}: {e}", test.name).into());
                    }
                }
            }

            suite.finalize_stats();
            self.all_stats.push(suite.stats.clone());
        }
        self.config.test_suites = suites;

        let cleanup_start = Instant::now();
        for name in self.config.schema.collection_names() {
            self.config.adapter.drop_collection(name).await?;
        }
        self.log.success(&format!(
            "CLEAN-UP completed ({:.3}ms)",
            cleanup_start.elapsed().as_secs_f64() * 1000.0
        ));

        self.print_aggregate_stats();
        Ok(())
    }

    pub fn stats(&self) -> &[TestSuiteStats] {
        &self.all_stats
    }

    fn print_aggregate_stats(&self) {
        if self.all_stats.is_empty() {
            return;
        }

        let dash = "─".repeat(80);
        println!("\n{dash}");
        println!("TEST SUITE STATISTICS SUMMARY ({})", self.config.adapter_display_name);
        println!("{dash}\n");

        for stats in &self.all_stats {
            let avg_reset = if stats.reset_count > 0 {
                stats.total_reset_time_ms / stats.reset_count as f64
            } else {
                0.0
            };
            println!("{}:", stats.suite_name);
            println!("  Tests: {}", stats.test_count);
            println!("  Resets: {} (avg: {:.2}ms)", stats.reset_count, avg_reset);
            println!("  Suite Duration: {:.2}ms", stats.suite_duration_ms);
            println!();
        }

        let total_tests: usize = self.all_stats.iter().map(|s| s.test_count).sum();
        let total_duration: f64 = self.all_stats.iter().map(|s| s.suite_duration_ms).sum();
        println!("{dash}");
        println!("TOTALS");
        println!("  Total Tests: {total_tests}");
        println!("  Total Duration: {total_duration:.2}ms");
        println!("{dash}\n");
    }
}
