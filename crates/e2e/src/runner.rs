//! Main test runner that orchestrates the storefront, mock backend and Playwright

use std::path::PathBuf;
use std::time::Instant;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use pizza_mock::{MockServer, MockServerConfig};

use crate::error::{E2eError, E2eResult};
use crate::playwright::{PlaywrightConfig, PlaywrightHandle, StepResult};
use crate::server::{StorefrontConfig, StorefrontHandle};
use crate::spec::TestSpec;

/// Result of running a single test
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestResult {
    pub name: String,
    pub success: bool,
    pub duration_ms: u64,
    pub steps: Vec<StepResult>,
    pub error: Option<String>,
}

impl TestResult {
    fn errored(name: &str, error: &E2eError) -> Self {
        Self {
            name: name.to_string(),
            success: false,
            duration_ms: 0,
            steps: vec![],
            error: Some(error.to_string()),
        }
    }
}

/// Result of running all tests
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestSuiteResult {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub duration_ms: u64,
    pub results: Vec<TestResult>,
}

impl TestSuiteResult {
    pub fn from_results(results: Vec<TestResult>, duration_ms: u64) -> Self {
        let passed = results.iter().filter(|r| r.success).count();
        Self {
            total: results.len(),
            passed,
            failed: results.len() - passed,
            duration_ms,
            results,
        }
    }
}

/// Main E2E test runner
pub struct TestRunner {
    /// Storefront configuration
    storefront_config: StorefrontConfig,

    /// Playwright configuration
    playwright_config: PlaywrightConfig,

    /// Running storefront handle (if any)
    storefront: Option<StorefrontHandle>,

    /// Already-running storefront to use instead of spawning one
    external_url: Option<String>,

    /// Test specs directory
    specs_dir: PathBuf,

    /// Output directory for results
    output_dir: PathBuf,
}

impl TestRunner {
    /// Create a new test runner with default configuration
    pub fn new() -> Self {
        Self::with_config(RunnerConfig::default())
    }

    /// Create a test runner with custom configuration
    pub fn with_config(config: RunnerConfig) -> Self {
        Self {
            storefront_config: config.storefront,
            playwright_config: config.playwright,
            storefront: None,
            external_url: config.external_url,
            specs_dir: config.specs_dir,
            output_dir: config.output_dir,
        }
    }

    /// Start the storefront, or point at the external one
    pub async fn start_storefront(&mut self) -> E2eResult<()> {
        if let Some(url) = &self.external_url {
            self.playwright_config.base_url = url.trim_end_matches('/').to_string();
            return Ok(());
        }
        if self.storefront.is_some() {
            return Ok(()); // Already running
        }

        let storefront = StorefrontHandle::spawn(self.storefront_config.clone()).await?;

        // Update playwright config with actual storefront URL
        self.playwright_config.base_url = storefront.base_url().to_string();

        self.storefront = Some(storefront);
        Ok(())
    }

    /// Stop the storefront
    pub fn stop_storefront(&mut self) -> E2eResult<()> {
        if let Some(mut storefront) = self.storefront.take() {
            storefront.stop()?;
        }
        Ok(())
    }

    /// Run all tests in the specs directory
    pub async fn run_all(&mut self) -> E2eResult<TestSuiteResult> {
        let specs = TestSpec::load_all(&self.specs_dir)?;
        self.run_specs(&specs).await
    }

    /// Run tests matching a tag
    pub async fn run_tagged(&mut self, tag: &str) -> E2eResult<TestSuiteResult> {
        let specs = TestSpec::load_all(&self.specs_dir)?;
        let filtered: Vec<TestSpec> = TestSpec::filter_by_tag(&specs, tag)
            .into_iter()
            .cloned()
            .collect();
        self.run_specs(&filtered).await
    }

    /// Run a specific test by name
    pub async fn run_test(&mut self, name: &str) -> E2eResult<TestResult> {
        let specs = TestSpec::load_all(&self.specs_dir)?;
        let spec = specs
            .into_iter()
            .find(|s| s.name == name)
            .ok_or_else(|| E2eError::SpecParse(format!("Test not found: {}", name)))?;

        self.start_storefront().await?;
        self.run_spec(&spec).await
    }

    /// Run a list of test specs, one after another
    pub async fn run_specs(&mut self, specs: &[TestSpec]) -> E2eResult<TestSuiteResult> {
        let start = Instant::now();
        let mut results = Vec::new();

        // Ensure storefront is running
        self.start_storefront().await?;

        info!("Running {} test(s)...", specs.len());

        for spec in specs {
            let result = match self.run_spec(spec).await {
                Ok(result) => result,
                Err(e) => TestResult::errored(&spec.name, &e),
            };
            if result.success {
                info!("✓ {} ({} ms)", result.name, result.duration_ms);
            } else {
                error!("✗ {} - {}", result.name, result.error.as_deref().unwrap_or("unknown error"));
            }
            results.push(result);
        }

        let suite = TestSuiteResult::from_results(results, start.elapsed().as_millis() as u64);

        info!("");
        info!("Test Results: {} passed, {} failed ({} ms)",
            suite.passed, suite.failed, suite.duration_ms);

        Ok(suite)
    }

    /// Run a single test spec against its own mock backend
    pub async fn run_spec(&self, spec: &TestSpec) -> E2eResult<TestResult> {
        let start = Instant::now();
        debug!("Running test: {}", spec.name);

        let playwright = PlaywrightHandle::new(self.playwright_config.clone())?;

        let mock = MockServer::start(MockServerConfig {
            seed: spec.seed_identity()?,
            ..Default::default()
        })
        .await?;

        let outcome = playwright.run_spec(spec, mock.base_url()).await;

        // Release the interception backend whatever the scenario did
        mock.shutdown().await?;
        let step_results = outcome?;

        let test_error = step_results
            .iter()
            .find(|r| !r.success)
            .map(|r| {
                E2eError::StepFailed {
                    step: r.step_name.clone(),
                    reason: r.error.clone().unwrap_or_default(),
                }
                .to_string()
            })
            .or_else(|| {
                (step_results.len() < spec.steps.len()).then(|| {
                    format!("only {} of {} steps reported", step_results.len(), spec.steps.len())
                })
            });

        Ok(TestResult {
            name: spec.name.clone(),
            success: test_error.is_none(),
            duration_ms: start.elapsed().as_millis() as u64,
            steps: step_results,
            error: test_error,
        })
    }

    /// Write test results to JSON file
    pub fn write_results(&self, results: &TestSuiteResult) -> E2eResult<PathBuf> {
        std::fs::create_dir_all(&self.output_dir)?;

        let path = self.output_dir.join("test-results.json");
        let json = serde_json::to_string_pretty(results)?;
        std::fs::write(&path, json)?;

        info!("Results written to: {}", path.display());
        Ok(path)
    }
}

impl Default for TestRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TestRunner {
    fn drop(&mut self) {
        let _ = self.stop_storefront();
    }
}

/// Configuration for the test runner
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub storefront: StorefrontConfig,
    pub playwright: PlaywrightConfig,
    pub external_url: Option<String>,
    pub specs_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            storefront: StorefrontConfig::default(),
            playwright: PlaywrightConfig::default(),
            external_url: None,
            specs_dir: PathBuf::from("tests/e2e/specs"),
            output_dir: PathBuf::from("test-results"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(name: &str, success: bool) -> TestResult {
        TestResult {
            name: name.to_string(),
            success,
            duration_ms: 1,
            steps: vec![],
            error: (!success).then(|| "boom".to_string()),
        }
    }

    #[test]
    fn test_suite_counts() {
        let suite = TestSuiteResult::from_results(
            vec![result("home", true), result("login", false), result("docs", true)],
            30,
        );
        assert_eq!(suite.total, 3);
        assert_eq!(suite.passed, 2);
        assert_eq!(suite.failed, 1);
    }

    #[test]
    fn test_write_results() {
        let dir = tempfile::tempdir().unwrap();
        let runner = TestRunner::with_config(RunnerConfig {
            output_dir: dir.path().join("out"),
            ..Default::default()
        });
        let suite = TestSuiteResult::from_results(vec![result("home", true)], 5);

        let path = runner.write_results(&suite).unwrap();
        let written: TestSuiteResult =
            serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(written.total, 1);
        assert_eq!(written.results[0].name, "home");
    }

    #[tokio::test]
    async fn test_external_url_skips_spawn() {
        let mut runner = TestRunner::with_config(RunnerConfig {
            external_url: Some("http://localhost:5173/".to_string()),
            ..Default::default()
        });
        runner.start_storefront().await.unwrap();
        assert!(runner.storefront.is_none());
        assert_eq!(runner.playwright_config.base_url, "http://localhost:5173");
    }

    #[tokio::test]
    async fn test_unknown_test_name() {
        let dir = tempfile::tempdir().unwrap();
        let mut runner = TestRunner::with_config(RunnerConfig {
            specs_dir: dir.path().to_path_buf(),
            ..Default::default()
        });
        assert!(matches!(
            runner.run_test("missing").await,
            Err(E2eError::SpecParse(_))
        ));
    }
}
