//! Playwright browser automation
//!
//! A scenario is rendered to a single node script so the page, its cookies
//! and the mock session all live for the whole scenario. The script forwards
//! every intercepted backend call to the scenario's mock server and reports
//! progress as one JSON line per step on stdout.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use serde::{Deserialize, Serialize};
use tokio::process::Command as TokioCommand;
use tracing::{debug, info, warn};

use pizza_mock::server::UNHANDLED_HEADER;
use pizza_mock::JS_ROUTE_PATTERNS;

use crate::error::{E2eError, E2eResult};
use crate::spec::{Locator, TestSpec, TestStep};

/// Playwright browser handle
pub struct PlaywrightHandle {
    config: PlaywrightConfig,
}

#[derive(Debug, Clone, Copy, Default)]
pub enum Browser {
    #[default]
    Chromium,
    Firefox,
    Webkit,
}

impl Browser {
    fn as_str(&self) -> &'static str {
        match self {
            Browser::Chromium => "chromium",
            Browser::Firefox => "firefox",
            Browser::Webkit => "webkit",
        }
    }
}

impl std::str::FromStr for Browser {
    type Err = E2eError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "chromium" => Ok(Browser::Chromium),
            "firefox" => Ok(Browser::Firefox),
            "webkit" => Ok(Browser::Webkit),
            other => Err(E2eError::Playwright(format!("unknown browser: {}", other))),
        }
    }
}

/// Result of executing a test step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    pub success: bool,
    pub step_name: String,
    pub duration_ms: u64,
    pub error: Option<String>,
    pub screenshot_path: Option<PathBuf>,
}

/// One progress line printed by the generated script
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProgressLine {
    step: usize,
    ok: bool,
    duration_ms: u64,
    #[serde(default)]
    error: Option<String>,
}

/// Render a string as a JavaScript string literal
fn js_str(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}

impl Locator {
    /// Playwright locator expression rooted at `page`
    pub fn to_js(&self) -> String {
        let base = self
            .within
            .as_ref()
            .map_or_else(|| "page".to_string(), |parent| parent.to_js());

        let exact = if self.exact { ", exact: true" } else { "" };
        let mut expr = if let Some(role) = &self.role {
            match (&self.name, &self.name_pattern) {
                (Some(name), _) => format!(
                    "{}.getByRole({}, {{ name: {}{} }})",
                    base,
                    js_str(role),
                    js_str(name),
                    exact
                ),
                (None, Some(pattern)) => format!(
                    "{}.getByRole({}, {{ name: new RegExp({}) }})",
                    base,
                    js_str(role),
                    js_str(pattern)
                ),
                (None, None) => format!("{}.getByRole({})", base, js_str(role)),
            }
        } else if let Some(placeholder) = &self.placeholder {
            format!("{}.getByPlaceholder({})", base, js_str(placeholder))
        } else if let Some(text) = &self.text {
            if self.exact {
                format!("{}.getByText({}, {{ exact: true }})", base, js_str(text))
            } else {
                format!("{}.getByText({})", base, js_str(text))
            }
        } else if let Some(label) = &self.label {
            format!("{}.getByLabel({})", base, js_str(label))
        } else {
            format!("{}.locator({})", base, js_str(self.css.as_deref().unwrap_or("body")))
        };

        if self.first {
            expr.push_str(".first()");
        }
        expr
    }
}

impl PlaywrightHandle {
    /// Create a new Playwright handle
    pub fn new(config: PlaywrightConfig) -> E2eResult<Self> {
        // Verify playwright is installed
        Self::check_playwright_installed(config.node_modules.as_deref())?;

        // Create screenshot directory
        std::fs::create_dir_all(&config.screenshot_dir)?;

        Ok(Self { config })
    }

    /// Check that node can resolve the modules the script requires
    fn check_playwright_installed(node_modules: Option<&Path>) -> E2eResult<()> {
        let mut cmd = Command::new("node");
        cmd.args(["-e", "require.resolve('playwright'); require.resolve('@playwright/test')"]);
        if let Some(modules) = node_modules {
            cmd.env("NODE_PATH", modules);
        }
        let output = cmd
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();

        match output {
            Ok(status) if status.success() => Ok(()),
            _ => Err(E2eError::PlaywrightNotFound),
        }
    }

    /// Generate a display name for a step
    pub fn step_name(step: &TestStep) -> String {
        match step {
            TestStep::Navigate { url } => format!("navigate:{}", url),
            TestStep::Click { target, .. } => format!("click:{}", target.describe()),
            TestStep::Fill { target, .. } => format!("fill:{}", target.describe()),
            TestStep::Select { target, value } => format!("select:{}={}", target.describe(), value),
            TestStep::Wait { target, .. } => format!("wait:{}", target.describe()),
            TestStep::Sleep { ms } => format!("sleep:{}ms", ms),
            TestStep::Assert { target, .. } => format!("assert:{}", target.describe()),
            TestStep::AssertTitle { title } => format!("assert_title:{}", title),
            TestStep::Screenshot { name, .. } => format!("screenshot:{}", name),
            TestStep::Log { message } => {
                format!("log:{}", message.chars().take(30).collect::<String>())
            }
        }
    }

    fn screenshot_path(config: &PlaywrightConfig, name: &str) -> PathBuf {
        config.screenshot_dir.join(format!("{}.png", name))
    }

    /// Build the Playwright script for a whole scenario, with backend calls
    /// forwarded to the mock server at `mock_base_url`
    pub fn build_script(&self, spec: &TestSpec, mock_base_url: &str) -> String {
        Self::build_script_with(&self.config, spec, mock_base_url)
    }

    pub fn build_script_with(config: &PlaywrightConfig, spec: &TestSpec, mock_base_url: &str) -> String {
        let mut script = String::new();

        // Header
        script.push_str(&format!(
            r#"
const {{ chromium, firefox, webkit }} = require('playwright');
const {{ expect }} = require('@playwright/test');

const ROUTES = [{routes}];
const mockBase = {mock_base};
const baseUrl = {base_url};

function report(step, ok, started, error) {{
  console.log(JSON.stringify({{ step, ok, durationMs: Date.now() - started, error }}));
}}

(async () => {{
  const browser = await {browser}.launch({{ headless: {headless} }});
  const context = await browser.newContext({{
    viewport: {{ width: {width}, height: {height} }}
  }});
  const page = await context.newPage();

  const forward = async (route) => {{
    const request = route.request();
    const url = new URL(request.url());
    const method = request.method();
    const response = await fetch(mockBase + url.pathname + url.search, {{
      method,
      headers: {{ 'content-type': 'application/json' }},
      body: method === 'GET' || method === 'HEAD' ? undefined : (request.postData() ?? undefined),
    }});
    if (response.headers.get({unhandled}) === 'unhandled') {{
      await route.abort('failed');
      return;
    }}
    await route.fulfill({{
      status: response.status,
      contentType: 'application/json',
      body: await response.text(),
    }});
  }};
  for (const pattern of ROUTES) {{
    await page.route(pattern, forward);
  }}

  let step = 0;
  let started = Date.now();
  try {{
"#,
            routes = JS_ROUTE_PATTERNS.join(", "),
            mock_base = js_str(mock_base_url),
            base_url = js_str(&config.base_url),
            browser = config.browser.as_str(),
            headless = config.headless,
            width = spec.viewport.width,
            height = spec.viewport.height,
            unhandled = js_str(UNHANDLED_HEADER),
        ));

        // Generate step code
        for (i, step) in spec.steps.iter().enumerate() {
            let n = i + 1;
            script.push_str(&format!("\n    // Step {}: {}\n", n, Self::step_name(step)));
            script.push_str(&format!("    step = {}; started = Date.now();\n", n));
            script.push_str(&Self::step_to_js(config, step));
            script.push_str(&format!("\n    report({}, true, started);\n", n));
        }

        // Footer
        script.push_str(
            r#"
  } catch (error) {
    report(step, false, started, error.message);
    process.exitCode = 1;
  } finally {
    await page.unrouteAll({ behavior: 'ignoreErrors' });
    await browser.close();
  }
})();
"#,
        );

        script
    }

    /// Convert a step to JavaScript code
    fn step_to_js(config: &PlaywrightConfig, step: &TestStep) -> String {
        match step {
            TestStep::Navigate { url } => {
                format!("    await page.goto(baseUrl + {});", js_str(url))
            }
            TestStep::Click { target, timeout_ms } => {
                let timeout = timeout_ms.unwrap_or(5000);
                format!("    await {}.click({{ timeout: {} }});", target.to_js(), timeout)
            }
            TestStep::Fill { target, value } => {
                format!("    await {}.fill({});", target.to_js(), js_str(value))
            }
            TestStep::Select { target, value } => {
                format!("    await {}.selectOption({});", target.to_js(), js_str(value))
            }
            TestStep::Wait { target, timeout_ms, state } => format!(
                "    await {}.waitFor({{ state: '{}', timeout: {} }});",
                target.to_js(),
                state.as_str(),
                timeout_ms
            ),
            TestStep::Sleep { ms } => {
                format!("    await page.waitForTimeout({});", ms)
            }
            TestStep::Assert { target, visible, text_contains, count } => {
                let locator = target.to_js();
                let mut assertions = Vec::new();

                match visible {
                    Some(true) => assertions.push(format!("    await expect({}).toBeVisible();", locator)),
                    Some(false) => assertions.push(format!("    await expect({}).toBeHidden();", locator)),
                    None => {}
                }

                if let Some(text) = text_contains {
                    assertions.push(format!(
                        "    await expect({}).toContainText({});",
                        locator,
                        js_str(text)
                    ));
                }

                if let Some(c) = count {
                    assertions.push(format!("    await expect({}).toHaveCount({});", locator, c));
                }

                assertions.join("\n")
            }
            TestStep::AssertTitle { title } => {
                format!("    await expect(page).toHaveTitle({});", js_str(title))
            }
            TestStep::Screenshot { name, full_page } => {
                let path = Self::screenshot_path(config, name);
                format!(
                    "    await page.screenshot({{ path: {}, fullPage: {} }});",
                    js_str(&path.to_string_lossy()),
                    full_page
                )
            }
            TestStep::Log { message } => {
                format!("    console.error({});", js_str(&format!("[TEST] {}", message)))
            }
        }
    }

    /// Execute the full script via node, returning stdout
    pub async fn run_script(&self, script: &str) -> E2eResult<ScriptOutput> {
        // Write script to temp file
        let temp_dir = tempfile::tempdir()?;
        let script_path = temp_dir.path().join("scenario.js");
        std::fs::write(&script_path, script)?;

        debug!("Running Playwright script: {}", script_path.display());

        let mut cmd = TokioCommand::new("node");
        cmd.arg(&script_path);
        if let Some(modules) = &self.config.node_modules {
            cmd.env("NODE_PATH", modules);
        }
        let output = cmd.output().await?;

        Ok(ScriptOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    /// Run a scenario against the mock at `mock_base_url`. Stops at the
    /// first failing step; later steps have no result.
    pub async fn run_spec(&self, spec: &TestSpec, mock_base_url: &str) -> E2eResult<Vec<StepResult>> {
        let script = self.build_script(spec, mock_base_url);
        let output = self.run_script(&script).await?;

        for line in output.stderr.lines().filter(|l| l.starts_with("[TEST]")) {
            info!("{}", line);
        }

        let results = self.collect_results(spec, &output.stdout);
        let failed = results.iter().any(|r| !r.success);
        if !output.success && !failed {
            return Err(E2eError::Playwright(format!(
                "Script failed:\nstdout: {}\nstderr: {}",
                output.stdout, output.stderr
            )));
        }
        Ok(results)
    }

    fn collect_results(&self, spec: &TestSpec, stdout: &str) -> Vec<StepResult> {
        stdout
            .lines()
            .filter_map(|line| match serde_json::from_str::<ProgressLine>(line) {
                Ok(progress) => Some(progress),
                Err(_) => {
                    debug!("script output: {}", line);
                    None
                }
            })
            .filter_map(|progress| {
                let Some(step) = progress.step.checked_sub(1).and_then(|i| spec.steps.get(i)) else {
                    warn!("progress line for unknown step {}", progress.step);
                    return None;
                };
                let screenshot_path = match step {
                    TestStep::Screenshot { name, .. } if progress.ok => {
                        Some(Self::screenshot_path(&self.config, name))
                    }
                    _ => None,
                };
                Some(StepResult {
                    success: progress.ok,
                    step_name: Self::step_name(step),
                    duration_ms: progress.duration_ms,
                    error: progress.error,
                    screenshot_path,
                })
            })
            .collect()
    }
}

/// Captured output of one node run
#[derive(Debug, Clone)]
pub struct ScriptOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

/// Configuration for Playwright
#[derive(Debug, Clone)]
pub struct PlaywrightConfig {
    pub base_url: String,
    pub screenshot_dir: PathBuf,
    pub node_modules: Option<PathBuf>,
    pub browser: Browser,
    pub headless: bool,
}

impl Default for PlaywrightConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5173".to_string(),
            screenshot_dir: PathBuf::from("test-results/screenshots"),
            node_modules: None,
            browser: Browser::Chromium,
            headless: true,
        }
    }
}

impl PlaywrightConfig {
    /// Use the `node_modules` directory of a checked-out storefront
    pub fn with_storefront_modules(mut self, storefront_dir: &Path) -> Self {
        self.node_modules = Some(storefront_dir.join("node_modules"));
        self
    }
}
