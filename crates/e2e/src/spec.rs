//! Declarative YAML scenario specification

use serde::{Deserialize, Serialize};
use std::path::Path;

use pizza_common::{fixtures, Identity};

use crate::error::{E2eError, E2eResult};

/// A complete scenario parsed from YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestSpec {
    /// Unique name for this test
    pub name: String,

    /// Human-readable description
    #[serde(default)]
    pub description: String,

    /// Tags for filtering tests
    #[serde(default)]
    pub tags: Vec<String>,

    /// Viewport size for the browser
    #[serde(default = "default_viewport")]
    pub viewport: Viewport,

    /// How the mock backend starts for this scenario
    #[serde(default)]
    pub mock: MockSetup,

    /// Steps to execute in order
    pub steps: Vec<TestStep>,
}

fn default_viewport() -> Viewport {
    Viewport { width: 1280, height: 720 }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MockSetup {
    /// Email of the fixture identity the session starts logged in as
    #[serde(default)]
    pub logged_in_as: Option<String>,
}

/// Where on the page a step acts. Exactly one of `role`, `placeholder`,
/// `text`, `label` or `css` must be set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Locator {
    #[serde(default)]
    pub role: Option<String>,

    /// Accessible name, only with `role`
    #[serde(default)]
    pub name: Option<String>,

    /// Accessible name as a regular expression, only with `role`
    #[serde(default)]
    pub name_pattern: Option<String>,

    #[serde(default)]
    pub placeholder: Option<String>,

    #[serde(default)]
    pub text: Option<String>,

    #[serde(default)]
    pub label: Option<String>,

    #[serde(default)]
    pub css: Option<String>,

    /// Exact match for `name` or `text`
    #[serde(default)]
    pub exact: bool,

    /// Take the first of several matches
    #[serde(default)]
    pub first: bool,

    /// Resolve inside this parent locator
    #[serde(default)]
    pub within: Option<Box<Locator>>,
}

/// A single step in a scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum TestStep {
    /// Navigate to a URL (relative to the storefront base)
    Navigate {
        url: String,
    },

    /// Click an element
    Click {
        target: Locator,
        #[serde(default)]
        timeout_ms: Option<u64>,
    },

    /// Fill an input field
    Fill {
        target: Locator,
        value: String,
    },

    /// Select an option from a dropdown
    Select {
        target: Locator,
        value: String,
    },

    /// Wait for an element to reach a state
    Wait {
        target: Locator,
        #[serde(default = "default_wait_timeout")]
        timeout_ms: u64,
        #[serde(default)]
        state: WaitState,
    },

    /// Wait for a fixed amount of time (use sparingly)
    Sleep {
        ms: u64,
    },

    /// Assert something about an element
    Assert {
        target: Locator,
        #[serde(default)]
        visible: Option<bool>,
        #[serde(default)]
        text_contains: Option<String>,
        #[serde(default)]
        count: Option<usize>,
    },

    /// Assert the document title
    AssertTitle {
        title: String,
    },

    /// Take a screenshot
    Screenshot {
        name: String,
        #[serde(default)]
        full_page: bool,
    },

    /// Log a message (for debugging)
    Log {
        message: String,
    },
}

fn default_wait_timeout() -> u64 {
    5000 // 5 seconds default
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaitState {
    #[default]
    Visible,
    Hidden,
    Attached,
    Detached,
}

impl WaitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            WaitState::Visible => "visible",
            WaitState::Hidden => "hidden",
            WaitState::Attached => "attached",
            WaitState::Detached => "detached",
        }
    }
}

impl Locator {
    pub fn role(role: &str, name: &str) -> Self {
        Self {
            role: Some(role.to_string()),
            name: Some(name.to_string()),
            ..Default::default()
        }
    }

    pub fn placeholder(placeholder: &str) -> Self {
        Self {
            placeholder: Some(placeholder.to_string()),
            ..Default::default()
        }
    }

    pub fn text(text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
            ..Default::default()
        }
    }

    /// Check that the locator selects in exactly one way
    pub fn validate(&self) -> E2eResult<()> {
        let primaries = [
            self.role.is_some(),
            self.placeholder.is_some(),
            self.text.is_some(),
            self.label.is_some(),
            self.css.is_some(),
        ]
        .iter()
        .filter(|set| **set)
        .count();

        if primaries != 1 {
            return Err(E2eError::SpecParse(format!(
                "locator must set exactly one of role/placeholder/text/label/css, found {}",
                primaries
            )));
        }
        if self.role.is_none() && (self.name.is_some() || self.name_pattern.is_some()) {
            return Err(E2eError::SpecParse("name and name_pattern require role".to_string()));
        }
        if self.name.is_some() && self.name_pattern.is_some() {
            return Err(E2eError::SpecParse(
                "name and name_pattern are mutually exclusive".to_string(),
            ));
        }
        match &self.within {
            Some(parent) => parent.validate(),
            None => Ok(()),
        }
    }

    /// Short human-readable form used in step names
    pub fn describe(&self) -> String {
        let own = if let Some(role) = &self.role {
            match (&self.name, &self.name_pattern) {
                (Some(name), _) => format!("{}[{}]", role, name),
                (None, Some(pattern)) => format!("{}[/{}/]", role, pattern),
                (None, None) => role.clone(),
            }
        } else if let Some(p) = &self.placeholder {
            format!("placeholder[{}]", p)
        } else if let Some(t) = &self.text {
            format!("text[{}]", t)
        } else if let Some(l) = &self.label {
            format!("label[{}]", l)
        } else {
            self.css.clone().unwrap_or_default()
        };

        match &self.within {
            Some(parent) => format!("{} > {}", parent.describe(), own),
            None => own,
        }
    }
}

impl TestStep {
    fn locator(&self) -> Option<&Locator> {
        match self {
            TestStep::Click { target, .. }
            | TestStep::Fill { target, .. }
            | TestStep::Select { target, .. }
            | TestStep::Wait { target, .. }
            | TestStep::Assert { target, .. } => Some(target),
            _ => None,
        }
    }
}

impl TestSpec {
    /// Parse a test spec from YAML string
    pub fn from_yaml(yaml: &str) -> E2eResult<Self> {
        let spec: Self = serde_yaml::from_str(yaml)?;
        spec.validate()?;
        Ok(spec)
    }

    /// Parse a test spec from a YAML file
    pub fn from_file(path: &Path) -> E2eResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
            .map_err(|e| E2eError::SpecParse(format!("{}: {}", path.display(), e)))
    }

    /// Load all test specs from a directory, in file name order
    pub fn load_all(dir: &Path) -> E2eResult<Vec<Self>> {
        let mut specs = Vec::new();

        for entry in walkdir::WalkDir::new(dir)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| {
                e.path()
                    .extension()
                    .map(|ext| ext == "yaml" || ext == "yml")
                    .unwrap_or(false)
            })
        {
            let spec = Self::from_file(entry.path())?;
            specs.push(spec);
        }

        Ok(specs)
    }

    /// Filter specs by tag
    pub fn filter_by_tag<'a>(specs: &'a [Self], tag: &str) -> Vec<&'a Self> {
        specs.iter().filter(|s| s.tags.iter().any(|t| t == tag)).collect()
    }

    /// Reject specs that could never run
    pub fn validate(&self) -> E2eResult<()> {
        if self.steps.is_empty() {
            return Err(E2eError::SpecParse(format!("{}: no steps", self.name)));
        }
        for (i, step) in self.steps.iter().enumerate() {
            if let Some(locator) = step.locator() {
                locator.validate().map_err(|e| {
                    E2eError::SpecParse(format!("{} step {}: {}", self.name, i + 1, e))
                })?;
            }
            if let TestStep::Assert { visible: None, text_contains: None, count: None, .. } = step {
                return Err(E2eError::SpecParse(format!(
                    "{} step {}: assert without expectation",
                    self.name,
                    i + 1
                )));
            }
        }
        self.seed_identity()?;
        Ok(())
    }

    /// Identity the scenario's mock session starts with
    pub fn seed_identity(&self) -> E2eResult<Option<Identity>> {
        Ok(fixtures::resolve_seed_identity(self.mock.logged_in_as.as_deref())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_parse_simple_spec() {
        let yaml = r#"
name: login-as-diner
description: Log in and see the diner's initials
tags:
  - auth
  - smoke
steps:
  - action: navigate
    url: /
  - action: click
    target: { role: link, name: Login }
  - action: fill
    target: { placeholder: Email address }
    value: d@jwt.com
  - action: assert
    target: { role: link, name: KC }
    visible: true
"#;
        let spec = TestSpec::from_yaml(yaml).unwrap();
        assert_eq!(spec.name, "login-as-diner");
        assert_eq!(spec.steps.len(), 4);
        assert!(spec.mock.logged_in_as.is_none());
        assert_eq!(spec.viewport.width, 1280);
    }

    #[test]
    fn test_parse_scoped_locator_and_seed() {
        let yaml = r#"
name: franchise-from-nav
mock:
  logged_in_as: f@jwt.com
steps:
  - action: click
    target:
      role: link
      name: Franchise
      within: { label: Global }
  - action: click
    target:
      role: button
      name: Close
      within: { role: row, name_pattern: pizzaPocket }
      first: true
"#;
        let spec = TestSpec::from_yaml(yaml).unwrap();
        assert_eq!(spec.seed_identity().unwrap().map(|i| i.id), Some(4));

        match &spec.steps[1] {
            TestStep::Click { target, .. } => {
                assert!(target.first);
                assert_eq!(target.describe(), "row[/pizzaPocket/] > button[Close]");
            }
            other => panic!("unexpected step {:?}", other),
        }
    }

    #[test]
    fn test_rejects_ambiguous_locator() {
        let yaml = r#"
name: bad
steps:
  - action: click
    target: { role: button, text: Login }
"#;
        assert!(matches!(TestSpec::from_yaml(yaml), Err(E2eError::SpecParse(_))));
    }

    #[test_case("{}" ; "no primary")]
    #[test_case("{ role: button, css: button }" ; "two primaries")]
    #[test_case("{ placeholder: Email address, name: x }" ; "name without role")]
    #[test_case("{ text: Close, name_pattern: Close }" ; "pattern without role")]
    #[test_case("{ role: button, name: Close, name_pattern: Close }" ; "name and pattern")]
    #[test_case("{ role: button, name: Close, within: { label: Global, css: nav } }" ; "invalid parent")]
    fn test_invalid_locators(target: &str) {
        let locator: Locator = serde_yaml::from_str(target).unwrap();
        assert!(matches!(locator.validate(), Err(E2eError::SpecParse(_))), "{}", target);
    }

    #[test_case(Locator::role("button", "Login") ; "role and name")]
    #[test_case(Locator::placeholder("Email address") ; "placeholder")]
    #[test_case(Locator { exact: true, ..Locator::text("Create store") } ; "exact text")]
    fn test_valid_locators(locator: Locator) {
        assert!(locator.validate().is_ok());
    }

    #[test]
    fn test_rejects_unknown_seed() {
        let yaml = r#"
name: ghost
mock:
  logged_in_as: ghost@jwt.com
steps:
  - action: navigate
    url: /
"#;
        assert!(matches!(TestSpec::from_yaml(yaml), Err(E2eError::Seed(_))));
    }

    #[test]
    fn test_rejects_empty_assert() {
        let yaml = r#"
name: empty-assert
steps:
  - action: assert
    target: { text: Oops }
"#;
        assert!(TestSpec::from_yaml(yaml).is_err());
    }
}
