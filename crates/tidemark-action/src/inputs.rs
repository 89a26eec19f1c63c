//! Layering of flags, action inputs, and the config file into one settings set.

use tidemark_core::{split_lines, Result, TidemarkConfig, TidemarkError};
use tidemark_runs::github::DEFAULT_API_URL;

/// Values supplied on the command line or as `INPUT_*` variables.
///
/// `None` (or an empty list) means "not given"; lower layers fill the gap.
#[derive(Debug, Clone, Default)]
pub struct InputOverrides {
    /// `access-token`.
    pub token: Option<String>,
    /// `workflow-identifier`.
    pub workflow: Option<String>,
    /// `filter`, one pattern per entry; entries may themselves hold newlines.
    pub filter: Vec<String>,
    /// `default-branch`.
    pub default_branch: Option<String>,
    /// API base URL given as a flag.
    pub api_url: Option<String>,
    /// `GITHUB_API_URL` from the runner; used only when neither a flag nor
    /// the config file names an API URL.
    pub runner_api_url: Option<String>,
}

/// Settings after layering, ready for the pipeline.
///
/// # Examples
///
/// ```
/// use tidemark_action::{ActionInputs, InputOverrides};
/// use tidemark_core::TidemarkConfig;
///
/// let overrides = InputOverrides {
///     token: Some("ghp_xxxx".into()),
///     filter: vec!["src/**\n*.md".into()],
///     ..InputOverrides::default()
/// };
/// let config = TidemarkConfig {
///     workflow: Some("ci.yml".into()),
///     ..TidemarkConfig::default()
/// };
/// let inputs = ActionInputs::resolve(overrides, &config).unwrap();
/// assert_eq!(inputs.workflow.as_deref(), Some("ci.yml"));
/// assert_eq!(inputs.filter, vec!["src/**", "*.md"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionInputs {
    /// Token for the run-metadata API.
    pub token: String,
    /// Workflow whose last green run is the preferred base.
    pub workflow: Option<String>,
    /// Glob patterns; empty disables filtering.
    pub filter: Vec<String>,
    /// Default-branch override for payloads that lack one.
    pub default_branch: Option<String>,
    /// Run-metadata API base URL.
    pub api_url: String,
}

impl ActionInputs {
    /// Layer `overrides` over `config`.
    ///
    /// # Errors
    ///
    /// Returns [`TidemarkError::Config`] if no access token is available.
    pub fn resolve(overrides: InputOverrides, config: &TidemarkConfig) -> Result<Self> {
        let token = non_blank(overrides.token).ok_or_else(|| {
            TidemarkError::Config(
                "access-token is required; pass --token or set INPUT_ACCESS-TOKEN / GITHUB_TOKEN"
                    .into(),
            )
        })?;

        let filter: Vec<String> = overrides
            .filter
            .iter()
            .flat_map(|entry| split_lines(entry))
            .collect();
        let filter = if filter.is_empty() {
            config
                .filter
                .iter()
                .flat_map(|entry| split_lines(entry))
                .collect()
        } else {
            filter
        };

        Ok(Self {
            token,
            workflow: non_blank(overrides.workflow)
                .or_else(|| non_blank(config.workflow.clone())),
            filter,
            default_branch: non_blank(overrides.default_branch)
                .or_else(|| non_blank(config.default_branch.clone())),
            api_url: non_blank(overrides.api_url)
                .or_else(|| non_blank(config.api_url.clone()))
                .or_else(|| non_blank(overrides.runner_api_url))
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
