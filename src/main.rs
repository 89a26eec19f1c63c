mod logging;

use std::path::{Path, PathBuf};

use clap::Parser;
use miette::{IntoDiagnostic, Result};

use tidemark_action::{
    ActionInputs, AtPhase, InputOverrides, Phase, PhaseError, Pipeline, Workflow,
};
use tidemark_core::{TidemarkConfig, TriggerContext};
use tidemark_filter::PathFilter;
use tidemark_runs::GitHubRuns;
use tidemark_vcs::GitCli;

#[derive(Parser)]
#[command(
    name = "tidemark",
    version,
    about = "List the files changed since the last known good commit",
    long_about = "Tidemark works out which files a CI run should care about.\n\n\
                   The base revision is the head of the last successful run of a workflow\n\
                   on the current branch, else the point where the branch left the default\n\
                   branch (or the pull request's base), else the empty tree. Changed paths\n\
                   are published as the `files` and `count` step outputs.\n\n\
                   Examples:\n  \
                     tidemark --workflow ci.yml            Diff against the last green run\n  \
                     tidemark --filter 'src/*' --print     Print matching paths to stdout"
)]
struct Cli {
    /// Token for the workflow-run API
    #[arg(long, env = "INPUT_ACCESS-TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Workflow file name or id whose last successful run is the preferred base
    #[arg(long, env = "INPUT_WORKFLOW-IDENTIFIER")]
    workflow: Option<String>,

    /// Glob pattern to keep (repeatable; newline-delimited from the action input)
    #[arg(long, env = "INPUT_FILTER", value_delimiter = '\n')]
    filter: Vec<String>,

    /// Default branch, when the event payload does not name one
    #[arg(long, env = "INPUT_DEFAULT-BRANCH")]
    default_branch: Option<String>,

    /// Base URL of the GitHub API (default: config file, then GITHUB_API_URL)
    #[arg(long)]
    api_url: Option<String>,

    /// Repository to inspect (default: current directory)
    #[arg(long, default_value = ".")]
    repo: PathBuf,

    /// Path to configuration file (default: .tidemark.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Also print the changed files to stdout, one per line
    #[arg(long)]
    print: bool,

    /// Enable debug logging
    #[arg(long, short)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .build(),
        )
    }))?;
    human_panic::setup_panic!();

    let cli = Cli::parse();
    logging::init(cli.verbose);

    let mut wf = Workflow::from_env();
    match run(&cli, &mut wf).await {
        Ok(files) => {
            if cli.print {
                for file in &files {
                    println!("{file}");
                }
            }
            Ok(())
        }
        Err(e) => {
            tracing::error!(phase = %e.phase, error = %e.source, "run failed");
            wf.fail(Some(e.phase.label()), &e.source.to_string())
                .into_diagnostic()?;
            Err(e.into())
        }
    }
}

async fn run(cli: &Cli, wf: &mut Workflow<std::io::Stdout>) -> Result<Vec<String>, PhaseError> {
    let config = load_config(cli.config.as_deref()).at(Phase::Inputs)?;
    let overrides = InputOverrides {
        token: cli
            .token
            .clone()
            .or_else(|| std::env::var("GITHUB_TOKEN").ok()),
        workflow: cli.workflow.clone(),
        filter: cli.filter.clone(),
        default_branch: cli.default_branch.clone(),
        api_url: cli.api_url.clone(),
        runner_api_url: std::env::var("GITHUB_API_URL").ok(),
    };
    let inputs = ActionInputs::resolve(overrides, &config).at(Phase::Inputs)?;
    let filter = PathFilter::new(inputs.filter.as_slice()).at(Phase::Inputs)?;

    let mut ctx = TriggerContext::from_env().at(Phase::Context)?;
    if ctx.master_branch.is_none() {
        ctx.master_branch = inputs.default_branch.clone();
    }
    tracing::debug!(event = %ctx.event, git_ref = ?ctx.git_ref, after = ?ctx.after, "trigger");

    let vcs = GitCli::new(&cli.repo);
    let runs = GitHubRuns::new(&inputs.token, Some(inputs.api_url.as_str()))
        .at(Phase::Inputs)?;

    let files = Pipeline::new(&vcs)
        .with_runs(&runs, inputs.workflow.as_deref())
        .with_filter(filter)
        .run(&ctx, wf)
        .await?;

    tracing::info!(count = files.len(), "changed files");
    wf.set_files(&files).at(Phase::Output)?;
    Ok(files)
}

fn load_config(path: Option<&Path>) -> tidemark_core::Result<TidemarkConfig> {
    match path {
        Some(path) => TidemarkConfig::from_file(path),
        None => {
            let default_path = Path::new(".tidemark.toml");
            if default_path.exists() {
                TidemarkConfig::from_file(default_path)
            } else {
                Ok(TidemarkConfig::default())
            }
        }
    }
}
