use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

fn git(repo: &Path, args: &[&str]) -> String {
    let out = Command::new("git")
        .args(args)
        .current_dir(repo)
        .output()
        .unwrap();
    assert!(
        out.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&out.stderr)
    );
    String::from_utf8(out.stdout).unwrap().trim().to_string()
}

fn init_repo() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    git(dir.path(), &["init", "-q"]);
    git(dir.path(), &["symbolic-ref", "HEAD", "refs/heads/main"]);
    git(dir.path(), &["config", "user.name", "test-user"]);
    git(dir.path(), &["config", "user.email", "test@example.com"]);
    git(dir.path(), &["config", "commit.gpgsign", "false"]);
    dir
}

fn commit(repo: &Path, path: &str) -> String {
    let full = repo.join(path);
    if let Some(parent) = full.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(full, path).unwrap();
    git(repo, &["add", "."]);
    git(repo, &["commit", "-q", "-m", path]);
    git(repo, &["rev-parse", "HEAD"])
}

/// A CI-like invocation of the binary against a scratch repository.
struct Run {
    repo: PathBuf,
    scratch: tempfile::TempDir,
    event: &'static str,
    git_ref: String,
    payload: String,
    token: Option<&'static str>,
    args: Vec<String>,
}

impl Run {
    fn push(repo: &Path, branch: &str, payload: &str) -> Self {
        Self {
            repo: repo.to_path_buf(),
            scratch: tempfile::tempdir().unwrap(),
            event: "push",
            git_ref: format!("refs/heads/{branch}"),
            payload: payload.to_string(),
            token: Some("dummy-token"),
            args: Vec::new(),
        }
    }

    fn arg(mut self, arg: &str) -> Self {
        self.args.push(arg.to_string());
        self
    }

    fn output_path(&self) -> PathBuf {
        self.scratch.path().join("github_output")
    }

    fn exec(&self) -> (Output, HashMap<String, String>) {
        let event_path = self.scratch.path().join("event.json");
        std::fs::write(&event_path, &self.payload).unwrap();

        let mut cmd = Command::new(env!("CARGO_BIN_EXE_tidemark"));
        for var in [
            "GITHUB_TOKEN",
            "GITHUB_API_URL",
            "GITHUB_REPOSITORY",
            "GITHUB_SHA",
            "INPUT_ACCESS-TOKEN",
            "INPUT_WORKFLOW-IDENTIFIER",
            "INPUT_FILTER",
            "INPUT_DEFAULT-BRANCH",
            "TIDEMARK_LOG",
            "RUST_LOG",
        ] {
            cmd.env_remove(var);
        }
        cmd.current_dir(&self.repo)
            .env("GITHUB_EVENT_NAME", self.event)
            .env("GITHUB_REF", &self.git_ref)
            .env("GITHUB_EVENT_PATH", &event_path)
            .env("GITHUB_OUTPUT", self.output_path())
            .args(&self.args);
        if let Some(token) = self.token {
            cmd.env("INPUT_ACCESS-TOKEN", token);
        }

        let output = cmd.output().unwrap();
        let written = std::fs::read_to_string(self.output_path()).unwrap_or_default();
        (output, parse_outputs(&written))
    }
}

/// Parse `name<<delim ... delim` blocks from a `GITHUB_OUTPUT` file.
fn parse_outputs(content: &str) -> HashMap<String, String> {
    let mut outputs = HashMap::new();
    let mut lines = content.lines();
    while let Some(header) = lines.next() {
        let (name, delimiter) = header.split_once("<<").unwrap();
        let mut value = Vec::new();
        for line in lines.by_ref() {
            if line == delimiter {
                break;
            }
            value.push(line);
        }
        outputs.insert(name.to_string(), value.join("\n"));
    }
    outputs
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

#[test]
fn first_push_lists_every_tracked_file() {
    let repo = init_repo();
    commit(repo.path(), "README.md");
    commit(repo.path(), "src/lib.rs");
    let head = commit(repo.path(), "src/main.rs");

    let run = Run::push(repo.path(), "main", &format!(r#"{{"after":"{head}"}}"#));
    let (output, outputs) = run.exec();

    assert!(
        output.status.success(),
        "tidemark failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert_eq!(outputs["files"], "README.md\nsrc/lib.rs\nsrc/main.rs");
    assert_eq!(outputs["count"], "3");
    assert!(stdout(&output).contains("::group::Resolving base revision"));
    assert_eq!(git(repo.path(), &["tag", "-l", "empty"]), "empty");
}

#[test]
fn feature_branch_diffs_from_its_fork_point() {
    let repo = init_repo();
    commit(repo.path(), "README.md");
    git(repo.path(), &["checkout", "-q", "-b", "feature"]);
    commit(repo.path(), "src/new.rs");
    let head = commit(repo.path(), "docs/guide.md");

    let payload = format!(r#"{{"after":"{head}","repository":{{"default_branch":"main"}}}}"#);
    let (output, outputs) = Run::push(repo.path(), "feature", &payload).exec();

    assert!(output.status.success());
    assert_eq!(outputs["files"], "docs/guide.md\nsrc/new.rs");
    assert_eq!(outputs["count"], "2");
}

#[test]
fn default_branch_flag_fills_in_for_payload() {
    let repo = init_repo();
    commit(repo.path(), "README.md");
    git(repo.path(), &["checkout", "-q", "-b", "feature"]);
    let head = commit(repo.path(), "src/new.rs");

    let (output, outputs) = Run::push(repo.path(), "feature", &format!(r#"{{"after":"{head}"}}"#))
        .arg("--default-branch")
        .arg("main")
        .exec();

    assert!(output.status.success());
    assert_eq!(outputs["files"], "src/new.rs");
}

#[test]
fn filter_and_print() {
    let repo = init_repo();
    commit(repo.path(), "README.md");
    commit(repo.path(), "src/lib.rs");
    let head = commit(repo.path(), "docs/a.md");

    let (output, outputs) = Run::push(repo.path(), "main", &format!(r#"{{"after":"{head}"}}"#))
        .arg("--filter")
        .arg("src/*")
        .arg("--filter")
        .arg("*.md")
        .arg("--print")
        .exec();

    assert!(output.status.success());
    assert_eq!(outputs["files"], "src/lib.rs\nREADME.md\ndocs/a.md");
    let printed: Vec<String> = stdout(&output)
        .lines()
        .filter(|l| !l.starts_with("::"))
        .map(str::to_string)
        .collect();
    assert_eq!(printed, vec!["src/lib.rs", "README.md", "docs/a.md"]);
}

#[test]
fn config_file_supplies_filter() {
    let repo = init_repo();
    commit(repo.path(), "README.md");
    let head = commit(repo.path(), "src/lib.rs");
    std::fs::write(repo.path().join(".tidemark.toml"), "filter = [\"*.rs\"]\n").unwrap();

    let (output, outputs) =
        Run::push(repo.path(), "main", &format!(r#"{{"after":"{head}"}}"#)).exec();

    assert!(output.status.success());
    assert_eq!(outputs["files"], "src/lib.rs");
    assert_eq!(outputs["count"], "1");
}

#[test]
fn tag_push_fails_without_touching_the_repository() {
    let repo = init_repo();
    let head = commit(repo.path(), "README.md");

    let mut run = Run::push(repo.path(), "main", &format!(r#"{{"after":"{head}"}}"#));
    run.git_ref = "refs/tags/v1.0.0".into();
    let (output, outputs) = run.exec();

    assert!(!output.status.success());
    assert!(stdout(&output).contains(
        "::error title=Resolving base revision::failed to get start or endpoint for diff"
    ));
    assert_eq!(outputs["files"], "");
    assert_eq!(outputs["count"], "0");
    assert_eq!(git(repo.path(), &["tag", "-l"]), "");
}

#[test]
fn missing_token_is_fatal() {
    let repo = init_repo();
    let head = commit(repo.path(), "README.md");

    let mut run = Run::push(repo.path(), "main", &format!(r#"{{"after":"{head}"}}"#));
    run.token = None;
    let (output, outputs) = run.exec();

    assert!(!output.status.success());
    assert!(stdout(&output).contains("::error title=Reading inputs::"));
    assert_eq!(outputs["count"], "0");
}

#[test]
fn malformed_payload_is_fatal() {
    let repo = init_repo();
    commit(repo.path(), "README.md");

    let (output, _) = Run::push(repo.path(), "main", "{not json").exec();

    assert!(!output.status.success());
    assert!(stdout(&output).contains("::error title=Reading event context::"));
}

#[test]
fn invalid_filter_pattern_is_fatal() {
    let repo = init_repo();
    let head = commit(repo.path(), "README.md");

    let (output, _) = Run::push(repo.path(), "main", &format!(r#"{{"after":"{head}"}}"#))
        .arg("--filter")
        .arg("src/[*.rs")
        .exec();

    assert!(!output.status.success());
    assert!(stdout(&output).contains("::error title=Reading inputs::"));
}
