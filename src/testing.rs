//! In-memory collaborators for unit tests
//!
//! Every double shares its state through `Rc<RefCell<_>>`, so a test keeps a clone,
//! hands another to the context and inspects what happened afterwards. Reads land in
//! `calls`; state-changing calls also land in `mutations`. A call whose text starts
//! with `fail_on` fails with a tool error and is not recorded as a mutation.

use crate::core::config::RailConfig;
use crate::core::context::{ReleaseContext, RunMode};
use crate::core::error::{ReleaseResult, Tool, ToolError, ValidationError};
use crate::core::sandbox::{Sandbox, ToolProbe};
use crate::core::vcs::{CommitRecord, TrackingStatus, Vcs, mentions_exact};
use crate::platform::{
  NewPullRequest, Platform, PullRequest, PullRequestQuery, PullRequestState, WorkItem, WorkItemFilter,
};
use crate::release::project::{Project, ProjectKind};
use crate::ui::{Prompter, TextEditor};
use chrono::NaiveDate;
use std::cell::{RefCell, RefMut};
use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tempfile::TempDir;

fn injected(tool: Tool, call: &str) -> crate::core::error::ReleaseError {
  ToolError::new(tool, call, "injected failure").into()
}

fn fails(fail_on: &Option<String>, call: &str) -> bool {
  fail_on.as_deref().is_some_and(|prefix| call.starts_with(prefix))
}

/// Commit with a stable fake sha derived from the subject
pub fn commit(subject: &str) -> CommitRecord {
  let hash = subject
    .bytes()
    .fold(0xcbf2_9ce4_8422_2325u64, |h, b| (h ^ u64::from(b)).wrapping_mul(0x100_0000_01b3));
  CommitRecord {
    sha: format!("{:040x}", hash),
    subject: subject.to_string(),
    body: String::new(),
    parent_count: 1,
  }
}

pub fn pull_request(number: u64, head: &str, base: &str, state: PullRequestState) -> PullRequest {
  PullRequest {
    number,
    title: format!("chore(release): {}", head.rsplit('/').next().unwrap_or(head)),
    head: head.to_string(),
    base: base.to_string(),
    state,
    url: format!("https://github.com/acme/widget/pull/{}", number),
  }
}

// ----------------------------------------------------------------------------
// Version control
// ----------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct VcsState {
  /// Working tree the fake restores files into
  pub root: Option<PathBuf>,
  /// Content at HEAD, by relative path
  pub committed: HashMap<String, String>,
  pub current_branch: String,
  pub dirty: Vec<String>,
  /// Returned by the next status call only, then `dirty` again
  pub dirty_once: Vec<String>,
  pub tracked: HashSet<String>,
  pub ignored: HashSet<String>,
  pub tracking: TrackingStatus,
  pub local_tags: Vec<String>,
  pub remote_tags: Vec<String>,
  /// History returned by `commits_since`, newest first
  pub commits: Vec<CommitRecord>,
  /// History searched by `find_commit_on_branch`, by branch or remote ref
  pub branch_commits: HashMap<String, Vec<CommitRecord>>,
  pub local_branches: BTreeSet<String>,
  pub remote_branches: BTreeSet<String>,
  pub calls: Vec<String>,
  pub mutations: Vec<String>,
  pub fail_on: Option<String>,
}

#[derive(Clone, Default)]
pub struct FakeVcs(Rc<RefCell<VcsState>>);

impl FakeVcs {
  pub fn state(&self) -> RefMut<'_, VcsState> {
    self.0.borrow_mut()
  }

  pub fn calls(&self) -> Vec<String> {
    self.0.borrow().calls.clone()
  }

  pub fn mutations(&self) -> Vec<String> {
    self.0.borrow().mutations.clone()
  }

  fn read(&self, call: &str) -> ReleaseResult<RefMut<'_, VcsState>> {
    let mut state = self.state();
    if fails(&state.fail_on, call) {
      return Err(injected(Tool::Git, call));
    }
    state.calls.push(call.to_string());
    Ok(state)
  }

  fn mutate(&self, call: String) -> ReleaseResult<RefMut<'_, VcsState>> {
    let mut state = self.state();
    if fails(&state.fail_on, &call) {
      return Err(injected(Tool::Git, &call));
    }
    state.calls.push(call.clone());
    state.mutations.push(call);
    Ok(state)
  }
}

impl Vcs for FakeVcs {
  fn current_branch(&self) -> ReleaseResult<String> {
    Ok(self.read("current-branch")?.current_branch.clone())
  }

  fn uncommitted_paths(&self) -> ReleaseResult<Vec<String>> {
    let mut state = self.read("status")?;
    if !state.dirty_once.is_empty() {
      return Ok(std::mem::take(&mut state.dirty_once));
    }
    Ok(state.dirty.clone())
  }

  fn is_tracked(&self, path: &str) -> ReleaseResult<bool> {
    Ok(self.read(&format!("is-tracked {}", path))?.tracked.contains(path))
  }

  fn is_ignored(&self, path: &str) -> ReleaseResult<bool> {
    Ok(self.read(&format!("is-ignored {}", path))?.ignored.contains(path))
  }

  fn fetch(&self, remote: &str) -> ReleaseResult<()> {
    self.read(&format!("fetch {}", remote))?;
    Ok(())
  }

  fn tracking_status(&self, branch: &str, remote: &str) -> ReleaseResult<TrackingStatus> {
    Ok(self.read(&format!("tracking {}/{}", remote, branch))?.tracking)
  }

  fn tag_exists(&self, tag: &str, _remote: &str) -> ReleaseResult<bool> {
    let state = self.read(&format!("tag-exists {}", tag))?;
    Ok(state.local_tags.iter().chain(&state.remote_tags).any(|t| t == tag))
  }

  fn list_tags(&self, prefix: &str) -> ReleaseResult<Vec<String>> {
    let state = self.read("list-tags")?;
    Ok(state.local_tags.iter().filter(|t| t.starts_with(prefix)).cloned().collect())
  }

  fn commits_since(&self, _since: Option<&str>, window: usize) -> ReleaseResult<Vec<CommitRecord>> {
    let state = self.read("log")?;
    Ok(state.commits.iter().take(window).cloned().collect())
  }

  fn find_commit_on_branch(&self, branch: &str, patterns: &[String]) -> ReleaseResult<Option<CommitRecord>> {
    let state = self.read(&format!("search {}", branch))?;
    Ok(state.branch_commits.get(branch).and_then(|commits| {
      commits
        .iter()
        .find(|c| !c.is_revert() && patterns.iter().any(|p| mentions_exact(&c.message(), p)))
        .cloned()
    }))
  }

  fn local_branch_exists(&self, branch: &str) -> ReleaseResult<bool> {
    Ok(self.read(&format!("local-branch {}", branch))?.local_branches.contains(branch))
  }

  fn remote_branch_exists(&self, branch: &str, remote: &str) -> ReleaseResult<bool> {
    Ok(
      self
        .read(&format!("remote-branch {}/{}", remote, branch))?
        .remote_branches
        .contains(branch),
    )
  }

  fn create_and_checkout_branch(&self, branch: &str) -> ReleaseResult<()> {
    let mut state = self.mutate(format!("create-branch {}", branch))?;
    state.local_branches.insert(branch.to_string());
    state.current_branch = branch.to_string();
    Ok(())
  }

  fn checkout_branch(&self, branch: &str) -> ReleaseResult<()> {
    self.mutate(format!("checkout {}", branch))?.current_branch = branch.to_string();
    Ok(())
  }

  fn pull(&self, remote: &str, branch: &str) -> ReleaseResult<()> {
    self.mutate(format!("pull {} {}", remote, branch))?;
    Ok(())
  }

  fn delete_local_branch(&self, branch: &str) -> ReleaseResult<()> {
    self.mutate(format!("delete-local {}", branch))?.local_branches.remove(branch);
    Ok(())
  }

  fn delete_remote_branch(&self, branch: &str, remote: &str) -> ReleaseResult<()> {
    self
      .mutate(format!("delete-remote {} {}", remote, branch))?
      .remote_branches
      .remove(branch);
    Ok(())
  }

  fn push_branch(&self, branch: &str, remote: &str) -> ReleaseResult<()> {
    self
      .mutate(format!("push {} {}", remote, branch))?
      .remote_branches
      .insert(branch.to_string());
    Ok(())
  }

  fn commit_paths(&self, paths: &[PathBuf], message: &str) -> ReleaseResult<String> {
    let listed: Vec<String> = paths.iter().map(|p| p.display().to_string()).collect();
    let subject = message.lines().next().unwrap_or_default();
    let mut state = self.mutate(format!("commit {}: {}", listed.join(","), subject))?;
    if let Some(root) = state.root.clone() {
      for path in &listed {
        if let Ok(content) = fs::read_to_string(root.join(path)) {
          state.committed.insert(path.clone(), content);
        }
      }
    }
    Ok(commit(message).sha)
  }

  fn revert_commit(&self, commit: &CommitRecord) -> ReleaseResult<()> {
    self.mutate(format!("revert {}", commit.sha))?;
    Ok(())
  }

  fn restore_paths(&self, paths: &[PathBuf]) -> ReleaseResult<()> {
    for path in paths {
      let key = path.display().to_string();
      let state = self.mutate(format!("restore {}", key))?;
      if let (Some(root), Some(content)) = (&state.root, state.committed.get(&key)) {
        fs::write(root.join(path), content)?;
      }
    }
    Ok(())
  }
}

// ----------------------------------------------------------------------------
// Hosted platform
// ----------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct PlatformState {
  pub closed_items: Vec<WorkItem>,
  pub open_counts: HashMap<String, usize>,
  pub pull_requests: Vec<PullRequest>,
  /// Filters passed to `list_closed_work_items`, in call order
  pub filters: Vec<WorkItemFilter>,
  pub created: Vec<NewPullRequest>,
  pub calls: Vec<String>,
  pub mutations: Vec<String>,
  pub fail_on: Option<String>,
}

#[derive(Clone, Default)]
pub struct FakePlatform(Rc<RefCell<PlatformState>>);

impl FakePlatform {
  pub fn state(&self) -> RefMut<'_, PlatformState> {
    self.0.borrow_mut()
  }

  pub fn mutations(&self) -> Vec<String> {
    self.0.borrow().mutations.clone()
  }

  pub fn created(&self) -> Vec<NewPullRequest> {
    self.0.borrow().created.clone()
  }

  fn call(&self, call: String, mutation: bool) -> ReleaseResult<RefMut<'_, PlatformState>> {
    let mut state = self.state();
    if fails(&state.fail_on, &call) {
      return Err(injected(Tool::Gh, &call));
    }
    state.calls.push(call.clone());
    if mutation {
      state.mutations.push(call);
    }
    Ok(state)
  }
}

impl Platform for FakePlatform {
  fn list_closed_work_items(&self, filter: &WorkItemFilter) -> ReleaseResult<Vec<WorkItem>> {
    let mut state = self.call("list-items".to_string(), false)?;
    state.filters.push(filter.clone());
    Ok(state.closed_items.clone())
  }

  fn count_open_work_items(&self, milestone: &str) -> ReleaseResult<usize> {
    let state = self.call(format!("count-open {}", milestone), false)?;
    Ok(state.open_counts.get(milestone).copied().unwrap_or(0))
  }

  fn find_pull_request(
    &self,
    head: &str,
    base: Option<&str>,
    query: PullRequestQuery,
  ) -> ReleaseResult<Option<PullRequest>> {
    let state = self.call(format!("find-pr {}", head), false)?;
    Ok(
      state
        .pull_requests
        .iter()
        .filter(|pr| pr.head == head)
        .filter(|pr| base.is_none_or(|b| pr.base == b))
        .filter(|pr| query == PullRequestQuery::Any || pr.state == PullRequestState::Open)
        .max_by_key(|pr| pr.number)
        .cloned(),
    )
  }

  fn create_pull_request(&self, request: &NewPullRequest) -> ReleaseResult<PullRequest> {
    let mut state = self.call(format!("create {} -> {}", request.head, request.base), true)?;
    let number = 100 + state.pull_requests.len() as u64;
    let mut pr = pull_request(number, &request.head, &request.base, PullRequestState::Open);
    pr.title = request.title.clone();
    state.pull_requests.push(pr.clone());
    state.created.push(request.clone());
    Ok(pr)
  }

  fn close_pull_request(&self, number: u64, _comment: &str, delete_branch: bool) -> ReleaseResult<()> {
    let call = if delete_branch {
      format!("close #{} --delete-branch", number)
    } else {
      format!("close #{}", number)
    };
    let mut state = self.call(call, true)?;
    for pr in state.pull_requests.iter_mut().filter(|pr| pr.number == number) {
      pr.state = PullRequestState::Closed;
    }
    Ok(())
  }
}

// ----------------------------------------------------------------------------
// Sandbox, prompts, editor, tool probe
// ----------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct SandboxState {
  pub calls: Vec<String>,
  pub fail_on: Option<String>,
}

#[derive(Clone, Default)]
pub struct FakeSandbox(Rc<RefCell<SandboxState>>);

impl FakeSandbox {
  pub fn calls(&self) -> Vec<String> {
    self.0.borrow().calls.clone()
  }

  pub fn fail_on(&self, prefix: &str) {
    self.0.borrow_mut().fail_on = Some(prefix.to_string());
  }
}

impl Sandbox for FakeSandbox {
  fn describe(&self) -> String {
    "test sandbox".to_string()
  }

  fn run(&self, _dir: &Path, argv: &[&str]) -> ReleaseResult<String> {
    let call = argv.join(" ");
    let mut state = self.0.borrow_mut();
    if fails(&state.fail_on, &call) {
      return Err(injected(Tool::Container, &call));
    }
    state.calls.push(call);
    Ok(String::new())
  }
}

#[derive(Debug, Default)]
struct PrompterState {
  answers: VecDeque<bool>,
  choices: VecDeque<usize>,
  inputs: VecDeque<String>,
  questions: Vec<String>,
}

/// Answers confirmations from a queue, yes once the queue is empty
#[derive(Clone, Default)]
pub struct ScriptedPrompter(Rc<RefCell<PrompterState>>);

impl ScriptedPrompter {
  pub fn answer(&self, yes: bool) {
    self.0.borrow_mut().answers.push_back(yes);
  }

  pub fn choose(&self, index: usize) {
    self.0.borrow_mut().choices.push_back(index);
  }

  pub fn type_in(&self, text: &str) {
    self.0.borrow_mut().inputs.push_back(text.to_string());
  }

  pub fn questions(&self) -> Vec<String> {
    self.0.borrow().questions.clone()
  }
}

impl Prompter for ScriptedPrompter {
  fn confirm(&self, question: &str) -> ReleaseResult<bool> {
    let mut state = self.0.borrow_mut();
    state.questions.push(question.to_string());
    Ok(state.answers.pop_front().unwrap_or(true))
  }

  fn select(&self, question: &str, options: &[String]) -> ReleaseResult<usize> {
    let mut state = self.0.borrow_mut();
    state.questions.push(question.to_string());
    Ok(state.choices.pop_front().unwrap_or(0).min(options.len().saturating_sub(1)))
  }

  fn input(&self, question: &str) -> ReleaseResult<String> {
    let mut state = self.0.borrow_mut();
    state.questions.push(question.to_string());
    state.inputs.pop_front().ok_or_else(|| ValidationError::VersionRequired.into())
  }
}

/// Editor that saves fixed text, or leaves the template untouched
pub struct FakeEditor(Option<String>);

impl FakeEditor {
  pub fn returning(text: Option<&str>) -> Self {
    Self(text.map(str::to_string))
  }
}

impl TextEditor for FakeEditor {
  fn edit(&self, template: &str) -> ReleaseResult<String> {
    Ok(self.0.clone().unwrap_or_else(|| template.to_string()))
  }
}

/// Every tool is installed except these
pub struct MissingTools(pub Vec<&'static str>);

impl ToolProbe for MissingTools {
  fn is_available(&self, program: &str) -> bool {
    !self.0.contains(&program)
  }
}

// ----------------------------------------------------------------------------
// Test bed
// ----------------------------------------------------------------------------

pub const CARGO_TOML: &str = "[package]\nname = \"widget\"\nversion = \"1.2.0\"\nedition = \"2024\"\n";
pub const CARGO_LOCK: &str = "# This file is automatically @generated by Cargo.\nversion = 4\n\n[[package]]\nname = \"widget\"\nversion = \"1.2.0\"\n";
pub const CHANGELOG: &str = "# Changelog\n\n## [Unreleased]\n\n## [1.2.0] - 2025-02-01\n\n### Added\n\n- **Initial widget** (#1)\n";

/// A Cargo project at 1.2.0 on `development`, in sync, one release tag, one
/// feature and one fix since
pub struct TestBed {
  pub dir: TempDir,
  pub vcs: FakeVcs,
  pub platform: FakePlatform,
  pub sandbox: FakeSandbox,
  pub prompter: ScriptedPrompter,
}

impl TestBed {
  pub fn new() -> Self {
    let dir = TempDir::new().expect("temp dir");
    let files = [
      ("Cargo.toml", CARGO_TOML),
      ("Cargo.lock", CARGO_LOCK),
      ("CHANGELOG.md", CHANGELOG),
    ];

    let vcs = FakeVcs::default();
    {
      let mut state = vcs.state();
      state.root = Some(dir.path().to_path_buf());
      for (name, content) in files {
        fs::write(dir.path().join(name), content).expect("write fixture");
        state.committed.insert(name.to_string(), content.to_string());
        state.tracked.insert(name.to_string());
      }
      state.current_branch = "development".to_string();
      state.local_branches.insert("development".to_string());
      state.remote_branches.insert("development".to_string());
      state.local_tags.push("v1.2.0".to_string());
      state.commits = vec![
        commit("fix: handle empty input"),
        commit("feat: add gizmo (#12)"),
      ];
    }

    let platform = FakePlatform::default();
    platform.state().closed_items.push(WorkItem {
      number: 12,
      title: "Add gizmo".to_string(),
      labels: vec!["enhancement".to_string()],
    });

    Self {
      dir,
      vcs,
      platform,
      sandbox: FakeSandbox::default(),
      prompter: ScriptedPrompter::default(),
    }
  }

  pub fn root(&self) -> &Path {
    self.dir.path()
  }

  pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 2).expect("valid date")
  }

  pub fn context(&self) -> ReleaseContext {
    self.context_with(RunMode::default())
  }

  pub fn context_with(&self, mode: RunMode) -> ReleaseContext {
    ReleaseContext {
      root: self.dir.path().to_path_buf(),
      config: RailConfig::default(),
      project: Project {
        name: "widget".to_string(),
        kind: ProjectKind::Cargo,
        path: PathBuf::from("."),
        repo: None,
      },
      mode,
      today: Self::today(),
      vcs: Box::new(self.vcs.clone()),
      platform: Box::new(self.platform.clone()),
      sandbox: Box::new(self.sandbox.clone()),
      prompter: Box::new(self.prompter.clone()),
      editor: Box::new(FakeEditor::returning(None)),
      probe: Box::new(MissingTools(Vec::new())),
    }
  }
}
