//! GitHub CLI backend
//!
//! Read operations use `--json` and are parsed with serde; writes use the plain
//! subcommands. Authentication is whatever `gh auth` already holds.

use super::{NewPullRequest, Platform, PullRequest, PullRequestQuery, PullRequestState, WorkItem, WorkItemFilter};
use crate::core::error::{ReleaseError, ReleaseResult, ResultExt, Tool, ToolError};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Command;

const ISSUE_FIELDS: &str = "number,title,labels";
const PR_FIELDS: &str = "number,title,headRefName,baseRefName,state,url";

/// Upper bound on issues fetched per query
const LIST_LIMIT: &str = "500";

pub struct GhCli {
  root: PathBuf,
  /// `owner/name`; inferred from the git remote when absent
  repo: Option<String>,
}

impl GhCli {
  pub fn new(root: &Path, repo: Option<String>) -> Self {
    Self {
      root: root.to_path_buf(),
      repo,
    }
  }

  fn run(&self, args: &[&str]) -> ReleaseResult<String> {
    let mut cmd = Command::new("gh");
    cmd.current_dir(&self.root).args(args);
    if let Some(repo) = &self.repo {
      cmd.args(["--repo", repo.as_str()]);
    }
    cmd.env("GH_PROMPT_DISABLED", "1");

    let rendered = format!("gh {}", args.join(" "));
    tracing::debug!(command = %rendered, "running gh");
    let output = cmd.output().with_context(|| format!("Failed to execute {}", rendered))?;

    if !output.status.success() {
      return Err(ToolError::new(Tool::Gh, rendered, String::from_utf8_lossy(&output.stderr)).into());
    }
    Ok(String::from_utf8_lossy(&output.stdout).to_string())
  }
}

#[derive(Deserialize)]
struct IssueJson {
  number: u64,
  title: String,
  #[serde(default)]
  labels: Vec<LabelJson>,
}

#[derive(Deserialize)]
struct LabelJson {
  name: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PullRequestJson {
  number: u64,
  title: String,
  head_ref_name: String,
  base_ref_name: String,
  state: String,
  url: String,
}

impl From<IssueJson> for WorkItem {
  fn from(issue: IssueJson) -> Self {
    WorkItem {
      number: issue.number,
      title: issue.title,
      labels: issue.labels.into_iter().map(|l| l.name).collect(),
    }
  }
}

impl From<PullRequestJson> for PullRequest {
  fn from(pr: PullRequestJson) -> Self {
    let state = match pr.state.to_ascii_uppercase().as_str() {
      "OPEN" => PullRequestState::Open,
      "MERGED" => PullRequestState::Merged,
      _ => PullRequestState::Closed,
    };
    PullRequest {
      number: pr.number,
      title: pr.title,
      head: pr.head_ref_name,
      base: pr.base_ref_name,
      state,
      url: pr.url,
    }
  }
}

fn parse_issues(json: &str) -> ReleaseResult<Vec<WorkItem>> {
  let issues: Vec<IssueJson> = serde_json::from_str(json)?;
  Ok(issues.into_iter().map(WorkItem::from).collect())
}

fn parse_pull_requests(json: &str) -> ReleaseResult<Vec<PullRequest>> {
  let prs: Vec<PullRequestJson> = serde_json::from_str(json)?;
  Ok(prs.into_iter().map(PullRequest::from).collect())
}

/// `gh pr create` prints the new pull request URL; its last segment is the number
fn number_from_url(url: &str) -> Option<u64> {
  url.trim().trim_end_matches('/').rsplit('/').next()?.parse().ok()
}

impl Platform for GhCli {
  fn list_closed_work_items(&self, filter: &WorkItemFilter) -> ReleaseResult<Vec<WorkItem>> {
    let mut args = vec![
      "issue".to_string(),
      "list".to_string(),
      "--state".to_string(),
      "closed".to_string(),
      "--limit".to_string(),
      LIST_LIMIT.to_string(),
      "--json".to_string(),
      ISSUE_FIELDS.to_string(),
    ];
    match filter {
      WorkItemFilter::Milestone(milestone) => args.extend(["--milestone".to_string(), milestone.clone()]),
      WorkItemFilter::ClosedSince(date) => {
        args.extend(["--search".to_string(), format!("closed:>={}", date.format("%Y-%m-%d"))])
      }
    }
    let args: Vec<&str> = args.iter().map(String::as_str).collect();
    parse_issues(&self.run(&args)?)
  }

  fn count_open_work_items(&self, milestone: &str) -> ReleaseResult<usize> {
    let json = self.run(&[
      "issue",
      "list",
      "--state",
      "open",
      "--milestone",
      milestone,
      "--limit",
      LIST_LIMIT,
      "--json",
      "number",
    ])?;
    let numbers: Vec<serde_json::Value> = serde_json::from_str(&json)?;
    Ok(numbers.len())
  }

  fn find_pull_request(
    &self,
    head: &str,
    base: Option<&str>,
    query: PullRequestQuery,
  ) -> ReleaseResult<Option<PullRequest>> {
    let state = match query {
      PullRequestQuery::Open => "open",
      PullRequestQuery::Any => "all",
    };
    let mut args = vec!["pr", "list", "--head", head, "--state", state, "--json", PR_FIELDS];
    if let Some(base) = base {
      args.extend(["--base", base]);
    }
    Ok(parse_pull_requests(&self.run(&args)?)?.into_iter().next())
  }

  fn create_pull_request(&self, request: &NewPullRequest) -> ReleaseResult<PullRequest> {
    for label in &request.labels {
      // Creating the label first keeps `pr create --label` from failing on new repositories
      if let Err(e) = self.run(&["label", "create", label.as_str(), "--force", "--color", "0E8A16"]) {
        tracing::warn!(label = %label, error = %e, "could not ensure label exists");
      }
    }

    let mut args = vec![
      "pr",
      "create",
      "--title",
      request.title.as_str(),
      "--body",
      request.body.as_str(),
      "--base",
      request.base.as_str(),
      "--head",
      request.head.as_str(),
    ];
    for label in &request.labels {
      args.extend(["--label", label.as_str()]);
    }

    let url = self.run(&args)?.trim().to_string();
    let number = number_from_url(&url)
      .ok_or_else(|| ReleaseError::message(format!("Could not read pull request number from '{}'", url)))?;

    Ok(PullRequest {
      number,
      title: request.title.clone(),
      head: request.head.clone(),
      base: request.base.clone(),
      state: PullRequestState::Open,
      url,
    })
  }

  fn close_pull_request(&self, number: u64, comment: &str, delete_branch: bool) -> ReleaseResult<()> {
    let number = number.to_string();
    let mut args = vec!["pr", "close", number.as_str(), "--comment", comment];
    if delete_branch {
      args.push("--delete-branch");
    }
    self.run(&args)?;
    Ok(())
  }
}
