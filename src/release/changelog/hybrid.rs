//! Hybrid changelog generation
//!
//! Closed work items give the structure (one bullet per item, grouped by label);
//! commits give the detail (sub-bullets for commits referencing the item). Commits
//! that reference nothing land under `Changed`.

use super::commit::is_release_chore;
use super::refs::{has_references, mentions, strip_reference};
use super::{Bullet, Category, ChangelogEntry, Section};
use crate::core::vcs::CommitRecord;
use crate::platform::WorkItem;
use crate::release::version::ReleaseVersion;
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Bullet emitted when nothing else was found
pub const PLACEHOLDER: &str = "Version bump";

/// Build the changelog entry for `version`
///
/// `commits` are newest first, as read from history; sub-bullets keep that order.
pub fn generate(
  version: &ReleaseVersion,
  date: NaiveDate,
  work_items: &[WorkItem],
  commits: &[CommitRecord],
  max_commits_per_item: usize,
) -> ChangelogEntry {
  let mut sections = Vec::new();

  for (label, category) in Category::LABELED {
    // Keyed by number: de-duplicated and ascending
    let matched: BTreeMap<u64, &WorkItem> = work_items
      .iter()
      .filter(|item| item.has_label(label))
      .map(|item| (item.number, item))
      .collect();

    if matched.is_empty() {
      continue;
    }

    let bullets = matched
      .values()
      .map(|item| Bullet {
        text: format!("**{}** (#{})", item.title.trim(), item.number),
        children: related_commits(item.number, commits, max_commits_per_item),
      })
      .collect();
    sections.push(Section { category, bullets });
  }

  let orphans: Vec<Bullet> = commits
    .iter()
    .filter(|c| !c.is_merge() && !is_release_chore(&c.subject) && !has_references(&c.message()))
    .map(|c| Bullet::new(c.subject.trim()))
    .filter(|b| !b.text.is_empty())
    .collect();

  if !orphans.is_empty() {
    sections.push(Section {
      category: Category::Changed,
      bullets: orphans,
    });
  }

  if sections.is_empty() {
    sections.push(Section {
      category: Category::Changed,
      bullets: vec![Bullet::new(PLACEHOLDER)],
    });
  }

  tracing::debug!(
    version = %version,
    sections = sections.len(),
    work_items = work_items.len(),
    commits = commits.len(),
    "generated hybrid changelog"
  );

  ChangelogEntry {
    version: *version,
    date,
    sections,
  }
}

/// Subjects of the first `limit` non-merge commits referencing `number`, reference removed
fn related_commits(number: u64, commits: &[CommitRecord], limit: usize) -> Vec<String> {
  commits
    .iter()
    .filter(|c| !c.is_merge() && mentions(&c.message(), number))
    .take(limit)
    .map(|c| strip_reference(&c.subject, number))
    .filter(|subject| !subject.is_empty())
    .collect()
}
