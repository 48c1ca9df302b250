//! Parsers for git plumbing output

use super::{CommitRecord, TrackingStatus};

/// `git log` format: fields split by US (0x1f), records terminated by RS (0x1e)
///
/// Fields: %H (hash) %P (parent hashes) %s (subject) %b (body)
pub(super) const LOG_FORMAT: &str = "%H%x1f%P%x1f%s%x1f%b%x1e";

/// Parse `git log --format=LOG_FORMAT` output
pub(super) fn parse_log_records(output: &str) -> Vec<CommitRecord> {
  output
    .split('\x1e')
    .filter_map(|record| {
      let record = record.trim_start_matches(['\n', '\r']);
      if record.trim().is_empty() {
        return None;
      }
      let mut fields = record.splitn(4, '\x1f');
      let sha = fields.next()?.trim().to_string();
      let parents = fields.next().unwrap_or("");
      let subject = fields.next().unwrap_or("").trim().to_string();
      let body = fields.next().unwrap_or("").trim().to_string();
      Some(CommitRecord {
        sha,
        subject,
        body,
        parent_count: parents.split_whitespace().count(),
      })
    })
    .collect()
}

/// Parse `git rev-list --left-right --count A...B` ("<ahead>\t<behind>")
pub(super) fn parse_left_right(output: &str) -> Option<TrackingStatus> {
  let mut counts = output.split_whitespace().map(|n| n.parse::<usize>());
  let ahead = counts.next()?.ok()?;
  let behind = counts.next()?.ok()?;
  Some(TrackingStatus { ahead, behind })
}

/// Paths from `git status --porcelain=v1`
///
/// Renames report the destination path.
pub(super) fn parse_porcelain(output: &str) -> Vec<String> {
  output
    .lines()
    .filter(|line| line.len() > 3)
    .map(|line| {
      let path = &line[3..];
      let path = path.rsplit_once(" -> ").map(|(_, to)| to).unwrap_or(path);
      path.trim_matches('"').to_string()
    })
    .collect()
}
