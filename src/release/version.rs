//! Version engine: format, ordering and increment rules for `X.Y.Z` release versions
//!
//! Grammar (whole input, nothing else allowed):
//!
//! ```text
//! version = digits "." digits "." digits
//! digits  = 1*("0".."9")        ; must fit in u64
//! ```
//!
//! A new version is legal only when it is exactly one of the three canonical bumps of
//! the current version: `(major+1).0.0`, `major.(minor+1).0` or `major.minor.(patch+1)`.
//! Everything here is pure; callers decide whether a validation failure aborts.

use crate::core::error::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use winnow::ascii::digit1;
use winnow::prelude::*;

/// Release version triplet, ordered lexically by (major, minor, patch)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ReleaseVersion {
  pub major: u64,
  pub minor: u64,
  pub patch: u64,
}

impl ReleaseVersion {
  pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
    Self { major, minor, patch }
  }

  /// Parse a strict `X.Y.Z` string
  pub fn parse(input: &str) -> Result<Self, ValidationError> {
    triplet.parse(input).map_err(|_| ValidationError::InvalidVersionFormat {
      input: input.to_string(),
    })
  }

  /// The three legal successors of this version, in major/minor/patch order
  pub fn legal_next(&self) -> [(VersionBump, ReleaseVersion); 3] {
    [
      (VersionBump::Major, VersionBump::Major.apply(self)),
      (VersionBump::Minor, VersionBump::Minor.apply(self)),
      (VersionBump::Patch, VersionBump::Patch.apply(self)),
    ]
  }
}

impl fmt::Display for ReleaseVersion {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
  }
}

impl FromStr for ReleaseVersion {
  type Err = ValidationError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Self::parse(s)
  }
}

fn segment(input: &mut &str) -> winnow::Result<u64> {
  digit1.parse_to().parse_next(input)
}

fn triplet(input: &mut &str) -> winnow::Result<ReleaseVersion> {
  (segment, '.', segment, '.', segment)
    .map(|(major, _, minor, _, patch)| ReleaseVersion { major, minor, patch })
    .parse_next(input)
}

/// Canonical increment shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VersionBump {
  /// Major version bump (breaking changes)
  Major,
  /// Minor version bump (new features)
  Minor,
  /// Patch version bump (bug fixes)
  Patch,
}

impl VersionBump {
  /// Apply bump to a version
  pub fn apply(&self, version: &ReleaseVersion) -> ReleaseVersion {
    match self {
      VersionBump::Major => ReleaseVersion::new(version.major + 1, 0, 0),
      VersionBump::Minor => ReleaseVersion::new(version.major, version.minor + 1, 0),
      VersionBump::Patch => ReleaseVersion::new(version.major, version.minor, version.patch + 1),
    }
  }

  pub fn name(&self) -> &'static str {
    match self {
      VersionBump::Major => "major",
      VersionBump::Minor => "minor",
      VersionBump::Patch => "patch",
    }
  }
}

/// Outcome of [`compare`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
  Greater,
  NotGreater,
}

/// True iff `s` is exactly three non-negative integers separated by two dots
pub fn validate_format(s: &str) -> bool {
  triplet.parse(s).is_ok()
}

/// Triplet lexical comparison; equal versions are `NotGreater`
pub fn compare(a: &ReleaseVersion, b: &ReleaseVersion) -> Comparison {
  if a > b {
    Comparison::Greater
  } else {
    Comparison::NotGreater
  }
}

/// Version segment named in increment errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
  Major,
  Minor,
  Patch,
}

impl fmt::Display for Segment {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      Segment::Major => "major",
      Segment::Minor => "minor",
      Segment::Patch => "patch",
    };
    write!(f, "{}", name)
  }
}

/// Rejected version increment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncrementError {
  pub current: ReleaseVersion,
  pub requested: ReleaseVersion,
  pub segment: Segment,
  pub reason: &'static str,
  /// Legal next versions, e.g. `2.0.0 (major)`
  pub options: Vec<String>,
}

impl fmt::Display for IncrementError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "Invalid version increment {} -> {}: {} (segment: {}). Legal next versions: {}",
      self.current,
      self.requested,
      self.reason,
      self.segment,
      self.options.join(", ")
    )
  }
}

/// Accept exactly one of the three canonical bumps of `current`
pub fn validate_increment(new: &ReleaseVersion, current: &ReleaseVersion) -> Result<(), IncrementError> {
  if current.legal_next().iter().any(|(_, next)| next == new) {
    return Ok(());
  }

  let (segment, reason) = if new.major > current.major {
    if new.minor != 0 || new.patch != 0 {
      (Segment::Major, "major bump must reset minor and patch to 0")
    } else {
      (Segment::Major, "major bump must increase major by exactly 1")
    }
  } else if new.major < current.major {
    (Segment::Major, "major version cannot decrease")
  } else if new.minor > current.minor {
    if new.patch != 0 {
      (Segment::Minor, "minor bump must reset patch to 0")
    } else {
      (Segment::Minor, "minor bump must increase minor by exactly 1")
    }
  } else if new.minor < current.minor {
    (Segment::Minor, "minor version cannot decrease within the same major")
  } else if new.patch > current.patch {
    (Segment::Patch, "patch bump must increase patch by exactly 1")
  } else {
    (Segment::Patch, "version must be greater than the current version")
  };

  Err(IncrementError {
    current: *current,
    requested: *new,
    segment,
    reason,
    options: current
      .legal_next()
      .iter()
      .map(|(bump, next)| format!("{} ({})", next, bump.name()))
      .collect(),
  })
}
