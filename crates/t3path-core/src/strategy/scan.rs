//! Caller-directed search and the bounded depth scan.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use regex::Regex;
use tracing::debug;
use walkdir::WalkDir;

use super::{Candidate, StrategyInput, safe_segment};
use crate::domain::{ArtifactKind, PathType};
use crate::error::StrategyError;

const SEARCH_DIRECTORY_CONFIDENCE: u8 = 70;

/// Names the requested artifact may carry.
fn target_names<'a>(input: &StrategyInput<'a>) -> Result<Vec<&'a str>, StrategyError> {
    match input.path_type {
        PathType::Extension => match input.extension {
            Some(extension) => Ok(vec![safe_segment(&extension.key)?]),
            None => Ok(Vec::new()),
        },
        other => Ok(other.target_names().to_vec()),
    }
}

pub(super) fn search_directories(
    input: &StrategyInput<'_>,
) -> Result<Vec<Candidate>, StrategyError> {
    let names = target_names(input)?;
    let mut out = Vec::new();

    for dir in &input.configuration.search_directories {
        let dir = dir.trim();
        if dir.is_empty() {
            continue;
        }
        let base = if Path::new(dir).is_absolute() {
            PathBuf::from(dir)
        } else {
            input.installation_path.join(dir)
        };
        for name in &names {
            out.push(Candidate::new(
                base.join(name),
                SEARCH_DIRECTORY_CONFIDENCE,
                format!("search directory {dir}"),
            ));
        }
    }

    Ok(out)
}

pub(super) fn depth_scan(input: &StrategyInput<'_>) -> Result<Vec<Candidate>, StrategyError> {
    let names = target_names(input)?;
    if names.is_empty() {
        return Ok(Vec::new());
    }
    let excludes = compile_excludes(&input.configuration.exclude_patterns)?;
    let kind = input.path_type.artifact_kind();
    let mut out = Vec::new();

    let walker = WalkDir::new(input.installation_path)
        .min_depth(1)
        .max_depth(input.configuration.max_depth.max(1))
        .follow_links(input.configuration.follow_symlinks)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| !is_excluded(&excludes, entry.file_name()));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() == 0 => {
                return Err(StrategyError::Io {
                    path: input.installation_path.to_path_buf(),
                    reason: e.to_string(),
                });
            }
            Err(e) => {
                debug!("depth scan skipped entry: {e}");
                continue;
            }
        };

        let Some(name) = entry.file_name().to_str() else {
            continue;
        };
        if !names.contains(&name) {
            continue;
        }
        let kind_matches = match kind {
            ArtifactKind::Directory => entry.file_type().is_dir(),
            ArtifactKind::File => entry.file_type().is_file(),
        };
        if !kind_matches {
            continue;
        }

        let depth = entry.depth();
        out.push(Candidate::new(
            entry.into_path(),
            depth_confidence(depth),
            format!("found by scan at depth {depth}"),
        ));
        if out.len() >= input.scan_limit {
            break;
        }
    }

    Ok(out)
}

/// Shallower matches are more likely to be the real thing.
fn depth_confidence(depth: usize) -> u8 {
    let penalty = depth.saturating_mul(5).min(35);
    u8::try_from(45 - penalty).unwrap_or(10).max(10)
}

/// Translate glob-style patterns (`*`, `?`) into anchored regexes.
fn compile_excludes(patterns: &[String]) -> Result<Vec<Regex>, StrategyError> {
    patterns
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .map(|pattern| {
            let mut source = String::from("^");
            for ch in pattern.chars() {
                match ch {
                    '*' => source.push_str(".*"),
                    '?' => source.push('.'),
                    other => source.push_str(&regex::escape(&other.to_string())),
                }
            }
            source.push('$');
            Regex::new(&source).map_err(|e| StrategyError::InvalidPattern {
                pattern: pattern.to_string(),
                reason: e.to_string(),
            })
        })
        .collect()
}

fn is_excluded(excludes: &[Regex], name: &OsStr) -> bool {
    let name = name.to_string_lossy();
    excludes.iter().any(|re| re.is_match(&name))
}
