//! Ordered strategy execution.
//!
//! Search order for a request:
//! 1. Take the path type's default chain
//! 2. Drop strategies incompatible with the installation type
//! 3. Stable-sort by effective priority tier (highest first); equal tiers
//!    keep chain order
//! 4. Run strategies in that order until one yields an accepted candidate
//!
//! A failing strategy is recorded as a warning and skipped.

use std::path::{Component, Path, PathBuf};

use tracing::{debug, warn};

use super::{Candidate, Strategy, StrategyInput};
use crate::domain::{ArtifactKind, InstallationType, PathResolutionRequest, PathType};

/// Result of running the strategy chain for one request.
#[derive(Debug, Clone, Default)]
pub struct DispatchOutcome {
    /// Winning strategy and its best accepted candidate.
    pub winner: Option<(Strategy, Candidate)>,
    /// Ranked best-first, deduplicated, winner excluded.
    pub alternatives: Vec<PathBuf>,
    /// Every candidate evaluated, in evaluation order.
    pub candidate_paths: Vec<PathBuf>,
    /// Strategies that ran, in execution order.
    pub strategies_attempted: Vec<Strategy>,
    /// "strategy X failed: reason" entries and other advisories.
    pub warnings: Vec<String>,
    /// True when at least one strategy ran and every one of them failed.
    pub all_failed: bool,
}

/// A candidate remembered for alternative ranking.
struct Evaluated {
    candidate: Candidate,
    order: usize,
}

/// Runs pruned, tier-ordered fallback chains.
#[derive(Debug, Clone, Copy)]
pub struct StrategyDispatcher {
    max_alternatives: usize,
    scan_limit: usize,
}

impl StrategyDispatcher {
    pub const fn new(max_alternatives: usize, scan_limit: usize) -> Self {
        Self {
            max_alternatives,
            scan_limit,
        }
    }

    /// Effective execution order for a path type on an installation type.
    pub fn plan(path_type: PathType, installation_type: InstallationType) -> Vec<Strategy> {
        let mut chain: Vec<Strategy> = path_type
            .default_chain()
            .iter()
            .copied()
            .filter(|s| s.is_compatible_with(installation_type))
            .collect();
        // `sort_by` is stable, so equal tiers keep chain order.
        chain.sort_by(|a, b| {
            b.effective_tier(installation_type)
                .cmp(&a.effective_tier(installation_type))
        });
        chain
    }

    pub fn dispatch(&self, request: &PathResolutionRequest) -> DispatchOutcome {
        let path_type = request.path_type();
        let installation_type = request.installation_type();
        let configuration = request.path_configuration();
        let input = StrategyInput {
            installation_path: request.installation_path(),
            path_type,
            extension: request.extension_identifier(),
            configuration,
            scan_limit: self.scan_limit,
        };

        let plan = Self::plan(path_type, installation_type);
        let mut outcome = DispatchOutcome::default();

        if plan.is_empty() {
            outcome.warnings.push(format!(
                "no strategy applicable to {path_type} on {installation_type}"
            ));
            return outcome;
        }

        let mut evaluated: Vec<Evaluated> = Vec::new();
        let mut failures = 0usize;

        for strategy in &plan {
            let strategy = *strategy;
            outcome.strategies_attempted.push(strategy);

            let candidates = match strategy.candidates(&input) {
                Ok(candidates) => candidates,
                Err(e) => {
                    warn!(%strategy, error = %e, "strategy failed");
                    outcome.warnings.push(format!("strategy {strategy} failed: {e}"));
                    failures += 1;
                    continue;
                }
            };
            debug!(%strategy, count = candidates.len(), "strategy produced candidates");

            let mut best: Option<Candidate> = None;
            for candidate in candidates {
                let accepted = if configuration.validate_exists {
                    exists_as(&candidate.path, path_type.artifact_kind())
                } else {
                    is_syntactically_valid(&candidate.path)
                };
                if accepted && best.as_ref().is_none_or(|b| candidate.confidence > b.confidence) {
                    best = Some(candidate.clone());
                }
                outcome.candidate_paths.push(candidate.path.clone());
                evaluated.push(Evaluated {
                    candidate,
                    order: evaluated.len(),
                });
            }

            if let Some(winner) = best {
                debug!(%strategy, path = %winner.path.display(), "strategy won");
                outcome.winner = Some((strategy, winner));
                break;
            }
        }

        outcome.all_failed = outcome.winner.is_none() && failures == plan.len();
        let winner_path = outcome.winner.as_ref().map(|(_, c)| c.path.as_path());
        outcome.alternatives = rank_alternatives(evaluated, winner_path, self.max_alternatives);
        outcome
    }
}

/// Confidence first, then evaluation order; first occurrence of a path wins.
fn rank_alternatives(
    mut evaluated: Vec<Evaluated>,
    winner: Option<&Path>,
    limit: usize,
) -> Vec<PathBuf> {
    evaluated.sort_by(|a, b| {
        b.candidate
            .confidence
            .cmp(&a.candidate.confidence)
            .then(a.order.cmp(&b.order))
    });

    let mut ranked: Vec<PathBuf> = Vec::new();
    for item in evaluated {
        if ranked.len() >= limit {
            break;
        }
        let path = item.candidate.path;
        if Some(path.as_path()) == winner || ranked.contains(&path) {
            continue;
        }
        ranked.push(path);
    }
    ranked
}

fn exists_as(path: &Path, kind: ArtifactKind) -> bool {
    match kind {
        ArtifactKind::Directory => path.is_dir(),
        ArtifactKind::File => path.is_file(),
    }
}

fn is_syntactically_valid(path: &Path) -> bool {
    path.is_absolute()
        && path.file_name().is_some()
        && !path.components().any(|c| c == Component::ParentDir)
}
