//! Fixed-shape layout rules.
//!
//! Each rule maps a path type to relative locations with a base confidence.
//! Nothing here checks existence except the vendor namespace listing needed
//! to expand `vendor/*/<key>`.

use std::io;
use std::path::{Path, PathBuf};

use super::{Candidate, StrategyInput, safe_segment};
use crate::domain::PathType;
use crate::error::StrategyError;

/// Shape of a Composer-managed installation.
pub(super) struct ComposerLayout {
    pub web_roots: &'static [&'static str],
    pub vendor_roots: &'static [&'static str],
    /// Subtracted from every base confidence.
    pub penalty: u8,
    pub label: &'static str,
}

pub(super) const STANDARD_COMPOSER: ComposerLayout = ComposerLayout {
    web_roots: &["public"],
    vendor_roots: &["vendor"],
    penalty: 0,
    label: "composer",
};

pub(super) const CUSTOM_COMPOSER: ComposerLayout = ComposerLayout {
    web_roots: &["web", "htdocs", "www", "html"],
    vendor_roots: &["vendor", "app/vendor", "lib/vendor"],
    penalty: 10,
    label: "custom composer",
};

/// Container mount points probed below the installation root.
const CONTAINER_MOUNTS: &[&str] = &["app", "var/www/html", "src"];

const CONTAINER_PENALTY: u8 = 15;

pub(super) fn composer(
    root: &Path,
    input: &StrategyInput<'_>,
    layout: &ComposerLayout,
) -> Result<Vec<Candidate>, StrategyError> {
    let mut out = Vec::new();
    let score = |base: u8| base.saturating_sub(layout.penalty);
    let label = layout.label;

    match input.path_type {
        PathType::Extension => {
            let Some(extension) = input.extension else {
                return Ok(out);
            };
            let key = safe_segment(&extension.key)?;
            let package = extension.package_name();

            for vendor in layout.vendor_roots {
                let vendor_dir = root.join(vendor);
                for namespace in list_subdirs(&vendor_dir)? {
                    out.push(Candidate::new(
                        namespace.join(key),
                        score(90),
                        format!("{label} package in {vendor}"),
                    ));
                    if package != key {
                        out.push(Candidate::new(
                            namespace.join(&package),
                            score(85),
                            format!("{label} package name in {vendor}"),
                        ));
                    }
                }
            }
            for web in layout.web_roots {
                out.push(Candidate::new(
                    root.join(web).join("typo3conf/ext").join(key),
                    score(60),
                    format!("{label} symlinked extension under {web}"),
                ));
            }
        }
        PathType::ExtensionDir => {
            for web in layout.web_roots {
                out.push(Candidate::new(
                    root.join(web).join("typo3conf/ext"),
                    score(80),
                    format!("{label} extension directory under {web}"),
                ));
            }
            for vendor in layout.vendor_roots {
                out.push(Candidate::new(
                    root.join(vendor),
                    score(50),
                    format!("{label} vendor directory holds extensions"),
                ));
            }
        }
        PathType::SystemExtensionDir => {
            for vendor in layout.vendor_roots {
                out.push(Candidate::new(
                    root.join(vendor).join("typo3"),
                    score(85),
                    format!("{label} core packages in {vendor}/typo3"),
                ));
            }
            for web in layout.web_roots {
                out.push(Candidate::new(
                    root.join(web).join("typo3/sysext"),
                    score(60),
                    format!("{label} sysext under {web}"),
                ));
            }
        }
        PathType::VendorDir => {
            for vendor in layout.vendor_roots {
                out.push(Candidate::new(
                    root.join(vendor),
                    score(95),
                    format!("{label} vendor directory"),
                ));
            }
        }
        PathType::ConfigFile => {
            out.push(Candidate::new(
                root.join("config/system/settings.php"),
                score(95),
                format!("{label} system settings"),
            ));
            for web in layout.web_roots {
                let typo3conf = root.join(web).join("typo3conf");
                out.push(Candidate::new(
                    typo3conf.join("LocalConfiguration.php"),
                    score(80),
                    format!("{label} LocalConfiguration under {web}"),
                ));
                out.push(Candidate::new(
                    typo3conf.join("system/settings.php"),
                    score(75),
                    format!("{label} typo3conf settings under {web}"),
                ));
            }
        }
        PathType::WebDir => {
            for web in layout.web_roots {
                out.push(Candidate::new(
                    root.join(web),
                    score(95),
                    format!("{label} web root"),
                ));
            }
        }
    }

    Ok(out)
}

pub(super) fn legacy(
    root: &Path,
    input: &StrategyInput<'_>,
    penalty: u8,
) -> Result<Vec<Candidate>, StrategyError> {
    let score = |base: u8| base.saturating_sub(penalty);

    let out = match input.path_type {
        PathType::Extension => {
            let Some(extension) = input.extension else {
                return Ok(Vec::new());
            };
            let key = safe_segment(&extension.key)?;
            vec![
                Candidate::new(
                    root.join("typo3conf/ext").join(key),
                    score(90),
                    "legacy local extension",
                ),
                Candidate::new(
                    root.join("typo3/ext").join(key),
                    score(50),
                    "legacy global extension",
                ),
                Candidate::new(
                    root.join("typo3/sysext").join(key),
                    score(40),
                    "legacy system extension",
                ),
            ]
        }
        PathType::ExtensionDir => vec![Candidate::new(
            root.join("typo3conf/ext"),
            score(95),
            "legacy typo3conf/ext",
        )],
        PathType::SystemExtensionDir => vec![
            Candidate::new(root.join("typo3/sysext"), score(95), "legacy typo3/sysext"),
            Candidate::new(
                root.join("typo3_src/typo3/sysext"),
                score(80),
                "legacy source symlink sysext",
            ),
        ],
        PathType::ConfigFile => vec![
            Candidate::new(
                root.join("typo3conf/LocalConfiguration.php"),
                score(90),
                "legacy LocalConfiguration",
            ),
            Candidate::new(
                root.join("typo3conf/system/settings.php"),
                score(85),
                "legacy typo3conf settings",
            ),
        ],
        PathType::WebDir => vec![Candidate::new(
            root.to_path_buf(),
            score(80),
            "legacy installation root is the web root",
        )],
        // Legacy trees have no Composer vendor directory.
        PathType::VendorDir => Vec::new(),
    };

    Ok(out)
}

/// Composer and legacy rules re-rooted under each existing container mount.
pub(super) fn container(input: &StrategyInput<'_>) -> Result<Vec<Candidate>, StrategyError> {
    let mut out = Vec::new();

    for mount in CONTAINER_MOUNTS {
        let root = input.installation_path.join(mount);
        if !root.is_dir() {
            continue;
        }
        let relabel = |mut c: Candidate| {
            c.rationale = format!("{} (container mount {mount})", c.rationale);
            c
        };
        let standard = ComposerLayout {
            penalty: CONTAINER_PENALTY,
            ..STANDARD_COMPOSER
        };
        out.extend(composer(&root, input, &standard)?.into_iter().map(relabel));
        out.extend(
            legacy(&root, input, CONTAINER_PENALTY)?
                .into_iter()
                .map(relabel),
        );
    }

    Ok(out)
}

/// Sorted subdirectories of `dir`. A missing directory has none.
fn list_subdirs(dir: &Path) -> Result<Vec<PathBuf>, StrategyError> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => {
            return Err(StrategyError::Io {
                path: dir.to_path_buf(),
                reason: e.to_string(),
            });
        }
    };

    let mut dirs: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    dirs.sort();
    Ok(dirs)
}
