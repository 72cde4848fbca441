//! Removing games the way the Steam client does
//!
//! The client treats `appmanifest_<appid>.acf` as the only signal that a game is
//! installed. Every game is therefore removed in a fixed order:
//!
//! 1. `steamapps/shadercache/<appid>`
//! 2. `steamapps/compatdata/<appid>`
//! 3. `steamapps/common/<installdir>`
//! 4. `steamapps/appmanifest_<appid>.acf`
//!
//! The manifest goes last and only when steps 1-3 each removed their path or
//! found nothing there. An interrupted or failed run leaves the manifest in
//! place, so the client still sees the game and can repair or uninstall it.
//!
//! Distinct games share no paths and may be removed concurrently; the steps of
//! one game always run in order on one worker.

use crate::catalog::{AuxiliaryKind, InventoryItem};
use crate::error::{PathErrorKind, Result, SweepError};
use crate::process::ProcessProbe;
use crate::size::{reclaimable_size, size_of};
use anyhow::anyhow;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};

/// Appids chosen for removal
pub type SelectionSet = HashSet<String>;

/// One step of a game's removal, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    ShaderCache,
    CompatData,
    Content,
    Manifest,
}

impl Step {
    pub const ORDER: [Step; 4] = [Step::ShaderCache, Step::CompatData, Step::Content, Step::Manifest];

    pub fn label(self) -> &'static str {
        match self {
            Step::ShaderCache => AuxiliaryKind::ShaderCache.label(),
            Step::CompatData => AuxiliaryKind::CompatData.label(),
            Step::Content => "game files",
            Step::Manifest => "manifest",
        }
    }

    fn path(self, item: &InventoryItem) -> PathBuf {
        match self {
            Step::ShaderCache => item.auxiliary_path(AuxiliaryKind::ShaderCache),
            Step::CompatData => item.auxiliary_path(AuxiliaryKind::CompatData),
            Step::Content => item.content_path.clone(),
            Step::Manifest => item.manifest_path.clone(),
        }
    }
}

/// What happened to one path
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum PathAction {
    /// Deleted; `bytes` measured just before deletion
    Removed { bytes: u64 },
    SkippedAbsent,
    /// Manifest left in place because an earlier step failed
    Retained,
    Failed { kind: PathErrorKind, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathOutcome {
    pub step: Step,
    pub path: PathBuf,
    pub action: PathAction,
}

impl PathOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self.action, PathAction::Failed { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UninstallStatus {
    /// Every path that existed was removed
    Complete,
    /// Some existing paths were removed, others were not
    Partial,
    /// Nothing that existed was removed
    Failed,
}

/// Outcome for one game
#[derive(Debug, Clone, Serialize)]
pub struct UninstallResult {
    pub appid: String,
    pub name: String,
    pub library: PathBuf,
    /// One entry per step, in execution order
    pub outcomes: Vec<PathOutcome>,
}

impl UninstallResult {
    pub fn status(&self) -> UninstallStatus {
        let existing = self
            .outcomes
            .iter()
            .filter(|o| o.action != PathAction::SkippedAbsent)
            .count();
        let removed = self
            .outcomes
            .iter()
            .filter(|o| matches!(o.action, PathAction::Removed { .. }))
            .count();

        if removed == existing {
            UninstallStatus::Complete
        } else if removed > 0 {
            UninstallStatus::Partial
        } else {
            UninstallStatus::Failed
        }
    }

    pub fn bytes_freed(&self) -> u64 {
        self.outcomes
            .iter()
            .map(|o| match o.action {
                PathAction::Removed { bytes } => bytes,
                _ => 0,
            })
            .sum()
    }

    pub fn failures(&self) -> impl Iterator<Item = &PathOutcome> {
        self.outcomes.iter().filter(|o| o.is_failure())
    }
}

/// Totals over a batch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UninstallSummary {
    pub total: usize,
    pub complete: usize,
    pub partial: usize,
    pub failed: usize,
    pub bytes_freed: u64,
}

impl UninstallSummary {
    pub fn from_results(results: &[UninstallResult]) -> Self {
        let mut summary = Self {
            total: results.len(),
            ..Default::default()
        };
        for result in results {
            match result.status() {
                UninstallStatus::Complete => summary.complete += 1,
                UninstallStatus::Partial => summary.partial += 1,
                UninstallStatus::Failed => summary.failed += 1,
            }
            summary.bytes_freed += result.bytes_freed();
        }
        summary
    }

    pub fn all_complete(&self) -> bool {
        self.complete == self.total
    }
}

/// Progress notifications, emitted as work completes
#[derive(Debug, Clone, Copy)]
pub enum UninstallEvent<'a> {
    ItemStarted { item: &'a InventoryItem },
    PathFinished { appid: &'a str, outcome: &'a PathOutcome },
    ItemFinished { result: &'a UninstallResult },
}

/// Shared flag to stop a batch between games
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct UninstallOptions {
    /// Games removed concurrently
    pub jobs: usize,
    /// Proceed even if Steam is running
    pub force: bool,
}

impl Default for UninstallOptions {
    fn default() -> Self {
        Self {
            jobs: 4,
            force: false,
        }
    }
}

/// A step as it would run right now
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedPath {
    pub step: Step,
    pub path: PathBuf,
    pub exists: bool,
    pub size: u64,
}

/// The four removal steps for a game, without touching anything
pub fn removal_plan(item: &InventoryItem) -> Vec<PlannedPath> {
    Step::ORDER
        .iter()
        .map(|&step| {
            let path = step.path(item);
            let exists = path.symlink_metadata().is_ok();
            let size = reclaimable_size(&path);
            PlannedPath {
                step,
                path,
                exists,
                size,
            }
        })
        .collect()
}

/// Batch uninstaller
pub struct Uninstaller<P> {
    probe: P,
    options: UninstallOptions,
}

impl<P: ProcessProbe> Uninstaller<P> {
    pub fn new(probe: P, options: UninstallOptions) -> Self {
        Self { probe, options }
    }

    /// Remove every inventory item whose appid is selected.
    ///
    /// Returns one result per removed item. Fails before touching anything if
    /// the selection names an unknown appid, or if Steam is running and
    /// `force` is off. After `cancel` fires, games already in progress finish
    /// all their steps and unstarted games are left alone.
    pub fn run<F>(
        &self,
        selection: &SelectionSet,
        inventory: &[InventoryItem],
        cancel: &CancelToken,
        on_event: F,
    ) -> Result<Vec<UninstallResult>>
    where
        F: Fn(UninstallEvent<'_>) + Sync,
    {
        let known: HashSet<&str> = inventory.iter().map(|item| item.appid.as_str()).collect();
        let unknown: BTreeSet<&str> = selection
            .iter()
            .map(String::as_str)
            .filter(|id| !known.contains(id))
            .collect();
        if !unknown.is_empty() {
            return Err(SweepError::UnknownItem(
                unknown.into_iter().collect::<Vec<_>>().join(", "),
            ));
        }

        if self.probe.is_running() {
            if !self.options.force {
                return Err(SweepError::Precondition("Steam is running".to_string()));
            }
            warn!("Steam is running, continuing because force was requested");
        }

        let targets: Vec<&InventoryItem> = inventory
            .iter()
            .filter(|item| selection.contains(&item.appid))
            .collect();

        let jobs = self.options.jobs.max(1);
        debug!("Uninstalling {} items with {} workers", targets.len(), jobs);

        let work = |item: &InventoryItem| {
            if cancel.is_cancelled() {
                debug!("Cancelled before {} ({})", item.name, item.appid);
                return None;
            }
            Some(uninstall_item(item, &on_event))
        };

        if jobs == 1 || targets.len() <= 1 {
            let mut results = Vec::with_capacity(targets.len());
            for item in targets {
                match work(item) {
                    Some(result) => results.push(result),
                    None => break,
                }
            }
            return Ok(results);
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build()
            .map_err(|e| anyhow!("Failed to start worker pool: {}", e))?;

        // One slot per target, filled once by the worker that owns it
        let slots: Vec<Option<UninstallResult>> =
            pool.install(|| targets.par_iter().map(|item| work(*item)).collect());

        Ok(slots.into_iter().flatten().collect())
    }
}

/// Run all four steps for one game, strictly in order
fn uninstall_item<F>(item: &InventoryItem, on_event: &F) -> UninstallResult
where
    F: Fn(UninstallEvent<'_>) + Sync,
{
    on_event(UninstallEvent::ItemStarted { item });

    let mut outcomes = Vec::with_capacity(Step::ORDER.len());
    let mut blocked = false;

    for step in Step::ORDER {
        let path = step.path(item);
        let outcome = if step == Step::Manifest && blocked {
            warn!(
                "Keeping manifest for {} ({}) because earlier removals failed",
                item.name, item.appid
            );
            PathOutcome {
                step,
                path,
                action: PathAction::Retained,
            }
        } else {
            remove_path(step, path)
        };

        blocked |= outcome.is_failure();
        on_event(UninstallEvent::PathFinished {
            appid: &item.appid,
            outcome: &outcome,
        });
        outcomes.push(outcome);
    }

    let result = UninstallResult {
        appid: item.appid.clone(),
        name: item.name.clone(),
        library: item.library.clone(),
        outcomes,
    };
    on_event(UninstallEvent::ItemFinished { result: &result });
    result
}

fn remove_path(step: Step, path: PathBuf) -> PathOutcome {
    let action = match fs::symlink_metadata(&path) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => PathAction::SkippedAbsent,
        Err(e) => failed(&path, e),
        Ok(metadata) => {
            let (bytes, removal) = if metadata.is_dir() {
                (size_of(&path), fs::remove_dir_all(&path))
            } else {
                // Files and symlinks; a symlink is removed, never followed
                let bytes = if metadata.is_file() { metadata.len() } else { 0 };
                (bytes, fs::remove_file(&path))
            };

            match removal {
                Ok(()) => {
                    info!("Removed {}: {}", step.label(), path.display());
                    PathAction::Removed { bytes }
                }
                Err(_) if !exists(&path) => PathAction::Removed { bytes },
                Err(e) => failed(&path, e),
            }
        }
    };

    PathOutcome { step, path, action }
}

fn exists(path: &Path) -> bool {
    path.symlink_metadata().is_ok()
}

fn failed(path: &Path, err: io::Error) -> PathAction {
    let kind = PathErrorKind::classify(&err);
    warn!("Failed to remove {}: {}", path.display(), err);
    PathAction::Failed {
        kind,
        message: err.to_string(),
    }
}
