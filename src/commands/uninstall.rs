use super::discover;
use crate::progress::BatchProgress;
use anyhow::{Context, Result, bail};
use colored::Colorize;
use std::io::{self, BufRead, IsTerminal, Write};
use steamsweep::catalog::InventoryItem;
use steamsweep::uninstall::{PathAction, PathOutcome, removal_plan};
use steamsweep::{
    CancelToken, SelectionSet, SteamConfig, SteamProcessProbe, SweepError, UninstallEvent,
    UninstallOptions, UninstallStatus, UninstallSummary, Uninstaller, format_size,
};

/// Flags for `steamsweep uninstall`
#[derive(Debug, Clone, Copy)]
pub struct UninstallArgs {
    pub dry_run: bool,
    pub yes: bool,
    pub force: bool,
    pub jobs: usize,
}

pub fn uninstall(config: &SteamConfig, targets: &[String], args: UninstallArgs) -> Result<()> {
    let discovery = discover(config)?;
    let inventory = discovery.catalog.items;

    let selection = resolve_selection(&inventory, targets)?;
    let selected: Vec<&InventoryItem> = inventory
        .iter()
        .filter(|item| selection.contains(&item.appid))
        .collect();
    let total_size: u64 = selected.iter().map(|item| item.size_on_disk).sum();

    if args.dry_run {
        println!("Dry run - no files will be removed");
        for item in &selected {
            println!("  {} {}", item.name.cyan().bold(), item.appid.dimmed());
            for planned in removal_plan(item) {
                if planned.exists {
                    println!(
                        "    Would remove {}: {} ({})",
                        planned.step.label(),
                        planned.path.display(),
                        format_size(planned.size)
                    );
                }
            }
        }
        println!(
            "{} Would free {} across {} games",
            "✓".green(),
            format_size(total_size).bold(),
            selected.len().to_string().bold()
        );
        return Ok(());
    }

    if !args.yes && !confirm(selected.len(), total_size)? {
        println!("Aborted.");
        return Ok(());
    }

    println!(
        "Uninstalling {} games...",
        selected.len().to_string().bold()
    );

    let progress = BatchProgress::new(selected.len());
    let uninstaller = Uninstaller::new(
        SteamProcessProbe,
        UninstallOptions {
            jobs: args.jobs,
            force: args.force,
        },
    );

    let outcome = uninstaller.run(&selection, &inventory, &CancelToken::new(), |event| {
        match event {
            UninstallEvent::ItemStarted { item } => progress.item_started(&item.name),
            UninstallEvent::PathFinished { appid, outcome } => {
                if let Some(line) = describe_outcome(appid, outcome) {
                    progress.println(line);
                }
            }
            UninstallEvent::ItemFinished { result } => {
                let line = match result.status() {
                    UninstallStatus::Complete => format!(
                        "  {} {} ({})",
                        "✓".green(),
                        result.name.bold().green(),
                        format_size(result.bytes_freed())
                    ),
                    UninstallStatus::Partial => format!(
                        "  {} {} partially removed, run again to retry",
                        "⚠".yellow(),
                        result.name.bold()
                    ),
                    UninstallStatus::Failed => {
                        format!("  {} {} could not be removed", "✗".red(), result.name.bold())
                    }
                };
                progress.println(line);
                progress.item_finished();
            }
        }
    });

    let results = match outcome {
        Ok(results) => results,
        Err(SweepError::Precondition(reason)) => {
            progress.finish(false);
            bail!("{}. Close Steam or pass --force.", reason);
        }
        Err(e) => {
            progress.finish(false);
            return Err(e.into());
        }
    };

    let summary = UninstallSummary::from_results(&results);
    progress.finish(summary.all_complete());

    if summary.all_complete() {
        println!(
            "{} Uninstalled {} game{}, freed {}",
            "✓".green().bold(),
            summary.complete.to_string().bold(),
            if summary.complete == 1 { "" } else { "s" },
            format_size(summary.bytes_freed).bold()
        );
        Ok(())
    } else {
        println!(
            "{} {} complete, {} partial, {} failed, freed {}",
            "⚠".yellow(),
            summary.complete,
            summary.partial,
            summary.failed,
            format_size(summary.bytes_freed)
        );
        bail!("Some games were not fully removed")
    }
}

/// Map appids or exact names to a selection; unknown entries are an error
fn resolve_selection(inventory: &[InventoryItem], targets: &[String]) -> Result<SelectionSet> {
    let mut selection = SelectionSet::new();
    let mut unknown = Vec::new();

    for target in targets {
        let matches: Vec<&InventoryItem> = inventory
            .iter()
            .filter(|item| item.appid == *target || item.name.eq_ignore_ascii_case(target))
            .collect();

        if matches.is_empty() {
            unknown.push(target.as_str());
        }
        selection.extend(matches.into_iter().map(|item| item.appid.clone()));
    }

    if unknown.is_empty() {
        return Ok(selection);
    }

    for target in &unknown {
        println!("  {} {} is not installed", "⚠".yellow(), target.bold());
        let suggestions = suggest(inventory, target);
        if !suggestions.is_empty() {
            println!("    Did you mean: {}", suggestions.join(", ").cyan());
        }
    }
    bail!("No installed game matches: {}", unknown.join(", "))
}

/// Closest installed names by Jaro-Winkler similarity
fn suggest<'a>(inventory: &'a [InventoryItem], target: &str) -> Vec<&'a str> {
    let target = target.to_lowercase();
    let mut scored: Vec<(f64, &str)> = inventory
        .iter()
        .map(|item| {
            (
                strsim::jaro_winkler(&item.name.to_lowercase(), &target),
                item.name.as_str(),
            )
        })
        .filter(|(score, _)| *score >= 0.8)
        .collect();

    scored.sort_by(|a, b| b.0.total_cmp(&a.0));
    let mut names: Vec<&str> = scored.into_iter().map(|(_, name)| name).collect();
    names.dedup();
    names.truncate(3);
    names
}

fn describe_outcome(appid: &str, outcome: &PathOutcome) -> Option<String> {
    match &outcome.action {
        PathAction::Removed { bytes } => Some(format!(
            "    {} Removed {} {} ({})",
            "├".dimmed(),
            outcome.step.label(),
            appid.dimmed(),
            format_size(*bytes).dimmed()
        )),
        PathAction::SkippedAbsent => None,
        PathAction::Retained => Some(format!(
            "    {} Kept {} so Steam still sees {}",
            "├".dimmed(),
            outcome.step.label(),
            appid
        )),
        PathAction::Failed { kind, message } => Some(format!(
            "    {} Failed to remove {} ({}): {}",
            "├".red(),
            outcome.path.display(),
            kind,
            message
        )),
    }
}

fn confirm(count: usize, total_size: u64) -> Result<bool> {
    let stdin = io::stdin();
    if !stdin.is_terminal() {
        bail!("Refusing to uninstall without confirmation; pass --yes");
    }

    print!(
        "Uninstall {} games and free {}? [y/N] ",
        count.to_string().bold(),
        format_size(total_size).bold()
    );
    io::stdout().flush()?;

    let mut answer = String::new();
    stdin
        .lock()
        .read_line(&mut answer)
        .context("Failed to read confirmation")?;

    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn item(appid: &str, name: &str) -> InventoryItem {
        InventoryItem {
            appid: appid.to_string(),
            name: name.to_string(),
            install_dir: name.to_lowercase(),
            library: PathBuf::from("/lib"),
            manifest_path: PathBuf::from(format!("/lib/steamapps/appmanifest_{appid}.acf")),
            content_path: PathBuf::from("/lib/steamapps/common").join(name),
            auxiliary: vec![],
            content_size: 0,
            size_on_disk: 0,
            declared_size: None,
            uses_compat_layer: false,
            playtime_minutes: 0,
            warnings: vec![],
        }
    }

    #[test]
    fn test_select_by_appid_and_name() {
        let inventory = vec![item("100", "Portal"), item("200", "Celeste")];
        let selection =
            resolve_selection(&inventory, &["100".to_string(), "celeste".to_string()]).unwrap();
        assert_eq!(selection.len(), 2);
        assert!(selection.contains("200"));
    }

    #[test]
    fn test_unknown_selection_rejected() {
        let inventory = vec![item("100", "Portal")];
        assert!(resolve_selection(&inventory, &["999".to_string()]).is_err());
    }

    #[test]
    fn test_suggestions() {
        let inventory = vec![item("1", "Portal 2"), item("2", "Hollow Knight")];
        assert_eq!(suggest(&inventory, "portal2"), vec!["Portal 2"]);
        assert!(suggest(&inventory, "zzzz").is_empty());
    }
}
