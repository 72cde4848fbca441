use super::{discover, truncate};
use anyhow::Result;
use colored::Colorize;
use steamsweep::{InventoryItem, SteamConfig, format_size, playtime::format_playtime};

const NAME_WIDTH: usize = 50;

pub fn list(config: &SteamConfig, filter: Option<&str>, json: bool) -> Result<()> {
    let discovery = discover(config)?;
    let library_count = discovery.libraries.paths.len();
    let catalog = discovery.catalog;

    let needle = filter.map(str::to_lowercase);
    let items: Vec<&InventoryItem> = catalog
        .items
        .iter()
        .filter(|item| match &needle {
            Some(needle) => item.name.to_lowercase().contains(needle.as_str()),
            None => true,
        })
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&items)?);
        return Ok(());
    }

    if items.is_empty() {
        println!("No installed games found.");
    } else {
        let name_width = items
            .iter()
            .map(|item| item.name.chars().count())
            .max()
            .unwrap_or(0)
            .min(NAME_WIDTH);

        for item in &items {
            let kind = if item.uses_compat_layer {
                "Proton".yellow()
            } else {
                "Native".green()
            };
            let marker = if item.has_warnings() {
                format!(" {}", "⚠".yellow())
            } else {
                String::new()
            };

            println!(
                "  {:<width$}  {:>10}  {:>6}  {:>7}  {}{}",
                truncate(&item.name, name_width),
                format_size(item.size_on_disk),
                kind,
                format_playtime(item.playtime_minutes).dimmed(),
                item.appid.dimmed(),
                marker,
                width = name_width,
            );
            for warning in &item.warnings {
                println!("    {} {}", "└".dimmed(), warning.describe().yellow());
            }
        }

        let total: u64 = items.iter().map(|item| item.size_on_disk).sum();
        println!(
            "\n{} {} games in {} libraries, {}",
            "✓".green(),
            items.len().to_string().bold(),
            library_count,
            format_size(total).bold()
        );
    }

    if !catalog.diagnostics.is_empty() {
        println!(
            "{} {} manifests could not be read (run with {} for details)",
            "⚠".yellow(),
            catalog.diagnostics.len(),
            "--verbose".dimmed()
        );
    }

    Ok(())
}
