use anyhow::{Result, bail};
use colored::Colorize;
use steamsweep::SteamConfig;

pub fn libraries(config: &SteamConfig, json: bool) -> Result<()> {
    let libraries = steamsweep::resolve_libraries(config);

    if json {
        println!("{}", serde_json::to_string_pretty(&libraries)?);
        return Ok(());
    }

    if libraries.is_empty() {
        bail!("Could not find a Steam installation");
    }

    println!("{}", "Steam roots:".bold());
    for root in &libraries.roots {
        println!("  {}", root.display().to_string().cyan());
    }

    println!("{}", "Library folders:".bold());
    for path in &libraries.paths {
        println!("  {}", path.display());
    }

    Ok(())
}
