use std::path::Path;

use anyhow::Result;
use owo_colors::OwoColorize;
use scheduler_core::SchedulerConfig;

pub fn show(path: &Path) -> Result<()> {
    let config = SchedulerConfig::load_from(path)?;

    println!("{}", "Paths".bold());
    let note = if path.exists() { "" } else { " (not created, using defaults)" };
    println!("  Config:  {}{}", path.display(), note.dimmed());
    println!();
    println!("{}", toml::to_string_pretty(&config)?);

    Ok(())
}

pub fn init(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "Config already exists at {}\n\nUse --force to overwrite it.",
            path.display()
        );
    }

    SchedulerConfig::create_default_config(path)?;
    println!("{} {}", "Created".green(), path.display());

    Ok(())
}
