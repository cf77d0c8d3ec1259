//! The `keyscore init` command.

use std::path::Path;

use anyhow::{Context as _, Result};

use keyscore_fetch::config::SAMPLE_CONFIG;

pub fn execute() -> Result<()> {
    let path = Path::new("keyscore.toml");
    if path.exists() {
        println!("keyscore.toml already exists, skipping.");
        return Ok(());
    }
    std::fs::write(path, SAMPLE_CONFIG).context("failed to write keyscore.toml")?;
    println!("Created keyscore.toml");

    println!("\nNext steps:");
    println!("  1. Edit keyscore.toml to choose where results are stored");
    println!("  2. Run: keyscore submit --url demo --category General --gender Female --state Delhi --language English");
    println!("  3. Run: keyscore stats");

    Ok(())
}
