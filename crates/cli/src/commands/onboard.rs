//! `rallycoach onboard`: first-time setup.

use std::path::Path;

use rallycoach_config::AppConfig;

pub async fn run(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let config_path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(AppConfig::config_path);

    println!("🎾 RallyCoach: First-Time Setup");
    println!("===============================\n");

    if let Some(config_dir) = config_path.parent() {
        if !config_dir.exists() {
            std::fs::create_dir_all(config_dir)?;
            println!("✅ Created config directory: {}", config_dir.display());
        } else {
            println!("  Config directory exists: {}", config_dir.display());
        }
    }

    if config_path.exists() {
        println!("\n⚠️  Config already exists at: {}", config_path.display());
        println!("   Edit it manually or delete and re-run onboard.\n");
        return Ok(());
    }

    std::fs::write(&config_path, AppConfig::default_toml())?;
    println!("✅ Created config.toml at: {}", config_path.display());

    let index_path = AppConfig::default().index.path;
    if let Some(index_dir) = index_path.parent() {
        std::fs::create_dir_all(index_dir)?;
        println!("✅ Created index directory: {}", index_dir.display());
    }

    println!("\n📝 Next steps:");
    println!("   1. Set TOGETHER_API_KEY (or add api_key to {})", config_path.display());
    println!("   2. Run: rallycoach ingest <book.txt>");
    println!("   3. Run: rallycoach chat\n");

    Ok(())
}
