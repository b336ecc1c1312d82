//! `rallycoach doctor`: diagnose configuration, provider and index health.

use std::path::Path;

use rallycoach_config::AppConfig;
use rallycoach_core::index::VectorIndex;
use rallycoach_core::provider::Provider;
use rallycoach_retrieval::PassageIndex;

pub async fn run(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    println!("🩺 RallyCoach Doctor: System Diagnostics");
    println!("========================================\n");

    let mut issues = 0;

    let path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(AppConfig::config_path);
    if path.exists() {
        println!("  ✅ Config file found: {}", path.display());
    } else {
        println!("  ⚠️  No config file, using defaults (run `rallycoach onboard`)");
    }

    let config = match AppConfig::load_with_env(&path) {
        Ok(config) => {
            println!("  ✅ Config valid");
            config
        }
        Err(e) => {
            println!("  ❌ Config invalid: {e}");
            println!("\n  ⚠️  1 issue(s) found. See above for details.");
            return Ok(());
        }
    };

    println!(
        "  ✅ Chat: {} / {}",
        config.default_provider, config.chat_model
    );
    println!(
        "  ✅ Embeddings: {} / {}",
        config.embedding_provider_name(),
        config.embedding_model
    );

    if config.has_api_key() {
        println!("  ✅ API key configured");
    } else {
        println!("  ⚠️  No API key: set TOGETHER_API_KEY or add api_key to config.toml");
        issues += 1;
    }

    let router = rallycoach_providers::build_from_config(&config);
    let mut roles = vec![("Chat", config.default_provider.as_str())];
    if config.embedding_provider_name() != config.default_provider {
        roles.push(("Embeddings", config.embedding_provider_name()));
    }
    for (role, name) in roles {
        match router.get(name) {
            Some(provider) => {
                if !check_provider(role, provider.as_ref()).await {
                    issues += 1;
                }
            }
            None => {
                println!("  ❌ {role} provider '{name}' is not configured");
                issues += 1;
            }
        }
    }

    if config.index.path.exists() {
        let index = PassageIndex::open(&config.index.path);
        let passages = index.count().await?;
        if passages > 0 {
            println!("  ✅ Passage index: {passages} passages");
        } else {
            println!("  ⚠️  Passage index is empty: run `rallycoach ingest <FILE>`");
            issues += 1;
        }
    } else {
        println!(
            "  ⚠️  No passage index at {}: run `rallycoach ingest <FILE>`",
            config.index.path.display()
        );
        issues += 1;
    }

    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}

/// Report whether `provider` answers; returns true when it does.
async fn check_provider(role: &str, provider: &dyn Provider) -> bool {
    match provider.health_check().await {
        Ok(true) => {
            println!("  ✅ {role} provider '{}' reachable", provider.name());
            true
        }
        Ok(false) => {
            println!(
                "  ❌ {role} provider '{}' rejected the request (check the API key)",
                provider.name()
            );
            false
        }
        Err(e) => {
            println!("  ❌ {role} provider '{}' unreachable: {e}", provider.name());
            false
        }
    }
}
