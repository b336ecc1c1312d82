//! `rallycoach ingest`: chunk, embed and index a reference document.

use std::path::{Path, PathBuf};

use rallycoach_retrieval::{Ingestor, PassageIndex, read_document};

pub async fn run(
    config_path: Option<&Path>,
    file: PathBuf,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(config_path)?;

    // PDFs are extracted page by page; anything else is read as text
    let text = read_document(&file)?;
    if text.trim().is_empty() {
        return Err(format!("{} is empty", file.display()).into());
    }

    let router = rallycoach_providers::build_from_config(&config);
    let provider = router
        .get(config.embedding_provider_name())
        .ok_or("No embedding provider configured")?;

    let ingestor = Ingestor::new(
        provider,
        &config.embedding_model,
        config.ingest.chunk_size,
        config.ingest.chunk_stride,
    );
    let index = PassageIndex::open(&config.index.path);

    println!("📚 Ingesting {}", file.display());
    println!("   Model:  {}", config.embedding_model);
    println!(
        "   Chunks: {} chars every {} chars",
        config.ingest.chunk_size, config.ingest.chunk_stride
    );

    let report = ingestor.ingest(&index, &text).await?;

    println!(
        "✅ Stored {} passages in {}",
        report.total_passages,
        config.index.path.display()
    );

    Ok(())
}
