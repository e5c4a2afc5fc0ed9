//! Analyze a sample page and print the graded report.
//!
//! Runs against a local Ollama server by default:
//!
//! ```sh
//! cargo run --example analyze
//! ```
//!
//! Pass `--mock` to grade with the deterministic offline provider instead:
//!
//! ```sh
//! cargo run --example analyze -- --mock
//! ```

use std::sync::Arc;

use contextvec::{
    AnalysisEngine, EmbeddingProvider, EngineConfig, MockProvider, OllamaProvider, RawElement,
};

fn sample_page() -> Vec<RawElement> {
    [
        ("title", "Ciche Zmywarki - Top 12 Modeli 2025"),
        (
            "meta",
            "Sprawdz ktore zmywarki pracuja najciszej: poziomy halasu, koszty i opinie.",
        ),
        ("h1", "Ranking cichych zmywarek do zabudowy"),
        ("h2", "Jak wybrac cicha zmywarke?"),
        ("h3", "Poziom halasu w decybelach"),
        ("h3", "Rodzaje wyciszenia komory"),
        ("h2", "Ranking modeli 45 cm"),
        ("h2", "Opinie uzytkownikow"),
    ]
    .into_iter()
    .enumerate()
    .map(|(order, (kind, text))| RawElement::new(kind, text, order as u32))
    .collect()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = EngineConfig::from_env()?;
    let provider: Arc<dyn EmbeddingProvider> = if std::env::args().any(|arg| arg == "--mock") {
        tracing::info!("using the deterministic mock provider");
        Arc::new(MockProvider::new(config.embedding.dimension))
    } else {
        Arc::new(OllamaProvider::from_config(&config.embedding)?)
    };

    let engine = AnalysisEngine::new(provider, config)?;
    let result = engine.analyze(&sample_page()).await?;

    println!("run {}", result.run_id);
    println!(
        "overall coherence: {:.1} / 100 ({} passed, {} warned, {} failed)",
        result.overall_score,
        result.passed_count(),
        result.warnings().len(),
        result.failures().len(),
    );
    println!();

    for finding in result.findings() {
        println!(
            "[{}] {} {}: {}",
            finding.priority.as_str().to_uppercase(),
            finding.code,
            finding.status,
            finding.message,
        );
        if let Some(text) = &finding.node_text {
            println!("        -> {text:?}");
        }
    }

    if !result.drifting_h2.is_empty() {
        println!();
        println!("sections drifting from the core topic:");
        for index in &result.drifting_h2 {
            if let Some(node) = result.hierarchy.node(*index) {
                println!("  - {:?}", node.text);
            }
        }
    }

    if !result.embedding_failures.is_empty() {
        println!();
        println!("nodes graded without vectors:");
        for failure in &result.embedding_failures {
            println!("  - node {}: {}", failure.node, failure.reason);
        }
    }

    Ok(())
}
