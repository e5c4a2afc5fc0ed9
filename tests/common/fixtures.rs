//! Page fixtures and scripted providers for end-to-end tests.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;

use contextvec::{
    EmbeddingProvider, EngineConfig, MockProvider, ProviderError, ProviderResult, RawElement,
    normalize_text,
};

/// Builds element lists in document order without hand-numbering.
pub struct PageBuilder {
    elements: Vec<RawElement>,
}

impl PageBuilder {
    pub fn new() -> Self {
        Self {
            elements: Vec::new(),
        }
    }

    pub fn element(mut self, kind: &str, text: &str) -> Self {
        let order = self.elements.len() as u32;
        self.elements.push(RawElement::new(kind, text, order));
        self
    }

    pub fn title(self, text: &str) -> Self {
        self.element("title", text)
    }

    pub fn meta(self, text: &str) -> Self {
        self.element("meta", text)
    }

    pub fn h1(self, text: &str) -> Self {
        self.element("h1", text)
    }

    pub fn h2(self, text: &str) -> Self {
        self.element("h2", text)
    }

    pub fn h3(self, text: &str) -> Self {
        self.element("h3", text)
    }

    pub fn build(self) -> Vec<RawElement> {
        self.elements
    }
}

impl Default for PageBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A page that satisfies every critical and high rule once its headings are
/// scripted close to the core topic.
pub fn healthy_page() -> Vec<RawElement> {
    PageBuilder::new()
        .title("Ciche zmywarki do zabudowy przeglad modeli na rok 2025")
        .meta("Poznaj ranking cichych zmywarek, poziomy halasu i koszty.")
        .h1("Ciche zmywarki do zabudowy")
        .h2("Jakie ciche zmywarki wybrac do malego mieszkania?")
        .h3("Modele do zabudowy na wymiar")
        .h3("Modele wolnostojace pod blat")
        .h2("Ile kosztuje cicha zmywarka do zabudowy?")
        .h2("Jak mierzony jest poziom halasu zmywarki?")
        .h2("Czy cicha zmywarka zuzywa wiecej pradu?")
        .build()
}

/// Scripts the healthy page so every relation lands inside its band.
pub fn healthy_provider() -> ScriptedProvider {
    ScriptedProvider::new()
        .aligned("Ciche zmywarki do zabudowy przeglad modeli na rok 2025")
        .aligned("Poznaj ranking cichych zmywarek, poziomy halasu i koszty.")
        .aligned("Ciche zmywarki do zabudowy")
        .at("Jakie ciche zmywarki wybrac do malego mieszkania?", 0.90)
        .at("Modele do zabudowy na wymiar", 0.85)
        .at("Modele wolnostojace pod blat", 0.80)
        .at("Ile kosztuje cicha zmywarka do zabudowy?", 0.80)
        .at("Jak mierzony jest poziom halasu zmywarki?", 0.85)
        .at("Czy cicha zmywarka zuzywa wiecej pradu?", 0.95)
}

/// A real audited page: short title, thin meta, and too few H2 sections.
pub fn audit_page() -> Vec<RawElement> {
    PageBuilder::new()
        .title("Ciche Zmywarki - Top 12 Modeli 2025")
        .meta("Ciche zmywarki top modele.")
        .h1("Ranking cichych zmywarek do zabudowy")
        .h2("Jak wybrac cicha zmywarke?")
        .h2("Ranking modeli 45 cm")
        .h2("Opinie uzytkownikow")
        .build()
}

pub fn audit_provider() -> ScriptedProvider {
    ScriptedProvider::new()
        .aligned("Ciche Zmywarki - Top 12 Modeli 2025")
        .at("Ciche zmywarki top modele.", 0.82)
        .at("Ranking cichych zmywarek do zabudowy", 0.85)
        .at("Jak wybrac cicha zmywarke?", 0.90)
        .at("Ranking modeli 45 cm", 0.88)
        .at("Opinie uzytkownikow", 0.82)
}

/// Engine configuration rooted at a scratch directory, with a retry budget
/// small enough for tests.
pub fn engine_config(dir: &TempDir) -> EngineConfig {
    let mut config = EngineConfig::default();
    config.data_dir = dir.path().to_path_buf();
    config.embedding.dimension = 2;
    config.embedding.retry_limit = 1;
    config.embedding.retry_base_delay = Duration::from_millis(1);
    config.embedding.call_timeout = Duration::from_millis(200);
    config
}

/// Unit vector whose cosine against `axis()` is exactly `cosine`.
pub fn unit_at(cosine: f32) -> Vec<f32> {
    vec![cosine, (1.0 - cosine * cosine).max(0.0).sqrt()]
}

pub fn axis() -> Vec<f32> {
    vec![1.0, 0.0]
}

/// Provider that returns a pre-scripted unit vector per normalized text.
///
/// Unscripted texts are an error so a fixture typo fails the test instead of
/// silently scoring garbage.
pub struct ScriptedProvider {
    model: String,
    vectors: HashMap<String, Vec<f32>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self {
            model: "scripted-embed".to_string(),
            vectors: HashMap::new(),
        }
    }

    /// Scripts `text` at the given cosine against the core axis.
    pub fn at(mut self, text: &str, cosine: f32) -> Self {
        self.vectors.insert(normalize_text(text), unit_at(cosine));
        self
    }

    /// Scripts `text` exactly on the core axis.
    pub fn aligned(self, text: &str) -> Self {
        let mut this = self;
        this.vectors.insert(normalize_text(text), axis());
        this
    }
}

impl Default for ScriptedProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmbeddingProvider for ScriptedProvider {
    async fn embed(&self, texts: &[String]) -> ProviderResult<Vec<Vec<f32>>> {
        texts
            .iter()
            .map(|text| {
                self.vectors
                    .get(text)
                    .cloned()
                    .ok_or_else(|| ProviderError::MalformedResponse {
                        message: format!("unscripted text: {text}"),
                    })
            })
            .collect()
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn dimension(&self) -> usize {
        2
    }
}

/// Counts provider round trips on top of the deterministic mock.
pub struct CountingProvider {
    inner: MockProvider,
    calls: AtomicUsize,
}

impl CountingProvider {
    pub fn new(dimension: usize) -> Arc<Self> {
        Arc::new(Self {
            inner: MockProvider::new(dimension),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmbeddingProvider for CountingProvider {
    async fn embed(&self, texts: &[String]) -> ProviderResult<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.embed(texts).await
    }

    fn model(&self) -> &str {
        self.inner.model()
    }

    fn dimension(&self) -> usize {
        self.inner.dimension()
    }
}
