//! Chunk contextualization.
//!
//! Prefixes each chunk's text with a short generated summary so that
//! embedding and lexical matching see richer text. Generation failures
//! fall back to a fixed placeholder; one bad chunk never halts the run.

use std::sync::Arc;

use tracing::{error, info};

use manual_core::{Chunk, Generator, ManualError, Result, RetryPolicy};

/// Generates contextual summaries for chunks via the generation
/// collaborator.
pub struct Contextualizer<G> {
    generator: Arc<G>,
    policy: RetryPolicy,
}

impl<G: Generator> Contextualizer<G> {
    pub fn new(generator: Arc<G>, policy: RetryPolicy) -> Self {
        Self { generator, policy }
    }

    /// Rewrite each chunk's `contextualized_text` as
    /// `"{context}\n\n{text}"`. Never fails; permanent generation failures
    /// use the placeholder.
    pub async fn add_context(&self, chunks: &mut [Chunk]) {
        info!("Adding context to {} chunks", chunks.len());

        for chunk in chunks.iter_mut() {
            let context = match self.generate_context(chunk).await {
                Ok(context) => context,
                Err(err) => {
                    error!(
                        "Context generation failed permanently for {}: {}",
                        chunk.chunk_id, err
                    );
                    placeholder(chunk.page_number)
                }
            };
            chunk.contextualized_text = format!("{}\n\n{}", context, chunk.text);
        }

        info!("Context generation complete");
    }

    async fn generate_context(&self, chunk: &Chunk) -> Result<String> {
        let prompt = build_prompt(chunk);
        self.policy
            .run(
                || async { self.generator.generate(&prompt).await },
                is_transient,
            )
            .await
            .map(|text| text.trim().to_string())
    }
}

/// Rate-limit and availability failures are worth retrying; anything else
/// fails straight to the placeholder.
fn is_transient(err: &ManualError) -> bool {
    matches!(
        err,
        ManualError::Collaborator { .. } | ManualError::Http { .. }
    )
}

fn placeholder(page_number: u32) -> String {
    format!("Technical manual content from page {}", page_number)
}

fn build_prompt(chunk: &Chunk) -> String {
    // First 500 characters of the parent page, char-boundary safe.
    let parent_head: String = chunk.parent_page_text.chars().take(500).collect();

    format!(
        "This is a chunk from a technical operations manual, Page {}.\n\n\
         Page context (first 500 chars):\n{}...\n\n\
         Chunk:\n{}\n\n\
         Provide 2-3 sentences of context explaining:\n\
         1. What procedure/section this relates to\n\
         2. Key technical terms or components\n\
         Keep it concise and technical. Context only, no preamble.",
        chunk.page_number, parent_head, chunk.text
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    struct EchoGenerator;

    #[async_trait]
    impl Generator for EchoGenerator {
        async fn generate(&self, _prompt: &str) -> Result<String> {
            Ok("  Engine start procedure. Covers starter and ignition.  ".to_string())
        }
    }

    struct FlakyGenerator {
        calls: AtomicU32,
    }

    #[async_trait]
    impl Generator for FlakyGenerator {
        async fn generate(&self, _prompt: &str) -> Result<String> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if n < 3 {
                Err(ManualError::collaborator("generation", "rate limited"))
            } else {
                Ok("Recovered context.".to_string())
            }
        }
    }

    struct DeadGenerator;

    #[async_trait]
    impl Generator for DeadGenerator {
        async fn generate(&self, _prompt: &str) -> Result<String> {
            Err(ManualError::collaborator("generation", "unavailable"))
        }
    }

    fn chunk() -> Chunk {
        Chunk::new(12, 0, "start switches to GRD", "start switches to GRD until N2 rises")
    }

    #[tokio::test]
    async fn test_context_prefixes_chunk_text() {
        let contextualizer = Contextualizer::new(Arc::new(EchoGenerator), RetryPolicy::no_retry());
        let mut chunks = vec![chunk()];

        contextualizer.add_context(&mut chunks).await;

        assert_eq!(
            chunks[0].contextualized_text,
            "Engine start procedure. Covers starter and ignition.\n\nstart switches to GRD"
        );
        // Raw text is untouched.
        assert_eq!(chunks[0].text, "start switches to GRD");
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_failures_are_retried() {
        let generator = Arc::new(FlakyGenerator {
            calls: AtomicU32::new(0),
        });
        let policy = RetryPolicy::new(5, Duration::from_millis(10), Duration::from_secs(1));
        let contextualizer = Contextualizer::new(generator.clone(), policy);
        let mut chunks = vec![chunk()];

        contextualizer.add_context(&mut chunks).await;

        assert!(chunks[0].contextualized_text.starts_with("Recovered context."));
        assert_eq!(generator.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_permanent_failure_uses_placeholder() {
        let policy = RetryPolicy::new(2, Duration::from_millis(1), Duration::from_millis(1));
        let contextualizer = Contextualizer::new(Arc::new(DeadGenerator), policy);
        let mut chunks = vec![chunk()];

        contextualizer.add_context(&mut chunks).await;

        assert_eq!(
            chunks[0].contextualized_text,
            "Technical manual content from page 12\n\nstart switches to GRD"
        );
    }
}
