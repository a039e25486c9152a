//! Chunked script generation with continuity context.
//!
//! Short documents go out in a single call.  Long documents are split with
//! the literal `". "` segmenter and generated chunk by chunk, each prompt
//! carrying the previous chunk's output.  The calls form a strict data
//! dependency chain, so they run one after another.

use std::sync::Arc;

use super::client::{LlmError, TextGenerator};
use super::prompt::PromptBuilder;
use crate::text::{chunk_for_generation, estimate_generation_tokens};

/// Drives the generation collaborator over one document.
pub struct ScriptGenerator {
    generator: Arc<dyn TextGenerator>,
    prompts: PromptBuilder,
    max_tokens_per_chunk: usize,
}

impl ScriptGenerator {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        prompts: PromptBuilder,
        max_tokens_per_chunk: usize,
    ) -> Self {
        Self {
            generator,
            prompts,
            max_tokens_per_chunk,
        }
    }

    /// Produce the podcast script for `document`.
    ///
    /// The first failing call aborts the whole run; outputs of earlier
    /// chunks are discarded.
    pub fn generate(
        &self,
        document: &str,
        duration: &str,
        style: &str,
        characters: u8,
    ) -> Result<String, LlmError> {
        let estimate = estimate_generation_tokens(document);
        if estimate <= self.max_tokens_per_chunk {
            log::info!("generating script in one call (~{estimate} tokens)");
            let prompt = self
                .prompts
                .build_short(document, duration, style, characters);
            return self.generator.generate(&prompt);
        }

        let chunks = chunk_for_generation(document, self.max_tokens_per_chunk);
        log::info!(
            "generating script in {} chunks (~{estimate} tokens, ceiling {})",
            chunks.len(),
            self.max_tokens_per_chunk
        );

        let mut outputs: Vec<String> = Vec::with_capacity(chunks.len());
        for (i, chunk) in chunks.iter().enumerate() {
            log::debug!("generation chunk {}/{}", i + 1, chunks.len());
            let context = outputs.last().map(String::as_str);
            let prompt = self
                .prompts
                .build_long(chunk, duration, style, characters, context);
            outputs.push(self.generator.generate(&prompt)?);
        }

        Ok(outputs.join("\n"))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
