//! Prompt builder for podcast script generation.
//!
//! [`PromptBuilder`] produces two prompt shapes:
//! * **Short** (`build_short`) — the whole document in one call.
//! * **Long** (`build_long`) — one document chunk, plus the previous chunk's
//!   generated output as continuity context.
//!
//! Both embed the three run parameters (`duration`, `style`, `characters`)
//! as a pretty-printed JSON block.  Vietnamese (`"vi"`) and English (`"en"`)
//! have dedicated wording; any other code falls back to English.

// ---------------------------------------------------------------------------
// Instructions
// ---------------------------------------------------------------------------

struct Wording {
    role: &'static str,
    task: &'static str,
    mode_note: &'static str,
    text_heading: &'static str,
    params_heading: &'static str,
    context_heading: &'static str,
    no_context: &'static str,
}

static WORDING_VI: Wording = Wording {
    role: "Bạn là một nhà viết nội dung podcast.",
    task: "Hãy chuyển đoạn văn sau thành nội dung phù hợp podcast, giữ kiến thức cốt lõi, không bịa đặt.",
    mode_note: "\
Nếu 2 người nói chuyện, hãy viết theo định dạng:
Speaker 1: ...
Speaker 2: ...
Nếu 1 người thì viết dạng đoạn văn, KHÔNG gắn nhãn Speaker.",
    text_heading: "text:",
    params_heading: "Yêu cầu (JSON):",
    context_heading: "Context ngay trước đó để đảm bảo tính liền mạch:",
    no_context: "Không có context trước đó.",
};

static WORDING_EN: Wording = Wording {
    role: "You are a podcast content writer.",
    task: "Turn the following passage into podcast-ready content. Keep the core knowledge and do not invent facts.",
    mode_note: "\
If two people are talking, write in this format:
Speaker 1: ...
Speaker 2: ...
If there is one person, write plain paragraphs WITHOUT Speaker labels.",
    text_heading: "text:",
    params_heading: "Requirements (JSON):",
    context_heading: "Immediately preceding content, for continuity:",
    no_context: "No previous context.",
};

// ---------------------------------------------------------------------------
// PromptBuilder
// ---------------------------------------------------------------------------

/// Builds script-generation prompts.
///
/// # Example
/// ```rust
/// use podcast_gen::llm::PromptBuilder;
///
/// let builder = PromptBuilder::new("en");
/// let prompt = builder.build_short("Rivers carve valleys.", "short", "casual", 2);
/// assert!(prompt.contains("Speaker 1: ..."));
/// assert!(prompt.contains("\"characters\": 2"));
/// ```
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    language: String,
}

impl PromptBuilder {
    pub fn new(language: &str) -> Self {
        Self {
            language: language.to_string(),
        }
    }

    /// Prompt for a document that fits in a single generation call.
    pub fn build_short(&self, text: &str, duration: &str, style: &str, characters: u8) -> String {
        let w = self.wording();
        format!(
            "{}\n{}\n{}\n\n{}\n{}\n\n{}\n{}",
            w.role,
            w.task,
            w.mode_note,
            w.text_heading,
            text,
            w.params_heading,
            params_json(duration, style, characters),
        )
        .trim()
        .to_string()
    }

    /// Prompt for one chunk of a long document.  `context` is the previous
    /// chunk's output; `None` or blank yields the explicit "no context" line.
    pub fn build_long(
        &self,
        text: &str,
        duration: &str,
        style: &str,
        characters: u8,
        context: Option<&str>,
    ) -> String {
        let w = self.wording();
        let context_info = match context.filter(|c| !c.trim().is_empty()) {
            Some(ctx) => format!("{}\n{}", w.context_heading, ctx),
            None => w.no_context.to_string(),
        };
        format!(
            "{}\n\n{}",
            self.build_short(text, duration, style, characters),
            context_info
        )
        .trim()
        .to_string()
    }

    fn wording(&self) -> &'static Wording {
        match self.language.as_str() {
            "vi" => &WORDING_VI,
            _ => &WORDING_EN,
        }
    }
}

fn params_json(duration: &str, style: &str, characters: u8) -> String {
    let params = serde_json::json!({
        "duration": duration,
        "style": style,
        "characters": characters,
    });
    serde_json::to_string_pretty(&params).unwrap_or_else(|_| params.to_string())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
