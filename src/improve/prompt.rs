//! Rewrite prompts.

/// Which instruction set to send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PromptStyle {
    /// Grammar, clarity and natural phrasing, tone preserved.
    #[default]
    Standard,
    /// Friendlier and more concise; returns already-good text unchanged.
    Casual,
}

impl PromptStyle {
    fn guidelines(self) -> &'static [&'static str] {
        match self {
            Self::Standard => &[
                "Fixing grammar and spelling errors",
                "Enhancing clarity and readability",
                "Making it sound more natural",
                "Preserving the original meaning and tone",
            ],
            Self::Casual => &[
                "Fixing grammar and spelling errors",
                "Enhancing clarity and readability",
                "Making it sound more casual and engaging",
                "Using a friendly and approachable tone",
                "Avoiding overly complex language",
                "Ensuring the text flows well",
                "Keeping the content concise and to the point",
                "Preserving the original meaning and tone",
            ],
        }
    }

    fn closing(self) -> &'static str {
        match self {
            Self::Standard => {
                "Please respond ONLY with the improved text, nothing else. \
                 Do not add explanations, comments, or extra formatting."
            }
            Self::Casual => {
                "IMPORTANT: If the text is already well-written, return it unchanged.\n\
                 Only respond with the improved text, nothing else."
            }
        }
    }

    /// Render the full prompt around `text`.
    pub fn build(self, text: &str) -> String {
        let mut prompt = String::from(
            "You are a helpful writing assistant. \
             Your task is to improve the following text by:\n",
        );
        for line in self.guidelines() {
            prompt.push_str("- ");
            prompt.push_str(line);
            prompt.push('\n');
        }
        prompt.push('\n');
        prompt.push_str(self.closing());
        prompt.push_str("\n\nText to improve:\n");
        prompt.push_str(text);
        prompt.push_str("\n\nImproved text:\n");
        prompt
    }
}
