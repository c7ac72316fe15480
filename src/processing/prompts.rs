//! Fixed instruction templates for every workflow.

use crate::llm::Prompt;

const HEADING_TEMPLATE: &str = "Write a short, professional, and engaging heading of at most \
ten words that captures the essence of this paragraph:\n{paragraph}\n";

const SEGMENT_TEMPLATE: &str = "Summarize the following passage into one concise, coherent \
paragraph without dropping key details:\n{text}\nKeep the response clear and professional.\n";

const COMBINE_TEMPLATE: &str = "Below are partial summaries, each covering a different part of \
one document, in document order. Merge them into a single coherent and concise summary that \
captures the essence of the whole document.\nPartial summaries:\n{text}\nReturn the merged \
summary as a single paragraph.\n";

const SIMILARITY_SYSTEM: &str = "You identify the content two paragraphs have in common. \
Analyze the key ideas, phrases, and sentences present in both and express that overlap \
concisely and coherently.\n\nYour answer must:\n1. Highlight the meaning or wording shared by \
both paragraphs.\n2. Introduce no new or unrelated information.\n3. Be clear and \
professional.\n";

/// Prompt asking for a heading for `paragraph`.
pub fn heading(paragraph: &str) -> Prompt {
    Prompt::user(HEADING_TEMPLATE.replace("{paragraph}", paragraph))
}

/// Prompt summarizing one segment.
pub fn segment(text: &str) -> Prompt {
    Prompt::user(SEGMENT_TEMPLATE.replace("{text}", text))
}

/// Prompt merging already-joined partial summaries.
pub fn combine(joined_summaries: &str) -> Prompt {
    Prompt::user(COMBINE_TEMPLATE.replace("{text}", joined_summaries))
}

/// Prompt extracting the overlap between two paragraphs.
pub fn similarity(first: &str, second: &str) -> Prompt {
    Prompt::with_system(
        SIMILARITY_SYSTEM,
        format!("paragraph1 = {first}, paragraph2 = {second}"),
    )
}
