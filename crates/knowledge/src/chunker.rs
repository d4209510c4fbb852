//! Plain-text splitting for `knowledge import`.
//!
//! Paragraphs are packed into chunks of at most `max_chars` characters. A
//! paragraph longer than that is cut at word boundaries. Nothing fancier:
//! structured formats are expected to arrive pre-chunked as JSONL.

use crate::types::DocumentChunk;

/// Default chunk size in characters.
pub const DEFAULT_CHUNK_CHARS: usize = 800;

/// Split `text` into chunks belonging to `document_id`.
///
/// Chunk ids are the zero-based position within the document.
pub fn chunk_text(document_id: &str, text: &str, max_chars: usize) -> Vec<DocumentChunk> {
    let max_chars = max_chars.max(1);
    let mut pieces: Vec<String> = Vec::new();
    let mut current = String::new();

    for paragraph in text.split("\n\n") {
        let paragraph = paragraph.split_whitespace().collect::<Vec<_>>().join(" ");
        if paragraph.is_empty() {
            continue;
        }

        for part in split_long(&paragraph, max_chars) {
            let joined_len = current.chars().count() + 2 + part.chars().count();
            if !current.is_empty() && joined_len > max_chars {
                pieces.push(std::mem::take(&mut current));
            }
            if !current.is_empty() {
                current.push_str("\n\n");
            }
            current.push_str(&part);
        }
    }
    if !current.is_empty() {
        pieces.push(current);
    }

    tracing::debug!(
        "Chunked document '{}' into {} chunks (max {} chars)",
        document_id,
        pieces.len(),
        max_chars
    );

    pieces
        .into_iter()
        .enumerate()
        .map(|(position, text)| DocumentChunk::new(document_id, position.to_string(), text))
        .collect()
}

fn split_long(paragraph: &str, max_chars: usize) -> Vec<String> {
    if paragraph.chars().count() <= max_chars {
        return vec![paragraph.to_string()];
    }

    let mut parts = Vec::new();
    let mut current = String::new();
    for word in paragraph.split(' ') {
        let needed =
            current.chars().count() + usize::from(!current.is_empty()) + word.chars().count();
        if !current.is_empty() && needed > max_chars {
            parts.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        parts.push(current);
    }
    parts
}
