//! Adaptive passage splitter.
//!
//! Transcripts come in two shapes. Most carry paragraph markers (`E-1`,
//! `53`, `53.`, `53:`) at line starts; those are split strictly on the
//! markers so every passage gets an exact paragraph label. Transcripts
//! without enough markers fall back to size-bounded chunking on paragraph
//! boundaries (`\n\n`), with synthetic `"Unnumbered (Chunk N)"` labels.
//!
//! The fallback accumulates paragraphs into a buffer until adding the
//! next one would exceed the size limit, then flushes; a single oversized
//! paragraph is hard-split at the nearest newline or space.

use crate::models::Passage;

/// Approximate characters-per-token ratio used by the fallback chunker.
const CHARS_PER_TOKEN: usize = 4;

/// Buffers at or below this length are dropped as marker noise.
const MIN_PARAGRAPH_CHARS: usize = 20;

/// A document with more numbered lines than this is split on its markers.
const NUMBERED_LINE_THRESHOLD: usize = 5;

/// Parse a paragraph marker at the start of a line.
///
/// Accepts `E-<digits>` or `<digits>`, optionally followed by `.` or `:`,
/// and always followed by whitespace. Returns the marker itself.
fn paragraph_marker(line: &str) -> Option<&str> {
    let trimmed = line.trim_start();
    let (marker_len, rest) = if let Some(stripped) = trimmed.strip_prefix("E-") {
        let digits = stripped
            .chars()
            .take_while(|c| c.is_ascii_digit())
            .count();
        if digits == 0 {
            return None;
        }
        (2 + digits, &stripped[digits..])
    } else {
        let digits = trimmed
            .chars()
            .take_while(|c| c.is_ascii_digit())
            .count();
        if digits == 0 {
            return None;
        }
        (digits, &trimmed[digits..])
    };
    let rest = rest.strip_prefix(['.', ':']).unwrap_or(rest);
    if rest.starts_with(char::is_whitespace) {
        Some(&trimmed[..marker_len])
    } else {
        None
    }
}

/// Split one document's text into labeled passages.
pub fn split_passages(source: &str, text: &str, max_tokens: usize) -> Vec<Passage> {
    let lines: Vec<&str> = text.lines().collect();
    let numbered = lines
        .iter()
        .filter(|line| paragraph_marker(line).is_some())
        .count();

    if numbered > NUMBERED_LINE_THRESHOLD {
        split_numbered(source, &lines)
    } else {
        chunk_unnumbered(source, text, max_tokens)
    }
}

fn split_numbered(source: &str, lines: &[&str]) -> Vec<Passage> {
    let mut passages = Vec::new();
    let mut label = String::from("Intro");
    let mut buffer: Vec<&str> = Vec::new();

    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(marker) = paragraph_marker(line) {
            flush(source, &label, &buffer, &mut passages);
            label = marker.to_string();
            buffer = vec![line];
        } else {
            buffer.push(line);
        }
    }
    flush(source, &label, &buffer, &mut passages);
    passages
}

fn flush(source: &str, label: &str, buffer: &[&str], out: &mut Vec<Passage>) {
    if buffer.is_empty() {
        return;
    }
    let combined = buffer.join(" ");
    if combined.len() > MIN_PARAGRAPH_CHARS {
        out.push(Passage {
            content: combined,
            source: source.to_string(),
            paragraph: label.to_string(),
        });
    }
}

fn chunk_unnumbered(source: &str, text: &str, max_tokens: usize) -> Vec<Passage> {
    chunk_text(text, max_tokens)
        .into_iter()
        .enumerate()
        .map(|(i, content)| Passage {
            content,
            source: source.to_string(),
            paragraph: format!("Unnumbered (Chunk {})", i + 1),
        })
        .collect()
}

/// Split text into pieces on `\n\n` boundaries, respecting `max_tokens`.
fn chunk_text(text: &str, max_tokens: usize) -> Vec<String> {
    let max_chars = max_tokens * CHARS_PER_TOKEN;
    let mut chunks = Vec::new();
    let mut current = String::new();

    for para in text.split("\n\n") {
        let trimmed = para.trim();
        if trimmed.is_empty() {
            continue;
        }

        let would_be = if current.is_empty() {
            trimmed.len()
        } else {
            current.len() + 2 + trimmed.len()
        };
        if would_be > max_chars && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
        }

        if trimmed.len() > max_chars {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
            }
            hard_split(trimmed, max_chars, &mut chunks);
        } else {
            if !current.is_empty() {
                current.push_str("\n\n");
            }
            current.push_str(trimmed);
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Split an oversized paragraph at the nearest newline or space boundary
/// before `max_chars`, snapping to valid char boundaries.
fn hard_split(paragraph: &str, max_chars: usize, out: &mut Vec<String>) {
    let mut remaining = paragraph;
    while !remaining.is_empty() {
        let limit = snap_to_char_boundary(remaining, remaining.len().min(max_chars));
        let split_at = if limit < remaining.len() {
            remaining[..limit]
                .rfind('\n')
                .or_else(|| remaining[..limit].rfind(' '))
                .map(|pos| pos + 1)
                .unwrap_or(limit)
        } else {
            limit
        };
        let split_at = snap_to_char_boundary(remaining, split_at);
        // Guarantee forward progress even when no boundary was found.
        let split_at = if split_at == 0 {
            remaining
                .char_indices()
                .nth(1)
                .map(|(i, _)| i)
                .unwrap_or(remaining.len())
        } else {
            split_at
        };
        let piece = remaining[..split_at].trim();
        if !piece.is_empty() {
            out.push(piece.to_string());
        }
        remaining = &remaining[split_at..];
    }
}

/// Snap a byte index back to the nearest valid UTF-8 char boundary.
fn snap_to_char_boundary(s: &str, index: usize) -> usize {
    if index >= s.len() {
        return s.len();
    }
    let mut i = index;
    while i > 0 && !s.is_char_boundary(i) {
        i -= 1;
    }
    i
}
