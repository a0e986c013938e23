//! Sentence- and markup-aware splitting of utterance text.
//!
//! Chunks are contiguous slices of the input: concatenating them in order
//! reproduces the original text byte for byte. Plain text splits at
//! sentence boundaries and merges sentences up to the configured budget;
//! a sentence over budget falls back to clause, then word, then character
//! splits. Markup input splits only between top-level nodes and never
//! inside an element, so a single element over budget becomes one
//! oversized chunk. Markup that fails to scan degrades to a single
//! passthrough chunk.

use std::ops::Range;

use lector_core::{Chunk, SpeechKind};

/// Default per-chunk budget, in characters.
pub const DEFAULT_MAX_CHUNK_CHARS: usize = 600;

#[derive(Debug, Clone)]
pub struct ChunkerConfig {
    /// Budget per chunk, in characters. Only an unsplittable markup
    /// element can push a chunk past it.
    pub max_chunk_chars: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            max_chunk_chars: DEFAULT_MAX_CHUNK_CHARS,
        }
    }
}

/// Split `text` into bounded chunks for synthesis.
///
/// Empty and whitespace-only input yields no chunks.
pub fn chunk_text(text: &str, config: &ChunkerConfig) -> Vec<Chunk> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }
    let max = config.max_chunk_chars.max(1);
    let (kind, ranges) = if looks_like_markup(trimmed) {
        (SpeechKind::Markup, markup_ranges(text, max))
    } else {
        let units = plain_units(text, 0..text.len(), max);
        (SpeechKind::Plain, merge_ranges(text, units, max))
    };
    ranges
        .into_iter()
        .enumerate()
        .map(|(index, range)| Chunk::new(index, kind, &text[range]))
        .collect()
}

fn looks_like_markup(trimmed: &str) -> bool {
    let mut chars = trimmed.chars();
    if chars.next() != Some('<') {
        return false;
    }
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '!' || c == '?')
}

fn char_count(text: &str, range: &Range<usize>) -> usize {
    text[range.clone()].chars().count()
}

/// Greedily merge adjacent units while the combined character count stays
/// within `max`. A single unit over budget passes through on its own.
fn merge_ranges(text: &str, units: Vec<Range<usize>>, max: usize) -> Vec<Range<usize>> {
    let mut merged: Vec<Range<usize>> = Vec::new();
    let mut current: Option<(Range<usize>, usize)> = None;
    for unit in units {
        let chars = char_count(text, &unit);
        match current.take() {
            None => current = Some((unit, chars)),
            Some((range, count)) => {
                if count + chars <= max {
                    current = Some((range.start..unit.end, count + chars));
                } else {
                    merged.push(range);
                    current = Some((unit, chars));
                }
            }
        }
    }
    if let Some((range, _)) = current {
        merged.push(range);
    }
    merged
}

/// Minimal plain-text pieces covering `range`, each within `max` characters.
fn plain_units(text: &str, range: Range<usize>, max: usize) -> Vec<Range<usize>> {
    let mut units = Vec::new();
    for sentence in sentence_ranges(text, range) {
        if char_count(text, &sentence) <= max {
            units.push(sentence);
        } else {
            units.extend(break_sentence(text, sentence, max));
        }
    }
    units
}

/// Sentence ranges covering `range` exactly. A sentence ends after a run
/// of terminators plus any closing quotes or brackets, once whitespace
/// follows; the whitespace stays with the sentence it ends.
fn sentence_ranges(text: &str, range: Range<usize>) -> Vec<Range<usize>> {
    let slice = &text[range.clone()];
    let base = range.start;
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = slice.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if !matches!(c, '.' | '!' | '?') {
            continue;
        }
        let mut end = i + c.len_utf8();
        while let Some(&(j, next)) = chars.peek() {
            if matches!(next, '.' | '!' | '?' | ')' | ']' | '"' | '\'' | '\u{bb}' | '\u{201d}') {
                chars.next();
                end = j + next.len_utf8();
            } else {
                break;
            }
        }
        let mut saw_whitespace = false;
        while let Some(&(j, next)) = chars.peek() {
            if next.is_whitespace() {
                saw_whitespace = true;
                chars.next();
                end = j + next.len_utf8();
            } else {
                break;
            }
        }
        // "3.14" has no whitespace after the dot and is not a boundary
        if saw_whitespace || chars.peek().is_none() {
            sentences.push(base + start..base + end);
            start = end;
        }
    }
    if start < slice.len() {
        sentences.push(base + start..base + slice.len());
    }
    sentences
}

/// Break one oversized sentence into pieces of at most `max` characters:
/// clause boundaries first, then words, then raw characters.
fn break_sentence(text: &str, range: Range<usize>, max: usize) -> Vec<Range<usize>> {
    let mut pieces = Vec::new();
    for clause in clause_ranges(text, range) {
        if char_count(text, &clause) <= max {
            pieces.push(clause);
            continue;
        }
        for word in word_ranges(text, clause) {
            if char_count(text, &word) <= max {
                pieces.push(word);
            } else {
                pieces.extend(char_ranges(text, word, max));
            }
        }
    }
    pieces
}

fn clause_ranges(text: &str, range: Range<usize>) -> Vec<Range<usize>> {
    let slice = &text[range.clone()];
    let base = range.start;
    let mut out = Vec::new();
    let mut start = 0;
    let mut chars = slice.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if !matches!(c, ',' | ';' | ':') {
            continue;
        }
        let mut end = i + c.len_utf8();
        while let Some(&(j, next)) = chars.peek() {
            if next.is_whitespace() {
                chars.next();
                end = j + next.len_utf8();
            } else {
                break;
            }
        }
        out.push(base + start..base + end);
        start = end;
    }
    if start < slice.len() {
        out.push(base + start..base + slice.len());
    }
    out
}

/// Word pieces; each keeps the whitespace run that follows it.
fn word_ranges(text: &str, range: Range<usize>) -> Vec<Range<usize>> {
    let slice = &text[range.clone()];
    let base = range.start;
    let mut out = Vec::new();
    let mut start = 0;
    let mut in_whitespace = false;
    for (i, c) in slice.char_indices() {
        if c.is_whitespace() {
            in_whitespace = true;
        } else if in_whitespace {
            out.push(base + start..base + i);
            start = i;
            in_whitespace = false;
        }
    }
    if start < slice.len() {
        out.push(base + start..base + slice.len());
    }
    out
}

/// Last resort: fixed-size character windows over an unbreakable word.
fn char_ranges(text: &str, range: Range<usize>, max: usize) -> Vec<Range<usize>> {
    let slice = &text[range.clone()];
    let base = range.start;
    let mut out = Vec::new();
    let mut start = 0;
    let mut count = 0;
    for (i, _) in slice.char_indices() {
        if count == max {
            out.push(base + start..base + i);
            start = i;
            count = 0;
        }
        count += 1;
    }
    if start < slice.len() {
        out.push(base + start..base + slice.len());
    }
    out
}

/// Chunk ranges for markup input. Any scan failure falls back to a single
/// range spanning the whole input.
fn markup_ranges(text: &str, max: usize) -> Vec<Range<usize>> {
    let Some(nodes) = scan_nodes(text, 0..text.len()) else {
        return vec![0..text.len()];
    };
    if let Some(content) = speak_document_bounds(text, &nodes) {
        let Some(inner) = scan_nodes(text, content) else {
            return vec![0..text.len()];
        };
        let mut ranges = node_chunk_ranges(text, inner, max);
        if ranges.is_empty() {
            return vec![0..text.len()];
        }
        // The wrapper tags ride along with the first and last chunks so
        // that concatenation still reproduces the input.
        if let Some(first) = ranges.first_mut() {
            first.start = 0;
        }
        if let Some(last) = ranges.last_mut() {
            last.end = text.len();
        }
        ranges
    } else {
        node_chunk_ranges(text, nodes, max)
    }
}

fn node_chunk_ranges(text: &str, nodes: Vec<MarkupNode>, max: usize) -> Vec<Range<usize>> {
    let mut units = Vec::new();
    for node in nodes {
        match node.kind {
            NodeKind::Text => units.extend(plain_units(text, node.range, max)),
            NodeKind::Element { .. } | NodeKind::Misc => units.push(node.range),
        }
    }
    merge_ranges(text, units, max)
}

struct MarkupNode {
    range: Range<usize>,
    kind: NodeKind,
}

enum NodeKind {
    Text,
    Element { name: Range<usize> },
    /// Comments, declarations, and processing instructions.
    Misc,
}

/// When the input is a single element named `speak` with only whitespace
/// around it, return the range of its content so chunking can split
/// between the document's own children.
fn speak_document_bounds(text: &str, nodes: &[MarkupNode]) -> Option<Range<usize>> {
    let mut root: Option<&MarkupNode> = None;
    for node in nodes {
        match &node.kind {
            NodeKind::Text => {
                if !text[node.range.clone()].trim().is_empty() {
                    return None;
                }
            }
            NodeKind::Element { name } => {
                if root.is_some() || !text[name.clone()].eq_ignore_ascii_case("speak") {
                    return None;
                }
                root = Some(node);
            }
            NodeKind::Misc => return None,
        }
    }
    let node = root?;
    let open_end = find_unquoted_gt(text, node.range.start, node.range.end)? + 1;
    // The last "</" inside the element is its own close tag. A
    // self-closing root has none and stays whole.
    let close_start = text[node.range.clone()]
        .rfind("</")
        .map(|offset| node.range.start + offset)?;
    if open_end > close_start {
        return None;
    }
    Some(open_end..close_start)
}

/// Lex `range` into top-level nodes: text runs, balanced elements, and
/// comment or declaration blocks. `None` means the markup does not scan.
fn scan_nodes(text: &str, range: Range<usize>) -> Option<Vec<MarkupNode>> {
    let mut nodes = Vec::new();
    let mut pos = range.start;
    while pos < range.end {
        let rest = &text[pos..range.end];
        let Some(rel) = rest.find('<') else {
            nodes.push(MarkupNode {
                range: pos..range.end,
                kind: NodeKind::Text,
            });
            break;
        };
        if rel > 0 {
            nodes.push(MarkupNode {
                range: pos..pos + rel,
                kind: NodeKind::Text,
            });
        }
        let at = pos + rel;
        let tag = &text[at..range.end];
        if tag.starts_with("<!--") {
            let end = at + tag.find("-->")? + 3;
            nodes.push(MarkupNode {
                range: at..end,
                kind: NodeKind::Misc,
            });
            pos = end;
        } else if tag.starts_with("<!") || tag.starts_with("<?") {
            let end = find_unquoted_gt(text, at, range.end)? + 1;
            nodes.push(MarkupNode {
                range: at..end,
                kind: NodeKind::Misc,
            });
            pos = end;
        } else if tag[1..].starts_with(|c: char| c.is_ascii_alphabetic()) {
            let node = scan_element(text, at, range.end)?;
            pos = node.range.end;
            nodes.push(node);
        } else {
            // stray '<'
            return None;
        }
    }
    Some(nodes)
}

/// Scan one balanced element starting at `start`, which must point at `<`
/// followed by a name character. Every close tag must match its open tag.
fn scan_element(text: &str, start: usize, limit: usize) -> Option<MarkupNode> {
    let mut stack: Vec<Range<usize>> = Vec::new();
    let mut root_name: Option<Range<usize>> = None;
    let mut pos = start;
    loop {
        let rel = text[pos..limit].find('<')?;
        let at = pos + rel;
        let rest = &text[at..limit];
        if rest.starts_with("</") {
            let name = tag_name(text, at + 2, limit)?;
            let end = find_unquoted_gt(text, name.end, limit)?;
            let open = stack.pop()?;
            if !text[open].eq_ignore_ascii_case(&text[name]) {
                return None;
            }
            pos = end + 1;
            if stack.is_empty() {
                return Some(MarkupNode {
                    range: start..pos,
                    kind: NodeKind::Element { name: root_name? },
                });
            }
        } else if rest.starts_with("<!--") {
            pos = at + rest.find("-->")? + 3;
        } else if rest.starts_with("<!") || rest.starts_with("<?") {
            pos = find_unquoted_gt(text, at, limit)? + 1;
        } else if rest[1..].starts_with(|c: char| c.is_ascii_alphabetic()) {
            let name = tag_name(text, at + 1, limit)?;
            let end = find_unquoted_gt(text, name.end, limit)?;
            let self_closing = text[..end].ends_with('/');
            if root_name.is_none() {
                root_name = Some(name.clone());
            }
            pos = end + 1;
            if !self_closing {
                stack.push(name);
            }
            if stack.is_empty() {
                return Some(MarkupNode {
                    range: start..pos,
                    kind: NodeKind::Element { name: root_name? },
                });
            }
        } else {
            return None;
        }
    }
}

/// Name characters after a `<` or `</`.
fn tag_name(text: &str, from: usize, limit: usize) -> Option<Range<usize>> {
    let mut end = from;
    for (i, c) in text[from..limit].char_indices() {
        if c.is_ascii_alphanumeric() || matches!(c, ':' | '-' | '_' | '.') {
            end = from + i + c.len_utf8();
        } else {
            break;
        }
    }
    (end > from).then_some(from..end)
}

/// Position of the next `>` outside attribute quotes, before `limit`.
fn find_unquoted_gt(text: &str, from: usize, limit: usize) -> Option<usize> {
    let mut quote: Option<char> = None;
    for (i, c) in text[from..limit].char_indices() {
        match (quote, c) {
            (Some(q), _) if c == q => quote = None,
            (None, '"' | '\'') => quote = Some(c),
            (None, '>') => return Some(from + i),
            _ => {}
        }
    }
    None
}
