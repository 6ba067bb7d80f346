//! Lossless word/delimiter tokenization.

use serde::{Deserialize, Serialize};

/// Classification of a tokenized span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    /// Maximal run of word characters.
    Token,
    /// Whitespace, punctuation, or a bracketed `[cue]`.
    Delimiter,
}

/// One span of the source text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextElement {
    pub kind: ElementKind,
    pub text: String,
    /// Ordinal of this element in the returned sequence.
    pub index: usize,
    /// Byte offset of `text` in the source string.
    pub offset: usize,
}

impl TextElement {
    pub fn is_token(&self) -> bool {
        self.kind == ElementKind::Token
    }
}

/// Split `text` into alternating token and delimiter elements.
///
/// Concatenating the returned `text` fields reproduces the input exactly.
/// A `[` with a later `]` starts a bracketed cue that is emitted whole as a
/// single delimiter, so stage directions never reach the matchers.
pub fn tokenize(text: &str) -> Vec<TextElement> {
    let mut elements = Vec::new();
    let mut run: Option<(ElementKind, usize)> = None;
    // Once a `[` has no closing bracket after it, no later `[` can have one.
    let mut unclosed_bracket = false;
    let mut chars = text.char_indices().peekable();

    while let Some((pos, c)) = chars.next() {
        if c == '[' && !unclosed_bracket {
            match text[pos..].find(']') {
                Some(close) => {
                    if let Some((kind, start)) = run.take() {
                        push_element(&mut elements, kind, &text[start..pos], start);
                    }
                    let end = pos + close + 1;
                    push_element(&mut elements, ElementKind::Delimiter, &text[pos..end], pos);
                    while chars.next_if(|&(p, _)| p < end).is_some() {}
                    continue;
                }
                None => unclosed_bracket = true,
            }
        }

        let kind = classify(c);
        match run {
            Some((current, _)) if current == kind => {}
            Some((current, start)) => {
                push_element(&mut elements, current, &text[start..pos], start);
                run = Some((kind, pos));
            }
            None => run = Some((kind, pos)),
        }
    }

    if let Some((kind, start)) = run {
        push_element(&mut elements, kind, &text[start..], start);
    }

    elements
}

/// Lower-cased token projection of `text`; the unit of alignment.
pub fn word_tokens(text: &str) -> Vec<String> {
    tokenize(text)
        .into_iter()
        .filter(TextElement::is_token)
        .map(|e| e.text.to_lowercase())
        .collect()
}

/// Space-join a word slice into the string form the matchers compare.
pub fn join_words<S: AsRef<str>>(words: &[S]) -> String {
    let mut joined = String::new();
    for (i, word) in words.iter().enumerate() {
        if i > 0 {
            joined.push(' ');
        }
        joined.push_str(word.as_ref());
    }
    joined
}

fn push_element(elements: &mut Vec<TextElement>, kind: ElementKind, text: &str, offset: usize) {
    elements.push(TextElement {
        kind,
        text: text.to_string(),
        index: elements.len(),
        offset,
    });
}

fn classify(c: char) -> ElementKind {
    if is_word_char(c) {
        ElementKind::Token
    } else {
        ElementKind::Delimiter
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || is_combining_mark(c)
}

/// Combining diacritics stay attached to the letter they modify.
fn is_combining_mark(c: char) -> bool {
    matches!(
        c as u32,
        0x0300..=0x036F | 0x1AB0..=0x1AFF | 0x1DC0..=0x1DFF | 0x20D0..=0x20FF | 0xFE20..=0xFE2F
    )
}
