//! Splits accumulated response text into a reasoning segment and a final answer.
//!
//! The remote service may prefix its answer with a `<think>...</think>` block.
//! [`parse_tagged_content`] is a pure function of the whole accumulated text and
//! is re-run from scratch every time a chunk lands, so it never carries state
//! between chunks.

use crate::types::ParsedContent;
use regex::Regex;
use std::sync::OnceLock;

pub const OPEN_TAG: &str = "<think>";
pub const CLOSE_TAG: &str = "</think>";

fn think_block() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        let pattern = format!(
            "(?s){}(.*?){}",
            regex::escape(OPEN_TAG),
            regex::escape(CLOSE_TAG)
        );
        Regex::new(&pattern).unwrap()
    })
}

/// Parse the accumulated text into `(reasoning, final_answer)`.
///
/// - An opening tag and no closing tag anywhere: the block is still streaming.
///   Reasoning is the text with the first opening tag removed, trimmed, and the
///   answer is empty.
/// - A complete block: the first `<think>...</think>` pair becomes the trimmed
///   reasoning, and the text with that block cut out (trimmed) is the answer.
/// - Anything else: no reasoning, and the answer is the text exactly as
///   received (not trimmed). This includes a closing tag that precedes every
///   opening tag.
///
/// Only the first pair is recognized. Any later pair stays in the answer
/// verbatim.
pub fn parse_tagged_content(text: &str) -> ParsedContent {
    if reasoning_in_progress(text) {
        return ParsedContent {
            reasoning: text.replacen(OPEN_TAG, "", 1).trim().to_string(),
            final_answer: String::new(),
        };
    }

    if let Some(captures) = think_block().captures(text) {
        if let (Some(block), Some(inner)) = (captures.get(0), captures.get(1)) {
            let mut remainder = String::with_capacity(text.len() - block.len());
            remainder.push_str(&text[..block.start()]);
            remainder.push_str(&text[block.end()..]);

            return ParsedContent {
                reasoning: inner.as_str().trim().to_string(),
                final_answer: remainder.trim().to_string(),
            };
        }
    }

    ParsedContent {
        reasoning: String::new(),
        final_answer: text.to_string(),
    }
}

/// True while an opened reasoning block has not been closed yet
pub fn reasoning_in_progress(text: &str) -> bool {
    text.contains(OPEN_TAG) && !text.contains(CLOSE_TAG)
}
