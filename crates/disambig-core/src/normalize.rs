//! Head normalization
//!
//! Collision keys are compared after normalization. Hosts with a richer
//! normalizer (script conversion, width folding) plug it in through
//! [`Normalizer`]; [`BasicNormalizer`] is the fallback.

use std::fmt::Debug;

/// Text normalizer used to build collision keys and search keys
pub trait Normalizer: Send + Sync + Debug {
    /// Normalize `text`, joining whitespace-separated words with `separator`
    fn normalize(&self, text: &str, separator: &str) -> String;
}

/// Lowercase and collapse whitespace runs
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicNormalizer;

impl Normalizer for BasicNormalizer {
    fn normalize(&self, text: &str, separator: &str) -> String {
        let lowered = text.to_lowercase();
        let mut out = String::with_capacity(lowered.len());
        let mut in_space = false;

        for ch in lowered.chars() {
            if ch.is_whitespace() {
                if !in_space {
                    out.push_str(separator);
                    in_space = true;
                }
            } else {
                out.push(ch);
                in_space = false;
            }
        }

        out
    }
}
