//! Token counts for generated templates.
//!
//! Counts come from tiktoken-rs; if an encoder cannot be loaded the count
//! falls back to a character-based estimate.

use std::sync::OnceLock;

use tiktoken_rs::CoreBPE;

/// Tokenizer encoding used for counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    /// GPT-4 and GPT-3.5 family.
    #[default]
    Cl100kBase,
    /// GPT-4o family.
    O200kBase,
}

impl std::fmt::Display for Encoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Encoding::Cl100kBase => "cl100k_base",
            Encoding::O200kBase => "o200k_base",
        })
    }
}

impl std::str::FromStr for Encoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cl100k" | "cl100k_base" => Ok(Encoding::Cl100kBase),
            "o200k" | "o200k_base" => Ok(Encoding::O200kBase),
            other => Err(format!("unknown encoding: {other}")),
        }
    }
}

static CL100K: OnceLock<Option<CoreBPE>> = OnceLock::new();
static O200K: OnceLock<Option<CoreBPE>> = OnceLock::new();

fn encoder(encoding: Encoding) -> Option<&'static CoreBPE> {
    let (cell, init): (&OnceLock<Option<CoreBPE>>, fn() -> Option<CoreBPE>) = match encoding {
        Encoding::Cl100kBase => (&CL100K, || tiktoken_rs::cl100k_base().ok()),
        Encoding::O200kBase => (&O200K, || tiktoken_rs::o200k_base().ok()),
    };
    cell.get_or_init(init).as_ref()
}

/// Roughly four characters per token for source code and prose.
fn estimate(text: &str) -> usize {
    text.chars().count().div_ceil(4)
}

/// Count tokens in `text`. Never fails.
///
/// # Examples
///
/// ```
/// use treegen::tokens::{count_tokens, Encoding};
///
/// assert_eq!(count_tokens("", Encoding::default()), 0);
/// assert!(count_tokens("def main():\n    pass\n", Encoding::Cl100kBase) > 0);
/// ```
pub fn count_tokens(text: &str, encoding: Encoding) -> usize {
    if text.is_empty() {
        return 0;
    }
    match encoder(encoding) {
        Some(bpe) => bpe.encode_ordinary(text).len(),
        None => estimate(text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoding_parse_and_display() {
        assert_eq!("cl100k".parse::<Encoding>().unwrap(), Encoding::Cl100kBase);
        assert_eq!("O200K_BASE".parse::<Encoding>().unwrap(), Encoding::O200kBase);
        assert!("p50k".parse::<Encoding>().is_err());
        assert_eq!(Encoding::O200kBase.to_string(), "o200k_base");
    }

    #[test]
    fn test_estimate() {
        assert_eq!(estimate(""), 0);
        assert_eq!(estimate("abcd"), 1);
        assert_eq!(estimate("abcde"), 2);
    }

    #[test]
    fn test_count_tokens_grows_with_text() {
        let short = count_tokens("x = 1\n", Encoding::Cl100kBase);
        let long = count_tokens(&"x = 1\n".repeat(50), Encoding::Cl100kBase);
        assert!(short > 0);
        assert!(long > short);
    }
}
