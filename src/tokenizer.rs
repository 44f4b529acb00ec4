use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    // Numbers with internal punctuation ("1,024", "3.14") first, then words
    // including hyphenated compounds. Single-character tokens do not match.
    static ref TOKEN_RE: Regex =
        Regex::new(r"\d[\d.,]*\d|\w[\w-]*\w").expect("valid regex");
    static ref STOPWORDS: HashSet<&'static str> = {
        let words: &[&str] = &[
            "a","about","above","after","again","against","all","am","an","and","any","are","aren't","as","at",
            "be","because","been","before","being","below","between","both","but","by",
            "can","can't","cannot","could","couldn't",
            "did","didn't","do","does","doesn't","doing","don't","down","during",
            "each","few","for","from","further",
            "had","hadn't","has","hasn't","have","haven't","having","he","he'd","he'll","he's","her","here","here's","hers","herself","him","himself","his","how","how's",
            "i","i'd","i'll","i'm","i've","if","in","into","is","isn't","it","it's","its","itself",
            "let's","me","more","most","mustn't","my","myself",
            "no","nor","not","of","off","on","once","only","or","other","ought","our","ours","ourselves","out","over","own",
            "same","she","she'd","she'll","she's","should","shouldn't","so","some","such",
            "than","that","that's","the","their","theirs","them","themselves","then","there","there's","these","they","they'd","they'll","they're","they've","this","those","through","to","too",
            "under","until","up","very",
            "was","wasn't","we","we'd","we'll","we're","we've","were","weren't","what","what's","when","when's","where","where's","which","while","who","who's","whom","why","why's","with","won't","would","wouldn't",
            "you","you'd","you'll","you're","you've","your","yours","yourself","yourselves"
        ];
        words.iter().copied().collect()
    };
}

/// Text-processing switches. They are persisted with the index statistics,
/// and query-time analysis must mirror them exactly; a mismatch corrupts
/// term matching and is rejected up front (see [`crate::search::Searcher`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextOptions {
    /// Lowercase all text before tokenizing.
    pub case_folding: bool,
    /// Tokenize with the word/number pattern instead of whitespace splits.
    pub handle_punctuation: bool,
    /// Drop stopwords.
    pub stopped: bool,
}

impl Default for TextOptions {
    fn default() -> Self {
        Self {
            case_folding: true,
            handle_punctuation: true,
            stopped: false,
        }
    }
}

/// Turns raw text into the normalized token streams the index builder and
/// the searcher consume.
pub struct Analyzer {
    options: TextOptions,
    stopwords: HashSet<String>,
}

impl Analyzer {
    /// Analyzer with the built-in english stopword list (used only when
    /// `options.stopped` is set).
    pub fn new(options: TextOptions) -> Self {
        let stopwords = if options.stopped {
            STOPWORDS.iter().map(|w| (*w).to_string()).collect()
        } else {
            HashSet::new()
        };
        Self { options, stopwords }
    }

    /// Analyzer with a caller-supplied stopword list, one word per line.
    pub fn with_stopwords(options: TextOptions, words: &str) -> Self {
        let stopwords = if options.stopped {
            words
                .lines()
                .map(|w| w.trim().to_string())
                .filter(|w| !w.is_empty())
                .collect()
        } else {
            HashSet::new()
        };
        Self { options, stopwords }
    }

    pub fn options(&self) -> TextOptions {
        self.options
    }

    fn is_stopword(&self, token: &str) -> bool {
        !self.stopwords.is_empty() && self.stopwords.contains(&token.to_lowercase())
    }

    /// Normalize (NFKC) and split `text` according to the configured
    /// options. Used verbatim for queries.
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let normalized = text.nfkc().collect::<String>();
        let normalized = if self.options.case_folding {
            normalized.to_lowercase()
        } else {
            normalized
        };
        let raw: Vec<&str> = if self.options.handle_punctuation {
            TOKEN_RE.find_iter(&normalized).map(|m| m.as_str()).collect()
        } else {
            normalized.split_whitespace().collect()
        };
        raw.into_iter()
            .filter(|t| !self.is_stopword(t))
            .map(str::to_string)
            .collect()
    }

    /// Document tokenization additionally strips the trailing run of purely
    /// numeric tokens, so reference numbers at the end of a document never
    /// enter the index. Queries are not stripped.
    pub fn document_tokens(&self, text: &str) -> Vec<String> {
        let mut tokens = self.tokenize(text);
        while tokens.last().is_some_and(|t| is_numeric(t)) {
            tokens.pop();
        }
        tokens
    }
}

fn is_numeric(token: &str) -> bool {
    !token.is_empty() && token.chars().all(|c| c.is_ascii_digit())
}
