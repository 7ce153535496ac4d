//! Text post-processing applied to every completion before it is returned:
//! currency symbol normalization and word-limit enforcement.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::Serialize;

/// `US$25m`, `$ 25m`, `€1.2bn`, `£300k` ... a currency symbol attached to an amount.
/// A bare `$` must not follow a letter, so `NZ$40m` is left alone.
static PREFIX_CURRENCY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?:\b(?P<named>US|A|C|HK|S)\$|(?P<lead>^|[^A-Za-z])\$|(?P<symbol>[€£¥₹])) ?(?P<digit>\d)",
    )
    .expect("currency pattern is valid")
});

/// `25€`, `1.200,50€`, and `25 €` when the symbol closes the phrase.
/// `2024 € markets` is not an amount.
static SUFFIX_EURO: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d[\d.,]*)(?:€| €(?P<tail> *(?:\n|$)|[^\w\s]))")
        .expect("euro suffix pattern is valid")
});

static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\S+").expect("word pattern is valid"));

/// Sentence end (punctuation plus closing quotes/brackets, then whitespace or
/// end of text) or a line break.
static SENTENCE_BOUNDARY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"([.!?]+["'”’)\]]*)(?:\s|$)|(\n)"#).expect("boundary pattern is valid")
});

const HARD_CUT_MARKER: &str = "…";

/// Replaces currency symbols attached to amounts with ISO codes.
pub fn normalize_currency(text: &str) -> String {
    let text = PREFIX_CURRENCY.replace_all(text, |caps: &Captures| {
        let named = caps.name("named").map(|m| m.as_str());
        let symbol = caps.name("symbol").map(|m| m.as_str());
        let code = match (named, symbol) {
            (Some("US"), _) => "USD",
            (Some("A"), _) => "AUD",
            (Some("C"), _) => "CAD",
            (Some("HK"), _) => "HKD",
            (Some("S"), _) => "SGD",
            (_, Some("€")) => "EUR",
            (_, Some("£")) => "GBP",
            (_, Some("¥")) => "JPY",
            (_, Some("₹")) => "INR",
            _ => "USD",
        };
        let lead = caps.name("lead").map_or("", |m| m.as_str());
        format!("{lead}{code} {}", &caps["digit"])
    });
    SUFFIX_EURO.replace_all(&text, "EUR ${1}${tail}").into_owned()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WordLimitMode {
    /// Allows a 10% overrun before trimming.
    #[default]
    Soft,
    /// Never exceeds the limit.
    Hard,
}

impl WordLimitMode {
    pub fn from_key(key: &str) -> Option<Self> {
        match key.trim().to_ascii_lowercase().as_str() {
            "soft" => Some(WordLimitMode::Soft),
            "hard" => Some(WordLimitMode::Hard),
            _ => None,
        }
    }

    fn ceiling(self, limit: usize) -> usize {
        match self {
            WordLimitMode::Soft => limit.saturating_add(limit.div_ceil(10)),
            WordLimitMode::Hard => limit,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Trimmed {
    pub text: String,
    pub word_count: usize,
    pub trimmed: bool,
}

pub fn count_words(text: &str) -> usize {
    WORD.find_iter(text).count()
}

/// Trims `text` to the word limit, preferring the last sentence boundary that
/// fits. Falls back to a hard cut after `limit` words when no boundary keeps
/// at least half of the limit.
pub fn enforce_word_limit(text: &str, limit: usize, mode: WordLimitMode) -> Trimmed {
    let text = text.trim();
    let word_ends: Vec<usize> = WORD.find_iter(text).map(|m| m.end()).collect();
    let ceiling = mode.ceiling(limit);

    if word_ends.len() <= ceiling {
        return Trimmed {
            text: text.to_string(),
            word_count: word_ends.len(),
            trimmed: false,
        };
    }

    let words_before = |offset: usize| word_ends.partition_point(|&end| end <= offset);

    let mut best: Option<(usize, usize)> = None;
    for caps in SENTENCE_BOUNDARY.captures_iter(text) {
        let offset = match (caps.get(1), caps.get(2)) {
            (Some(punct), _) => punct.end(),
            (None, Some(newline)) => newline.start(),
            _ => continue,
        };
        let words = words_before(offset);
        if words > ceiling {
            break;
        }
        best = Some((offset, words));
    }

    // At least half of the limit, so 2 of 5 is not enough.
    if let Some((offset, words)) = best.filter(|&(_, words)| words > 0 && words * 2 >= limit) {
        return Trimmed {
            text: text[..offset].trim_end().to_string(),
            word_count: words,
            trimmed: true,
        };
    }

    if limit == 0 {
        return Trimmed {
            text: String::new(),
            word_count: 0,
            trimmed: true,
        };
    }

    let cut = text[..word_ends[limit - 1]]
        .trim_end_matches(|c: char| matches!(c, ',' | ';' | ':' | '-' | '–' | '—'))
        .trim_end();
    Trimmed {
        text: format!("{cut}{HARD_CUT_MARKER}"),
        word_count: limit,
        trimmed: true,
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PostProcessOptions {
    pub normalize_currency: bool,
    pub word_limit: Option<(usize, WordLimitMode)>,
}

/// Currency normalization first, so the word limit sees the final text.
pub fn post_process(text: &str, options: &PostProcessOptions) -> Trimmed {
    let text = if options.normalize_currency {
        normalize_currency(text)
    } else {
        text.to_string()
    };

    match options.word_limit {
        Some((limit, mode)) => enforce_word_limit(&text, limit, mode),
        None => {
            let text = text.trim().to_string();
            Trimmed {
                word_count: count_words(&text),
                text,
                trimmed: false,
            }
        }
    }
}
