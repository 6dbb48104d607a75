//! Sentiment Scoring
//!
//! Lexicon-based compound scorer tuned for crypto chatter. Each post gets a
//! valence sum over its tokens (negation, boosters, caps and exclamation
//! emphasis applied), normalized into [-1, 1].

use std::collections::{HashMap, HashSet};
use thiserror::Error;
use tracing::warn;

use crate::ports::social::SocialPost;

/// Normalization constant for the compound score
const NORMALIZATION_ALPHA: f64 = 15.0;

/// Valence multiplier when a token sits in negated scope
const NEGATION_SCALAR: f64 = -0.74;

/// Added magnitude for ALL-CAPS emphasis in mixed-case text
const CAPS_BOOST: f64 = 0.733;

/// Added magnitude per trailing exclamation mark
const EXCLAMATION_BOOST: f64 = 0.292;

/// Exclamation marks counted at most
const MAX_EXCLAMATIONS: usize = 4;

/// How far back negations and boosters reach, in tokens
const MODIFIER_WINDOW: usize = 3;

/// Booster decay at distance two and three
const BOOSTER_DECAY: [f64; 3] = [1.0, 0.95, 0.9];

/// Shortest text worth scoring, in characters
const MIN_TEXT_CHARS: usize = 3;

/// Longest text scored; the rest is cut off
const MAX_TEXT_CHARS: usize = 512;

#[rustfmt::skip]
static LEXICON: &[(&str, f64)] = &[
    // General polarity
    ("good", 1.9), ("great", 3.1), ("awesome", 3.1), ("amazing", 2.8),
    ("excellent", 3.2), ("best", 3.2), ("love", 3.2), ("strong", 2.3),
    ("solid", 2.2), ("huge", 1.8), ("win", 2.8), ("winning", 2.8),
    ("safe", 1.9), ("legit", 1.7),
    ("bad", -2.5), ("terrible", -3.1), ("awful", -3.0), ("worst", -3.1),
    ("hate", -2.7), ("weak", -1.9), ("dead", -2.8), ("worthless", -3.0),
    ("fake", -2.1), ("fraud", -3.2), ("fear", -2.2), ("panic", -2.7),
    // Market moves
    ("profit", 2.3), ("gain", 2.2), ("gains", 2.4), ("rally", 2.1),
    ("surge", 2.2), ("soar", 2.4), ("breakout", 2.0), ("rocket", 2.5),
    ("loss", -2.4), ("losses", -2.4), ("lose", -2.2), ("losing", -2.3),
    ("drop", -1.7), ("dropping", -1.9), ("crash", -3.0), ("crashing", -3.2),
    // Memecoin slang
    ("moon", 2.9), ("mooning", 3.1), ("pump", 1.8), ("pumping", 2.2),
    ("bull", 2.0), ("bullish", 2.9), ("hodl", 1.6), ("ape", 1.1),
    ("lfg", 2.6), ("gem", 2.4),
    ("dump", -2.3), ("dumping", -2.6), ("bear", -1.9), ("bearish", -2.7),
    ("rug", -3.2), ("rugged", -3.5), ("rugpull", -3.6), ("scam", -3.3),
    ("rekt", -2.9), ("honeypot", -3.3),
];

#[rustfmt::skip]
static BOOSTERS: &[(&str, f64)] = &[
    ("very", 0.293), ("extremely", 0.293), ("absolutely", 0.293),
    ("incredibly", 0.293), ("really", 0.293), ("super", 0.293),
    ("totally", 0.293), ("insanely", 0.293), ("massively", 0.293),
    ("mega", 0.293), ("ultra", 0.293),
    ("slightly", -0.293), ("somewhat", -0.293), ("barely", -0.293),
    ("kinda", -0.293), ("marginally", -0.293), ("hardly", -0.293),
];

#[rustfmt::skip]
static NEGATIONS: &[&str] = &[
    "not", "no", "never", "none", "neither", "nobody", "nothing",
    "isnt", "isn't", "wasnt", "wasn't", "dont", "don't", "doesnt",
    "doesn't", "didnt", "didn't", "cant", "can't", "cannot", "wont",
    "won't", "aint", "ain't", "without",
];

/// Errors that can occur during sentiment scoring
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SentimentError {
    /// Text too short to carry any signal
    #[error("Text too short to score: {length} chars (minimum {MIN_TEXT_CHARS})")]
    TooShort { length: usize },
}

/// Polarity bucket for a compound score
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
}

impl SentimentLabel {
    /// Standard compound cutoffs: +/-0.05
    pub fn from_compound(compound: f64) -> Self {
        if compound >= 0.05 {
            SentimentLabel::Positive
        } else if compound <= -0.05 {
            SentimentLabel::Negative
        } else {
            SentimentLabel::Neutral
        }
    }
}

/// Score for one text
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SentimentScore {
    /// Normalized valence sum in [-1, 1]
    pub compound: f64,
    pub label: SentimentLabel,
}

/// Lexicon-based sentiment scorer
pub struct SentimentAnalyzer {
    lexicon: HashMap<&'static str, f64>,
    boosters: HashMap<&'static str, f64>,
    negations: HashSet<&'static str>,
}

impl Default for SentimentAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl SentimentAnalyzer {
    pub fn new() -> Self {
        Self {
            lexicon: LEXICON.iter().copied().collect(),
            boosters: BOOSTERS.iter().copied().collect(),
            negations: NEGATIONS.iter().copied().collect(),
        }
    }

    /// Score a single text.
    ///
    /// Texts shorter than three characters are rejected; longer than 512
    /// characters are truncated before scoring.
    pub fn score_text(&self, text: &str) -> Result<SentimentScore, SentimentError> {
        let trimmed = text.trim();
        let length = trimmed.chars().count();
        if length < MIN_TEXT_CHARS {
            return Err(SentimentError::TooShort { length });
        }

        let capped: String = trimmed.chars().take(MAX_TEXT_CHARS).collect();
        let tokens = tokenize(&capped);
        let mixed_case = has_caps_differential(&tokens);

        let mut sum = 0.0;
        for (i, token) in tokens.iter().enumerate() {
            let base = match self.lexicon.get(token.lower.as_str()) {
                Some(&valence) => valence,
                None => continue,
            };
            let mut valence = base;

            if mixed_case && token.is_all_caps {
                valence += CAPS_BOOST.copysign(valence);
            }

            let window_start = i.saturating_sub(MODIFIER_WINDOW);
            let mut negated = false;
            for (distance, prior) in tokens[window_start..i].iter().rev().enumerate() {
                if self.negations.contains(prior.lower.as_str()) {
                    negated = true;
                }
                if let Some(&boost) = self.boosters.get(prior.lower.as_str()) {
                    // Boosters push away from zero, dampeners pull toward it
                    let decay = BOOSTER_DECAY[distance.min(BOOSTER_DECAY.len() - 1)];
                    valence += boost * decay * valence.signum();
                }
            }
            if negated {
                valence *= NEGATION_SCALAR;
            }

            sum += valence;
        }

        // Exclamation emphasis pushes the total further from zero
        let exclamations = capped.matches('!').count().min(MAX_EXCLAMATIONS);
        if sum != 0.0 {
            sum += (exclamations as f64 * EXCLAMATION_BOOST).copysign(sum);
        }

        let compound = normalize(sum);
        Ok(SentimentScore {
            compound,
            label: SentimentLabel::from_compound(compound),
        })
    }

    /// Mean compound over a batch of posts, rounded to four decimals.
    ///
    /// Unscoreable posts are skipped with a warning; an empty or fully
    /// skipped batch scores 0.0.
    pub fn score_posts(&self, posts: &[SocialPost]) -> f64 {
        let mut total = 0.0;
        let mut counted = 0usize;

        for post in posts {
            match self.score_text(&post.text) {
                Ok(score) => {
                    total += score.compound;
                    counted += 1;
                }
                Err(err) => {
                    warn!(post_id = %post.id, source = %post.source, "Skipping post: {}", err);
                }
            }
        }

        if counted == 0 {
            return 0.0;
        }

        round4(total / counted as f64)
    }
}

struct Token {
    lower: String,
    is_all_caps: bool,
}

fn tokenize(text: &str) -> Vec<Token> {
    text.split_whitespace()
        .filter_map(|raw| {
            let stripped = raw.trim_matches(|c: char| !c.is_alphanumeric() && c != '\'');
            if stripped.is_empty() {
                return None;
            }
            let has_alpha = stripped.chars().any(|c| c.is_alphabetic());
            let is_all_caps =
                has_alpha && stripped.chars().filter(|c| c.is_alphabetic()).all(|c| c.is_uppercase());
            Some(Token {
                lower: stripped.to_lowercase(),
                is_all_caps,
            })
        })
        .collect()
}

/// Caps emphasis only means something when the text mixes cases
fn has_caps_differential(tokens: &[Token]) -> bool {
    let caps = tokens.iter().filter(|t| t.is_all_caps).count();
    caps > 0 && caps < tokens.len()
}

/// Map the raw valence sum into [-1, 1]
fn normalize(sum: f64) -> f64 {
    let compound = sum / (sum * sum + NORMALIZATION_ALPHA).sqrt();
    compound.clamp(-1.0, 1.0)
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}
