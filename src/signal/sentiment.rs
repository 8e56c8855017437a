//! Text polarity scoring shared by the social sources.
//!
//! `LexiconScorer` is a small valence-lexicon model: word valences on a
//! -4..4 scale, negation flip, intensifier boost, exclamation emphasis, and
//! the compound normalisation `s / sqrt(s^2 + 15)` into [-1, 1]. Any other
//! model can be plugged in through [`PolarityScorer`].

use crate::utils::round_to;
use lazy_static::lazy_static;
use std::collections::{HashMap, HashSet};

/// Per-text polarity in [-1, 1].
pub trait PolarityScorer: Send + Sync {
    fn polarity(&self, text: &str) -> f64;
}

const NORMALIZATION_ALPHA: f64 = 15.0;
const NEGATION_SCALAR: f64 = -0.74;
const BOOSTER_INCREMENT: f64 = 0.293;
const EXCLAMATION_INCREMENT: f64 = 0.292;
const MAX_EXCLAMATIONS: usize = 4;
const NEGATION_LOOKBACK: usize = 3;

lazy_static! {
    static ref VALENCE: HashMap<&'static str, f64> = [
        // general
        ("good", 1.9), ("great", 3.1), ("excellent", 2.7), ("amazing", 2.8),
        ("awesome", 3.1), ("love", 3.2), ("like", 1.5), ("happy", 2.7),
        ("win", 2.8), ("winning", 2.4), ("best", 3.2), ("strong", 2.3),
        ("safe", 1.9), ("nice", 1.8), ("profit", 1.9), ("gain", 2.0),
        ("gains", 2.0), ("up", 0.7), ("growth", 1.8), ("opportunity", 1.6),
        ("bad", -2.5), ("terrible", -2.1), ("awful", -2.0), ("hate", -2.7),
        ("worst", -3.1), ("weak", -1.9), ("loss", -1.3), ("losses", -1.7),
        ("lose", -1.8), ("losing", -1.6), ("fear", -2.2), ("panic", -2.3),
        ("down", -0.9), ("crash", -2.1), ("fraud", -2.8), ("risk", -1.1),
        ("sad", -2.1), ("angry", -2.3), ("fail", -2.5), ("dead", -3.3),
        // market slang
        ("bullish", 2.6), ("bearish", -2.4), ("moon", 2.2), ("mooning", 2.5),
        ("pump", 1.4), ("pumping", 1.6), ("rally", 2.0), ("breakout", 1.8),
        ("ath", 1.9), ("hodl", 1.2), ("lambo", 1.8), ("undervalued", 1.6),
        ("dump", -2.0), ("dumping", -2.2), ("rug", -3.0), ("rugged", -3.2),
        ("scam", -3.1), ("rekt", -2.6), ("fud", -1.8), ("overvalued", -1.4),
        ("dip", -0.8), ("bagholder", -1.6), ("exploit", -2.4), ("hacked", -2.9),
    ]
    .into_iter()
    .collect();

    static ref NEGATIONS: HashSet<&'static str> = [
        "not", "no", "never", "none", "nothing", "nobody", "neither", "nor",
        "dont", "don't", "doesnt", "doesn't", "didnt", "didn't", "isnt", "isn't",
        "wasnt", "wasn't", "arent", "aren't", "cant", "can't", "cannot",
        "wont", "won't", "shouldnt", "shouldn't", "aint", "ain't", "without",
    ]
    .into_iter()
    .collect();

    static ref BOOSTERS: HashSet<&'static str> = [
        "very", "extremely", "super", "really", "so", "totally", "absolutely",
        "incredibly", "hugely", "massively", "insanely", "mega",
    ]
    .into_iter()
    .collect();
}

/// Default lexicon model.
#[derive(Debug, Clone, Copy, Default)]
pub struct LexiconScorer;

impl LexiconScorer {
    pub fn new() -> Self {
        Self
    }
}

fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .filter(|t| !t.is_empty())
        .map(|t| t.trim_matches('\'').to_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}

fn normalize(sum: f64) -> f64 {
    sum / (sum * sum + NORMALIZATION_ALPHA).sqrt()
}

impl PolarityScorer for LexiconScorer {
    fn polarity(&self, text: &str) -> f64 {
        let tokens = tokenize(text);
        let mut sum = 0.0;

        for (i, token) in tokens.iter().enumerate() {
            let Some(&base) = VALENCE.get(token.as_str()) else {
                continue;
            };
            let mut valence = base;

            if i > 0 && BOOSTERS.contains(tokens[i - 1].as_str()) {
                valence += BOOSTER_INCREMENT * valence.signum();
            }

            let window = i.saturating_sub(NEGATION_LOOKBACK)..i;
            if tokens[window].iter().any(|t| NEGATIONS.contains(t.as_str())) {
                valence *= NEGATION_SCALAR;
            }

            sum += valence;
        }

        if sum == 0.0 {
            return 0.0;
        }

        let bangs = text.matches('!').count().min(MAX_EXCLAMATIONS);
        sum += EXCLAMATION_INCREMENT * bangs as f64 * sum.signum();

        normalize(sum).clamp(-1.0, 1.0)
    }
}

/// Mean polarity of `texts` rounded to 2 decimals, `None` when empty.
pub fn mean_polarity<S, I>(scorer: &S, texts: I) -> Option<f64>
where
    S: PolarityScorer + ?Sized,
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let (total, count) = texts
        .into_iter()
        .fold((0.0, 0usize), |(total, count), t| (total + scorer.polarity(t.as_ref()), count + 1));
    if count == 0 {
        None
    } else {
        Some(round_to(total / count as f64, 2))
    }
}
