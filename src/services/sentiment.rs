//! 新闻标题情绪打分
//!
//! 词典法：匹配情绪词取平均，处理否定词和程度副词

use regex::Regex;
use std::collections::HashMap;

/// 情绪分类器
pub trait SentimentClassifier: Send + Sync {
    /// 文本情绪得分，范围 [-1, 1]
    fn polarity(&self, text: &str) -> f64;
}

/// 否定词
const NEGATION_WORDS: &[&str] = &[
    "not", "no", "never", "don't", "doesn't", "didn't", "isn't", "aren't", "wasn't", "weren't",
    "won't", "wouldn't", "can't", "cannot", "couldn't", "shouldn't", "hardly", "barely",
    "neither", "nor", "without",
];

/// 否定词作用范围（向前看的词数）
const NEGATION_WINDOW: usize = 3;

/// 否定后得分乘数
const NEGATION_FACTOR: f64 = -0.5;

/// 程度副词及其放大倍数
const INTENSIFIERS: &[(&str, f64)] = &[
    ("very", 1.3),
    ("really", 1.3),
    ("extremely", 1.5),
    ("highly", 1.3),
    ("hugely", 1.5),
    ("sharply", 1.4),
    ("significantly", 1.3),
    ("slightly", 0.5),
    ("somewhat", 0.7),
];

/// 情绪词典
const LEXICON: &[(&str, f64)] = &[
    // 通用正面词
    ("good", 0.7),
    ("great", 0.8),
    ("best", 1.0),
    ("better", 0.5),
    ("excellent", 1.0),
    ("positive", 0.23),
    ("strong", 0.43),
    ("stronger", 0.45),
    ("success", 0.6),
    ("successful", 0.75),
    ("win", 0.8),
    ("wins", 0.8),
    ("happy", 0.8),
    ("optimistic", 0.6),
    ("impressive", 1.0),
    ("beautiful", 0.85),
    ("new", 0.14),
    ("top", 0.5),
    ("high", 0.16),
    ("higher", 0.25),
    ("record", 0.3),
    ("huge", 0.4),
    ("bright", 0.7),
    ("free", 0.4),
    ("smart", 0.21),
    // 财经正面词
    ("bullish", 0.6),
    ("rally", 0.5),
    ("rallies", 0.5),
    ("surge", 0.5),
    ("surges", 0.5),
    ("soar", 0.6),
    ("soars", 0.6),
    ("gain", 0.4),
    ("gains", 0.4),
    ("profit", 0.4),
    ("profitable", 0.5),
    ("growth", 0.4),
    ("beat", 0.4),
    ("beats", 0.4),
    ("upgrade", 0.5),
    ("upgraded", 0.5),
    ("outperform", 0.5),
    ("rise", 0.3),
    ("rises", 0.3),
    ("jump", 0.4),
    ("jumps", 0.4),
    ("boost", 0.4),
    ("boosts", 0.4),
    ("breakthrough", 0.6),
    ("innovation", 0.4),
    ("exceed", 0.4),
    ("exceeds", 0.4),
    ("momentum", 0.3),
    ("rebound", 0.4),
    ("recovery", 0.4),
    ("robust", 0.5),
    ("upside", 0.4),
    ("buyback", 0.3),
    ("dividend", 0.2),
    // 通用负面词
    ("bad", -0.7),
    ("worse", -0.4),
    ("worst", -1.0),
    ("poor", -0.4),
    ("negative", -0.3),
    ("weak", -0.38),
    ("weaker", -0.4),
    ("fail", -0.5),
    ("fails", -0.5),
    ("failure", -0.5),
    ("terrible", -1.0),
    ("awful", -1.0),
    ("fear", -0.5),
    ("fears", -0.5),
    ("worried", -0.5),
    ("worry", -0.5),
    ("sad", -0.5),
    ("low", -0.16),
    ("lower", -0.25),
    ("difficult", -0.5),
    ("trouble", -0.5),
    ("crisis", -0.6),
    ("problem", -0.4),
    ("wrong", -0.5),
    // 财经负面词
    ("bearish", -0.6),
    ("decline", -0.4),
    ("declines", -0.4),
    ("loss", -0.5),
    ("losses", -0.5),
    ("fall", -0.4),
    ("falls", -0.4),
    ("plunge", -0.6),
    ("plunges", -0.6),
    ("crash", -0.8),
    ("crashes", -0.8),
    ("miss", -0.4),
    ("misses", -0.4),
    ("downgrade", -0.5),
    ("downgraded", -0.5),
    ("underperform", -0.5),
    ("drop", -0.4),
    ("drops", -0.4),
    ("slump", -0.5),
    ("slumps", -0.5),
    ("tumble", -0.5),
    ("tumbles", -0.5),
    ("sink", -0.4),
    ("sinks", -0.4),
    ("concern", -0.3),
    ("concerns", -0.3),
    ("risk", -0.2),
    ("risks", -0.2),
    ("warning", -0.4),
    ("warns", -0.4),
    ("lawsuit", -0.5),
    ("probe", -0.4),
    ("investigation", -0.4),
    ("recall", -0.4),
    ("bankruptcy", -0.8),
    ("layoff", -0.5),
    ("layoffs", -0.5),
    ("downside", -0.4),
    ("overvalued", -0.4),
    ("bubble", -0.4),
    ("headwind", -0.3),
    ("headwinds", -0.3),
];

/// 词典情绪分类器
pub struct LexiconSentiment {
    lexicon: HashMap<&'static str, f64>,
    intensifiers: HashMap<&'static str, f64>,
    token_re: Regex,
}

impl Default for LexiconSentiment {
    fn default() -> Self {
        Self::new()
    }
}

impl LexiconSentiment {
    pub fn new() -> Self {
        Self {
            lexicon: LEXICON.iter().copied().collect(),
            intensifiers: INTENSIFIERS.iter().copied().collect(),
            token_re: Regex::new(r"[a-z]+(?:['’][a-z]+)?").expect("valid token regex"),
        }
    }

    fn tokenize<'t>(&self, text: &'t str) -> Vec<&'t str> {
        self.token_re.find_iter(text).map(|m| m.as_str()).collect()
    }

    fn is_negation(word: &str) -> bool {
        let normalized = word.replace('’', "'");
        NEGATION_WORDS.contains(&normalized.as_str())
    }
}

impl SentimentClassifier for LexiconSentiment {
    fn polarity(&self, text: &str) -> f64 {
        let lowered = text.to_lowercase();
        let tokens = self.tokenize(&lowered);

        let mut scores = Vec::new();
        for (i, token) in tokens.iter().enumerate() {
            let Some(&base) = self.lexicon.get(*token) else {
                continue;
            };

            let mut score = base;
            if i > 0 {
                if let Some(&factor) = self.intensifiers.get(tokens[i - 1]) {
                    score *= factor;
                }
            }

            let window_start = i.saturating_sub(NEGATION_WINDOW);
            if tokens[window_start..i].iter().any(|w| Self::is_negation(w)) {
                score *= NEGATION_FACTOR;
            }

            scores.push(score.clamp(-1.0, 1.0));
        }

        if scores.is_empty() {
            return 0.0;
        }

        let mean = scores.iter().sum::<f64>() / scores.len() as f64;
        mean.clamp(-1.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SentimentLabel;
    use crate::services::formatter::classify_sentiment;

    fn label(text: &str) -> SentimentLabel {
        classify_sentiment(LexiconSentiment::new().polarity(text))
    }

    #[test]
    fn test_positive_headline() {
        assert_eq!(label("Apple shares surge after record profit"), SentimentLabel::Positive);
        assert_eq!(label("Analysts upgrade Microsoft on strong cloud growth"), SentimentLabel::Positive);
    }

    #[test]
    fn test_negative_headline() {
        assert_eq!(label("Tesla stock plunges as deliveries miss estimates"), SentimentLabel::Negative);
        assert_eq!(label("Regulators open probe into bank losses"), SentimentLabel::Negative);
    }

    #[test]
    fn test_neutral_headline() {
        let analyzer = LexiconSentiment::new();
        assert_eq!(analyzer.polarity("Apple to hold event on Tuesday"), 0.0);
        assert_eq!(analyzer.polarity(""), 0.0);
        assert_eq!(label("Nvidia announces quarterly earnings date"), SentimentLabel::Neutral);
    }

    #[test]
    fn test_negation_flips_sign() {
        let analyzer = LexiconSentiment::new();
        let plain = analyzer.polarity("results were good");
        let negated = analyzer.polarity("results were not good");
        assert!(plain > 0.0);
        assert!(negated < 0.0);
        assert!((negated - plain * NEGATION_FACTOR).abs() < 1e-12);
    }

    #[test]
    fn test_intensifier_scales_score() {
        let analyzer = LexiconSentiment::new();
        let plain = analyzer.polarity("a good quarter");
        let intense = analyzer.polarity("a very good quarter");
        assert!(intense > plain);
        assert!(intense <= 1.0);
    }

    #[test]
    fn test_polarity_bounded() {
        let analyzer = LexiconSentiment::new();
        for text in [
            "extremely best best excellent impressive",
            "extremely worst terrible awful crash",
            "Don't panic: stocks aren't crashing",
        ] {
            let score = analyzer.polarity(text);
            assert!((-1.0..=1.0).contains(&score), "{} -> {}", text, score);
        }
    }
}
