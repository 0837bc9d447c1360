//! 展示格式化
//!
//! 大数缩写、"N/A" 缺省值和情绪标签都集中在这里

use crate::models::SentimentLabel;

/// 缺失字段的统一占位
pub const NOT_AVAILABLE: &str = "N/A";

const TRILLION: f64 = 1e12;
const BILLION: f64 = 1e9;
const MILLION: f64 = 1e6;

/// 按量级缩写金额
///
/// 阈值按万亿、十亿、百万降序判断，取最大的适用量级；
/// 不足百万时输出千分位数字
pub fn scale_magnitude(value: Option<f64>, currency: &str) -> String {
    let value = match value {
        Some(v) => v,
        None => return NOT_AVAILABLE.to_string(),
    };

    if value >= TRILLION {
        format!("{:.2} Trillion {}", value / TRILLION, currency)
    } else if value >= BILLION {
        format!("{:.2} Billion {}", value / BILLION, currency)
    } else if value >= MILLION {
        format!("{:.2} Million {}", value / MILLION, currency)
    } else {
        format!("{} {}", with_thousands_separator(value), currency)
    }
}

/// 千分位格式化，整数值不带小数部分
pub fn with_thousands_separator(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }

    let text = value.to_string();
    let (sign, unsigned) = match text.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", text.as_str()),
    };
    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (unsigned, None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    match frac_part {
        Some(frac) => format!("{}{}.{}", sign, grouped, frac),
        None => format!("{}{}", sign, grouped),
    }
}

/// 情绪得分映射为三分类标签
pub fn classify_sentiment(polarity: f64) -> SentimentLabel {
    if polarity > 0.0 {
        SentimentLabel::Positive
    } else if polarity < 0.0 {
        SentimentLabel::Negative
    } else {
        SentimentLabel::Neutral
    }
}

/// 文本字段，缺失时为 "N/A"
pub fn display_text(value: Option<&str>) -> String {
    text_or(value, NOT_AVAILABLE)
}

/// 文本字段，缺失或空白时使用给定占位
pub fn text_or(value: Option<&str>, fallback: &str) -> String {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => fallback.to_string(),
    }
}

/// 原样输出数值，缺失时为 "N/A"
pub fn display_number(value: Option<f64>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => NOT_AVAILABLE.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_magnitude_examples() {
        assert_eq!(scale_magnitude(Some(1.5e12), "USD"), "1.50 Trillion USD");
        assert_eq!(scale_magnitude(Some(2.3e9), "USD"), "2.30 Billion USD");
        assert_eq!(scale_magnitude(Some(4.56e6), "EUR"), "4.56 Million EUR");
        assert_eq!(scale_magnitude(Some(999.0), "USD"), "999 USD");
        assert_eq!(scale_magnitude(None, "USD"), "N/A");
    }

    #[test]
    fn test_scale_thresholds_inclusive() {
        assert_eq!(scale_magnitude(Some(1e12), "USD"), "1.00 Trillion USD");
        assert_eq!(scale_magnitude(Some(1e9), "USD"), "1.00 Billion USD");
        assert_eq!(scale_magnitude(Some(1e6), "USD"), "1.00 Million USD");
        assert_eq!(scale_magnitude(Some(999_999.0), "USD"), "999,999 USD");
    }

    #[test]
    fn test_scale_selection_monotonic() {
        for value in [1e9, 1.2e9, 9.99e11, 5e12, 3.3e15] {
            let text = scale_magnitude(Some(value), "USD");
            assert!(!text.contains("Million"), "{} -> {}", value, text);
        }
    }

    #[test]
    fn test_thousands_separator() {
        assert_eq!(with_thousands_separator(0.0), "0");
        assert_eq!(with_thousands_separator(1234.0), "1,234");
        assert_eq!(with_thousands_separator(123456.5), "123,456.5");
        assert_eq!(with_thousands_separator(-5_000_000_000.0), "-5,000,000,000");
    }

    #[test]
    fn test_negative_values_fall_through_unscaled() {
        assert_eq!(scale_magnitude(Some(-2_500_000.0), "USD"), "-2,500,000 USD");
    }

    #[test]
    fn test_classify_sentiment() {
        assert_eq!(classify_sentiment(0.4), SentimentLabel::Positive);
        assert_eq!(classify_sentiment(-0.1), SentimentLabel::Negative);
        assert_eq!(classify_sentiment(0.0), SentimentLabel::Neutral);
        assert_eq!(classify_sentiment(-0.0), SentimentLabel::Neutral);
    }

    #[test]
    fn test_display_fallbacks() {
        assert_eq!(display_text(Some("Technology")), "Technology");
        assert_eq!(display_text(None), "N/A");
        assert_eq!(display_text(Some("  ")), "N/A");
        assert_eq!(text_or(None, "Unknown Publisher"), "Unknown Publisher");
        assert_eq!(display_number(Some(0.44)), "0.44");
        assert_eq!(display_number(None), "N/A");
    }
}
