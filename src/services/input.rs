//! 输入解析
//!
//! 规范化股票代码、区间选项和预测参数

use thiserror::Error;

use crate::config::ForecastConfig;
use crate::models::Period;

/// 预测天数范围
pub const MIN_HORIZON_DAYS: u32 = 30;
pub const MAX_HORIZON_DAYS: u32 = 365;

/// 季节性先验强度范围
pub const MIN_SEASONALITY_PRIOR_SCALE: f64 = 0.01;
pub const MAX_SEASONALITY_PRIOR_SCALE: f64 = 0.5;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum InputError {
    #[error("No ticker provided")]
    MissingTicker,

    #[error("Unknown period: {0}")]
    UnknownPeriod(String),

    #[error("Forecast horizon must be between 30 and 365 days, got {0}")]
    HorizonOutOfRange(u32),

    #[error("Seasonality prior scale must be between 0.01 and 0.5, got {0}")]
    SeasonalityOutOfRange(f64),
}

/// 预测参数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForecastSettings {
    pub horizon_days: u32,
    pub seasonality_prior_scale: f64,
}

/// 解析后的输入
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedInput {
    /// 大写、去空白的股票代码
    pub ticker: String,
    pub period: Period,
    pub forecast: ForecastSettings,
}

/// 规范化股票代码，空代码视为未输入
pub fn normalize_ticker(raw: &str) -> Result<String, InputError> {
    let ticker = raw.trim().to_uppercase();
    if ticker.is_empty() {
        return Err(InputError::MissingTicker);
    }
    Ok(ticker)
}

/// 按名称或代码解析区间，不区分大小写；缺省为第一个选项
pub fn parse_period(raw: Option<&str>) -> Result<Period, InputError> {
    let value = match raw.map(str::trim) {
        None | Some("") => return Ok(Period::ALL[0]),
        Some(value) => value,
    };

    Period::ALL
        .iter()
        .copied()
        .find(|p| p.label().eq_ignore_ascii_case(value) || p.code().eq_ignore_ascii_case(value))
        .ok_or_else(|| InputError::UnknownPeriod(value.to_string()))
}

/// 校验预测参数，缺省值取自配置
pub fn resolve_forecast(
    horizon: Option<u32>,
    seasonality: Option<f64>,
    defaults: &ForecastConfig,
) -> Result<ForecastSettings, InputError> {
    let horizon_days = horizon.unwrap_or(defaults.default_horizon_days);
    if !(MIN_HORIZON_DAYS..=MAX_HORIZON_DAYS).contains(&horizon_days) {
        return Err(InputError::HorizonOutOfRange(horizon_days));
    }

    let seasonality_prior_scale = seasonality.unwrap_or(defaults.default_seasonality_prior_scale);
    if !(MIN_SEASONALITY_PRIOR_SCALE..=MAX_SEASONALITY_PRIOR_SCALE).contains(&seasonality_prior_scale) {
        return Err(InputError::SeasonalityOutOfRange(seasonality_prior_scale));
    }

    Ok(ForecastSettings {
        horizon_days,
        seasonality_prior_scale,
    })
}

/// 解析全部用户输入
///
/// 股票代码优先校验：为空时直接返回 MissingTicker
pub fn resolve(
    ticker: &str,
    period: Option<&str>,
    horizon: Option<u32>,
    seasonality: Option<f64>,
    defaults: &ForecastConfig,
) -> Result<ResolvedInput, InputError> {
    let ticker = normalize_ticker(ticker)?;
    let period = parse_period(period)?;
    let forecast = resolve_forecast(horizon, seasonality, defaults)?;

    Ok(ResolvedInput {
        ticker,
        period,
        forecast,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_ticker() {
        assert_eq!(normalize_ticker("  aapl ").unwrap(), "AAPL");
        assert_eq!(normalize_ticker("brk-b").unwrap(), "BRK-B");
        assert_eq!(normalize_ticker("   "), Err(InputError::MissingTicker));
        assert_eq!(normalize_ticker(""), Err(InputError::MissingTicker));
    }

    #[test]
    fn test_parse_period_by_label_and_code() {
        assert_eq!(parse_period(Some("1 Year")).unwrap(), Period::OneYear);
        assert_eq!(parse_period(Some("1y")).unwrap(), Period::OneYear);
        assert_eq!(parse_period(Some("5 years")).unwrap(), Period::FiveYears);
        assert_eq!(parse_period(Some("MAX")).unwrap(), Period::Max);
        assert_eq!(parse_period(None).unwrap(), Period::OneMonth);
        assert_eq!(parse_period(Some(" ")).unwrap(), Period::OneMonth);
        assert_eq!(
            parse_period(Some("10y")),
            Err(InputError::UnknownPeriod("10y".to_string()))
        );
    }

    #[test]
    fn test_forecast_ranges() {
        let defaults = ForecastConfig::default();

        let settings = resolve_forecast(None, None, &defaults).unwrap();
        assert_eq!(settings.horizon_days, 180);
        assert_eq!(settings.seasonality_prior_scale, 0.1);

        assert!(resolve_forecast(Some(30), Some(0.01), &defaults).is_ok());
        assert!(resolve_forecast(Some(365), Some(0.5), &defaults).is_ok());
        assert_eq!(
            resolve_forecast(Some(29), None, &defaults),
            Err(InputError::HorizonOutOfRange(29))
        );
        assert_eq!(
            resolve_forecast(Some(366), None, &defaults),
            Err(InputError::HorizonOutOfRange(366))
        );
        assert_eq!(
            resolve_forecast(None, Some(0.6), &defaults),
            Err(InputError::SeasonalityOutOfRange(0.6))
        );
    }

    #[test]
    fn test_missing_ticker_checked_first() {
        let defaults = ForecastConfig::default();
        let result = resolve(" ", Some("bogus"), Some(1), None, &defaults);
        assert_eq!(result, Err(InputError::MissingTicker));
    }

    #[test]
    fn test_resolve_full() {
        let defaults = ForecastConfig::default();
        let input = resolve("tsla", Some("6 Months"), Some(90), Some(0.2), &defaults).unwrap();
        assert_eq!(input.ticker, "TSLA");
        assert_eq!(input.period, Period::SixMonths);
        assert_eq!(input.forecast.horizon_days, 90);
        assert_eq!(input.forecast.seasonality_prior_scale, 0.2);
    }
}
