//! 股票数据模型
//!
//! 定义行情、基本面、新闻和预测相关的数据结构

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 可选时间区间
///
/// 固定枚举，每个选项对应数据源的区间代码
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Period {
    OneMonth,
    ThreeMonths,
    SixMonths,
    OneYear,
    TwoYears,
    FiveYears,
    Max,
}

impl Period {
    /// 按界面展示顺序排列的全部选项
    pub const ALL: [Period; 7] = [
        Period::OneMonth,
        Period::ThreeMonths,
        Period::SixMonths,
        Period::OneYear,
        Period::TwoYears,
        Period::FiveYears,
        Period::Max,
    ];

    /// 界面展示名称
    pub fn label(&self) -> &'static str {
        match self {
            Period::OneMonth => "1 Month",
            Period::ThreeMonths => "3 Months",
            Period::SixMonths => "6 Months",
            Period::OneYear => "1 Year",
            Period::TwoYears => "2 Years",
            Period::FiveYears => "5 Years",
            Period::Max => "Max",
        }
    }

    /// 数据源区间代码
    pub fn code(&self) -> &'static str {
        match self {
            Period::OneMonth => "1mo",
            Period::ThreeMonths => "3mo",
            Period::SixMonths => "6mo",
            Period::OneYear => "1y",
            Period::TwoYears => "2y",
            Period::FiveYears => "5y",
            Period::Max => "max",
        }
    }
}

/// 区间选项（供前端下拉框使用）
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PeriodOption {
    /// 展示名称，如 "1 Year"
    pub label: String,
    /// 区间代码，如 "1y"
    pub code: String,
}

impl From<Period> for PeriodOption {
    fn from(period: Period) -> Self {
        Self {
            label: period.label().to_string(),
            code: period.code().to_string(),
        }
    }
}

/// 单根日K线
///
/// 时间戳带交易所时区偏移
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PriceBar {
    /// 交易日（交易所本地时间零点）
    pub timestamp: DateTime<FixedOffset>,
    /// 开盘价
    pub open: f64,
    /// 最高价
    pub high: f64,
    /// 最低价
    pub low: f64,
    /// 收盘价
    pub close: f64,
    /// 成交量
    pub volume: u64,
}

/// 价格序列
///
/// 按时间升序排列的K线，附带逐根涨跌幅。构造后不可修改。
#[derive(Debug, Clone)]
pub struct PriceSeries {
    bars: Vec<PriceBar>,
    pct_change: Vec<Option<f64>>,
}

impl PriceSeries {
    /// 由K线构造序列并计算涨跌幅
    ///
    /// 第一根K线的涨跌幅未定义；前收盘价为 0 时同样未定义
    pub fn new(mut bars: Vec<PriceBar>) -> Self {
        bars.sort_by_key(|bar| bar.timestamp);

        let pct_change = bars
            .iter()
            .enumerate()
            .map(|(i, bar)| {
                if i == 0 {
                    return None;
                }
                let prev_close = bars[i - 1].close;
                if prev_close == 0.0 {
                    None
                } else {
                    Some((bar.close - prev_close) / prev_close * 100.0)
                }
            })
            .collect();

        Self { bars, pct_change }
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    /// 所有已定义的涨跌幅
    pub fn defined_changes(&self) -> impl Iterator<Item = f64> + '_ {
        self.pct_change.iter().filter_map(|change| *change)
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// 展开为原始数据表格行
    pub fn rows(&self) -> Vec<PriceRow> {
        self.bars
            .iter()
            .zip(self.pct_change.iter())
            .map(|(bar, change)| PriceRow {
                timestamp: bar.timestamp,
                open: bar.open,
                high: bar.high,
                low: bar.low,
                close: bar.close,
                volume: bar.volume,
                pct_change: *change,
            })
            .collect()
    }
}

/// 原始数据表格行
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PriceRow {
    pub timestamp: DateTime<FixedOffset>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
    /// 涨跌幅（%），首行为空
    pub pct_change: Option<f64>,
}

/// 基本面快照
///
/// 数据源返回的字段均可能缺失
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FundamentalSnapshot {
    /// 行业板块
    pub sector: Option<String>,
    /// 细分行业
    pub industry: Option<String>,
    /// 总市值
    pub market_cap: Option<f64>,
    /// 总营收
    pub total_revenue: Option<f64>,
    /// 归母净利润
    pub net_income: Option<f64>,
    /// 股息率
    pub dividend_yield: Option<f64>,
    /// 财报货币
    pub financial_currency: Option<String>,
}

/// 财务报表类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatementKind {
    BalanceSheet,
    IncomeStatement,
    CashFlow,
}

/// 单个报告期
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatementPeriod {
    /// 报告期截止日
    pub end_date: NaiveDate,
    /// 科目名 -> 数值
    pub items: BTreeMap<String, f64>,
}

/// 财务报表
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FinancialStatement {
    pub kind: StatementKind,
    pub periods: Vec<StatementPeriod>,
}

/// 数据源返回的原始新闻
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NewsArticle {
    pub title: Option<String>,
    pub publisher: Option<String>,
    pub url: Option<String>,
    pub published_at: Option<DateTime<chrono::Utc>>,
}

/// 情绪标签
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
}

/// 带情绪标签的新闻条目
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewsItem {
    pub title: String,
    pub publisher: String,
    pub url: String,
    pub publish_time: String,
    /// 标题情绪得分 [-1, 1]
    pub polarity: f64,
    pub sentiment_label: SentimentLabel,
}

/// 行情网关一次查询的完整结果
#[derive(Debug, Clone, Default)]
pub struct MarketData {
    pub bars: Vec<PriceBar>,
    pub fundamentals: FundamentalSnapshot,
    pub statements: Vec<FinancialStatement>,
    pub news: Vec<NewsArticle>,
}

impl MarketData {
    /// 无数据（未知代码等）
    pub fn empty() -> Self {
        Self::default()
    }
}

/// 预测点
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub predicted_value: f64,
}

/// 预测分量（趋势 + 季节项）
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ForecastComponentPoint {
    pub date: NaiveDate,
    pub trend: f64,
    pub yearly: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weekly: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub daily: Option<f64>,
}

/// 股票查询参数
#[derive(Debug, Default, Deserialize)]
pub struct StockQuery {
    /// 时间区间（名称或代码）
    pub period: Option<String>,
    /// 预测天数
    pub horizon: Option<u32>,
    /// 年季节性先验强度
    pub seasonality: Option<f64>,
}

/// 看板查询参数
#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    /// 股票代码
    #[serde(default)]
    pub ticker: String,
    pub period: Option<String>,
    pub horizon: Option<u32>,
    pub seasonality: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn bar(day: u32, close: f64) -> PriceBar {
        let offset = FixedOffset::west_opt(4 * 3600).unwrap();
        PriceBar {
            timestamp: offset.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap(),
            open: close,
            high: close,
            low: close,
            close,
            volume: 1_000,
        }
    }

    #[test]
    fn test_pct_change_first_bar_undefined() {
        let series = PriceSeries::new(vec![bar(2, 100.0), bar(3, 110.0), bar(4, 99.0)]);
        let changes: Vec<Option<f64>> = series.rows().iter().map(|r| r.pct_change).collect();

        assert_eq!(changes[0], None);
        assert!((changes[1].unwrap() - 10.0).abs() < 1e-12);
        assert!((changes[2].unwrap() + 10.0).abs() < 1e-12);
    }

    #[test]
    fn test_series_sorted_ascending() {
        let series = PriceSeries::new(vec![bar(5, 3.0), bar(2, 1.0), bar(3, 2.0)]);
        let closes: Vec<f64> = series.bars().iter().map(|b| b.close).collect();
        assert_eq!(closes, vec![1.0, 2.0, 3.0]);
        assert_eq!(series.rows()[1].pct_change, Some(100.0));
    }

    #[test]
    fn test_zero_previous_close_is_undefined() {
        let series = PriceSeries::new(vec![bar(2, 0.0), bar(3, 5.0)]);
        assert_eq!(series.rows()[1].pct_change, None);
        assert_eq!(series.defined_changes().count(), 0);
    }

    #[test]
    fn test_empty_series() {
        let series = PriceSeries::new(Vec::new());
        assert!(series.is_empty());
        assert_eq!(series.defined_changes().count(), 0);
    }

    #[test]
    fn test_rows_carry_pct_change() {
        let series = PriceSeries::new(vec![bar(2, 50.0), bar(3, 55.0)]);
        let rows = series.rows();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].pct_change, None);
        assert!((rows[1].pct_change.unwrap() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_period_codes() {
        let codes: Vec<&str> = Period::ALL.iter().map(|p| p.code()).collect();
        assert_eq!(codes, vec!["1mo", "3mo", "6mo", "1y", "2y", "5y", "max"]);
        assert_eq!(Period::OneYear.label(), "1 Year");
    }
}
