//! Yahoo Finance 数据源
//!
//! 对接 query1.finance.yahoo.com：
//! - /v8/finance/chart：日K线
//! - /v10/finance/quoteSummary：基本面和财报（需要 cookie + crumb）
//! - /v1/finance/search：新闻

use anyhow::{anyhow, Result};
use chrono::{DateTime, FixedOffset, NaiveDate, Offset, TimeZone, Utc};
use chrono_tz::Tz;
use futures::future::BoxFuture;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::sync::Mutex;
use url::Url;

use super::MarketDataGateway;
use crate::config::{ApiConfig, YahooConfig};
use crate::models::{
    DashboardView, FinancialStatement, FundamentalSnapshot, MarketData, NewsArticle, Period, PriceBar,
    StatementKind, StatementPeriod,
};

/// 日线
const CHART_INTERVAL: &str = "1d";
const REFERER: &str = "https://finance.yahoo.com/";

/// quoteSummary 请求的模块
const QUOTE_SUMMARY_MODULES: &str = "assetProfile,price,summaryDetail,financialData,defaultKeyStatistics,balanceSheetHistory,incomeStatementHistory,cashflowStatementHistory";

/// 财报模块名、列表字段名、报表类型
const STATEMENT_MODULES: [(&str, &str, StatementKind); 3] = [
    ("balanceSheetHistory", "balanceSheetStatements", StatementKind::BalanceSheet),
    ("incomeStatementHistory", "incomeStatementHistory", StatementKind::IncomeStatement),
    ("cashflowStatementHistory", "cashflowStatements", StatementKind::CashFlow),
];

/// Yahoo Finance 网关
///
/// 共享一个带 cookie 的 HTTP 客户端，crumb 首次使用时获取
pub struct YahooGateway {
    client: Client,
    config: YahooConfig,
    crumb: Mutex<Option<String>>,
}

impl YahooGateway {
    pub fn new(config: &YahooConfig, api: &ApiConfig) -> Result<Self> {
        let client = Client::builder()
            .cookie_store(true)
            .gzip(true)
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(api.timeout_secs))
            .connect_timeout(Duration::from_secs(api.connect_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            config: config.clone(),
            crumb: Mutex::new(None),
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.config.base_url)?;
        url.path_segments_mut()
            .map_err(|_| anyhow!("无效的数据源地址: {}", self.config.base_url))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// 获取日K线，未知代码返回空列表
    async fn fetch_history(&self, ticker: &str, period: Period) -> Result<Vec<PriceBar>> {
        let mut url = self.endpoint(&["v8", "finance", "chart", ticker])?;
        url.query_pairs_mut()
            .append_pair("range", period.code())
            .append_pair("interval", CHART_INTERVAL)
            .append_pair("includePrePost", "false")
            .append_pair("events", "div,splits");

        log::debug!("请求K线数据 URL: {}", url);

        let response = self.client.get(url).header("Referer", REFERER).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            log::info!("数据源未找到代码 {}", ticker);
            return Ok(Vec::new());
        }
        if !response.status().is_success() {
            return Err(anyhow!("获取历史数据失败: {}", response.status()));
        }

        let text = response.text().await?;
        parse_chart(&text)
    }

    /// 获取 crumb，结果在会话内复用
    async fn crumb(&self) -> Result<String> {
        let mut guard = self.crumb.lock().await;
        if let Some(crumb) = guard.as_ref() {
            return Ok(crumb.clone());
        }

        // 该页面通常返回 404，只需要它下发的 cookie
        self.client.get(&self.config.cookie_url).send().await?;

        let url = self.endpoint(&["v1", "test", "getcrumb"])?;
        let response = self.client.get(url).header("Referer", REFERER).send().await?;
        if !response.status().is_success() {
            return Err(anyhow!("获取 crumb 失败: {}", response.status()));
        }

        let crumb = response.text().await?.trim().to_string();
        if crumb.is_empty() || crumb.contains('<') {
            return Err(anyhow!("crumb 响应无效"));
        }

        log::debug!("获取 crumb 成功");
        *guard = Some(crumb.clone());
        Ok(crumb)
    }

    /// 获取基本面和财报
    async fn fetch_quote_summary(
        &self,
        ticker: &str,
    ) -> Result<(FundamentalSnapshot, Vec<FinancialStatement>)> {
        let crumb = self.crumb().await?;

        let mut url = self.endpoint(&["v10", "finance", "quoteSummary", ticker])?;
        url.query_pairs_mut()
            .append_pair("modules", QUOTE_SUMMARY_MODULES)
            .append_pair("crumb", &crumb);

        let response = self.client.get(url).header("Referer", REFERER).send().await?;

        match response.status() {
            StatusCode::NOT_FOUND => {
                log::warn!("{} 无基本面数据", ticker);
                return Ok((FundamentalSnapshot::default(), Vec::new()));
            }
            StatusCode::UNAUTHORIZED => {
                // 下次请求重新获取
                *self.crumb.lock().await = None;
                return Err(anyhow!("获取基本面数据失败: crumb 已失效"));
            }
            status if !status.is_success() => {
                return Err(anyhow!("获取基本面数据失败: {}", status));
            }
            _ => {}
        }

        let text = response.text().await?;
        parse_quote_summary(&text)
    }

    /// 获取最新新闻
    async fn fetch_news(&self, ticker: &str) -> Result<Vec<NewsArticle>> {
        let mut url = self.endpoint(&["v1", "finance", "search"])?;
        url.query_pairs_mut()
            .append_pair("q", ticker)
            .append_pair("quotesCount", "0")
            .append_pair("newsCount", &self.config.news_count.to_string());

        let response = self.client.get(url).header("Referer", REFERER).send().await?;
        if !response.status().is_success() {
            return Err(anyhow!("获取新闻失败: {}", response.status()));
        }

        let text = response.text().await?;
        parse_news(&text)
    }
}

impl MarketDataGateway for YahooGateway {
    fn fetch<'a>(
        &'a self,
        ticker: &'a str,
        period: Period,
        view: DashboardView,
    ) -> BoxFuture<'a, Result<MarketData>> {
        Box::pin(async move {
            let bars = self.fetch_history(ticker, period).await?;
            if bars.is_empty() {
                // 无行情时不再请求基本面和新闻
                return Ok(MarketData::empty());
            }

            let (fundamentals, statements) = if view.includes_fundamentals() {
                self.fetch_quote_summary(ticker).await?
            } else {
                (FundamentalSnapshot::default(), Vec::new())
            };
            let news = if view.includes_news() {
                self.fetch_news(ticker).await?
            } else {
                Vec::new()
            };

            log::info!(
                "{} 数据获取完成 ({:?}): {} 根K线, {} 份财报, {} 条新闻",
                ticker,
                view,
                bars.len(),
                statements.len(),
                news.len()
            );

            Ok(MarketData {
                bars,
                fundamentals,
                statements,
                news,
            })
        })
    }
}

// ==================== 响应解析 ====================

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartEnvelope,
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Option<Vec<i64>>,
    indicators: ChartIndicators,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    #[serde(default)]
    exchange_timezone_name: Option<String>,
    #[serde(default)]
    gmtoffset: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    #[serde(default)]
    quote: Vec<ChartQuote>,
}

#[derive(Debug, Deserialize)]
struct ChartQuote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

/// 交易所时区
enum ExchangeZone {
    Named(Tz),
    Fixed(FixedOffset),
}

impl ExchangeZone {
    fn from_meta(meta: &ChartMeta) -> Self {
        if let Some(tz) = meta
            .exchange_timezone_name
            .as_deref()
            .and_then(|name| name.parse::<Tz>().ok())
        {
            return ExchangeZone::Named(tz);
        }
        let offset = meta
            .gmtoffset
            .and_then(FixedOffset::east_opt)
            .unwrap_or_else(|| Utc.fix());
        ExchangeZone::Fixed(offset)
    }

    /// Unix 时间戳转为交易所本地日期零点
    fn trading_day(&self, ts: i64) -> Option<DateTime<FixedOffset>> {
        let utc = Utc.timestamp_opt(ts, 0).single()?;
        match self {
            ExchangeZone::Named(tz) => {
                let midnight = utc.with_timezone(tz).date_naive().and_hms_opt(0, 0, 0)?;
                tz.from_local_datetime(&midnight)
                    .earliest()
                    .map(|dt| dt.fixed_offset())
            }
            ExchangeZone::Fixed(offset) => {
                let midnight = utc.with_timezone(offset).date_naive().and_hms_opt(0, 0, 0)?;
                offset.from_local_datetime(&midnight).single()
            }
        }
    }
}

/// 解析 chart 响应
///
/// 接口报错（如代码不存在）或无数据时返回空列表
fn parse_chart(body: &str) -> Result<Vec<PriceBar>> {
    let response: ChartResponse = serde_json::from_str(body)?;

    if let Some(error) = response.chart.error.as_ref().filter(|e| !e.is_null()) {
        log::info!("chart 接口返回错误: {}", error);
        return Ok(Vec::new());
    }

    let Some(result) = response.chart.result.and_then(|r| r.into_iter().next()) else {
        return Ok(Vec::new());
    };
    let (Some(timestamps), Some(quote)) = (result.timestamp.as_ref(), result.indicators.quote.first())
    else {
        return Ok(Vec::new());
    };

    let zone = ExchangeZone::from_meta(&result.meta);
    let mut bars: Vec<PriceBar> = Vec::with_capacity(timestamps.len());

    for (i, &ts) in timestamps.iter().enumerate() {
        // OHLC 不全的K线丢弃
        let (Some(Some(open)), Some(Some(high)), Some(Some(low)), Some(Some(close))) = (
            quote.open.get(i),
            quote.high.get(i),
            quote.low.get(i),
            quote.close.get(i),
        ) else {
            continue;
        };
        let Some(timestamp) = zone.trading_day(ts) else {
            continue;
        };
        let volume = quote.volume.get(i).copied().flatten().unwrap_or(0.0).max(0.0) as u64;

        // 同一交易日保留最后一条（盘中实时K线）
        if bars.last().map(|bar| bar.timestamp) == Some(timestamp) {
            bars.pop();
        }
        bars.push(PriceBar {
            timestamp,
            open: *open,
            high: *high,
            low: *low,
            close: *close,
            volume,
        });
    }

    Ok(bars)
}

#[derive(Debug, Deserialize)]
struct QuoteSummaryResponse {
    #[serde(rename = "quoteSummary")]
    quote_summary: QuoteSummaryEnvelope,
}

#[derive(Debug, Deserialize)]
struct QuoteSummaryEnvelope {
    #[serde(default)]
    result: Option<Vec<Value>>,
    #[serde(default)]
    error: Option<Value>,
}

/// 数值字段，兼容 {"raw": 1.0, "fmt": "1"} 和裸数字两种格式
fn raw_number(value: &Value) -> Option<f64> {
    value
        .get("raw")
        .and_then(Value::as_f64)
        .or_else(|| value.as_f64())
        .filter(|v| v.is_finite())
}

fn module_number(summary: &Value, module: &str, field: &str) -> Option<f64> {
    summary.get(module).and_then(|m| m.get(field)).and_then(raw_number)
}

fn module_text(summary: &Value, module: &str, field: &str) -> Option<String> {
    summary
        .get(module)
        .and_then(|m| m.get(field))
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn parse_fundamentals(summary: &Value) -> FundamentalSnapshot {
    FundamentalSnapshot {
        sector: module_text(summary, "assetProfile", "sector"),
        industry: module_text(summary, "assetProfile", "industry"),
        market_cap: module_number(summary, "price", "marketCap")
            .or_else(|| module_number(summary, "summaryDetail", "marketCap")),
        total_revenue: module_number(summary, "financialData", "totalRevenue"),
        net_income: module_number(summary, "defaultKeyStatistics", "netIncomeToCommon"),
        dividend_yield: module_number(summary, "summaryDetail", "dividendYield").map(fraction_to_percent),
        financial_currency: module_text(summary, "financialData", "financialCurrency"),
    }
}

/// 小数转百分数（0.0044 → 0.44），保留四位小数
fn fraction_to_percent(fraction: f64) -> f64 {
    (fraction * 1e6).round() / 1e4
}

/// 报告期截止日，优先使用时间戳
fn statement_end_date(entry: &Value) -> Option<NaiveDate> {
    let end_date = entry.get("endDate")?;
    if let Some(raw) = end_date.get("raw").and_then(Value::as_i64) {
        return Utc.timestamp_opt(raw, 0).single().map(|dt| dt.date_naive());
    }
    end_date
        .get("fmt")
        .and_then(Value::as_str)
        .and_then(|fmt| NaiveDate::parse_from_str(fmt, "%Y-%m-%d").ok())
}

fn parse_statements(summary: &Value) -> Vec<FinancialStatement> {
    STATEMENT_MODULES
        .iter()
        .filter_map(|(module, list_field, kind)| {
            let entries = summary.get(module)?.get(list_field)?.as_array()?;

            let periods: Vec<StatementPeriod> = entries
                .iter()
                .filter_map(|entry| {
                    let end_date = statement_end_date(entry)?;
                    let items: BTreeMap<String, f64> = entry
                        .as_object()?
                        .iter()
                        .filter(|(key, _)| key.as_str() != "endDate" && key.as_str() != "maxAge")
                        .filter_map(|(key, value)| raw_number(value).map(|v| (key.clone(), v)))
                        .collect();
                    Some(StatementPeriod { end_date, items })
                })
                .collect();

            if periods.is_empty() {
                None
            } else {
                Some(FinancialStatement {
                    kind: *kind,
                    periods,
                })
            }
        })
        .collect()
}

/// 解析 quoteSummary 响应
fn parse_quote_summary(body: &str) -> Result<(FundamentalSnapshot, Vec<FinancialStatement>)> {
    let response: QuoteSummaryResponse = serde_json::from_str(body)?;

    if let Some(error) = response.quote_summary.error.as_ref().filter(|e| !e.is_null()) {
        return Err(anyhow!("quoteSummary 接口返回错误: {}", error));
    }

    let summary = response
        .quote_summary
        .result
        .and_then(|r| r.into_iter().next())
        .unwrap_or(Value::Null);

    Ok((parse_fundamentals(&summary), parse_statements(&summary)))
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    news: Vec<SearchNews>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchNews {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    publisher: Option<String>,
    #[serde(default)]
    link: Option<String>,
    #[serde(default)]
    provider_publish_time: Option<i64>,
}

/// 解析新闻搜索响应
fn parse_news(body: &str) -> Result<Vec<NewsArticle>> {
    let response: SearchResponse = serde_json::from_str(body)?;

    Ok(response
        .news
        .into_iter()
        .map(|item| NewsArticle {
            title: item.title,
            publisher: item.publisher,
            url: item.link,
            published_at: item
                .provider_publish_time
                .and_then(|ts| Utc.timestamp_opt(ts, 0).single()),
        })
        .collect())
}
