//! 看板编排
//!
//! 一次完整的交互流程：解析输入 → 拉取数据 → 统计 → 基本面 → 新闻情绪 → 预测。
//! 只计算当前视图需要的部分。

use thiserror::Error;

use crate::config::ForecastConfig;
use crate::models::{
    DashboardOutcome, DashboardReport, DashboardView, FundamentalSection, MarketData,
    NewsArticle, NewsItem, NewsSection, PeriodOption, PredictionSection, PriceSeries,
    PricingSection,
};
use crate::services::analytics::compute_statistics;
use crate::services::forecast::{forecast_closing_prices, ForecastError, ForecastModelFactory};
use crate::services::formatter::{
    classify_sentiment, display_number, display_text, scale_magnitude, text_or, NOT_AVAILABLE,
};
use crate::services::gateway::MarketDataGateway;
use crate::services::input::{self, InputError, ResolvedInput};
use crate::services::sentiment::SentimentClassifier;

/// 数据源无数据时的提示
pub const NO_DATA_MESSAGE: &str =
    "No data found for the given ticker. Please enter a valid stock symbol.";

/// 无新闻时的提示
pub const NO_NEWS_MESSAGE: &str = "No news available for this stock.";

const UNTITLED: &str = "No Title Available";
const UNKNOWN_PUBLISHER: &str = "Unknown Publisher";
const NO_LINK: &str = "#";

#[derive(Error, Debug)]
pub enum DashboardError {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Gateway(#[from] anyhow::Error),

    #[error("Prediction failed: {0}")]
    Forecast(#[from] ForecastError),
}

/// 一次请求的原始输入
#[derive(Debug, Clone)]
pub struct DashboardInputs {
    pub ticker: String,
    pub period: Option<String>,
    pub horizon: Option<u32>,
    pub seasonality: Option<f64>,
    pub view: DashboardView,
}

/// 编排所需的外部能力
pub struct DashboardContext<'a> {
    pub gateway: &'a dyn MarketDataGateway,
    pub sentiment: &'a dyn SentimentClassifier,
    pub forecaster: &'a dyn ForecastModelFactory,
    pub defaults: &'a ForecastConfig,
}

/// 计算看板状态
///
/// - 未输入代码：NoInput，不访问数据源
/// - 无K线：NoData，不做情绪分析和预测
pub async fn render_state(
    inputs: &DashboardInputs,
    ctx: &DashboardContext<'_>,
) -> Result<DashboardOutcome, DashboardError> {
    let resolved = match input::resolve(
        &inputs.ticker,
        inputs.period.as_deref(),
        inputs.horizon,
        inputs.seasonality,
        ctx.defaults,
    ) {
        Ok(resolved) => resolved,
        Err(InputError::MissingTicker) => return Ok(DashboardOutcome::NoInput),
        Err(e) => return Err(e.into()),
    };

    log::info!(
        "生成看板: ticker={}, period={}, view={:?}",
        resolved.ticker,
        resolved.period.code(),
        inputs.view
    );

    let mut data = ctx
        .gateway
        .fetch(&resolved.ticker, resolved.period, inputs.view)
        .await?;
    let series = PriceSeries::new(std::mem::take(&mut data.bars));
    if series.is_empty() {
        log::warn!("{} 无行情数据", resolved.ticker);
        return Ok(DashboardOutcome::NoData {
            ticker: resolved.ticker,
            message: NO_DATA_MESSAGE.to_string(),
        });
    }

    let report = build_report(&resolved, &series, data, inputs.view, ctx)?;
    Ok(DashboardOutcome::Report(Box::new(report)))
}

/// 按视图组装各标签页，`data.bars` 已移入 `series`
fn build_report(
    resolved: &ResolvedInput,
    series: &PriceSeries,
    data: MarketData,
    view: DashboardView,
    ctx: &DashboardContext<'_>,
) -> Result<DashboardReport, DashboardError> {
    let MarketData {
        fundamentals,
        statements,
        news,
        ..
    } = data;

    let pricing = view.includes_pricing().then(|| PricingSection {
        row_count: series.len(),
        rows: series.rows(),
        statistics: compute_statistics(series),
    });

    let fundamentals = view.includes_fundamentals().then(|| {
        let currency = text_or(fundamentals.financial_currency.as_deref(), NOT_AVAILABLE);
        FundamentalSection {
            sector: display_text(fundamentals.sector.as_deref()),
            industry: display_text(fundamentals.industry.as_deref()),
            market_cap: scale_magnitude(fundamentals.market_cap, &currency),
            revenue: scale_magnitude(fundamentals.total_revenue, &currency),
            net_income: scale_magnitude(fundamentals.net_income, &currency),
            dividend_yield: display_number(fundamentals.dividend_yield),
            currency,
            statements,
        }
    });

    let news = view
        .includes_news()
        .then(|| news_section(&news, ctx.sentiment));

    let prediction = if view.includes_prediction() {
        let mut model = ctx.forecaster.create();
        let forecast = forecast_closing_prices(series, &resolved.forecast, model.as_mut())?;
        Some(PredictionSection {
            horizon_days: resolved.forecast.horizon_days,
            seasonality_prior_scale: resolved.forecast.seasonality_prior_scale,
            history_len: series.len(),
            points: forecast.points,
            components: forecast.components,
        })
    } else {
        None
    };

    Ok(DashboardReport {
        ticker: resolved.ticker.clone(),
        period: PeriodOption::from(resolved.period),
        pricing,
        fundamentals,
        news,
        prediction,
    })
}

/// 新闻列表，逐条打情绪标签
fn news_section(articles: &[NewsArticle], classifier: &dyn SentimentClassifier) -> NewsSection {
    if articles.is_empty() {
        return NewsSection {
            items: Vec::new(),
            message: Some(NO_NEWS_MESSAGE.to_string()),
        };
    }

    let items = articles
        .iter()
        .map(|article| {
            let title = text_or(article.title.as_deref(), UNTITLED);
            let polarity = classifier.polarity(&title);
            NewsItem {
                publisher: text_or(article.publisher.as_deref(), UNKNOWN_PUBLISHER),
                url: text_or(article.url.as_deref(), NO_LINK),
                publish_time: article
                    .published_at
                    .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                    .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
                polarity,
                sentiment_label: classify_sentiment(polarity),
                title,
            }
        })
        .collect();

    NewsSection {
        items,
        message: None,
    }
}
