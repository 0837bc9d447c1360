//! 看板输出模型
//!
//! 一次请求的全部展示数据：价格、统计、基本面、新闻、预测

use serde::{Deserialize, Serialize};

use super::stock::{
    FinancialStatement, ForecastComponentPoint, ForecastPoint, NewsItem, PeriodOption, PriceRow,
};

/// 看板视图（对应前端标签页）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DashboardView {
    /// 全部标签页
    Full,
    Pricing,
    Fundamentals,
    News,
    Prediction,
}

impl DashboardView {
    pub fn includes_pricing(&self) -> bool {
        matches!(self, DashboardView::Full | DashboardView::Pricing)
    }

    pub fn includes_fundamentals(&self) -> bool {
        matches!(self, DashboardView::Full | DashboardView::Fundamentals)
    }

    pub fn includes_news(&self) -> bool {
        matches!(self, DashboardView::Full | DashboardView::News)
    }

    pub fn includes_prediction(&self) -> bool {
        matches!(self, DashboardView::Full | DashboardView::Prediction)
    }
}

/// 收益/风险统计
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StockStatistics {
    /// 年化收益率（%）
    pub annual_return: f64,
    /// 年化波动率（%）
    pub std_dev: f64,
    /// 风险调整收益
    pub risk_adjusted_return: f64,
    /// 展示文本，如 "12.34%"
    pub annual_return_display: String,
    pub std_dev_display: String,
    pub risk_adjusted_return_display: String,
}

/// 价格标签页
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingSection {
    pub row_count: usize,
    pub rows: Vec<PriceRow>,
    pub statistics: StockStatistics,
}

/// 基本面标签页（已格式化）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundamentalSection {
    pub sector: String,
    pub industry: String,
    pub market_cap: String,
    pub revenue: String,
    pub net_income: String,
    pub dividend_yield: String,
    pub currency: String,
    pub statements: Vec<FinancialStatement>,
}

/// 新闻标签页
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsSection {
    pub items: Vec<NewsItem>,
    /// 无新闻时的提示
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// 预测标签页
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionSection {
    pub horizon_days: u32,
    pub seasonality_prior_scale: f64,
    /// 参与拟合的历史点数
    pub history_len: usize,
    pub points: Vec<ForecastPoint>,
    pub components: Vec<ForecastComponentPoint>,
}

/// 看板报告
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardReport {
    pub ticker: String,
    pub period: PeriodOption,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pricing: Option<PricingSection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fundamentals: Option<FundamentalSection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub news: Option<NewsSection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prediction: Option<PredictionSection>,
}

/// 一次看板计算的结果
#[derive(Debug, Clone)]
pub enum DashboardOutcome {
    /// 未输入股票代码，不做任何处理
    NoInput,
    /// 数据源无数据
    NoData { ticker: String, message: String },
    Report(Box<DashboardReport>),
}
