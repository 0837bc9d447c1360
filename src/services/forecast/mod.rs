//! 价格预测
//!
//! 把收盘价序列整理成模型输入（ds, y），拟合后预测历史区间和未来若干天
//!
//! ## 组成
//! - `ForecastModel`：预测模型接口（fit / predict）
//! - `AdditiveRegression`：默认实现，趋势 + 年季节性
//! - `forecast_closing_prices`：预测适配器

mod additive;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::ForecastConfig;
use crate::models::{ForecastComponentPoint, ForecastPoint, PriceSeries};
use crate::services::input::ForecastSettings;

use additive::{AdditiveRegression, AdditiveRegressionConfig};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ForecastError {
    #[error("Not enough data to fit the forecast model: need {required} points, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    #[error("Non-finite closing price on {0}")]
    NonFiniteValue(NaiveDate),

    #[error("Prior scale must be positive")]
    InvalidPriorScale,

    #[error("Forecast model has not been fitted yet")]
    NotFitted,

    #[error("Forecast model system is singular and cannot be solved")]
    SingularSystem,
}

/// 模型输入行
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrainingRow {
    /// 日期（无时区）
    pub ds: NaiveDate,
    /// 收盘价
    pub y: f64,
}

/// 模型选项
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForecastOptions {
    pub yearly_seasonality: bool,
    pub weekly_seasonality: bool,
    pub daily_seasonality: bool,
    /// 季节项先验强度
    pub seasonality_prior_scale: f64,
}

impl ForecastOptions {
    /// 只保留年季节性；日线数据的周/日周期没有意义
    pub fn yearly_only(seasonality_prior_scale: f64) -> Self {
        Self {
            yearly_seasonality: true,
            weekly_seasonality: false,
            daily_seasonality: false,
            seasonality_prior_scale,
        }
    }
}

/// 预测结果
#[derive(Debug, Clone)]
pub struct Forecast {
    /// 历史日期 + 未来日期的预测值
    pub points: Vec<ForecastPoint>,
    /// 与 points 一一对应的分量
    pub components: Vec<ForecastComponentPoint>,
}

/// 预测模型
pub trait ForecastModel: Send {
    fn fit(&mut self, history: &[TrainingRow], options: &ForecastOptions) -> Result<(), ForecastError>;

    /// 预测全部历史日期及其后 horizon_days 个自然日
    fn predict(&self, horizon_days: u32) -> Result<Forecast, ForecastError>;
}

/// 每次请求创建新的模型实例
pub trait ForecastModelFactory: Send + Sync {
    fn create(&self) -> Box<dyn ForecastModel>;
}

/// 加性回归模型工厂
pub struct AdditiveRegressionFactory {
    config: AdditiveRegressionConfig,
}

impl AdditiveRegressionFactory {
    pub fn new(config: &ForecastConfig) -> Self {
        Self {
            config: AdditiveRegressionConfig::from(config),
        }
    }
}

impl ForecastModelFactory for AdditiveRegressionFactory {
    fn create(&self) -> Box<dyn ForecastModel> {
        Box::new(AdditiveRegression::new(self.config.clone()))
    }
}

/// 收盘价序列转为模型输入，去掉时区只保留交易日
pub fn to_training_frame(series: &PriceSeries) -> Vec<TrainingRow> {
    series
        .bars()
        .iter()
        .map(|bar| TrainingRow {
            ds: bar.timestamp.date_naive(),
            y: bar.close,
        })
        .collect()
}

/// 预测适配器
///
/// 在全部历史上拟合，输出历史区间 + horizon 天的预测
pub fn forecast_closing_prices(
    series: &PriceSeries,
    settings: &ForecastSettings,
    model: &mut dyn ForecastModel,
) -> Result<Forecast, ForecastError> {
    let history = to_training_frame(series);
    let options = ForecastOptions::yearly_only(settings.seasonality_prior_scale);

    log::info!(
        "拟合预测模型: {} 个历史点, 预测 {} 天, 季节性强度 {}",
        history.len(),
        settings.horizon_days,
        settings.seasonality_prior_scale
    );

    model.fit(&history, &options)?;
    model.predict(settings.horizon_days)
}
