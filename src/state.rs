//! 应用共享状态
//!
//! 数据网关、情绪分类器、预测模型工厂在启动时创建，所有 worker 共享

use std::sync::Arc;

use crate::config::{AppConfig, ForecastConfig};
use crate::services::dashboard::DashboardContext;
use crate::services::forecast::{AdditiveRegressionFactory, ForecastModelFactory};
use crate::services::gateway::{MarketDataGateway, YahooGateway};
use crate::services::sentiment::{LexiconSentiment, SentimentClassifier};

pub struct AppState {
    pub gateway: Arc<dyn MarketDataGateway>,
    pub sentiment: Arc<dyn SentimentClassifier>,
    pub forecaster: Arc<dyn ForecastModelFactory>,
    pub forecast_defaults: ForecastConfig,
}

impl AppState {
    /// 按配置创建默认实现
    pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let gateway = YahooGateway::new(&config.yahoo, &config.api)?;

        Ok(Self {
            gateway: Arc::new(gateway),
            sentiment: Arc::new(LexiconSentiment::new()),
            forecaster: Arc::new(AdditiveRegressionFactory::new(&config.forecast)),
            forecast_defaults: config.forecast.clone(),
        })
    }

    pub fn context(&self) -> DashboardContext<'_> {
        DashboardContext {
            gateway: self.gateway.as_ref(),
            sentiment: self.sentiment.as_ref(),
            forecaster: self.forecaster.as_ref(),
            defaults: &self.forecast_defaults,
        }
    }
}
