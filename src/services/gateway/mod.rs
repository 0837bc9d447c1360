//! 行情数据网关
//!
//! 统一的数据获取接口：K线、基本面、财报、新闻

mod yahoo;

use anyhow::Result;
use futures::future::BoxFuture;

use crate::models::{DashboardView, MarketData, Period};

pub use yahoo::YahooGateway;

/// 行情数据网关
///
/// 未知代码返回空K线，不视为错误。基本面、财报和新闻只在视图需要时获取，
/// 不需要的部分保持为空。
pub trait MarketDataGateway: Send + Sync {
    fn fetch<'a>(
        &'a self,
        ticker: &'a str,
        period: Period,
        view: DashboardView,
    ) -> BoxFuture<'a, Result<MarketData>>;
}

#[cfg(test)]
pub mod mock {
    //! 测试用的内存网关

    use super::*;
    use chrono::{Duration, FixedOffset, TimeZone};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use crate::models::{FundamentalSnapshot, NewsArticle, PriceBar};

    /// 返回固定数据并记录调用
    pub struct StaticGateway {
        data: MarketData,
        calls: AtomicUsize,
        last_request: Mutex<Option<(String, Period, DashboardView)>>,
        fail_with: Option<String>,
    }

    impl StaticGateway {
        pub fn new(data: MarketData) -> Self {
            Self {
                data,
                calls: AtomicUsize::new(0),
                last_request: Mutex::new(None),
                fail_with: None,
            }
        }

        pub fn failing(message: &str) -> Self {
            Self {
                fail_with: Some(message.to_string()),
                ..Self::new(MarketData::empty())
            }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        pub fn last_request(&self) -> Option<(String, Period, DashboardView)> {
            self.last_request.lock().unwrap().clone()
        }
    }

    impl MarketDataGateway for StaticGateway {
        fn fetch<'a>(
            &'a self,
            ticker: &'a str,
            period: Period,
            view: DashboardView,
        ) -> BoxFuture<'a, Result<MarketData>> {
            Box::pin(async move {
                self.calls.fetch_add(1, Ordering::SeqCst);
                *self.last_request.lock().unwrap() = Some((ticker.to_string(), period, view));
                match &self.fail_with {
                    Some(message) => Err(anyhow::anyhow!("{}", message)),
                    None => Ok(self.data.clone()),
                }
            })
        }
    }

    /// 生成 n 根连续交易日K线
    pub fn sample_bars(n: usize) -> Vec<PriceBar> {
        let offset = FixedOffset::west_opt(5 * 3600).unwrap();
        let start = offset.with_ymd_and_hms(2023, 1, 3, 0, 0, 0).unwrap();
        (0..n)
            .map(|i| {
                let close = 120.0 + i as f64 * 0.2 + (i as f64 * 0.4).sin() * 3.0;
                PriceBar {
                    timestamp: start + Duration::days(i as i64),
                    open: close - 0.5,
                    high: close + 1.0,
                    low: close - 1.0,
                    close,
                    volume: 50_000_000 + i as u64 * 1_000,
                }
            })
            .collect()
    }

    /// 类似 AAPL 的完整数据
    pub fn sample_market_data(n_bars: usize) -> MarketData {
        MarketData {
            bars: sample_bars(n_bars),
            fundamentals: FundamentalSnapshot {
                sector: Some("Technology".to_string()),
                industry: Some("Consumer Electronics".to_string()),
                market_cap: Some(2.95e12),
                total_revenue: Some(3.83e11),
                net_income: Some(9.7e10),
                dividend_yield: Some(0.44),  // 百分数
                financial_currency: Some("USD".to_string()),
            },
            statements: Vec::new(),
            news: vec![
                NewsArticle {
                    title: Some("Apple shares surge after record profit".to_string()),
                    publisher: Some("Reuters".to_string()),
                    url: Some("https://example.com/a".to_string()),
                    published_at: None,
                },
                NewsArticle {
                    title: Some("iPhone sales slump in China".to_string()),
                    publisher: None,
                    url: None,
                    published_at: None,
                },
                NewsArticle {
                    title: Some("Apple to hold event on Tuesday".to_string()),
                    publisher: Some("Bloomberg".to_string()),
                    url: Some("https://example.com/c".to_string()),
                    published_at: None,
                },
            ],
        }
    }
}
