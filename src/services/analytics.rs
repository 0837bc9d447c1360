//! 收益/风险统计
//!
//! 基于日涨跌幅计算年化收益、年化波动率和风险调整收益

use statrs::statistics::Statistics;

use crate::models::{PriceSeries, StockStatistics};

/// 每年交易日数
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// 计算统计指标
///
/// 调用方需保证序列非空。没有已定义涨跌幅时（只有一根K线）三项均为 0。
pub fn compute_statistics(series: &PriceSeries) -> StockStatistics {
    let changes: Vec<f64> = series.defined_changes().collect();

    let (annual_return, std_dev) = if changes.is_empty() {
        (0.0, 0.0)
    } else {
        (
            changes.iter().mean() * TRADING_DAYS_PER_YEAR,
            changes.iter().population_std_dev() * TRADING_DAYS_PER_YEAR.sqrt(),
        )
    };

    let risk_adjusted_return = risk_adjusted(annual_return, std_dev);

    StockStatistics {
        annual_return,
        std_dev,
        risk_adjusted_return,
        annual_return_display: format!("{:.2}%", annual_return),
        std_dev_display: format!("{:.2}%", std_dev),
        risk_adjusted_return_display: format!("{:.2}", risk_adjusted_return),
    }
}

/// 年化收益 / 年化波动率，波动率为 0 时返回 0
pub fn risk_adjusted(annual_return: f64, std_dev: f64) -> f64 {
    if std_dev == 0.0 {
        0.0
    } else {
        annual_return / std_dev
    }
}
