//! 加性回归预测模型
//!
//! y(t) = 分段线性趋势 + 傅里叶季节项，带高斯先验的最大后验估计（岭回归）

use chrono::{Duration, NaiveDate};
use ndarray::{Array1, Array2};

use super::{Forecast, ForecastError, ForecastModel, ForecastOptions, TrainingRow};
use crate::config::ForecastConfig;
use crate::models::{ForecastComponentPoint, ForecastPoint};

/// 拟合所需最少样本数
pub const MIN_TRAINING_POINTS: usize = 2;

/// 观测噪声（缩放后单位），决定先验惩罚强度
const OBSERVATION_NOISE: f64 = 0.05;
/// 截距和基础斜率几乎不惩罚
const UNPENALIZED: f64 = 1e-10;
/// 变点只放在历史前 80%
const CHANGEPOINT_RANGE: f64 = 0.8;

const YEARLY_PERIOD_DAYS: f64 = 365.25;
const WEEKLY_PERIOD_DAYS: f64 = 7.0;
const DAILY_PERIOD_DAYS: f64 = 1.0;
const WEEKLY_ORDER: usize = 3;
const DAILY_ORDER: usize = 4;

/// 模型超参数
#[derive(Debug, Clone)]
pub struct AdditiveRegressionConfig {
    /// 趋势变点数量上限
    pub n_changepoints: usize,
    /// 变点斜率变化的先验强度
    pub changepoint_prior_scale: f64,
    /// 年季节性傅里叶阶数
    pub yearly_order: usize,
}

impl Default for AdditiveRegressionConfig {
    fn default() -> Self {
        Self::from(&ForecastConfig::default())
    }
}

impl From<&ForecastConfig> for AdditiveRegressionConfig {
    fn from(config: &ForecastConfig) -> Self {
        Self {
            n_changepoints: config.changepoints,
            changepoint_prior_scale: config.changepoint_prior_scale,
            yearly_order: config.yearly_fourier_order,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SeasonalityKind {
    Yearly,
    Weekly,
    Daily,
}

#[derive(Debug, Clone)]
struct Seasonality {
    kind: SeasonalityKind,
    period_days: f64,
    order: usize,
    prior_scale: f64,
}

impl Seasonality {
    fn columns(&self) -> usize {
        2 * self.order
    }

    fn push_features(&self, days: f64, row: &mut Vec<f64>) {
        for n in 1..=self.order {
            let angle = 2.0 * std::f64::consts::PI * n as f64 * days / self.period_days;
            row.push(angle.sin());
            row.push(angle.cos());
        }
    }
}

/// 拟合结果
#[derive(Debug, Clone)]
struct FittedState {
    history: Vec<NaiveDate>,
    start: NaiveDate,
    span_days: f64,
    y_scale: f64,
    /// 变点位置（缩放后时间）
    changepoints: Vec<f64>,
    seasonalities: Vec<Seasonality>,
    beta: Array1<f64>,
}

impl FittedState {
    fn days(&self, date: NaiveDate) -> f64 {
        (date - self.start).num_days() as f64
    }

    fn trend_columns(&self) -> usize {
        2 + self.changepoints.len()
    }

    fn design_row(&self, date: NaiveDate) -> Vec<f64> {
        let days = self.days(date);
        let mut row = trend_features(days / self.span_days, &self.changepoints);
        for seasonality in &self.seasonalities {
            seasonality.push_features(days, &mut row);
        }
        row
    }
}

fn trend_features(t: f64, changepoints: &[f64]) -> Vec<f64> {
    let mut row = Vec::with_capacity(2 + changepoints.len());
    row.push(1.0);
    row.push(t);
    row.extend(changepoints.iter().map(|&c| (t - c).max(0.0)));
    row
}

/// 加性回归模型
#[derive(Debug, Clone)]
pub struct AdditiveRegression {
    config: AdditiveRegressionConfig,
    state: Option<FittedState>,
}

impl AdditiveRegression {
    pub fn new(config: AdditiveRegressionConfig) -> Self {
        Self {
            config,
            state: None,
        }
    }

    /// 在历史前 80% 上均匀放置变点
    fn place_changepoints(&self, history: &[TrainingRow], start: NaiveDate, span_days: f64) -> Vec<f64> {
        let hist_size = (history.len() as f64 * CHANGEPOINT_RANGE).floor() as usize;
        let n_changepoints = self.config.n_changepoints.min(hist_size.saturating_sub(1));
        if n_changepoints == 0 {
            return Vec::new();
        }

        let last_index = (hist_size - 1) as f64;
        (1..=n_changepoints)
            .map(|k| {
                let idx = (last_index * k as f64 / n_changepoints as f64).round() as usize;
                (history[idx].ds - start).num_days() as f64 / span_days
            })
            .collect()
    }

    fn seasonalities(&self, options: &ForecastOptions) -> Vec<Seasonality> {
        let mut seasonalities = Vec::new();
        if options.yearly_seasonality && self.config.yearly_order > 0 {
            seasonalities.push(Seasonality {
                kind: SeasonalityKind::Yearly,
                period_days: YEARLY_PERIOD_DAYS,
                order: self.config.yearly_order,
                prior_scale: options.seasonality_prior_scale,
            });
        }
        if options.weekly_seasonality {
            seasonalities.push(Seasonality {
                kind: SeasonalityKind::Weekly,
                period_days: WEEKLY_PERIOD_DAYS,
                order: WEEKLY_ORDER,
                prior_scale: options.seasonality_prior_scale,
            });
        }
        if options.daily_seasonality {
            seasonalities.push(Seasonality {
                kind: SeasonalityKind::Daily,
                period_days: DAILY_PERIOD_DAYS,
                order: DAILY_ORDER,
                prior_scale: options.seasonality_prior_scale,
            });
        }
        seasonalities
    }
}

impl ForecastModel for AdditiveRegression {
    fn fit(&mut self, history: &[TrainingRow], options: &ForecastOptions) -> Result<(), ForecastError> {
        if history.len() < MIN_TRAINING_POINTS {
            return Err(ForecastError::InsufficientData {
                required: MIN_TRAINING_POINTS,
                actual: history.len(),
            });
        }
        if let Some(row) = history.iter().find(|row| !row.y.is_finite()) {
            return Err(ForecastError::NonFiniteValue(row.ds));
        }
        if options.seasonality_prior_scale <= 0.0 || self.config.changepoint_prior_scale <= 0.0 {
            return Err(ForecastError::InvalidPriorScale);
        }

        let start = history[0].ds;
        let end = history[history.len() - 1].ds;
        let span_days = ((end - start).num_days() as f64).max(1.0);

        let max_abs = history.iter().map(|row| row.y.abs()).fold(0.0, f64::max);
        let y_scale = if max_abs > 0.0 { max_abs } else { 1.0 };

        let mut state = FittedState {
            history: history.iter().map(|row| row.ds).collect(),
            start,
            span_days,
            y_scale,
            changepoints: self.place_changepoints(history, start, span_days),
            seasonalities: self.seasonalities(options),
            beta: Array1::zeros(0),
        };

        // 各列的先验惩罚: noise² / prior_scale²
        let mut penalties = vec![UNPENALIZED, UNPENALIZED];
        let changepoint_penalty = (OBSERVATION_NOISE / self.config.changepoint_prior_scale).powi(2);
        penalties.extend(std::iter::repeat(changepoint_penalty).take(state.changepoints.len()));
        for seasonality in &state.seasonalities {
            let penalty = (OBSERVATION_NOISE / seasonality.prior_scale).powi(2);
            penalties.extend(std::iter::repeat(penalty).take(seasonality.columns()));
        }

        let n_rows = history.len();
        let n_cols = penalties.len();
        let mut x = Array2::<f64>::zeros((n_rows, n_cols));
        let mut y = Array1::<f64>::zeros(n_rows);
        for (i, row) in history.iter().enumerate() {
            for (j, value) in state.design_row(row.ds).into_iter().enumerate() {
                x[[i, j]] = value;
            }
            y[i] = row.y / y_scale;
        }

        let mut xtx = x.t().dot(&x);
        for (j, penalty) in penalties.iter().enumerate() {
            xtx[[j, j]] += penalty;
        }
        let xty = x.t().dot(&y);

        state.beta = cholesky_solve(&xtx, &xty)?;
        log::debug!(
            "预测模型拟合完成: {} 个样本, {} 个变点, {} 个参数",
            n_rows,
            state.changepoints.len(),
            n_cols
        );

        self.state = Some(state);
        Ok(())
    }

    fn predict(&self, horizon_days: u32) -> Result<Forecast, ForecastError> {
        let state = self.state.as_ref().ok_or(ForecastError::NotFitted)?;

        let last = state.history[state.history.len() - 1];
        let dates = state
            .history
            .iter()
            .copied()
            .chain((1..=i64::from(horizon_days)).map(|d| last + Duration::days(d)));

        let trend_cols = state.trend_columns();
        let mut points = Vec::with_capacity(state.history.len() + horizon_days as usize);
        let mut components = Vec::with_capacity(points.capacity());

        for date in dates {
            let row = state.design_row(date);
            let contribution = |from: usize, to: usize| -> f64 {
                row[from..to]
                    .iter()
                    .zip(state.beta.slice(ndarray::s![from..to]).iter())
                    .map(|(x, b)| x * b)
                    .sum::<f64>()
                    * state.y_scale
            };

            let trend = contribution(0, trend_cols);
            let mut yearly = 0.0;
            let mut weekly = None;
            let mut daily = None;
            let mut offset = trend_cols;
            for seasonality in &state.seasonalities {
                let value = contribution(offset, offset + seasonality.columns());
                offset += seasonality.columns();
                match seasonality.kind {
                    SeasonalityKind::Yearly => yearly = value,
                    SeasonalityKind::Weekly => weekly = Some(value),
                    SeasonalityKind::Daily => daily = Some(value),
                }
            }

            let seasonal_total = yearly + weekly.unwrap_or(0.0) + daily.unwrap_or(0.0);
            points.push(ForecastPoint {
                date,
                predicted_value: trend + seasonal_total,
            });
            components.push(ForecastComponentPoint {
                date,
                trend,
                yearly,
                weekly,
                daily,
            });
        }

        Ok(Forecast { points, components })
    }
}

/// Cholesky 分解求解对称正定方程组 A x = b
fn cholesky_solve(a: &Array2<f64>, b: &Array1<f64>) -> Result<Array1<f64>, ForecastError> {
    let n = a.nrows();
    let mut l = Array2::<f64>::zeros((n, n));

    for j in 0..n {
        let mut diag = a[[j, j]];
        for k in 0..j {
            diag -= l[[j, k]] * l[[j, k]];
        }
        if diag <= 0.0 || !diag.is_finite() {
            return Err(ForecastError::SingularSystem);
        }
        let l_jj = diag.sqrt();
        l[[j, j]] = l_jj;

        for i in (j + 1)..n {
            let mut sum = a[[i, j]];
            for k in 0..j {
                sum -= l[[i, k]] * l[[j, k]];
            }
            l[[i, j]] = sum / l_jj;
        }
    }

    // L z = b
    let mut z = Array1::<f64>::zeros(n);
    for i in 0..n {
        let mut sum = b[i];
        for k in 0..i {
            sum -= l[[i, k]] * z[k];
        }
        z[i] = sum / l[[i, i]];
    }

    // Lᵀ x = z
    let mut x = Array1::<f64>::zeros(n);
    for i in (0..n).rev() {
        let mut sum = z[i];
        for k in (i + 1)..n {
            sum -= l[[k, i]] * x[k];
        }
        x[i] = sum / l[[i, i]];
    }

    Ok(x)
}
