//! 配置模块
//!
//! 支持从 JSON 文件加载系统配置

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,
    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,
    /// 工作线程数（0 表示使用 CPU 核心数）
    #[serde(default)]
    pub workers: usize,
}

/// API 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// API Key（为空则不启用认证）
    #[serde(default)]
    pub api_key: String,
    /// 请求超时时间（秒）
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// 连接超时时间（秒）
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// 日志级别: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// Yahoo Finance 数据源配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YahooConfig {
    /// 行情/基本面/新闻接口根地址
    #[serde(default = "default_yahoo_base_url")]
    pub base_url: String,
    /// 获取会话 Cookie 的地址
    #[serde(default = "default_yahoo_cookie_url")]
    pub cookie_url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// 每次拉取的新闻条数
    #[serde(default = "default_news_count")]
    pub news_count: u32,
}

/// 预测模型配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastConfig {
    /// 默认预测天数（30 ~ 365）
    #[serde(default = "default_horizon_days")]
    pub default_horizon_days: u32,
    /// 默认年季节性先验强度（0.01 ~ 0.5）
    #[serde(default = "default_seasonality_prior_scale")]
    pub default_seasonality_prior_scale: f64,
    /// 年季节性傅里叶阶数
    #[serde(default = "default_yearly_order")]
    pub yearly_fourier_order: usize,
    /// 趋势变点数量
    #[serde(default = "default_changepoints")]
    pub changepoints: usize,
    /// 趋势变点先验强度
    #[serde(default = "default_changepoint_prior_scale")]
    pub changepoint_prior_scale: f64,
}

/// 默认配置文件位置
pub const CONFIG_PATHS: [&str; 2] = ["config.json", "config/config.json"];

/// 配置加载提示
#[derive(Debug, Clone, PartialEq)]
pub enum LoadNotice {
    Loaded(String),
    Failed { path: String, error: String },
    Defaults,
    AuthDisabled,
}

impl LoadNotice {
    pub fn log(&self) {
        match self {
            LoadNotice::Loaded(path) => log::info!("从 {} 加载配置成功", path),
            LoadNotice::Failed { path, error } => log::warn!("加载配置文件 {} 失败: {}", path, error),
            LoadNotice::Defaults => log::info!("使用默认配置"),
            LoadNotice::AuthDisabled => log::warn!("未设置 API Key，接口认证已关闭"),
        }
    }
}

/// 应用配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// 服务器配置
    #[serde(default)]
    pub server: ServerConfig,
    /// API 配置
    #[serde(default)]
    pub api: ApiConfig,
    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
    /// 数据源配置
    #[serde(default)]
    pub yahoo: YahooConfig,
    /// 预测配置
    #[serde(default)]
    pub forecast: ForecastConfig,
}

// 默认值函数
fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }
fn default_timeout() -> u64 { 30 }
fn default_connect_timeout() -> u64 { 10 }
fn default_log_level() -> String { "info".to_string() }
fn default_yahoo_base_url() -> String { "https://query1.finance.yahoo.com".to_string() }
fn default_yahoo_cookie_url() -> String { "https://fc.yahoo.com".to_string() }
fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36".to_string()
}
fn default_news_count() -> u32 { 10 }
fn default_horizon_days() -> u32 { 180 }
fn default_seasonality_prior_scale() -> f64 { 0.1 }
fn default_yearly_order() -> usize { 10 }
fn default_changepoints() -> usize { 25 }
fn default_changepoint_prior_scale() -> f64 { 0.05 }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: 0,
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            timeout_secs: default_timeout(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for YahooConfig {
    fn default() -> Self {
        Self {
            base_url: default_yahoo_base_url(),
            cookie_url: default_yahoo_cookie_url(),
            user_agent: default_user_agent(),
            news_count: default_news_count(),
        }
    }
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            default_horizon_days: default_horizon_days(),
            default_seasonality_prior_scale: default_seasonality_prior_scale(),
            yearly_fourier_order: default_yearly_order(),
            changepoints: default_changepoints(),
            changepoint_prior_scale: default_changepoint_prior_scale(),
        }
    }
}

impl AppConfig {
    /// 从 JSON 文件加载配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: AppConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// 加载配置，优先从文件，失败则使用默认值
    ///
    /// 环境变量 API_KEY 覆盖文件中的 api_key。
    /// 此时日志系统尚未初始化（日志级别来自配置），加载过程中的提示随配置一起返回。
    pub fn load() -> (Self, Vec<LoadNotice>) {
        let (mut config, mut notices) = Self::load_from(&CONFIG_PATHS);

        if let Ok(api_key) = env::var("API_KEY") {
            config.api.api_key = api_key;
        }
        if config.api.api_key.is_empty() {
            notices.push(LoadNotice::AuthDisabled);
        }

        (config, notices)
    }

    /// 依次尝试各个配置文件，取第一个解析成功的
    pub fn load_from<P: AsRef<Path>>(paths: &[P]) -> (Self, Vec<LoadNotice>) {
        let mut notices = Vec::new();

        for path in paths {
            let path: &Path = path.as_ref();
            if !path.exists() {
                continue;
            }
            match Self::from_file(path) {
                Ok(config) => {
                    notices.push(LoadNotice::Loaded(path.display().to_string()));
                    return (config, notices);
                }
                Err(e) => notices.push(LoadNotice::Failed {
                    path: path.display().to_string(),
                    error: e.to_string(),
                }),
            }
        }

        notices.push(LoadNotice::Defaults);
        (Self::default(), notices)
    }

    /// 获取服务器绑定地址
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
