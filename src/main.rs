//! 股票看板后端服务
//!
//! 提供股票行情、收益统计、基本面、新闻情绪和价格预测的 RESTful API 服务
//! 数据来源：Yahoo Finance

mod config;     // 配置
mod handlers;   // HTTP 请求处理器
mod middleware; // 中间件
mod models;     // 数据模型定义
mod services;   // 业务逻辑服务
mod state;      // 共享状态

use actix_web::{middleware::Logger, web, App, HttpServer};
use env_logger::Env;

use crate::config::AppConfig;
use crate::middleware::ApiKeyMiddleware;
use crate::state::AppState;

/// 应用程序入口
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let (config, notices) = AppConfig::load();

    // RUST_LOG 优先于配置文件中的日志级别
    env_logger::init_from_env(Env::default().default_filter_or(config.log.level.as_str()));
    for notice in &notices {
        notice.log();
    }

    let state = AppState::from_config(&config)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
    let state = web::Data::new(state);
    let api_key = config.api.api_key.clone();
    let bind_addr = config.bind_addr();

    log::info!("启动股票看板服务，监听 {}", bind_addr);

    // 创建并启动 HTTP 服务器
    let mut server = HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(ApiKeyMiddleware::new(api_key.clone())) // API Key 认证
            .wrap(Logger::default()) // 请求日志
            .configure(handlers::config)
    });
    if config.server.workers > 0 {
        server = server.workers(config.server.workers);
    }

    server.bind(bind_addr)?.run().await
}
