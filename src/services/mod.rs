//! 业务逻辑服务模块
//!
//! 封装数据获取、统计、情绪分析和预测逻辑

pub mod analytics;  // 收益/风险统计
pub mod dashboard;  // 看板编排
pub mod forecast;   // 价格预测
pub mod formatter;  // 展示格式化
pub mod gateway;    // 行情数据网关
pub mod input;      // 输入解析
pub mod sentiment;  // 新闻情绪
