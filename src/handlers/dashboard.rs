use actix_web::{http::StatusCode, web, HttpResponse, Result};

use crate::models::{
    ApiResponse, DashboardOutcome, DashboardQuery, DashboardView, Period, PeriodOption, StockQuery,
};
use crate::services::dashboard::{render_state, DashboardError, DashboardInputs};
use crate::state::AppState;

const NO_INPUT_MESSAGE: &str = "Please enter a stock ticker.";

/// 可选时间区间
pub async fn list_periods() -> Result<HttpResponse> {
    let periods: Vec<PeriodOption> = Period::ALL.iter().copied().map(PeriodOption::from).collect();
    Ok(HttpResponse::Ok().json(ApiResponse::success(periods)))
}

/// 完整看板
pub async fn get_dashboard(
    state: web::Data<AppState>,
    query: web::Query<DashboardQuery>,
) -> Result<HttpResponse> {
    let query = query.into_inner();
    let inputs = DashboardInputs {
        ticker: query.ticker,
        period: query.period,
        horizon: query.horizon,
        seasonality: query.seasonality,
        view: DashboardView::Full,
    };
    Ok(respond(&state, inputs).await)
}

pub async fn get_pricing(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<StockQuery>,
) -> Result<HttpResponse> {
    Ok(respond(&state, stock_inputs(path, query, DashboardView::Pricing)).await)
}

pub async fn get_fundamentals(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<StockQuery>,
) -> Result<HttpResponse> {
    Ok(respond(&state, stock_inputs(path, query, DashboardView::Fundamentals)).await)
}

pub async fn get_news(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<StockQuery>,
) -> Result<HttpResponse> {
    Ok(respond(&state, stock_inputs(path, query, DashboardView::News)).await)
}

pub async fn get_prediction(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<StockQuery>,
) -> Result<HttpResponse> {
    Ok(respond(&state, stock_inputs(path, query, DashboardView::Prediction)).await)
}

fn stock_inputs(
    path: web::Path<String>,
    query: web::Query<StockQuery>,
    view: DashboardView,
) -> DashboardInputs {
    let query = query.into_inner();
    DashboardInputs {
        ticker: path.into_inner(),
        period: query.period,
        horizon: query.horizon,
        seasonality: query.seasonality,
        view,
    }
}

/// 看板结果映射为 HTTP 响应
async fn respond(state: &AppState, inputs: DashboardInputs) -> HttpResponse {
    match render_state(&inputs, &state.context()).await {
        Ok(DashboardOutcome::Report(report)) => HttpResponse::Ok().json(ApiResponse::success(*report)),
        Ok(DashboardOutcome::NoInput) => {
            HttpResponse::BadRequest().json(ApiResponse::<()>::error(NO_INPUT_MESSAGE))
        }
        Ok(DashboardOutcome::NoData { ticker, message }) => {
            log::info!("{} 无数据，返回 404", ticker);
            HttpResponse::NotFound().json(ApiResponse::<()>::error(message))
        }
        Err(e) => {
            let status = match &e {
                DashboardError::Input(_) => StatusCode::BAD_REQUEST,
                DashboardError::Gateway(_) | DashboardError::Forecast(_) => {
                    log::error!("生成看板失败 ({}): {:#}", inputs.ticker.trim(), e);
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            };
            HttpResponse::build(status).json(ApiResponse::<()>::error(e.to_string()))
        }
    }
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/periods", web::get().to(list_periods))
        .route("/dashboard", web::get().to(get_dashboard))
        .service(
            web::scope("/stocks")
                .route("/{ticker}/pricing", web::get().to(get_pricing))
                .route("/{ticker}/fundamentals", web::get().to(get_fundamentals))
                .route("/{ticker}/news", web::get().to(get_news))
                .route("/{ticker}/prediction", web::get().to(get_prediction)),
        );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ForecastConfig;
    use crate::models::MarketData;
    use crate::services::forecast::AdditiveRegressionFactory;
    use crate::services::gateway::mock::{sample_market_data, StaticGateway};
    use crate::services::gateway::MarketDataGateway;
    use crate::services::sentiment::LexiconSentiment;
    use actix_web::{test, App};
    use serde_json::Value;
    use std::sync::Arc;

    fn app_state(gateway: StaticGateway) -> web::Data<AppState> {
        let gateway: Arc<dyn MarketDataGateway> = Arc::new(gateway);
        web::Data::new(AppState {
            gateway,
            sentiment: Arc::new(LexiconSentiment::new()),
            forecaster: Arc::new(AdditiveRegressionFactory::new(&ForecastConfig::default())),
            forecast_defaults: ForecastConfig::default(),
        })
    }

    #[actix_web::test]
    async fn test_list_periods() {
        let app = test::init_service(
            App::new()
                .app_data(app_state(StaticGateway::new(MarketData::empty())))
                .configure(crate::handlers::config),
        )
        .await;

        let req = test::TestRequest::get().uri("/api/v1/periods").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["success"], true);
        let periods = body["data"].as_array().unwrap();
        assert_eq!(periods.len(), 7);
        assert_eq!(periods[0]["label"], "1 Month");
        assert_eq!(periods[6]["code"], "max");
    }

    #[actix_web::test]
    async fn test_dashboard_full_report() {
        println!("\n========== 测试看板接口 ==========");
        let app = test::init_service(
            App::new()
                .app_data(app_state(StaticGateway::new(sample_market_data(252))))
                .configure(crate::handlers::config),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/api/v1/dashboard?ticker=aapl&period=1y&horizon=90&seasonality=0.2")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: Value = test::read_body_json(resp).await;
        let data = &body["data"];
        assert_eq!(data["ticker"], "AAPL");
        assert_eq!(data["period"]["label"], "1 Year");
        assert_eq!(data["pricing"]["row_count"], 252);
        assert_eq!(data["fundamentals"]["sector"], "Technology");
        assert_eq!(data["news"]["items"].as_array().unwrap().len(), 3);
        assert_eq!(data["news"]["items"][0]["sentiment_label"], "Positive");
        assert_eq!(data["prediction"]["horizon_days"], 90);
        assert_eq!(data["prediction"]["points"].as_array().unwrap().len(), 252 + 90);
        println!("✅ 看板接口测试通过！");
    }

    #[actix_web::test]
    async fn test_dashboard_without_ticker() {
        let app = test::init_service(
            App::new()
                .app_data(app_state(StaticGateway::new(sample_market_data(10))))
                .configure(crate::handlers::config),
        )
        .await;

        let req = test::TestRequest::get().uri("/api/v1/dashboard").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], NO_INPUT_MESSAGE);
    }

    #[actix_web::test]
    async fn test_unknown_ticker_not_found() {
        let app = test::init_service(
            App::new()
                .app_data(app_state(StaticGateway::new(MarketData::empty())))
                .configure(crate::handlers::config),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/api/v1/stocks/ZZZZINVALID/pricing")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(
            body["message"],
            "No data found for the given ticker. Please enter a valid stock symbol."
        );
        assert!(body["data"].is_null());
    }

    #[actix_web::test]
    async fn test_pricing_view_only() {
        let app = test::init_service(
            App::new()
                .app_data(app_state(StaticGateway::new(sample_market_data(40))))
                .configure(crate::handlers::config),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/api/v1/stocks/msft/pricing?period=3mo")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        let data = &body["data"];
        assert_eq!(data["ticker"], "MSFT");
        assert_eq!(data["period"]["code"], "3mo");
        assert_eq!(data["pricing"]["rows"].as_array().unwrap().len(), 40);
        assert!(data["pricing"]["statistics"]["annual_return"].is_number());
        assert!(data.get("fundamentals").is_none());
        assert!(data.get("prediction").is_none());
    }

    #[actix_web::test]
    async fn test_invalid_input_and_gateway_failure() {
        let app = test::init_service(
            App::new()
                .app_data(app_state(StaticGateway::new(sample_market_data(40))))
                .configure(crate::handlers::config),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/api/v1/stocks/AAPL/prediction?horizon=10")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::get()
            .uri("/api/v1/stocks/AAPL/news?period=10y")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let failing = test::init_service(
            App::new()
                .app_data(app_state(StaticGateway::failing("upstream timeout")))
                .configure(crate::handlers::config),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/api/v1/stocks/AAPL/fundamentals")
            .to_request();
        let resp = test::call_service(&failing, req).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["message"], "upstream timeout");
    }
}
