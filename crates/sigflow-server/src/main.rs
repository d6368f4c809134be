//! TradingView 웹훅 서버.
//!
//! Axum 기반 웹훅 수신 서버를 시작합니다. 수신한 신호는 메모리 큐에
//! 쌓이고, 실행 조율자가 디바운스 후 상쇄/주문을 수행합니다.

use std::{sync::Arc, time::Duration};

use axum::http::StatusCode;
use tokio_util::sync::CancellationToken;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
use tracing::{info, warn};

use sigflow_core::{ExchangeGateway, MemorySignalStore, SignalStore};
use sigflow_engine::ExecutionCoordinator;
use sigflow_exchange::{BinanceConfig, BinanceGateway, MockGateway};
use sigflow_notification::{NotificationManager, TelegramSender};
use sigflow_server::{
    config::{AppConfig, GatewayMode},
    routes::create_api_router,
    services::ReportForwarder,
    state::AppState,
    Result,
};

/// 설정에 맞는 거래소 게이트웨이 생성.
fn build_gateway(config: &AppConfig) -> Result<Arc<dyn ExchangeGateway>> {
    match config.gateway.mode {
        GatewayMode::Live => {
            let binance = BinanceConfig::new(
                config.gateway.api_key.clone(),
                config.gateway.secret_key.clone(),
                config.gateway.testnet,
            );
            Ok(Arc::new(BinanceGateway::new(binance)?))
        }
        GatewayMode::Mock => {
            warn!("모의 게이트웨이 모드: 실제 주문이 나가지 않습니다");
            Ok(Arc::new(MockGateway::new()))
        }
    }
}

/// 알림 매니저 초기화 (텔레그램 설정).
fn build_notifier() -> Arc<NotificationManager> {
    let mut manager = NotificationManager::new();
    if let Some(sender) = TelegramSender::from_env() {
        manager.add_sender(Box::new(sender));
        info!("Telegram 알림 활성화");
    } else {
        info!("Telegram 설정 없음, 알림 기능 비활성화");
    }
    Arc::new(manager)
}

#[tokio::main]
async fn main() -> Result<()> {
    // .env 파일 로드 (있는 경우)
    let _ = dotenvy::dotenv();

    // tracing 초기화
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "sigflow_server=info,sigflow_engine=info,tower_http=warn".into()
            }),
        )
        .init();

    info!("Starting sigflow webhook server...");

    // 설정 로드
    let config = AppConfig::from_env()?;
    let addr = config.server.socket_addr()?;

    // 게이트웨이 생성
    let gateway = build_gateway(&config)?;
    info!(
        "게이트웨이: {} (testnet={})",
        gateway.gateway_name(),
        config.gateway.testnet
    );
    info!(
        "주문 설정: 잔고 {}%, 레버리지 {}x, 마진 {}, 디바운스 {}초",
        config.order.balance_percent,
        config.order.leverage,
        config.order.margin_mode,
        config.order.debounce_secs
    );

    // 신호 저장소와 실행 조율자 생성
    let store: Arc<dyn SignalStore> = Arc::new(MemorySignalStore::new());
    let (report_tx, report_rx) = tokio::sync::mpsc::unbounded_channel();
    let coordinator =
        ExecutionCoordinator::new(gateway, Arc::clone(&store), config.order.clone())
            .with_report_sender(report_tx);

    // 전역 종료 토큰 (백그라운드 태스크에 전파)
    let shutdown_token = CancellationToken::new();

    // 보고 -> 알림 전달 서비스 시작
    let forwarder = ReportForwarder::new(report_rx, build_notifier());
    tokio::spawn(forwarder.run(shutdown_token.clone()));

    // 라우터 생성
    let state = AppState::new(coordinator, store, config.alert_key.clone());
    let app = create_api_router()
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        // 전역 타임아웃 (30초) - 408 상태 코드 반환
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(30),
        ));

    // 서버 시작
    info!(%addr, "Webhook server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown_token.clone()))
        .await?;

    // 종료 시그널 받은 후 정리 작업
    info!("Server shutdown initiated, cleaning up...");
    shutdown_token.cancel();
    info!("Server stopped gracefully");

    Ok(())
}

/// Graceful shutdown 시그널 대기.
///
/// Ctrl+C 또는 SIGTERM 시그널을 수신하면 종료 토큰을 취소합니다.
async fn shutdown_signal(shutdown_token: CancellationToken) {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            warn!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            warn!("Received SIGTERM, initiating graceful shutdown...");
        }
    }

    // 백그라운드 태스크에 종료 시그널 전파
    shutdown_token.cancel();
    info!("Shutdown signal propagated to background tasks");
}
