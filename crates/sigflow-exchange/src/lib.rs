//! # sigflow-exchange
//!
//! 거래소 게이트웨이 구현 모음입니다.
//!
//! - `binance`: Binance USDT-M 선물 REST API 연동 (메인넷/테스트넷)
//! - `mock`: 주문을 즉시 체결 처리하는 가상 게이트웨이
//!
//! 모든 게이트웨이는 [`sigflow_core::ExchangeGateway`]를 구현하므로
//! 실행 엔진은 어느 구현을 쓰는지 알 필요가 없습니다.
//!
//! # 사용 예시
//!
//! ```rust,ignore
//! use sigflow_exchange::{BinanceConfig, BinanceGateway};
//!
//! let config = BinanceConfig::new(api_key, secret_key, /* testnet */ true);
//! let gateway = BinanceGateway::new(config)?;
//! let price = gateway.market_price("BTCUSDT").await?;
//! ```

pub mod binance;
pub mod mock;

// 주요 타입 재내보내기
pub use binance::{BinanceClient, BinanceConfig, BinanceGateway};
pub use mock::MockGateway;
