//! Binance USDT-M 선물 연동.
//!
//! 서명/전송을 담당하는 [`BinanceClient`]와 그 위에서
//! [`ExchangeGateway`](sigflow_core::ExchangeGateway)를 구현하는
//! [`BinanceGateway`]로 나뉩니다.

mod client;
mod gateway;

pub use client::{BinanceClient, BinanceConfig};
pub use gateway::BinanceGateway;
