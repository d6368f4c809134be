//! 신호 저장소.
//!
//! 웹훅으로 수신된 신호를 실행 시까지 보관하는 저장소입니다.
//! 기본 구현은 메모리 저장소이며, trait로 추상화되어 있어
//! 다른 백엔드로 교체할 수 있습니다.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use thiserror::Error;

use crate::domain::Signal;

/// 소비된 신호의 보존 기간 (일).
pub const RETENTION_DAYS: i64 = 30;

// =============================================================================
// 에러 타입
// =============================================================================

/// SignalStore 에러.
#[derive(Debug, Error)]
pub enum StoreError {
    /// 내부 잠금 오염 (보유 중 패닉 발생)
    #[error("저장소 잠금 오염: {0}")]
    Poisoned(String),

    /// 백엔드 에러
    #[error("저장소 백엔드 에러: {0}")]
    Backend(String),
}

// =============================================================================
// SignalStore Trait
// =============================================================================

/// 신호 저장소 trait.
///
/// 수신된 신호의 적재, 미소비 신호 조회, 소비 처리를 담당합니다.
#[async_trait]
pub trait SignalStore: Send + Sync {
    /// 신호 적재.
    ///
    /// 동일 종목에 동일 의도의 미소비 신호가 이미 있으면 적재하지 않습니다.
    ///
    /// # Returns
    ///
    /// 적재되었으면 `true`, 중복으로 무시되었으면 `false`.
    async fn enqueue(&self, signal: Signal) -> Result<bool, StoreError>;

    /// 미소비 신호 전체 조회.
    ///
    /// 수신 순서를 유지합니다.
    async fn pending(&self) -> Result<Vec<Signal>, StoreError>;

    /// 특정 종목의 미소비 신호를 모두 소비 처리.
    ///
    /// 실행 성공 여부와 무관하게 시도된 신호는 소비 처리합니다.
    ///
    /// # Returns
    ///
    /// 소비 처리된 신호 개수.
    async fn mark_consumed(&self, instrument: &str) -> Result<u64, StoreError>;
}

// =============================================================================
// MemorySignalStore
// =============================================================================

/// 메모리 기반 신호 저장소.
///
/// 프로세스 재시작 시 내용이 사라집니다. 소비된 신호는
/// [`RETENTION_DAYS`]일이 지나면 적재 시점에 정리됩니다.
#[derive(Debug, Default)]
pub struct MemorySignalStore {
    signals: Mutex<Vec<Signal>>,
}

impl MemorySignalStore {
    /// 빈 저장소 생성.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Vec<Signal>>, StoreError> {
        self.signals
            .lock()
            .map_err(|e| StoreError::Poisoned(e.to_string()))
    }
}

#[async_trait]
impl SignalStore for MemorySignalStore {
    async fn enqueue(&self, signal: Signal) -> Result<bool, StoreError> {
        let mut signals = self.lock()?;

        // 보존 기간이 지난 소비 완료 신호 정리
        let cutoff = Utc::now() - Duration::days(RETENTION_DAYS);
        let before = signals.len();
        signals.retain(|s| !s.consumed || s.received_at >= cutoff);
        if signals.len() < before {
            tracing::debug!("보존 기간 경과 신호 {}건 정리", before - signals.len());
        }

        // 동일 종목 + 동일 의도의 미소비 신호가 있으면 중복
        let duplicate = signals
            .iter()
            .any(|s| !s.consumed && s.instrument == signal.instrument && s.intent == signal.intent);
        if duplicate {
            return Ok(false);
        }

        signals.push(signal);
        Ok(true)
    }

    async fn pending(&self) -> Result<Vec<Signal>, StoreError> {
        let signals = self.lock()?;
        Ok(signals.iter().filter(|s| !s.consumed).cloned().collect())
    }

    async fn mark_consumed(&self, instrument: &str) -> Result<u64, StoreError> {
        let mut signals = self.lock()?;
        let mut count = 0u64;
        for signal in signals.iter_mut() {
            if !signal.consumed && signal.instrument == instrument {
                signal.consumed = true;
                count += 1;
            }
        }
        Ok(count)
    }
}
