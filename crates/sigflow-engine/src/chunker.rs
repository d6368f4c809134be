//! 분할 주문 실행.
//!
//! 주문당 최대 수량을 넘는 총 수량을 여러 개의 시장가 주문으로 나눠
//! 제출합니다. 일부 청크만 체결되는 부분 성공은 정상 결과이며,
//! 체결된 수량은 [`sigflow_core::ExecutionResult`]에 그대로 남습니다.

use std::future::Future;

use rust_decimal::Decimal;
use sigflow_core::{ExecutionResult, GatewayError, InstrumentConstraints};
use tracing::{debug, warn};

use crate::error::EngineError;
use crate::quantizer::floor_to_step;

/// 청크 분할 한계.
#[derive(Debug, Clone)]
pub struct ChunkLimits {
    /// 수량 스텝
    pub step: Decimal,
    /// 최소 주문 수량
    pub min_qty: Decimal,
    /// 주문당 최대 수량 (없으면 분할 없이 한 번에 제출)
    pub per_order_max: Option<Decimal>,
}

impl From<&InstrumentConstraints> for ChunkLimits {
    fn from(constraints: &InstrumentConstraints) -> Self {
        Self {
            step: constraints.order_step(),
            min_qty: constraints.min_qty,
            per_order_max: constraints.order_max(),
        }
    }
}

/// 총 수량을 청크로 나눠 순차 제출합니다.
///
/// 각 청크는 스텝에 맞춰 내린 수량으로 제출합니다. 최소 수량 미만으로
/// 남은 잔여분은 버립니다. 거부된 청크는 한 스텝 줄여 한 번만 재시도하고,
/// 재시도마저 거부되면 남은 수량을 포기합니다. 모든 게이트웨이 에러는
/// 거부로 취급합니다 (타임아웃 포함).
///
/// # Errors
///
/// - `EngineError::InvalidChunkSize`: 주문당 최대 수량이 스텝 미만이라
///   유효한 청크를 만들 수 없는 경우
pub async fn execute_chunked<F, Fut>(
    total_qty: Decimal,
    limits: &ChunkLimits,
    mut submit: F,
) -> Result<ExecutionResult, EngineError>
where
    F: FnMut(Decimal) -> Fut,
    Fut: Future<Output = Result<(), GatewayError>>,
{
    let chunk_size = match limits.per_order_max {
        Some(max) => floor_to_step(max, limits.step),
        None => total_qty,
    };
    if chunk_size <= Decimal::ZERO {
        return Err(EngineError::InvalidChunkSize {
            total: total_qty,
            step: limits.step,
        });
    }

    let mut result = ExecutionResult {
        requested_qty: total_qty,
        ..ExecutionResult::default()
    };
    let mut remaining = total_qty;

    while remaining > Decimal::ZERO {
        let cur = floor_to_step(remaining.min(chunk_size), limits.step);
        if cur <= Decimal::ZERO || cur < limits.min_qty {
            // 최소 수량 미만의 잔여분은 버린다
            debug!("잔여 수량 {} 은 최소 수량 {} 미만, 버림", remaining, limits.min_qty);
            break;
        }

        match submit(cur).await {
            Ok(()) => {
                debug!("청크 체결: {} (잔여 {})", cur, remaining - cur);
                result.any_chunk_succeeded = true;
                result.executed_qty += cur;
                remaining -= cur;
            }
            Err(err) => {
                result.failed_chunks += 1;
                let shrunk = floor_to_step(cur - limits.step, limits.step);
                if shrunk <= Decimal::ZERO || shrunk < limits.min_qty {
                    warn!("청크 {} 거부, 축소 불가로 잔여 {} 포기: {}", cur, remaining, err);
                    break;
                }
                warn!("청크 {} 거부, {} 로 축소 재시도: {}", cur, shrunk, err);
                match submit(shrunk).await {
                    Ok(()) => {
                        result.any_chunk_succeeded = true;
                        result.executed_qty += shrunk;
                        remaining -= shrunk;
                    }
                    Err(err) => {
                        result.failed_chunks += 1;
                        warn!("재시도 {} 도 거부, 잔여 {} 포기: {}", shrunk, remaining, err);
                        break;
                    }
                }
            }
        }
    }

    Ok(result)
}
