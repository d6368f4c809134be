//! 백그라운드 서비스.
//!
//! 실행 보고를 수신하여 알림 이벤트로 변환해 전송합니다.
//!
//! ```text
//! ExecutionCoordinator          ReportForwarder          NotificationManager
//!        │                            │                          │
//!        │ ─── report_rx ───────────> │                          │
//!        │                            │ ── notify_event() ─────> │ ── Telegram
//! ```

use std::sync::Arc;

use sigflow_engine::{ExecutionReport, InstrumentOutcome};
use sigflow_notification::{NotificationEvent, NotificationManager};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// 실행 보고 전달 서비스.
///
/// 보고 채널이 닫히거나 종료 토큰이 취소되면 멈춥니다.
pub struct ReportForwarder {
    report_rx: mpsc::UnboundedReceiver<ExecutionReport>,
    notifier: Arc<NotificationManager>,
}

impl ReportForwarder {
    /// 새 서비스 생성.
    pub fn new(
        report_rx: mpsc::UnboundedReceiver<ExecutionReport>,
        notifier: Arc<NotificationManager>,
    ) -> Self {
        Self {
            report_rx,
            notifier,
        }
    }

    /// 서비스 시작.
    pub async fn run(mut self, shutdown: CancellationToken) {
        info!("ReportForwarder 시작");

        loop {
            tokio::select! {
                maybe_report = self.report_rx.recv() => {
                    match maybe_report {
                        Some(report) => self.handle_report(report).await,
                        None => {
                            debug!("보고 채널 닫힘");
                            break;
                        }
                    }
                }

                _ = shutdown.cancelled() => {
                    info!("ReportForwarder 종료");
                    break;
                }
            }
        }
    }

    async fn handle_report(&self, report: ExecutionReport) {
        debug!(
            "{}: 실행 보고 수신 ({}건 상쇄 -> {})",
            report.instrument, report.signal_count, report.net_intent
        );
        if let Some(event) = notification_for(&report) {
            self.notifier.notify_event(event).await;
        }
    }
}

/// 실행 보고를 알림 이벤트로 변환합니다.
///
/// 건너뛴 종목은 알림 대상이 아닙니다.
pub fn notification_for(report: &ExecutionReport) -> Option<NotificationEvent> {
    match &report.outcome {
        InstrumentOutcome::Completed(result) => {
            if result.is_total_failure() {
                return Some(NotificationEvent::ExecutionFailed {
                    instrument: report.instrument.clone(),
                    reason: format!("모든 청크 거부 ({}건)", result.failed_chunks),
                });
            }
            let (direction, action) = report.net_intent.directive()?;
            Some(NotificationEvent::OrderExecuted {
                instrument: report.instrument.clone(),
                direction,
                action,
                executed_qty: result.executed_qty,
                requested_qty: result.requested_qty,
                failed_chunks: result.failed_chunks,
            })
        }
        InstrumentOutcome::Skipped(_) => None,
        InstrumentOutcome::Aborted(e) => Some(NotificationEvent::ExecutionFailed {
            instrument: report.instrument.clone(),
            reason: e.to_string(),
        }),
    }
}
