//! 요청 핸들러가 공유하는 애플리케이션 상태.

use std::sync::Arc;

use sigflow_core::SignalStore;
use sigflow_engine::ExecutionCoordinator;

/// 애플리케이션 상태.
///
/// 핸들러마다 복제됩니다. 조율자 복제본은 동일한 드레인 세마포어를
/// 공유하므로 어느 복제본에서 트리거해도 안전합니다.
#[derive(Clone)]
pub struct AppState {
    /// 실행 조율자
    pub coordinator: ExecutionCoordinator,
    /// 신호 저장소 (조율자와 동일 인스턴스)
    pub store: Arc<dyn SignalStore>,
    /// 웹훅 인증 키
    pub alert_key: String,
}

impl AppState {
    pub fn new(
        coordinator: ExecutionCoordinator,
        store: Arc<dyn SignalStore>,
        alert_key: String,
    ) -> Self {
        Self {
            coordinator,
            store,
            alert_key,
        }
    }
}
