//! 파이프라인 오케스트레이션 -- 입력 채널, 워커 풀, 출력 채널을 관리합니다.
//!
//! [`EventPipeline`]은 core의 [`Pipeline`](sluice_core::pipeline::Pipeline) trait을 구현하여
//! 다른 파이프라인과 동일한 생명주기로 관리됩니다.
//!
//! # 내부 아키텍처
//! ```text
//! sender() -> mpsc -> worker x N (ChainSlot::load -> ActionChain::process) -> mpsc -> downstream
//! ```
//!
//! 워커는 입력 수신기를 `tokio::sync::Mutex`로 공유합니다. 이벤트마다 슬롯에서
//! 현재 체인을 가져오므로 리로드는 다음 이벤트부터 반영됩니다.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use sluice_core::config::MAX_CHANNEL_CAPACITY;
use sluice_core::error::{PipelineError, SluiceError};
use sluice_core::event::Event;
use sluice_core::metrics as m;
use sluice_core::pipeline::{HealthStatus, Pipeline};

use crate::action::ActionChain;
use crate::config::PipelineConfig;
use crate::error::EventPipelineError;
use crate::reload::{ChainSlot, ReloadOutcome};

/// 입력 채널 사용률이 이 값을 넘으면 Degraded로 보고합니다.
const DEGRADED_UTILIZATION: f64 = 0.9;

/// 파이프라인 실행 상태
#[derive(Debug, Clone, PartialEq, Eq)]
enum PipelineState {
    /// 초기화됨, 아직 시작하지 않음
    Initialized,
    /// 실행 중
    Running,
    /// 정지됨
    Stopped,
}

/// 처리 카운터
#[derive(Debug, Default)]
struct PipelineStats {
    processed: AtomicU64,
    discarded: AtomicU64,
}

/// 이벤트 파이프라인 -- 액션 체인을 워커 풀로 실행합니다.
///
/// # 사용 예시
/// ```ignore
/// use sluice_pipeline::{EventPipeline, EventPipelineBuilder};
///
/// let (mut pipeline, output_rx) = EventPipelineBuilder::new()
///     .config(config)
///     .build()?;
///
/// pipeline.start().await?;
/// let input = pipeline.sender()?;
/// input.send(event).await?;
/// ```
pub struct EventPipeline {
    /// 파이프라인 설정
    config: PipelineConfig,
    /// 현재 상태
    state: PipelineState,
    /// 현재 액션 체인
    slot: Arc<ChainSlot>,
    /// 입력 채널 송신측 (finish 시 drop)
    input_tx: Option<mpsc::Sender<Event>>,
    /// 입력 채널 수신측 (start 시 워커에 전달)
    input_rx: Option<mpsc::Receiver<Event>>,
    /// 출력 채널 송신측
    output_tx: mpsc::Sender<Event>,
    /// 종료 토큰
    cancel: CancellationToken,
    /// 워커 태스크 핸들
    tasks: Vec<JoinHandle<()>>,
    /// 처리 카운터
    stats: Arc<PipelineStats>,
}

impl EventPipeline {
    /// 파이프라인 이름
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// 현재 상태를 반환합니다.
    pub fn state_name(&self) -> &str {
        match self.state {
            PipelineState::Initialized => "initialized",
            PipelineState::Running => "running",
            PipelineState::Stopped => "stopped",
        }
    }

    /// 체인을 통과한 이벤트 수 (버려진 이벤트 포함)
    pub fn processed_count(&self) -> u64 {
        self.stats.processed.load(Ordering::Relaxed)
    }

    /// 버려진 이벤트 수
    pub fn discarded_count(&self) -> u64 {
        self.stats.discarded.load(Ordering::Relaxed)
    }

    /// 현재 액션 체인
    pub fn chain(&self) -> Arc<ActionChain> {
        self.slot.load()
    }

    /// 입력 채널 송신측을 반환합니다.
    ///
    /// # Errors
    /// `finish` 또는 `stop` 이후에는 입력을 받을 수 없습니다.
    pub fn sender(&self) -> Result<mpsc::Sender<Event>, EventPipelineError> {
        self.input_tx
            .clone()
            .ok_or_else(|| EventPipelineError::Channel("pipeline input is closed".to_owned()))
    }

    /// 새 설정으로 액션 체인을 리로드합니다.
    ///
    /// 워커 수와 채널 용량은 재시작 전까지 바뀌지 않습니다.
    /// 이름이 다른 설정은 거부합니다. 로그와 메트릭 라벨이 이름을 기준으로 합니다.
    pub fn reload(&mut self, config: PipelineConfig) -> Result<ReloadOutcome, EventPipelineError> {
        config.validate()?;
        if config.name != self.config.name {
            return Err(EventPipelineError::Config {
                field: "name".to_owned(),
                reason: format!(
                    "cannot reload pipeline '{}' as '{}'",
                    self.config.name, config.name
                ),
            });
        }
        let chain = ActionChain::from_config(&config.actions)?;

        if config.workers != self.config.workers
            || config.channel_capacity != self.config.channel_capacity
        {
            tracing::warn!(
                pipeline = %self.config.name,
                "worker count and channel capacity changes require a restart"
            );
        }

        let outcome = self.slot.reload(chain);
        self.config.actions = config.actions;
        Ok(outcome)
    }

    /// 입력을 닫고 남은 이벤트를 모두 처리할 때까지 기다립니다.
    ///
    /// `sender()`로 받은 복제본이 살아 있으면 그것이 drop될 때까지 대기합니다.
    pub async fn finish(&mut self) -> Result<(), SluiceError> {
        if self.state != PipelineState::Running {
            return Err(PipelineError::NotRunning.into());
        }

        tracing::info!(pipeline = %self.config.name, "draining event pipeline");
        self.input_tx = None;
        self.join_workers().await;
        self.state = PipelineState::Stopped;
        Ok(())
    }

    async fn join_workers(&mut self) {
        for task in self.tasks.drain(..) {
            if let Err(e) = task.await {
                tracing::warn!(pipeline = %self.config.name, error = %e, "worker task failed");
            }
        }
        metrics::gauge!(m::PIPELINE_WORKERS, m::LABEL_PIPELINE => self.config.name.clone())
            .set(0.0);
        tracing::info!(
            pipeline = %self.config.name,
            processed = self.processed_count(),
            discarded = self.discarded_count(),
            "event pipeline stopped"
        );
    }
}

impl Pipeline for EventPipeline {
    async fn start(&mut self) -> Result<(), SluiceError> {
        if self.state == PipelineState::Running {
            return Err(PipelineError::AlreadyRunning.into());
        }

        let input_rx = self.input_rx.take().ok_or_else(|| {
            PipelineError::InitFailed("a stopped pipeline cannot be restarted".to_owned())
        })?;
        let input_rx = Arc::new(Mutex::new(input_rx));

        tracing::info!(
            pipeline = %self.config.name,
            workers = self.config.workers,
            actions = self.slot.load().len(),
            "starting event pipeline"
        );

        for worker_id in 0..self.config.workers {
            let worker = Worker {
                id: worker_id,
                pipeline: self.config.name.clone(),
                input_rx: Arc::clone(&input_rx),
                output_tx: self.output_tx.clone(),
                slot: Arc::clone(&self.slot),
                cancel: self.cancel.clone(),
                stats: Arc::clone(&self.stats),
            };
            self.tasks.push(tokio::spawn(worker.run()));
        }

        metrics::gauge!(m::PIPELINE_WORKERS, m::LABEL_PIPELINE => self.config.name.clone())
            .set(self.config.workers as f64);

        self.state = PipelineState::Running;
        Ok(())
    }

    async fn stop(&mut self) -> Result<(), SluiceError> {
        if self.state != PipelineState::Running {
            return Err(PipelineError::NotRunning.into());
        }

        tracing::info!(pipeline = %self.config.name, "stopping event pipeline");
        self.cancel.cancel();
        self.input_tx = None;
        self.join_workers().await;
        self.state = PipelineState::Stopped;
        Ok(())
    }

    async fn health_check(&self) -> HealthStatus {
        match self.state {
            PipelineState::Running => {
                if self.output_tx.is_closed() {
                    return HealthStatus::Unhealthy("output channel closed".to_owned());
                }
                if self.tasks.iter().all(JoinHandle::is_finished) {
                    return HealthStatus::Unhealthy("all workers exited".to_owned());
                }
                match &self.input_tx {
                    Some(tx) => {
                        let max = tx.max_capacity();
                        let used = max - tx.capacity();
                        let utilization = used as f64 / max as f64;
                        if utilization > DEGRADED_UTILIZATION {
                            HealthStatus::Degraded(format!(
                                "input channel utilization high: {:.1}%",
                                utilization * 100.0
                            ))
                        } else {
                            HealthStatus::Healthy
                        }
                    }
                    None => HealthStatus::Degraded("draining".to_owned()),
                }
            }
            PipelineState::Initialized => HealthStatus::Unhealthy("not started".to_owned()),
            PipelineState::Stopped => HealthStatus::Unhealthy("stopped".to_owned()),
        }
    }
}

/// 워커 태스크 상태
struct Worker {
    id: usize,
    pipeline: String,
    input_rx: Arc<Mutex<mpsc::Receiver<Event>>>,
    output_tx: mpsc::Sender<Event>,
    slot: Arc<ChainSlot>,
    cancel: CancellationToken,
    stats: Arc<PipelineStats>,
}

impl Worker {
    async fn run(self) {
        tracing::debug!(pipeline = %self.pipeline, worker = self.id, "worker started");

        loop {
            let event = tokio::select! {
                biased;
                () = self.cancel.cancelled() => break,
                event = async { self.input_rx.lock().await.recv().await } => event,
            };
            // 입력이 닫히고 비었으면 종료
            let Some(event) = event else { break };

            let chain = self.slot.load();
            self.stats.processed.fetch_add(1, Ordering::Relaxed);
            metrics::counter!(m::EVENTS_PROCESSED_TOTAL, m::LABEL_PIPELINE => self.pipeline.clone())
                .increment(1);

            let Some(event) = chain.process(event) else {
                self.stats.discarded.fetch_add(1, Ordering::Relaxed);
                metrics::counter!(m::EVENTS_DISCARDED_TOTAL, m::LABEL_PIPELINE => self.pipeline.clone())
                    .increment(1);
                continue;
            };

            if self.output_tx.send(event).await.is_err() {
                tracing::warn!(
                    pipeline = %self.pipeline,
                    worker = self.id,
                    "output channel closed, worker exiting"
                );
                break;
            }
        }

        tracing::debug!(pipeline = %self.pipeline, worker = self.id, "worker stopped");
    }
}

/// 이벤트 파이프라인 빌더
///
/// 파이프라인을 구성하고 필요한 채널을 생성합니다.
pub struct EventPipelineBuilder {
    config: PipelineConfig,
    output_tx: Option<mpsc::Sender<Event>>,
    output_channel_capacity: usize,
}

impl EventPipelineBuilder {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self {
            config: PipelineConfig::default(),
            output_tx: None,
            output_channel_capacity: 1024,
        }
    }

    /// 파이프라인 설정을 지정합니다.
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// 외부 출력 채널을 설정합니다.
    ///
    /// 설정하지 않으면 빌더가 새 채널을 생성합니다.
    pub fn output_sender(mut self, tx: mpsc::Sender<Event>) -> Self {
        self.output_tx = Some(tx);
        self
    }

    /// 출력 채널 용량을 설정합니다 (외부 채널 미사용 시).
    pub fn output_channel_capacity(mut self, capacity: usize) -> Self {
        self.output_channel_capacity = capacity;
        self
    }

    /// 파이프라인을 빌드합니다.
    ///
    /// # Returns
    /// - `EventPipeline`: 파이프라인 인스턴스
    /// - `Option<mpsc::Receiver<Event>>`: 출력 수신 채널
    ///   (외부 output_sender를 설정한 경우 None)
    pub fn build(self) -> Result<(EventPipeline, Option<mpsc::Receiver<Event>>), EventPipelineError> {
        self.config.validate()?;
        if self.output_tx.is_none()
            && (self.output_channel_capacity == 0
                || self.output_channel_capacity > MAX_CHANNEL_CAPACITY)
        {
            return Err(EventPipelineError::Config {
                field: "output_channel_capacity".to_owned(),
                reason: format!("must be 1-{MAX_CHANNEL_CAPACITY}"),
            });
        }

        let chain = ActionChain::from_config(&self.config.actions)?;
        let (input_tx, input_rx) = mpsc::channel(self.config.channel_capacity);

        let (output_tx, output_rx) = if let Some(tx) = self.output_tx {
            (tx, None)
        } else {
            let (tx, rx) = mpsc::channel(self.output_channel_capacity);
            (tx, Some(rx))
        };

        let pipeline = EventPipeline {
            slot: Arc::new(ChainSlot::new(self.config.name.clone(), chain)),
            config: self.config,
            state: PipelineState::Initialized,
            input_tx: Some(input_tx),
            input_rx: Some(input_rx),
            output_tx,
            cancel: CancellationToken::new(),
            tasks: Vec::new(),
            stats: Arc::new(PipelineStats::default()),
        };

        Ok((pipeline, output_rx))
    }
}

impl Default for EventPipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use sluice_core::event::EVENT_SOURCE_STDIN;

    use crate::config::PipelineConfigBuilder;

    fn config(actions: Vec<serde_json::Value>) -> PipelineConfig {
        let mut builder = PipelineConfigBuilder::new().name("test").workers(2);
        for action in actions {
            builder = builder.action(action);
        }
        builder.build().unwrap()
    }

    fn event(fields: serde_json::Value) -> Event {
        Event::new(fields, EVENT_SOURCE_STDIN, 0)
    }

    #[test]
    fn builder_creates_pipeline() {
        let (pipeline, output_rx) = EventPipelineBuilder::new().build().unwrap();
        assert_eq!(pipeline.state_name(), "initialized");
        assert!(output_rx.is_some());
    }

    #[test]
    fn builder_with_external_output_sender() {
        let (tx, _rx) = mpsc::channel(10);
        let (_pipeline, rx) = EventPipelineBuilder::new().output_sender(tx).build().unwrap();
        assert!(rx.is_none());
    }

    #[test]
    fn builder_rejects_oversized_channels() {
        let mut oversized = config(Vec::new());
        oversized.channel_capacity = 4_611_686_018_427_387_904;
        let result = EventPipelineBuilder::new().config(oversized).build();
        assert!(matches!(
            result,
            Err(EventPipelineError::Config { ref field, .. }) if field == "channel_capacity"
        ));

        let result = EventPipelineBuilder::new()
            .output_channel_capacity(MAX_CHANNEL_CAPACITY + 1)
            .build();
        assert!(matches!(
            result,
            Err(EventPipelineError::Config { ref field, .. }) if field == "output_channel_capacity"
        ));
    }

    #[test]
    fn builder_rejects_invalid_actions() {
        let result = EventPipelineBuilder::new()
            .config(config(vec![json!({"type": "unknown"})]))
            .build();
        assert!(matches!(result, Err(EventPipelineError::Action { .. })));
    }

    #[tokio::test]
    async fn lifecycle_errors() {
        let (mut pipeline, _rx) = EventPipelineBuilder::new().build().unwrap();
        assert!(pipeline.health_check().await.is_unhealthy());
        assert!(pipeline.stop().await.is_err());

        pipeline.start().await.unwrap();
        assert!(pipeline.start().await.is_err());
        assert!(pipeline.health_check().await.is_healthy());

        pipeline.stop().await.unwrap();
        assert_eq!(pipeline.state_name(), "stopped");
        assert!(pipeline.start().await.is_err());
        assert!(pipeline.sender().is_err());
    }

    #[tokio::test]
    async fn processes_and_drains() {
        let (mut pipeline, rx) = EventPipelineBuilder::new()
            .config(config(vec![
                json!({"type": "discard", "do_if": {"op": "equal", "field": "level", "values": "debug"}}),
                json!({"type": "route", "output": "main"}),
            ]))
            .build()
            .unwrap();
        let mut rx = rx.unwrap();

        pipeline.start().await.unwrap();
        let input = pipeline.sender().unwrap();
        for level in ["info", "debug", "error", "debug"] {
            input.send(event(json!({"level": level}))).await.unwrap();
        }
        drop(input);
        pipeline.finish().await.unwrap();

        let mut levels = Vec::new();
        while let Ok(out) = rx.try_recv() {
            assert_eq!(out.route.as_deref(), Some("main"));
            levels.push(out.fields["level"].as_str().unwrap().to_owned());
        }
        levels.sort();
        assert_eq!(levels, vec!["error", "info"]);
        assert_eq!(pipeline.processed_count(), 4);
        assert_eq!(pipeline.discarded_count(), 2);
    }

    #[tokio::test]
    async fn reload_swaps_chain() {
        let (mut pipeline, _rx) = EventPipelineBuilder::new()
            .config(config(vec![json!({"type": "route", "output": "a"})]))
            .build()
            .unwrap();

        let same = config(vec![json!({"type": "route", "output": "a"})]);
        assert_eq!(pipeline.reload(same).unwrap(), ReloadOutcome::Unchanged);

        let changed = config(vec![json!({"type": "route", "output": "b"})]);
        assert_eq!(pipeline.reload(changed).unwrap(), ReloadOutcome::Replaced);

        let bad = config(vec![json!({"type": "discard", "do_if": {"op": "nope"}})]);
        assert!(pipeline.reload(bad).is_err());
        assert_eq!(pipeline.chain().len(), 1);
    }

    #[tokio::test]
    async fn reload_rejects_renamed_pipeline() {
        let (mut pipeline, _rx) = EventPipelineBuilder::new()
            .config(config(vec![json!({"type": "route", "output": "a"})]))
            .build()
            .unwrap();

        let mut renamed = config(vec![json!({"type": "route", "output": "b"})]);
        renamed.name = "other".to_owned();
        let err = pipeline.reload(renamed).unwrap_err();
        assert!(matches!(err, EventPipelineError::Config { ref field, .. } if field == "name"));
        assert!(err.to_string().contains("'test'"));

        // 기존 체인 유지
        let same = config(vec![json!({"type": "route", "output": "a"})]);
        assert_eq!(pipeline.reload(same).unwrap(), ReloadOutcome::Unchanged);
    }
}
