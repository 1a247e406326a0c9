/// The polling loop.
///
/// A single task samples every monitored condition once per tick, feeds each
/// sample to that condition's [`TransitionDetector`], and plays a notification
/// for every transition before the next tick starts. Because the loop awaits
/// each notification, transitions are announced strictly in sample order and
/// never overlap.
///
/// The config is read fresh from [`SharedConfig`] at the top of each tick and
/// again for each dispatch, so a save takes effect on the next transition and
/// toggling TUN monitoring takes effect on the next tick.
use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::condition::{ConditionId, ConditionSource, SampleError, TriState};
use crate::config::{ConfigError, SharedConfig};
use crate::detector::{Direction, Transition, TransitionDetector};
use crate::player::NotificationPlayer;
use crate::status::{self, MonitorStatus};

pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

pub type Sources = BTreeMap<ConditionId, Box<dyn ConditionSource>>;

#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigError),
    #[error("no source registered for condition '{0}'")]
    MissingSource(ConditionId),
}

/// State shared between the [`Monitor`] handle and its loop task.
struct Shared {
    config: SharedConfig,
    sources: Mutex<Sources>,
    player: Arc<NotificationPlayer>,
}

struct RunningLoop {
    stop_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

pub struct Monitor {
    shared: Arc<Shared>,
    interval: Duration,
    status_path: Option<PathBuf>,
    running: Option<RunningLoop>,
}

impl Monitor {
    /// Validates the current config and the source map once.
    ///
    /// The proxy source is always required. The TUN source is required only
    /// when TUN monitoring is already enabled; if it is enabled later without
    /// a source, the loop simply skips it.
    pub fn new(
        config: SharedConfig,
        sources: Sources,
        player: Arc<NotificationPlayer>,
    ) -> Result<Self, MonitorError> {
        let snapshot = config.snapshot();
        snapshot.validate()?;
        for id in ConditionId::ALL {
            if snapshot.is_monitored(id) && !sources.contains_key(&id) {
                return Err(MonitorError::MissingSource(id));
            }
        }

        Ok(Self {
            shared: Arc::new(Shared {
                config,
                sources: Mutex::new(sources),
                player,
            }),
            interval: TICK_INTERVAL,
            status_path: None,
            running: None,
        })
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Writes [`MonitorStatus`] to `path` whenever a condition's state changes.
    pub fn with_status_file(mut self, path: PathBuf) -> Self {
        self.status_path = Some(path);
        self
    }

    /// Whether the loop task is alive. A stopped loop counts as running until
    /// it has finished its last tick.
    pub fn is_running(&self) -> bool {
        self.running.as_ref().is_some_and(|r| !r.handle.is_finished())
    }

    fn is_stopping(&self) -> bool {
        self.running.as_ref().is_some_and(|r| *r.stop_tx.borrow())
    }

    /// Starts polling. No-op if already running.
    ///
    /// A loop that was asked to stop but is still finishing its tick is
    /// awaited first, so only one loop ever samples the sources. Every start
    /// creates fresh detectors, so a condition that is already active is
    /// announced again.
    pub async fn start(&mut self) {
        if self.is_running() && !self.is_stopping() {
            debug!("Monitor already running");
            return;
        }
        self.shutdown().await;

        let (stop_tx, stop_rx) = watch::channel(false);
        let shared = Arc::clone(&self.shared);
        let session = Session::new(self.status_path.clone());
        let handle = tokio::spawn(run(shared, session, self.interval, stop_rx));

        info!(interval_ms = self.interval.as_millis() as u64, "Monitor started");
        self.running = Some(RunningLoop { stop_tx, handle });
    }

    /// Asks the loop to stop after its current tick. No-op if not running.
    /// An in-flight notification is allowed to finish.
    pub fn stop(&self) {
        if let Some(running) = &self.running {
            if !running.stop_tx.send_replace(true) {
                info!("Monitor stopping");
            }
        }
    }

    /// Stops the loop and waits for it to exit.
    pub async fn shutdown(&mut self) {
        self.stop();
        if let Some(running) = self.running.take() {
            if let Err(e) = running.handle.await {
                warn!("Monitor task ended abnormally: {e}");
            }
        }
    }
}

async fn run(shared: Arc<Shared>, mut session: Session, period: Duration, mut stop_rx: watch::Receiver<bool>) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    session.set_running(true);

    loop {
        // The first tick completes immediately, which gives the startup sample.
        tokio::select! {
            _ = ticker.tick() => {}
            changed = stop_rx.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
        if *stop_rx.borrow_and_update() {
            break;
        }
        session.tick(&shared).await;
    }

    session.set_running(false);
    info!("Monitor stopped");
}

/// Per-run loop state. Detectors are created when a condition becomes
/// monitored and dropped when it stops being monitored or the run ends.
struct Session {
    detectors: BTreeMap<ConditionId, TransitionDetector>,
    status: MonitorStatus,
    status_path: Option<PathBuf>,
}

impl Session {
    fn new(status_path: Option<PathBuf>) -> Self {
        Self {
            detectors: BTreeMap::new(),
            status: MonitorStatus::new(),
            status_path,
        }
    }

    fn set_running(&mut self, running: bool) {
        self.status.running = running;
        self.write_status();
    }

    fn write_status(&self) {
        if let Some(path) = &self.status_path {
            status::write_status(path, &self.status);
        }
    }

    /// One polling cycle: sample, detect, then dispatch in order.
    async fn tick(&mut self, shared: &Shared) {
        let transitions = self.sample_all(shared);

        for (id, transition) in &transitions {
            dispatch(shared, *id, *transition).await;
        }

        let mut changed = !transitions.is_empty();
        for id in ConditionId::ALL {
            let state = self.detectors.get(&id).map_or(TriState::Unknown, TransitionDetector::state);
            if self.status.state(id) != state {
                self.status.set_state(id, state);
                changed = true;
            }
        }
        if !transitions.is_empty() {
            self.status.mark_transition();
        }
        if changed {
            self.write_status();
        }
    }

    fn sample_all(&mut self, shared: &Shared) -> Vec<(ConditionId, Transition)> {
        let config = shared.config.snapshot();
        let mut sources = shared.sources.lock().unwrap_or_else(|e| e.into_inner());
        let mut transitions = Vec::new();

        for id in ConditionId::ALL {
            if !config.is_monitored(id) {
                if self.detectors.remove(&id).is_some() {
                    info!(condition = %id, "Monitoring disabled");
                }
                continue;
            }
            let Some(source) = sources.get_mut(&id) else {
                debug!(condition = %id, "No source registered; skipping");
                continue;
            };

            let detector = self.detectors.entry(id).or_insert_with(|| {
                info!(condition = %id, "Monitoring enabled");
                TransitionDetector::new()
            });

            match sample_guarded(source.as_mut(), &config) {
                Ok(sample) => {
                    if let Some(transition) = detector.observe(sample) {
                        transitions.push((id, transition));
                    }
                }
                Err(e) => debug!(condition = %id, "Sample skipped: {e}"),
            }
        }
        transitions
    }
}

/// Samples `source`, turning a panic into a skipped tick.
fn sample_guarded(
    source: &mut dyn ConditionSource,
    config: &crate::config::Config,
) -> Result<TriState, SampleError> {
    panic::catch_unwind(AssertUnwindSafe(|| source.sample(config)))
        .unwrap_or_else(|_| Err(SampleError::Unavailable("source", "sampler panicked".to_string())))
}

async fn dispatch(shared: &Shared, id: ConditionId, transition: Transition) {
    let direction = transition.direction;
    match (direction, transition.is_initial) {
        (Direction::BecameActive, true) => info!(condition = %id, "Already active at startup"),
        (Direction::BecameActive, false) => info!(condition = %id, "Became active"),
        (Direction::BecameInactive, _) => info!(condition = %id, "Became inactive"),
    }

    let config = shared.config.snapshot();
    let player = Arc::clone(&shared.player);
    match tokio::task::spawn_blocking(move || player.notify(id, direction, &config)).await {
        Ok(outcome) => debug!(condition = %id, ?outcome, "Notification finished"),
        Err(e) => warn!(condition = %id, "Notification task failed: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::config::{Config, PROXY_DISABLED_TEXT, PROXY_ENABLED_TEXT, TUN_ENABLED_TEXT};
    use crate::player::fakes::{RecordingSink, RecordingSpeech};

    /// Replays a script of samples, repeating the last entry once exhausted.
    /// `None` entries fail the sample.
    struct ScriptedSource {
        script: VecDeque<Option<TriState>>,
        last: Option<TriState>,
        calls: Arc<AtomicUsize>,
    }

    impl ScriptedSource {
        fn new(script: &[Option<TriState>]) -> (Self, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            let source = Self {
                script: script.iter().copied().collect(),
                last: None,
                calls: Arc::clone(&calls),
            };
            (source, calls)
        }
    }

    impl ConditionSource for ScriptedSource {
        fn sample(&mut self, _config: &Config) -> Result<TriState, SampleError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let next = self.script.pop_front().unwrap_or(self.last);
            self.last = next;
            next.ok_or_else(|| SampleError::Unavailable("scripted", "no value".to_string()))
        }
    }

    struct Harness {
        monitor: Monitor,
        config: SharedConfig,
        speech: Arc<RecordingSpeech>,
    }

    impl Harness {
        fn new(config: Config, sources: Sources) -> Self {
            Self::with_speech(config, sources, RecordingSpeech::default())
        }

        fn with_speech(config: Config, sources: Sources, speech: RecordingSpeech) -> Self {
            let config = SharedConfig::new(config);
            let speech = Arc::new(speech);
            let player = Arc::new(NotificationPlayer::new(Arc::new(RecordingSink::default()), speech.clone()));
            let monitor = Monitor::new(config.clone(), sources, player).unwrap();
            Self { monitor, config, speech }
        }

        fn spoken(&self) -> Vec<String> {
            self.speech.spoken.lock().unwrap().iter().map(|s| s.text.clone()).collect()
        }
    }

    fn sources(entries: Vec<(ConditionId, ScriptedSource)>) -> Sources {
        entries
            .into_iter()
            .map(|(id, s)| (id, Box::new(s) as Box<dyn ConditionSource>))
            .collect()
    }

    use TriState::{Active, Inactive};

    // ── construction ──────────────────────────────────────────────────────────

    fn test_player() -> Arc<NotificationPlayer> {
        Arc::new(NotificationPlayer::new(
            Arc::new(RecordingSink::default()),
            Arc::new(RecordingSpeech::default()),
        ))
    }

    #[test]
    fn new_requires_proxy_source() {
        let result = Monitor::new(SharedConfig::new(Config::default()), Sources::new(), test_player());
        assert!(matches!(result, Err(MonitorError::MissingSource(ConditionId::Proxy))));
    }

    #[test]
    fn new_requires_tun_source_only_when_enabled() {
        let (proxy, _) = ScriptedSource::new(&[]);
        assert!(Monitor::new(
            SharedConfig::new(Config::default()),
            sources(vec![(ConditionId::Proxy, proxy)]),
            test_player()
        )
        .is_ok());

        let mut config = Config::default();
        config.tun.monitoring_enabled = true;
        let (proxy, _) = ScriptedSource::new(&[]);
        let result = Monitor::new(
            SharedConfig::new(config),
            sources(vec![(ConditionId::Proxy, proxy)]),
            test_player(),
        );
        assert!(matches!(result, Err(MonitorError::MissingSource(ConditionId::Tun))));
    }

    #[test]
    fn new_rejects_invalid_config() {
        let mut config = Config::default();
        config.tun.monitoring_enabled = true;
        config.tun.interface_keywords.clear();
        let (proxy, _) = ScriptedSource::new(&[]);
        let (tun, _) = ScriptedSource::new(&[]);
        let result = Monitor::new(
            SharedConfig::new(config),
            sources(vec![(ConditionId::Proxy, proxy), (ConditionId::Tun, tun)]),
            test_player(),
        );
        assert!(matches!(result, Err(MonitorError::InvalidConfig(ConfigError::NoTunKeywords))));
    }

    // ── ticking ───────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn five_tick_scenario_announces_on_and_off() {
        let (proxy, _) = ScriptedSource::new(&[
            Some(Inactive),
            Some(Inactive),
            Some(Active),
            Some(Active),
            Some(Inactive),
        ]);
        let h = Harness::new(Config::default(), sources(vec![(ConditionId::Proxy, proxy)]));
        let mut session = Session::new(None);

        let mut per_tick = Vec::new();
        for _ in 0..5 {
            let before = h.spoken().len();
            session.tick(&h.monitor.shared).await;
            per_tick.push(h.spoken()[before..].to_vec());
        }

        assert!(per_tick[0].is_empty());
        assert!(per_tick[1].is_empty());
        assert_eq!(per_tick[2], vec![PROXY_ENABLED_TEXT.to_string()]);
        assert!(per_tick[3].is_empty());
        assert_eq!(per_tick[4], vec![PROXY_DISABLED_TEXT.to_string()]);
        assert_eq!(h.spoken().len(), 2);
    }

    #[tokio::test]
    async fn active_at_startup_is_announced_once() {
        let (proxy, _) = ScriptedSource::new(&[Some(Active)]);
        let h = Harness::new(Config::default(), sources(vec![(ConditionId::Proxy, proxy)]));
        let mut session = Session::new(None);
        for _ in 0..3 {
            session.tick(&h.monitor.shared).await;
        }
        assert_eq!(h.spoken(), vec![PROXY_ENABLED_TEXT.to_string()]);
    }

    #[tokio::test]
    async fn sampling_errors_freeze_state() {
        let (proxy, _) = ScriptedSource::new(&[Some(Inactive), None, None, Some(Inactive), Some(Active)]);
        let h = Harness::new(Config::default(), sources(vec![(ConditionId::Proxy, proxy)]));
        let mut session = Session::new(None);

        for _ in 0..3 {
            session.tick(&h.monitor.shared).await;
        }
        assert_eq!(session.detectors[&ConditionId::Proxy].state(), Inactive);
        assert!(h.spoken().is_empty());

        session.tick(&h.monitor.shared).await;
        session.tick(&h.monitor.shared).await;
        assert_eq!(h.spoken(), vec![PROXY_ENABLED_TEXT.to_string()]);
    }

    #[tokio::test]
    async fn error_before_first_sample_stays_unknown() {
        let (proxy, _) = ScriptedSource::new(&[None, None, Some(Inactive)]);
        let h = Harness::new(Config::default(), sources(vec![(ConditionId::Proxy, proxy)]));
        let mut session = Session::new(None);

        session.tick(&h.monitor.shared).await;
        session.tick(&h.monitor.shared).await;
        assert_eq!(session.detectors[&ConditionId::Proxy].state(), TriState::Unknown);

        session.tick(&h.monitor.shared).await;
        assert_eq!(session.detectors[&ConditionId::Proxy].state(), Inactive);
        assert!(h.spoken().is_empty());
    }

    #[tokio::test]
    async fn failing_condition_does_not_block_the_other() {
        let mut config = Config::default();
        config.tun.monitoring_enabled = true;
        let (proxy, _) = ScriptedSource::new(&[None]);
        let (tun, _) = ScriptedSource::new(&[Some(Active)]);
        let h = Harness::new(
            config,
            sources(vec![(ConditionId::Proxy, proxy), (ConditionId::Tun, tun)]),
        );
        let mut session = Session::new(None);

        session.tick(&h.monitor.shared).await;
        assert_eq!(h.spoken(), vec![TUN_ENABLED_TEXT.to_string()]);
    }

    #[tokio::test]
    async fn panicking_source_is_contained() {
        let mut config = Config::default();
        config.tun.monitoring_enabled = true;
        let mut sources = Sources::new();
        sources.insert(
            ConditionId::Proxy,
            Box::new(|_: &Config| -> Result<TriState, SampleError> { panic!("registry exploded") }),
        );
        let (tun, _) = ScriptedSource::new(&[Some(Active)]);
        sources.insert(ConditionId::Tun, Box::new(tun));

        let h = Harness::new(config, sources);
        let mut session = Session::new(None);
        session.tick(&h.monitor.shared).await;
        session.tick(&h.monitor.shared).await;
        assert_eq!(h.spoken(), vec![TUN_ENABLED_TEXT.to_string()]);
    }

    #[tokio::test]
    async fn enabling_tun_at_runtime_keeps_proxy_state() {
        let (proxy, proxy_calls) = ScriptedSource::new(&[Some(Active)]);
        let (tun, tun_calls) = ScriptedSource::new(&[Some(Active)]);
        let h = Harness::new(
            Config::default(),
            sources(vec![(ConditionId::Proxy, proxy), (ConditionId::Tun, tun)]),
        );
        let mut session = Session::new(None);

        session.tick(&h.monitor.shared).await;
        session.tick(&h.monitor.shared).await;
        assert_eq!(tun_calls.load(Ordering::SeqCst), 0);
        assert_eq!(h.spoken(), vec![PROXY_ENABLED_TEXT.to_string()]);

        let mut next = (*h.config.snapshot()).clone();
        next.tun.monitoring_enabled = true;
        h.config.replace(next);

        session.tick(&h.monitor.shared).await;
        assert_eq!(tun_calls.load(Ordering::SeqCst), 1);
        assert_eq!(proxy_calls.load(Ordering::SeqCst), 3);
        // Proxy is not re-announced; only TUN's startup announcement is new.
        assert_eq!(
            h.spoken(),
            vec![PROXY_ENABLED_TEXT.to_string(), TUN_ENABLED_TEXT.to_string()]
        );
    }

    #[tokio::test]
    async fn disabling_tun_drops_its_detector() {
        let mut config = Config::default();
        config.tun.monitoring_enabled = true;
        let (proxy, _) = ScriptedSource::new(&[Some(Inactive)]);
        let (tun, tun_calls) = ScriptedSource::new(&[Some(Inactive)]);
        let h = Harness::new(
            config,
            sources(vec![(ConditionId::Proxy, proxy), (ConditionId::Tun, tun)]),
        );
        let mut session = Session::new(None);
        session.tick(&h.monitor.shared).await;
        assert!(session.detectors.contains_key(&ConditionId::Tun));

        let mut next = (*h.config.snapshot()).clone();
        next.tun.monitoring_enabled = false;
        h.config.replace(next);
        session.tick(&h.monitor.shared).await;

        assert!(!session.detectors.contains_key(&ConditionId::Tun));
        assert!(session.detectors.contains_key(&ConditionId::Proxy));
        assert_eq!(tun_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn dispatch_reads_config_saved_mid_run() {
        let (proxy, _) = ScriptedSource::new(&[Some(Inactive), Some(Active)]);
        let h = Harness::new(Config::default(), sources(vec![(ConditionId::Proxy, proxy)]));
        let mut session = Session::new(None);
        session.tick(&h.monitor.shared).await;

        let mut next = Config::default();
        next.proxy.enabled_text = Some("proxy is on".to_string());
        h.config.replace(next);

        session.tick(&h.monitor.shared).await;
        assert_eq!(h.spoken(), vec!["proxy is on".to_string()]);
    }

    #[tokio::test]
    async fn status_file_tracks_states() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("status.toml");
        let (proxy, _) = ScriptedSource::new(&[Some(Active)]);
        let h = Harness::new(Config::default(), sources(vec![(ConditionId::Proxy, proxy)]));
        let mut session = Session::new(Some(path.clone()));

        session.tick(&h.monitor.shared).await;

        let status: MonitorStatus = toml::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(status.proxy, Active);
        assert_eq!(status.tun, TriState::Unknown);
        assert!(status.last_transition.is_some());
    }

    // ── lifecycle ─────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn start_is_idempotent_and_stop_ends_polling() {
        let (proxy, calls) = ScriptedSource::new(&[Some(Inactive)]);
        let mut h = Harness::new(Config::default(), sources(vec![(ConditionId::Proxy, proxy)]));
        h.monitor = h.monitor.with_interval(Duration::from_millis(10));

        assert!(!h.monitor.is_running());
        h.monitor.start().await;
        h.monitor.start().await;
        assert!(h.monitor.is_running());

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(calls.load(Ordering::SeqCst) >= 1);

        h.monitor.stop();
        h.monitor.stop();
        h.monitor.shutdown().await;
        assert!(!h.monitor.is_running());

        let after_stop = calls.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(calls.load(Ordering::SeqCst), after_stop);
    }

    #[tokio::test]
    async fn stopped_loop_counts_as_running_until_its_tick_ends() {
        let (proxy, _) = ScriptedSource::new(&[Some(Active)]);
        let mut h = Harness::with_speech(
            Config::default(),
            sources(vec![(ConditionId::Proxy, proxy)]),
            RecordingSpeech {
                delay: Duration::from_millis(200),
                ..Default::default()
            },
        );
        h.monitor = h.monitor.with_interval(Duration::from_millis(10));

        h.monitor.start().await;
        tokio::time::sleep(Duration::from_millis(50)).await;
        h.monitor.stop();
        // The startup announcement is still playing.
        assert!(h.monitor.is_running());

        h.monitor.shutdown().await;
        assert!(!h.monitor.is_running());
        assert_eq!(h.spoken(), vec![PROXY_ENABLED_TEXT.to_string()]);
    }

    #[tokio::test]
    async fn restart_during_slow_notification_keeps_one_loop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("status.toml");
        let (proxy, calls) = ScriptedSource::new(&[Some(Active), Some(Inactive)]);
        let mut h = Harness::with_speech(
            Config::default(),
            sources(vec![(ConditionId::Proxy, proxy)]),
            RecordingSpeech {
                delay: Duration::from_millis(300),
                ..Default::default()
            },
        );
        h.monitor = h
            .monitor
            .with_interval(Duration::from_millis(10))
            .with_status_file(path.clone());

        h.monitor.start().await;
        tokio::time::sleep(Duration::from_millis(50)).await;
        h.monitor.stop();
        h.monitor.start().await;
        // The first loop sampled once and was awaited before the second began.
        let calls_at_restart = calls.load(Ordering::SeqCst);
        assert_eq!(calls_at_restart, 1);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(h.monitor.is_running());
        let status: MonitorStatus = toml::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert!(status.running);
        assert_eq!(status.proxy, Inactive);

        h.monitor.shutdown().await;
        let status: MonitorStatus = toml::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert!(!status.running);
    }

    #[tokio::test]
    async fn restart_announces_active_condition_again() {
        let (proxy, _) = ScriptedSource::new(&[Some(Active)]);
        let mut h = Harness::new(Config::default(), sources(vec![(ConditionId::Proxy, proxy)]));
        h.monitor = h.monitor.with_interval(Duration::from_millis(10));

        h.monitor.start().await;
        tokio::time::sleep(Duration::from_millis(50)).await;
        h.monitor.shutdown().await;
        assert_eq!(h.spoken().len(), 1);

        h.monitor.start().await;
        tokio::time::sleep(Duration::from_millis(50)).await;
        h.monitor.shutdown().await;
        assert_eq!(h.spoken().len(), 2);
    }
}
