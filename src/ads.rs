//! Ad and analytics gateway
//!
//! The SDK is an injected capability (`AdGateway`). `AdService` wraps it
//! so that no SDK failure ever reaches gameplay:
//! - Initialization is retried a bounded number of times, then the service
//!   stays in dev mode where every call is a no-op
//! - Analytics raised before the SDK is ready are queued and flushed in order
//! - Commercial breaks are rate limited by a cooldown
//! - Gameplay notifications are always re-enabled after an ad

use std::collections::VecDeque;

use serde_json::Value;
use thiserror::Error;

use crate::analytics::{AnalyticsEvent, REASON_SDK_NOT_READY};
use crate::platform::Platform;

/// Events kept while the SDK is not ready; the oldest are dropped past this
pub const MAX_QUEUED_EVENTS: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdError {
    #[error("ad SDK is not available")]
    Unavailable,
    #[error("ad SDK call failed: {0}")]
    Sdk(String),
    #[error("ad SDK is not initialized")]
    NotReady,
}

/// Third-party ad SDK surface
#[allow(async_fn_in_trait)]
pub trait AdGateway {
    async fn init(&mut self) -> Result<(), AdError>;
    fn gameplay_start(&mut self) -> Result<(), AdError>;
    fn gameplay_stop(&mut self) -> Result<(), AdError>;
    /// Resolves once the ad (if any) has finished
    async fn commercial_break(&mut self) -> Result<(), AdError>;
    /// Resolves to true only if the player watched to the end
    async fn rewarded_break(&mut self) -> Result<bool, AdError>;
    fn custom_event(&mut self, name: &str, payload: &Value) -> Result<(), AdError>;
}

/// Headless stand-in: ads finish instantly and events go to the log
#[derive(Debug, Clone, Copy, Default)]
pub struct LogGateway {
    /// Answer for rewarded breaks
    pub reward: bool,
}

impl AdGateway for LogGateway {
    async fn init(&mut self) -> Result<(), AdError> {
        Ok(())
    }

    fn gameplay_start(&mut self) -> Result<(), AdError> {
        log::debug!("[ads] gameplay start");
        Ok(())
    }

    fn gameplay_stop(&mut self) -> Result<(), AdError> {
        log::debug!("[ads] gameplay stop");
        Ok(())
    }

    async fn commercial_break(&mut self) -> Result<(), AdError> {
        log::info!("[ads] commercial break");
        Ok(())
    }

    async fn rewarded_break(&mut self) -> Result<bool, AdError> {
        log::info!("[ads] rewarded break (watched: {})", self.reward);
        Ok(self.reward)
    }

    fn custom_event(&mut self, name: &str, payload: &Value) -> Result<(), AdError> {
        log::info!("[analytics] {} {}", name, payload);
        Ok(())
    }
}

/// Guarded wrapper around a gateway
pub struct AdService<G: AdGateway> {
    gateway: G,
    ready: bool,
    queue: VecDeque<AnalyticsEvent>,
    cooldown_ms: u64,
    /// No commercial break before this time
    cooldown_until: u64,
    session_start: Option<u64>,
}

impl<G: AdGateway> AdService<G> {
    pub fn new(gateway: G, cooldown_ms: u64) -> Self {
        Self {
            gateway,
            ready: false,
            queue: VecDeque::new(),
            cooldown_ms,
            cooldown_until: 0,
            session_start: None,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn gateway_mut(&mut self) -> &mut G {
        &mut self.gateway
    }

    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    pub fn cooldown_active(&self, now: u64) -> bool {
        self.cooldown_until > now
    }

    /// Try to bring the SDK up, sleeping `backoff_ms` between attempts.
    /// Returns readiness; failure leaves the service in dev mode.
    pub async fn initialize<P: Platform>(
        &mut self,
        platform: &P,
        attempts: u32,
        backoff_ms: u32,
    ) -> bool {
        for attempt in 1..=attempts {
            match self.gateway.init().await {
                Ok(()) => {
                    self.ready = true;
                    log::info!("Ad SDK initialized (attempt {})", attempt);
                    self.flush();
                    self.send(&AnalyticsEvent::SdkInitialized);
                    return true;
                }
                Err(e) => log::error!("Ad SDK init attempt {} failed: {}", attempt, e),
            }
            if attempt < attempts {
                platform.sleep_ms(backoff_ms).await;
            }
        }
        log::warn!("Ad SDK not available - running in dev mode");
        false
    }

    /// Send now if ready, otherwise queue
    pub fn track(&mut self, event: AnalyticsEvent) {
        if self.ready {
            self.send(&event);
            return;
        }
        log::debug!("Event queued (SDK not ready): {}", event.name());
        if self.queue.len() >= MAX_QUEUED_EVENTS {
            self.queue.pop_front();
        }
        self.queue.push_back(event);
    }

    fn send(&mut self, event: &AnalyticsEvent) {
        let payload = event.payload();
        match self.gateway.custom_event(event.name(), &payload) {
            Ok(()) => log::debug!("Event tracked: {} {}", event.name(), payload),
            Err(e) => log::error!("Event tracking error ({}): {}", event.name(), e),
        }
    }

    fn flush(&mut self) {
        while let Some(event) = self.queue.pop_front() {
            self.send(&event);
        }
    }

    pub fn gameplay_start(&mut self) {
        if !self.ready {
            return;
        }
        if let Err(e) = self.gateway.gameplay_start() {
            log::error!("gameplayStart error: {}", e);
        }
    }

    pub fn gameplay_stop(&mut self) {
        if !self.ready {
            return;
        }
        if let Err(e) = self.gateway.gameplay_stop() {
            log::error!("gameplayStop error: {}", e);
        }
    }

    /// Interstitial ad. Returns true if the SDK showed it.
    pub async fn commercial_break(&mut self, now: u64) -> bool {
        if self.cooldown_active(now) {
            log::info!("Ad cooldown active, skipping commercial break");
            return false;
        }
        if !self.ready {
            log::warn!("Commercial break not available (SDK not ready)");
            self.track(AnalyticsEvent::CommercialBreakSkipped {
                reason: REASON_SDK_NOT_READY,
            });
            return false;
        }

        self.gameplay_stop();
        self.track(AnalyticsEvent::CommercialBreakStart { timestamp: now });
        let result = self.gateway.commercial_break().await;
        self.cooldown_until = now + self.cooldown_ms;

        let shown = match result {
            Ok(()) => {
                self.track(AnalyticsEvent::CommercialBreakComplete { error: None });
                true
            }
            Err(AdError::Sdk(reason)) => {
                log::warn!("Commercial break failed: {}", reason);
                self.track(AnalyticsEvent::CommercialBreakComplete {
                    error: Some(reason),
                });
                false
            }
            Err(e) => {
                log::error!("Commercial break error: {}", e);
                self.track(AnalyticsEvent::CommercialBreakError {
                    error: e.to_string(),
                });
                false
            }
        };

        self.gameplay_start();
        shown
    }

    /// Opt-in ad. Returns true only if the player watched it.
    pub async fn rewarded_break(&mut self, now: u64) -> bool {
        if !self.ready {
            log::warn!("Rewarded break not available (SDK not ready)");
            self.track(AnalyticsEvent::RewardedSkipped {
                reason: REASON_SDK_NOT_READY,
            });
            return false;
        }

        self.gameplay_stop();
        self.track(AnalyticsEvent::RewardedStart { timestamp: now });

        let watched = match self.gateway.rewarded_break().await {
            Ok(watched) => {
                self.track(AnalyticsEvent::RewardedComplete {
                    watched,
                    error: None,
                });
                watched
            }
            Err(AdError::Sdk(reason)) => {
                log::warn!("Rewarded break failed: {}", reason);
                self.track(AnalyticsEvent::RewardedComplete {
                    watched: false,
                    error: Some(reason),
                });
                false
            }
            Err(e) => {
                log::error!("Rewarded break error: {}", e);
                self.track(AnalyticsEvent::RewardedError {
                    error: e.to_string(),
                });
                false
            }
        };

        self.gameplay_start();
        watched
    }

    pub fn track_session_start(&mut self, now: u64, referrer: Option<String>) {
        self.session_start = Some(now);
        self.track(AnalyticsEvent::SessionStart {
            timestamp: now,
            referrer,
        });
    }

    /// Reports the session length once; later calls do nothing
    pub fn track_session_end(&mut self, now: u64) {
        let Some(start) = self.session_start.take() else {
            return;
        };
        self.track(AnalyticsEvent::SessionEnd {
            duration_secs: now.saturating_sub(start) / 1000,
            timestamp: now,
        });
    }
}


#[cfg(test)]
mod tests {
    use futures::executor::block_on;

    use super::fake::FakeGateway;
    use super::*;
    use crate::platform::VirtualClock;
    use crate::sim::GameMode;

    fn ready_service() -> AdService<FakeGateway> {
        let mut service = AdService::new(FakeGateway::ready(), 30_000);
        assert!(block_on(service.initialize(&VirtualClock::new(0), 3, 500)));
        service
    }

    #[test]
    fn test_init_retries_with_backoff() {
        let clock = VirtualClock::new(0);
        let gateway = FakeGateway {
            init_failures: 2,
            ..FakeGateway::default()
        };
        let mut service = AdService::new(gateway, 30_000);
        assert!(block_on(service.initialize(&clock, 3, 500)));
        assert_eq!(service.gateway().init_calls, 3);
        assert_eq!(clock.now_ms(), 1000);
    }

    #[test]
    fn test_init_gives_up_into_dev_mode() {
        let clock = VirtualClock::new(0);
        let mut service = AdService::new(FakeGateway::offline(), 30_000);
        assert!(!block_on(service.initialize(&clock, 3, 500)));
        assert!(!service.is_ready());
        assert_eq!(service.gateway().init_calls, 3);

        // Dev mode: ads are skipped, nothing reaches the SDK
        assert!(!block_on(service.commercial_break(0)));
        assert!(!block_on(service.rewarded_break(0)));
        assert_eq!(service.gateway().commercial_calls, 0);
        assert_eq!(service.gateway().rewarded_calls, 0);
        assert!(service.gateway().gameplay.is_empty());
        assert_eq!(service.queued(), 2);
    }

    #[test]
    fn test_queue_flushes_in_order_before_sdk_initialized() {
        let mut service = AdService::new(FakeGateway::ready(), 30_000);
        service.track_session_start(10, None);
        service.track(AnalyticsEvent::ScreenView {
            screen: "menu".into(),
        });
        service.track(AnalyticsEvent::ModeSelected {
            mode: GameMode::Campaign,
        });
        assert_eq!(service.queued(), 3);
        assert!(service.gateway().events.is_empty());

        block_on(service.initialize(&VirtualClock::new(0), 3, 500));
        assert_eq!(service.queued(), 0);
        assert_eq!(
            service.gateway().event_names(),
            vec!["session_start", "screen_view", "mode_selected", "sdk_initialized"]
        );
    }

    #[test]
    fn test_queue_is_bounded() {
        let mut service = AdService::new(FakeGateway::offline(), 30_000);
        for combo in 0..(MAX_QUEUED_EVENTS as u32 + 5) {
            service.track(AnalyticsEvent::ComboAchievement { combo });
        }
        assert_eq!(service.queued(), MAX_QUEUED_EVENTS);
    }

    #[test]
    fn test_commercial_break_cooldown() {
        let mut service = ready_service();
        assert!(block_on(service.commercial_break(1_000)));
        assert!(service.cooldown_active(30_999));
        assert!(!block_on(service.commercial_break(20_000)));
        assert_eq!(service.gateway().commercial_calls, 1);
        assert!(block_on(service.commercial_break(31_000)));
        assert_eq!(service.gateway().commercial_calls, 2);
    }

    #[test]
    fn test_commercial_break_sequence() {
        let mut service = ready_service();
        block_on(service.commercial_break(0));
        let gateway = service.gateway();
        assert_eq!(gateway.gameplay, vec!["stop", "start"]);
        assert_eq!(
            gateway.event_names(),
            vec![
                "sdk_initialized",
                "ad_commercial_break_start",
                "ad_commercial_break_complete"
            ]
        );
        assert_eq!(gateway.events[2].1["success"], true);
    }

    #[test]
    fn test_failed_break_degrades_and_still_cools_down() {
        let mut service = ready_service();
        service
            .gateway_mut()
            .commercial
            .push_back(Err(AdError::Sdk("no fill".into())));
        assert!(!block_on(service.commercial_break(0)));
        assert!(service.cooldown_active(1));

        let gateway = service.gateway();
        assert_eq!(gateway.gameplay, vec!["stop", "start"]);
        let (name, payload) = gateway.events.last().unwrap();
        assert_eq!(name, "ad_commercial_break_complete");
        assert_eq!(payload["error"], "no fill");
    }

    #[test]
    fn test_rewarded_break_outcomes() {
        let mut service = ready_service();
        service.gateway_mut().rewarded.extend([
            Ok(true),
            Ok(false),
            Err(AdError::Unavailable),
        ]);
        assert!(block_on(service.rewarded_break(0)));
        assert!(!block_on(service.rewarded_break(0)));
        assert!(!block_on(service.rewarded_break(0)));

        let names = service.gateway().event_names();
        assert_eq!(names.last(), Some(&"ad_rewarded_error"));
        assert_eq!(
            service.gateway().gameplay,
            vec!["stop", "start", "stop", "start", "stop", "start"]
        );
    }

    #[test]
    fn test_session_end_reports_seconds_once() {
        let mut service = ready_service();
        service.track_session_start(1_000, Some("https://example.org".into()));
        service.track_session_end(62_500);
        service.track_session_end(90_000);

        let ends: Vec<_> = service
            .gateway()
            .events
            .iter()
            .filter(|(name, _)| name == "session_end")
            .collect();
        assert_eq!(ends.len(), 1);
        assert_eq!(ends[0].1["duration"], 61);
    }
}
