//! Analytics events
//!
//! Every event has a fixed name and a structured JSON payload with camelCase
//! keys. The ad service forwards them to the SDK (or queues them until it is
//! ready).

use serde_json::{Value, json};

use crate::sim::{GameMode, PowerUpKind};

/// Why an ad call did not reach the SDK
pub const REASON_SDK_NOT_READY: &str = "sdk_not_ready";
/// Player closed a rewarded ad early
pub const REASON_USER_SKIPPED: &str = "user_skipped";

#[derive(Debug, Clone, PartialEq)]
pub enum AnalyticsEvent {
    SessionStart { timestamp: u64, referrer: Option<String> },
    /// `duration_secs` is whole seconds since the session started
    SessionEnd { duration_secs: u64, timestamp: u64 },
    ScreenView { screen: String },
    ModeSelected { mode: GameMode },
    GameStart { mode: GameMode },
    /// `level` is the 0-based index; reported 1-based
    LevelStart { level: usize, mode: GameMode },
    LevelComplete { level: usize, score: u64, target: u64 },
    CampaignComplete { total_score: u64, high_score: u64 },
    GameOver { score: u64, mode: GameMode },
    TimeAttackScore { score: u64, time_remaining: u32 },
    ScoreMilestone { score: u64, milestone: u64 },
    ComboAchievement { combo: u32 },
    HighScore { score: u64, previous: u64 },
    PowerUpCollected { kind: PowerUpKind, score: u64 },
    SdkInitialized,

    CommercialBreakStart { timestamp: u64 },
    /// `error` is set when the SDK call failed
    CommercialBreakComplete { error: Option<String> },
    CommercialBreakSkipped { reason: &'static str },
    CommercialBreakError { error: String },
    RewardedStart { timestamp: u64 },
    RewardedComplete { watched: bool, error: Option<String> },
    RewardedSkipped { reason: &'static str },
    RewardedError { error: String },
}

impl AnalyticsEvent {
    pub fn name(&self) -> &'static str {
        match self {
            AnalyticsEvent::SessionStart { .. } => "session_start",
            AnalyticsEvent::SessionEnd { .. } => "session_end",
            AnalyticsEvent::ScreenView { .. } => "screen_view",
            AnalyticsEvent::ModeSelected { .. } => "mode_selected",
            AnalyticsEvent::GameStart { .. } => "game_start",
            AnalyticsEvent::LevelStart { .. } => "level_start",
            AnalyticsEvent::LevelComplete { .. } => "level_complete",
            AnalyticsEvent::CampaignComplete { .. } => "campaign_complete",
            AnalyticsEvent::GameOver { .. } => "game_over",
            AnalyticsEvent::TimeAttackScore { .. } => "time_attack_score",
            AnalyticsEvent::ScoreMilestone { .. } => "score_milestone",
            AnalyticsEvent::ComboAchievement { .. } => "combo_achievement",
            AnalyticsEvent::HighScore { .. } => "high_score",
            AnalyticsEvent::PowerUpCollected { .. } => "powerup_collected",
            AnalyticsEvent::SdkInitialized => "sdk_initialized",
            AnalyticsEvent::CommercialBreakStart { .. } => "ad_commercial_break_start",
            AnalyticsEvent::CommercialBreakComplete { .. } => "ad_commercial_break_complete",
            AnalyticsEvent::CommercialBreakSkipped { .. } => "ad_commercial_break_skipped",
            AnalyticsEvent::CommercialBreakError { .. } => "ad_commercial_break_error",
            AnalyticsEvent::RewardedStart { .. } => "ad_rewarded_start",
            AnalyticsEvent::RewardedComplete { .. } => "ad_rewarded_complete",
            AnalyticsEvent::RewardedSkipped { .. } => "ad_rewarded_skipped",
            AnalyticsEvent::RewardedError { .. } => "ad_rewarded_error",
        }
    }

    pub fn payload(&self) -> Value {
        match self {
            AnalyticsEvent::SessionStart {
                timestamp,
                referrer,
            } => json!({
                "timestamp": timestamp,
                "referrer": referrer.as_deref().unwrap_or("direct"),
            }),
            AnalyticsEvent::SessionEnd {
                duration_secs,
                timestamp,
            } => json!({ "duration": duration_secs, "timestamp": timestamp }),
            AnalyticsEvent::ScreenView { screen } => json!({ "screen": screen }),
            AnalyticsEvent::ModeSelected { mode } | AnalyticsEvent::GameStart { mode } => {
                json!({ "mode": mode.as_str() })
            }
            AnalyticsEvent::LevelStart { level, mode } => {
                json!({ "level": level + 1, "mode": mode.as_str() })
            }
            AnalyticsEvent::LevelComplete {
                level,
                score,
                target,
            } => json!({ "level": level + 1, "score": score, "targetScore": target }),
            AnalyticsEvent::CampaignComplete {
                total_score,
                high_score,
            } => json!({ "totalScore": total_score, "highScore": high_score }),
            AnalyticsEvent::GameOver { score, mode } => {
                json!({ "score": score, "mode": mode.as_str() })
            }
            AnalyticsEvent::TimeAttackScore {
                score,
                time_remaining,
            } => json!({ "score": score, "timeRemaining": time_remaining }),
            AnalyticsEvent::ScoreMilestone { score, milestone } => {
                json!({ "score": score, "milestone": milestone })
            }
            AnalyticsEvent::ComboAchievement { combo } => json!({ "combo": combo }),
            AnalyticsEvent::HighScore { score, previous } => json!({
                "score": score,
                "previousHighScore": previous,
                "improvement": score.saturating_sub(*previous),
            }),
            AnalyticsEvent::PowerUpCollected { kind, score } => {
                json!({ "type": kind, "score": score })
            }
            AnalyticsEvent::SdkInitialized => json!({ "success": true }),
            AnalyticsEvent::CommercialBreakStart { timestamp }
            | AnalyticsEvent::RewardedStart { timestamp } => json!({ "timestamp": timestamp }),
            AnalyticsEvent::CommercialBreakComplete { error } => match error {
                None => json!({ "success": true }),
                Some(error) => json!({ "success": false, "error": error }),
            },
            AnalyticsEvent::RewardedComplete { watched, error } => match (error, watched) {
                (Some(error), _) => json!({ "success": false, "error": error }),
                (None, true) => json!({ "success": true, "watched": true }),
                (None, false) => json!({
                    "success": true,
                    "watched": false,
                    "reason": REASON_USER_SKIPPED,
                }),
            },
            AnalyticsEvent::CommercialBreakSkipped { reason }
            | AnalyticsEvent::RewardedSkipped { reason } => json!({ "reason": reason }),
            AnalyticsEvent::CommercialBreakError { error }
            | AnalyticsEvent::RewardedError { error } => json!({ "error": error }),
        }
    }
}
