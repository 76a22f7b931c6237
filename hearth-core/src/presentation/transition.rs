//! Screen fades and scene loading

use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::info;

use crate::error::Result;

/// Port for the screen-level effects around a scene
#[async_trait]
pub trait SceneTransition: Send + Sync {
    async fn fade_to_black(&self, duration: Duration);

    async fn fade_from_black(&self, duration: Duration);

    /// Switch to the scene with this id
    async fn load_scene(&self, scene_id: &str) -> Result<()>;
}

/// Linear fade curve: alpha at `elapsed` into a fade from `from` to `to`
pub fn fade_alpha(from: f32, to: f32, elapsed: Duration, duration: Duration) -> f32 {
    if duration.is_zero() {
        return to;
    }
    let t = (elapsed.as_secs_f32() / duration.as_secs_f32()).clamp(0.0, 1.0);
    from + (to - from) * t
}

/// Largest accepted fade time scale
pub const MAX_TIME_SCALE: f32 = 100.0;

/// Transition that only waits out the fades and records scene loads
#[derive(Debug)]
pub struct TimedTransition {
    time_scale: f32,
    loaded: Mutex<Vec<String>>,
}

impl TimedTransition {
    pub fn new() -> Self {
        Self {
            time_scale: 1.0,
            loaded: Mutex::new(Vec::new()),
        }
    }

    /// Scale every fade (0.0 skips waiting entirely)
    ///
    /// Clamped to `0.0..=MAX_TIME_SCALE`; NaN counts as 0.0.
    pub fn with_time_scale(mut self, scale: f32) -> Self {
        self.time_scale = if scale.is_nan() {
            0.0
        } else {
            scale.clamp(0.0, MAX_TIME_SCALE)
        };
        self
    }

    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    /// Scene ids passed to `load_scene`, in order
    pub async fn loaded_scenes(&self) -> Vec<String> {
        self.loaded.lock().await.clone()
    }

    async fn wait(&self, duration: Duration) {
        // out-of-range products skip the wait
        let scaled = Duration::try_from_secs_f32(duration.as_secs_f32() * self.time_scale)
            .unwrap_or(Duration::ZERO);
        if !scaled.is_zero() {
            tokio::time::sleep(scaled).await;
        }
    }
}

impl Default for TimedTransition {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SceneTransition for TimedTransition {
    async fn fade_to_black(&self, duration: Duration) {
        info!(?duration, "Fading to black");
        self.wait(duration).await;
    }

    async fn fade_from_black(&self, duration: Duration) {
        info!(?duration, "Fading from black");
        self.wait(duration).await;
    }

    async fn load_scene(&self, scene_id: &str) -> Result<()> {
        info!(scene = scene_id, "Loading scene");
        self.loaded.lock().await.push(scene_id.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fade_alpha_curve() {
        let second = Duration::from_secs(1);
        assert_eq!(fade_alpha(0.0, 1.0, Duration::ZERO, second), 0.0);
        assert!((fade_alpha(0.0, 1.0, Duration::from_millis(500), second) - 0.5).abs() < 1e-6);
        assert_eq!(fade_alpha(0.0, 1.0, Duration::from_secs(5), second), 1.0);
        assert_eq!(fade_alpha(1.0, 0.0, Duration::from_secs(1), second), 0.0);
    }

    #[test]
    fn test_fade_alpha_zero_duration() {
        assert_eq!(fade_alpha(1.0, 0.0, Duration::ZERO, Duration::ZERO), 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timed_transition_waits_and_records() {
        let transition = TimedTransition::new();
        let started = tokio::time::Instant::now();

        transition.fade_to_black(Duration::from_secs(1)).await;
        transition.load_scene("Field").await.unwrap();
        transition.fade_from_black(Duration::from_secs(1)).await;

        assert!(started.elapsed() >= Duration::from_secs(2));
        assert_eq!(transition.loaded_scenes().await, vec!["Field".to_string()]);
    }

    #[tokio::test]
    async fn test_zero_time_scale_skips_waiting() {
        let transition = TimedTransition::new().with_time_scale(0.0);
        let started = std::time::Instant::now();
        transition.fade_to_black(Duration::from_secs(30)).await;
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_time_scale_is_clamped() {
        assert_eq!(TimedTransition::new().with_time_scale(-2.0).time_scale(), 0.0);
        assert_eq!(TimedTransition::new().with_time_scale(f32::NAN).time_scale(), 0.0);

        let transition = TimedTransition::new().with_time_scale(f32::INFINITY);
        assert_eq!(transition.time_scale(), MAX_TIME_SCALE);

        let started = tokio::time::Instant::now();
        transition.fade_from_black(Duration::from_millis(10)).await;
        assert!(started.elapsed() >= Duration::from_millis(999));

        // too long to represent: no panic, no wait
        let started = tokio::time::Instant::now();
        transition.fade_to_black(Duration::MAX).await;
        assert_eq!(started.elapsed(), Duration::ZERO);
    }
}
