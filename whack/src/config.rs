use std::time::Duration;

use whack_core::{Layout, Timing};

use crate::render::FrameFormat;

#[derive(Debug, Clone)]
pub struct Config {
    /// Board geometry
    pub layout: Layout,
    /// Per-actor durations
    pub timing: Timing,
    /// One poker actor is spawned per entry
    pub poke_intervals: Vec<Duration>,
    /// How often the renderer prints a frame
    pub frame_interval: Duration,
    pub frame_format: FrameFormat,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_source(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; missing keys fall back to defaults.
    pub fn from_source<F>(get: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let layout = Layout::new(
            env_parse(&get, "WHACK_BOARD_WIDTH", 600)?,
            env_parse(&get, "WHACK_BOARD_HEIGHT", 600)?,
            env_parse(&get, "WHACK_CELL_WIDTH", 200)?,
            env_parse(&get, "WHACK_CELL_HEIGHT", 200)?,
        )?;

        let defaults = Timing::default();
        let timing = Timing {
            tick: env_millis(&get, "WHACK_TICK_MS", defaults.tick)?,
            stun: env_millis(&get, "WHACK_STUN_MS", defaults.stun)?,
            alert_min: env_millis(&get, "WHACK_ALERT_MIN_MS", defaults.alert_min)?,
            alert_jitter: env_millis(&get, "WHACK_ALERT_JITTER_MS", defaults.alert_jitter)?,
            gaze_roll_max: env_millis(&get, "WHACK_GAZE_ROLL_MS", defaults.gaze_roll_max)?,
        };
        if timing.tick.is_zero() {
            return Err(anyhow::anyhow!("WHACK_TICK_MS must be greater than zero"));
        }

        let poke_intervals = env_csv(&get, "WHACK_POKE_INTERVALS_MS", &["3000", "1000", "500"])
            .into_iter()
            .map(|raw| {
                let ms = raw.parse::<u64>().map_err(|e| {
                    anyhow::anyhow!("Failed to parse WHACK_POKE_INTERVALS_MS entry {raw}: {e}")
                })?;
                if ms == 0 {
                    return Err(anyhow::anyhow!(
                        "WHACK_POKE_INTERVALS_MS entries must be greater than zero"
                    ));
                }
                Ok(Duration::from_millis(ms))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        let frame_interval = env_millis(&get, "WHACK_FRAME_MS", Duration::from_millis(250))?;
        if frame_interval.is_zero() {
            return Err(anyhow::anyhow!("WHACK_FRAME_MS must be greater than zero"));
        }

        Ok(Self {
            layout,
            timing,
            poke_intervals,
            frame_interval,
            frame_format: env_parse(&get, "WHACK_FRAME_FORMAT", FrameFormat::Text)?,
        })
    }
}

fn env_parse<F, T>(get: &F, key: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match get(key) {
        Some(val) => val
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("Failed to parse env var {key}={val}: {e}")),
        None => Ok(default),
    }
}

fn env_millis<F>(get: &F, key: &str, default: Duration) -> anyhow::Result<Duration>
where
    F: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(_) => Ok(Duration::from_millis(env_parse(get, key, 0u64)?)),
        None => Ok(default),
    }
}

fn env_csv<F>(get: &F, key: &str, default: &[&str]) -> Vec<String>
where
    F: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ToString::to_string)
            .collect(),
        None => default.iter().map(|s| (*s).to_string()).collect(),
    }
}
