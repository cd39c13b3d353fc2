//! Headless renderer - polls every gopher once per frame and prints the board.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;
use whack_core::{ActorSnapshot, Gaze, Grid, GridSnapshot, Phase};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameFormat {
    /// One line per row of glyphs
    Text,
    /// One JSON object per frame
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown frame format '{0}', expected 'text' or 'json'")]
pub struct UnknownFrameFormat(String);

impl std::str::FromStr for FrameFormat {
    type Err = UnknownFrameFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(UnknownFrameFormat(other.to_string())),
        }
    }
}

fn glyph(cell: &ActorSnapshot) -> &'static str {
    match (cell.phase, cell.gaze) {
        (Phase::Resting, _) => "  _  ",
        (Phase::Stunned, _) => " x_x ",
        (Phase::Alert, Gaze::Left) => " <o  ",
        (Phase::Alert, Gaze::Right) => "  o> ",
        (Phase::Alert, Gaze::Closed) => " -_- ",
    }
}

pub fn render_text(snapshot: &GridSnapshot) -> String {
    let mut frame = String::new();
    for row in snapshot.iter_rows() {
        frame.push('|');
        for cell in row {
            frame.push_str(glyph(cell));
            frame.push('|');
        }
        frame.push('\n');
    }
    frame
}

pub fn render_json(snapshot: &GridSnapshot) -> serde_json::Result<String> {
    let mut line = serde_json::to_string(snapshot)?;
    line.push('\n');
    Ok(line)
}

pub fn render(snapshot: &GridSnapshot, format: FrameFormat) -> serde_json::Result<String> {
    match format {
        FrameFormat::Text => Ok(render_text(snapshot)),
        FrameFormat::Json => render_json(snapshot),
    }
}

/// Print a frame every `interval` until cancelled.
pub async fn run_renderer<W>(
    grid: Arc<Grid>,
    interval: Duration,
    format: FrameFormat,
    mut out: W,
    cancel: CancellationToken,
) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let frame = render(&grid.snapshot(), format)?;
        if format == FrameFormat::Text {
            out.write_all(b"\n").await?;
        }
        out.write_all(frame.as_bytes()).await?;
        out.flush().await?;
    }
    Ok(())
}
