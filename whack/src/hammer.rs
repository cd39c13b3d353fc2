//! Hammer input - one `<x> <y>` board coordinate per line, `quit` to exit.

use std::io::BufRead;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use whack_core::{Grid, Point};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Hammer(Point),
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("expected '<x> <y>' or 'quit', got '{0}'")]
    Malformed(String),
    #[error("invalid coordinate '{0}'")]
    Coordinate(String),
}

/// Parse one input line. Blank lines yield `None`.
pub fn parse_command(line: &str) -> Result<Option<Command>, CommandError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    if line.eq_ignore_ascii_case("quit") || line.eq_ignore_ascii_case("q") {
        return Ok(Some(Command::Quit));
    }

    let mut parts = line
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|part| !part.is_empty());
    let (Some(x), Some(y), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(CommandError::Malformed(line.to_string()));
    };
    let coord = |raw: &str| {
        raw.parse::<u32>()
            .map_err(|_| CommandError::Coordinate(raw.to_string()))
    };
    Ok(Some(Command::Hammer(Point::new(coord(x)?, coord(y)?))))
}

/// Read stdin lines on a plain thread. A blocking read cannot be cancelled,
/// so it must not live on the runtime's blocking pool or shutdown would wait
/// for the next keystroke.
pub fn spawn_stdin_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(16);
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.blocking_send(line).is_err() {
                break;
            }
        }
    });
    rx
}

/// Feed hammer blows from `lines` into the grid until the input closes,
/// `quit` or cancellation. `quit` cancels `cancel` so the rest of the process
/// can wind down.
pub async fn run_hammer(
    grid: Arc<Grid>,
    mut lines: mpsc::Receiver<String>,
    cancel: CancellationToken,
) {
    loop {
        let line = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            line = lines.recv() => line,
        };
        let Some(line) = line else {
            info!("hammer input closed");
            break;
        };

        match parse_command(&line) {
            Ok(None) => {}
            Ok(Some(Command::Quit)) => {
                info!("quit requested");
                cancel.cancel();
                break;
            }
            Ok(Some(Command::Hammer(point))) => {
                if let Err(e) = grid.hammer(point).await {
                    warn!(error = %e, "hammer missed");
                }
            }
            Err(e) => warn!(error = %e, "ignoring hammer input"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use whack_core::{Layout, Phase, Timing};

    #[test]
    fn test_parse_command() {
        assert_eq!(parse_command("   "), Ok(None));
        assert_eq!(parse_command("QUIT"), Ok(Some(Command::Quit)));
        assert_eq!(
            parse_command("250 410"),
            Ok(Some(Command::Hammer(Point::new(250, 410))))
        );
        assert_eq!(
            parse_command(" 7,8 "),
            Ok(Some(Command::Hammer(Point::new(7, 8))))
        );
        assert_eq!(
            parse_command("1 2 3"),
            Err(CommandError::Malformed("1 2 3".to_string()))
        );
        assert_eq!(
            parse_command("left 2"),
            Err(CommandError::Coordinate("left".to_string()))
        );
    }

    #[tokio::test]
    async fn test_run_hammer_stops_when_input_closes() {
        let grid = Arc::new(Grid::new(Layout::default(), Timing::default()));
        let cancel = CancellationToken::new();
        let (tx, rx) = mpsc::channel(1);
        drop(tx);
        run_hammer(grid, rx, cancel.clone()).await;
        assert!(!cancel.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_hammer_strikes_and_quits() {
        let grid = Arc::new(Grid::new(
            Layout::default(),
            Timing {
                alert_min: Duration::from_secs(10),
                ..Timing::default()
            },
        ));
        grid.start().unwrap();
        grid.poke(2).await.unwrap();
        tokio::time::sleep(Duration::from_millis(40)).await;

        let cancel = CancellationToken::new();
        let (tx, rx) = mpsc::channel(16);
        for line in ["oops", "700 10", "", "450 150", "quit", "0 0"] {
            tx.send(line.to_string()).await.unwrap();
        }
        run_hammer(grid.clone(), rx, cancel.clone()).await;
        assert!(cancel.is_cancelled());

        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(grid.actor(2).unwrap().current_phase(), Phase::Stunned);
        assert!(!grid
            .actor(0)
            .unwrap()
            .sender(whack_core::Stimulus::Strike)
            .is_pending());

        grid.shutdown().await;
    }
}
