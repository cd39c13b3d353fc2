//! Grid tests - geometry-driven stimuli and whole-board lifecycle

use std::time::Duration;
use tokio::time::{sleep, timeout};
use whack_core::{
    ActorError, Gaze, Grid, GridError, Layout, Phase, Point, Stimulus, Timing,
};

const TICK: Duration = Duration::from_millis(20);

fn long_alert() -> Timing {
    Timing {
        alert_min: Duration::from_secs(10),
        ..Timing::default()
    }
}

#[tokio::test(start_paused = true)]
async fn test_hammer_hits_the_gopher_under_the_pointer() {
    let grid = Grid::new(Layout::default(), long_alert());
    grid.start().unwrap();

    grid.poke(4).await.unwrap();
    sleep(TICK * 2).await;
    assert_eq!(grid.actor(4).unwrap().current_phase(), Phase::Alert);

    let index = grid.hammer(Point::new(300, 300)).await.unwrap();
    assert_eq!(index, 4);
    sleep(TICK * 2).await;

    let snapshot = grid.snapshot();
    assert_eq!(snapshot.cells[4].phase, Phase::Stunned);
    assert_eq!(snapshot.cells[4].gaze, Gaze::Closed);
    for (i, cell) in snapshot.cells.iter().enumerate() {
        if i != 4 {
            assert_eq!(cell.phase, Phase::Resting, "cell {i} should be untouched");
        }
    }

    grid.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_hammer_on_empty_hole_changes_nothing() {
    let grid = Grid::new(Layout::default(), Timing::default());
    grid.start().unwrap();

    assert_eq!(grid.hammer(Point::new(10, 590)).await.unwrap(), 6);
    sleep(TICK * 2).await;
    assert!(grid
        .snapshot()
        .cells
        .iter()
        .all(|cell| cell.phase == Phase::Resting && cell.gaze == Gaze::Closed));

    grid.shutdown().await;
}

#[tokio::test]
async fn test_off_board_and_out_of_bounds_are_rejected() {
    let grid = Grid::new(Layout::default(), Timing::default());

    assert_eq!(
        grid.hammer(Point::new(600, 0)).await,
        Err(GridError::OffBoard { x: 600, y: 0 })
    );
    assert_eq!(
        grid.poke(9).await,
        Err(GridError::OutOfBounds { index: 9, len: 9 })
    );
    assert_eq!(
        grid.strike(42).await,
        Err(GridError::OutOfBounds { index: 42, len: 9 })
    );
}

#[tokio::test]
async fn test_start_twice_is_rejected() {
    let grid = Grid::new(Layout::new(200, 100, 100, 100).unwrap(), Timing::default());
    grid.start().unwrap();
    assert_eq!(
        grid.start(),
        Err(GridError::Actor(ActorError::AlreadyStarted(0)))
    );
    grid.shutdown().await;
}

#[tokio::test]
async fn test_shutdown_stops_every_actor() {
    let grid = Grid::new(Layout::default(), Timing::default());
    grid.start().unwrap();
    assert!(grid.actors().iter().all(|actor| actor.is_started()));

    timeout(Duration::from_secs(1), grid.shutdown())
        .await
        .expect("grid shuts down promptly");
    assert!(grid.cancellation_token().is_cancelled());

    for index in 0..grid.len() {
        assert_eq!(
            grid.poke(index).await,
            Err(GridError::Actor(ActorError::Stopped(Stimulus::Poke)))
        );
    }
}

#[tokio::test(start_paused = true)]
async fn test_actors_decay_independently() {
    let grid = Grid::new(Layout::new(200, 100, 100, 100).unwrap(), long_alert());
    grid.start().unwrap();

    grid.poke(0).await.unwrap();
    grid.poke(1).await.unwrap();
    sleep(TICK * 2).await;
    grid.strike(0).await.unwrap();
    sleep(TICK * 2).await;

    assert_eq!(grid.actor(0).unwrap().current_phase(), Phase::Stunned);
    assert_eq!(grid.actor(1).unwrap().current_phase(), Phase::Alert);

    sleep(Duration::from_millis(600)).await;
    assert_eq!(grid.actor(0).unwrap().current_phase(), Phase::Resting);
    assert_eq!(grid.actor(1).unwrap().current_phase(), Phase::Alert);

    grid.shutdown().await;
}

#[test]
fn test_snapshot_serializes_as_json() {
    let grid = Grid::new(Layout::new(200, 100, 100, 100).unwrap(), Timing::default());
    let json = serde_json::to_value(grid.snapshot()).unwrap();
    assert_eq!(json["cols"], 2);
    assert_eq!(json["rows"], 1);
    assert_eq!(json["cells"][1]["phase"], "resting");
}
