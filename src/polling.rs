use log::{debug, info, warn};
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::board::{classify, lock, BoardController, BoardOutcome, Delta, Snapshot, Thresholds};
use crate::hardware::SensorGrid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub interval: Duration,
    pub thresholds: Thresholds,
}

impl Default for PollSettings {
    fn default() -> Self {
        PollSettings {
            interval: Duration::from_millis(50),
            thresholds: Thresholds::default(),
        }
    }
}

/// Turns successive grid reads into deltas.
pub struct SensorScan {
    grid: Box<dyn SensorGrid>,
    thresholds: Thresholds,
    previous: Option<Snapshot>,
}

impl SensorScan {
    pub fn new(grid: Box<dyn SensorGrid>, thresholds: Thresholds) -> Self {
        SensorScan {
            grid,
            thresholds,
            previous: None,
        }
    }

    /// Reads the grid once and returns what changed since the last good read.
    /// The first read only records a baseline. A failed read is logged and
    /// skipped, keeping the previous snapshot.
    pub fn scan(&mut self) -> Option<Delta> {
        let readings = match self.grid.poll() {
            Ok(readings) => readings,
            Err(e) => {
                warn!("Skipping sensor scan: {}", e);
                return None;
            }
        };
        let current = Snapshot::from_readings(&readings, self.thresholds);
        let delta = self.previous.as_ref().map(|previous| classify(previous, &current));
        self.previous = Some(current);
        delta.filter(|delta| !delta.is_empty())
    }

    pub fn into_grid(self) -> Box<dyn SensorGrid> {
        self.grid
    }
}

/// Background thread feeding sensor deltas into the shared controller.
///
/// The grid is scanned without holding the controller lock; the lock is only
/// taken to apply a non-empty delta.
pub struct PollingLoop {
    running: Arc<AtomicBool>,
    handle: JoinHandle<Box<dyn SensorGrid>>,
}

impl PollingLoop {
    /// Takes the baseline scan on the calling thread, then starts polling.
    pub fn spawn<F>(
        grid: Box<dyn SensorGrid>,
        settings: PollSettings,
        board: Arc<Mutex<BoardController>>,
        mut on_outcomes: F,
    ) -> io::Result<PollingLoop>
    where
        F: FnMut(Vec<BoardOutcome>) + Send + 'static,
    {
        let mut scan = SensorScan::new(grid, settings.thresholds);
        scan.scan();

        let running = Arc::new(AtomicBool::new(true));
        let running_ref = running.clone();
        let handle = thread::Builder::new()
            .name("sensor-poll".to_string())
            .spawn(move || {
                info!("Sensor polling started every {:?}", settings.interval);
                while running_ref.load(Ordering::SeqCst) {
                    if let Some(delta) = scan.scan() {
                        debug!("Board changed: vacated {:?}, occupied {:?}", delta.vacated, delta.occupied);
                        let outcomes = lock(&board).apply_delta(&delta);
                        if !outcomes.is_empty() {
                            on_outcomes(outcomes);
                        }
                    }
                    thread::sleep(settings.interval);
                }
                info!("Sensor polling stopped");
                scan.into_grid()
            })?;

        Ok(PollingLoop { running, handle })
    }

    /// Stops the thread, waits for it and hands the grid back.
    pub fn stop(self) -> Option<Box<dyn SensorGrid>> {
        self.running.store(false, Ordering::SeqCst);
        match self.handle.join() {
            Ok(grid) => Some(grid),
            Err(_) => {
                warn!("Sensor polling thread panicked, grid lost");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{BoardState, BoardStateMachine, CellState, LightFeedback, Readings, Square};
    use crate::game::{GameMode, GameSession};
    use crate::hardware::{RecordingLedDriver, SensorError, SimulatedGrid};
    use std::sync::mpsc;

    fn sq(name: &str) -> Square {
        name.parse().unwrap()
    }

    #[test]
    fn test_first_scan_is_baseline() {
        let (grid, handle) = SimulatedGrid::new(&Snapshot::starting_layout());
        let mut scan = SensorScan::new(Box::new(grid), Thresholds::default());
        assert_eq!(scan.scan(), None);
        assert_eq!(scan.scan(), None);

        handle.lift(sq("e2"));
        assert_eq!(scan.scan(), Some(Delta::new([sq("e2")], [])));
        assert_eq!(scan.scan(), None);

        handle.place(sq("e4"), CellState::White);
        assert_eq!(scan.scan(), Some(Delta::new([], [sq("e4")])));
    }

    struct FlakyGrid {
        calls: usize,
    }

    impl SensorGrid for FlakyGrid {
        fn poll(&mut self) -> Result<Readings, SensorError> {
            self.calls += 1;
            if self.calls == 2 {
                return Err(SensorError::ReadFailed {
                    channel: 12,
                    reason: "mux timeout".to_string(),
                });
            }
            let mut readings = [512; Square::COUNT];
            if self.calls >= 3 {
                readings[sq("a1").index()] = 1000;
            }
            Ok(readings)
        }
    }

    #[test]
    fn test_failed_read_keeps_previous_snapshot() {
        let mut scan = SensorScan::new(Box::new(FlakyGrid { calls: 0 }), Thresholds::default());
        assert_eq!(scan.scan(), None);
        assert_eq!(scan.scan(), None);
        assert_eq!(scan.scan(), Some(Delta::new([], [sq("a1")])));
    }

    #[test]
    fn test_polling_loop_feeds_controller() {
        let mut controller = BoardController::new(
            GameSession::default(),
            BoardStateMachine::new(LightFeedback::new(Box::new(RecordingLedDriver::new())), None),
        );
        controller.set_mode(GameMode::Local).unwrap();
        controller.start_game().unwrap();
        let board = Arc::new(Mutex::new(controller));

        let (grid, handle) = SimulatedGrid::new(&Snapshot::starting_layout());
        let (tx, rx) = mpsc::channel();
        let settings = PollSettings {
            interval: Duration::from_millis(2),
            ..PollSettings::default()
        };
        let poller = PollingLoop::spawn(Box::new(grid), settings, board.clone(), move |outcomes| {
            let _ = tx.send(outcomes);
        })
        .unwrap();

        handle.lift(sq("e2"));
        let outcomes = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(matches!(
            outcomes.as_slice(),
            [BoardOutcome::LegalMovesShown { from, .. }] if *from == sq("e2")
        ));
        assert_eq!(lock(&board).state(), BoardState::AwaitingPlacement(sq("e2")));

        assert!(poller.stop().is_some());
    }
}
