use actix::Recipient;
use log::{info, warn};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::board::{self, BoardController, BoardOutcome};
use crate::error::BoardError;
use crate::hardware::{SensorGrid, SimulatedGridHandle};
use crate::models::messages::{BoardEvent, EventRecord, PeerMessage};
use crate::polling::{PollSettings, PollingLoop};

/// The one remote connection allowed to drive the board.
pub struct Peer {
    pub id: String,
    pub recipient: Recipient<PeerMessage>,
}

/// Application state shared between connections
pub struct AppState {
    pub board: Arc<Mutex<BoardController>>,
    peer: Mutex<Option<Peer>>,
    grid: Mutex<Option<Box<dyn SensorGrid>>>,
    poller: Mutex<Option<PollingLoop>>,
    settings: PollSettings,
    simulator: Option<SimulatedGridHandle>,
}

fn guard<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl AppState {
    pub fn new(board: BoardController, grid: Box<dyn SensorGrid>, settings: PollSettings) -> Self {
        AppState {
            board: Arc::new(Mutex::new(board)),
            peer: Mutex::new(None),
            grid: Mutex::new(Some(grid)),
            poller: Mutex::new(None),
            settings,
            simulator: None,
        }
    }

    pub fn with_simulator(mut self, handle: SimulatedGridHandle) -> Self {
        self.simulator = Some(handle);
        self
    }

    pub fn simulator(&self) -> Option<&SimulatedGridHandle> {
        self.simulator.as_ref()
    }

    /// Makes `id` the paired peer and starts watching the sensors on its
    /// behalf.
    pub fn pair(&self, id: &str, recipient: Recipient<PeerMessage>) -> Result<(), BoardError> {
        {
            let mut peer = guard(&self.peer);
            if let Some(current) = peer.as_ref() {
                info!("Refusing {}: board is paired with {}", id, current.id);
                return Err(BoardError::AlreadyPaired);
            }
            *peer = Some(Peer {
                id: id.to_string(),
                recipient: recipient.clone(),
            });
        }
        info!("Paired with {}", id);
        self.start_polling(recipient);
        Ok(())
    }

    fn start_polling(&self, recipient: Recipient<PeerMessage>) {
        let grid = match guard(&self.grid).take() {
            Some(grid) => grid,
            None => {
                warn!("Sensor grid is not available, board changes will go unseen");
                return;
            }
        };
        let poller = PollingLoop::spawn(grid, self.settings, self.board.clone(), move |outcomes| {
            notify(&recipient, &outcomes)
        });
        match poller {
            Ok(poller) => *guard(&self.poller) = Some(poller),
            Err(e) => warn!("Failed to start sensor polling: {}", e),
        }
    }

    /// Releases the pairing held by `id`: polling stops, the game ends and the
    /// lights go out. Returns false when `id` was not the paired peer.
    pub fn unpair(&self, id: &str) -> bool {
        let released = {
            let mut peer = guard(&self.peer);
            match peer.as_ref() {
                Some(current) if current.id == id => peer.take(),
                _ => None,
            }
        };
        if released.is_none() {
            return false;
        }

        let poller = guard(&self.poller).take();
        if let Some(grid) = poller.and_then(PollingLoop::stop) {
            *guard(&self.grid) = Some(grid);
        }
        board::lock(&self.board).end_game();
        info!("Unpaired {}", id);
        true
    }

    pub fn paired_peer(&self) -> Option<String> {
        guard(&self.peer).as_ref().map(|peer| peer.id.clone())
    }

    pub fn is_polling(&self) -> bool {
        guard(&self.poller).is_some()
    }
}

fn notify(recipient: &Recipient<PeerMessage>, outcomes: &[BoardOutcome]) {
    for event in outcomes.iter().filter_map(BoardEvent::from_outcome) {
        recipient.do_send(PeerMessage(EventRecord::Event(event).to_json()));
    }
}
