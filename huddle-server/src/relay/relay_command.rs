use huddle_core::{ClientSignal, PeerId};

#[derive(Debug)]
pub enum RelayCommand {
    Signal {
        peer_id: PeerId,
        signal: ClientSignal,
    },
    Disconnected {
        peer_id: PeerId,
    },
}
