use anyhow::{Context, Result};
use huddle_core::{ClientSignal, PeerId, RoomId};
use huddle_server::RelayCommand;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::utils::SignalMessage;

pub const SIGNAL_TIMEOUT_MS: u64 = 2000;
pub const SILENCE_MS: u64 = 200;
pub const NEGOTIATION_TIMEOUT_MS: u64 = 10000;

pub async fn send_signal(
    relay_tx: &mpsc::Sender<RelayCommand>,
    peer_id: &PeerId,
    signal: ClientSignal,
) -> Result<()> {
    relay_tx
        .send(RelayCommand::Signal {
            peer_id: peer_id.clone(),
            signal,
        })
        .await
        .context("Relay is gone")
}

pub async fn join_room(
    relay_tx: &mpsc::Sender<RelayCommand>,
    peer_id: &PeerId,
    room: &str,
) -> Result<()> {
    send_signal(relay_tx, peer_id, ClientSignal::JoinRoom(RoomId::from(room))).await
}

pub async fn disconnect(relay_tx: &mpsc::Sender<RelayCommand>, peer_id: &PeerId) -> Result<()> {
    relay_tx
        .send(RelayCommand::Disconnected {
            peer_id: peer_id.clone(),
        })
        .await
        .context("Relay is gone")
}

/// Next captured signal, failing after `SIGNAL_TIMEOUT_MS`.
pub async fn next_signal(rx: &mut mpsc::UnboundedReceiver<SignalMessage>) -> Result<SignalMessage> {
    tokio::time::timeout(Duration::from_millis(SIGNAL_TIMEOUT_MS), rx.recv())
        .await
        .context("Timeout waiting for signal")?
        .context("Signal channel closed")
}

/// Collects exactly `n` signals.
pub async fn next_signals(
    rx: &mut mpsc::UnboundedReceiver<SignalMessage>,
    n: usize,
) -> Result<Vec<SignalMessage>> {
    let mut out = Vec::with_capacity(n);
    for _ in 0..n {
        out.push(next_signal(rx).await?);
    }
    Ok(out)
}

/// Fails if anything arrives within `SILENCE_MS`.
pub async fn expect_no_signal(rx: &mut mpsc::UnboundedReceiver<SignalMessage>) -> Result<()> {
    match tokio::time::timeout(Duration::from_millis(SILENCE_MS), rx.recv()).await {
        Ok(Some(msg)) => anyhow::bail!("Unexpected signal: {:?}", msg),
        _ => Ok(()),
    }
}
