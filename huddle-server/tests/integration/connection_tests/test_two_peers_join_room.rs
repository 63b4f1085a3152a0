use huddle_core::{PeerId, ServerSignal};

use crate::integration::{create_test_relay, init_tracing};
use crate::utils::{SignalMessage, expect_no_signal, join_room, next_signal};

#[tokio::test]
async fn test_two_peers_join_room() {
    init_tracing();

    let (relay_tx, mut signal_rx, _signaling) = create_test_relay();
    let a = PeerId::from("A");
    let b = PeerId::from("B");

    join_room(&relay_tx, &a, "r1").await.unwrap();
    assert_eq!(
        next_signal(&mut signal_rx).await.unwrap(),
        SignalMessage {
            to: a.clone(),
            signal: ServerSignal::AllUsers(vec![]),
        }
    );

    join_room(&relay_tx, &b, "r1").await.unwrap();
    assert_eq!(
        next_signal(&mut signal_rx).await.unwrap(),
        SignalMessage {
            to: b.clone(),
            signal: ServerSignal::AllUsers(vec![a.clone()]),
        }
    );
    assert_eq!(
        next_signal(&mut signal_rx).await.unwrap(),
        SignalMessage {
            to: a.clone(),
            signal: ServerSignal::UserJoined(b.clone()),
        }
    );

    expect_no_signal(&mut signal_rx).await.unwrap();
}
