use huddle_core::{PeerId, ServerSignal};

use crate::integration::{create_test_relay, init_tracing};
use crate::utils::{disconnect, expect_no_signal, join_room, next_signals};

#[tokio::test]
async fn test_three_peers_join() {
    init_tracing();

    let (relay_tx, mut signal_rx, signaling) = create_test_relay();
    let peers: Vec<PeerId> = ["A", "B", "C"].into_iter().map(PeerId::from).collect();

    for peer in &peers {
        join_room(&relay_tx, peer, "r1").await.unwrap();
    }
    // 1 + 2 + 3 deliveries.
    next_signals(&mut signal_rx, 6).await.unwrap();
    expect_no_signal(&mut signal_rx).await.unwrap();

    assert_eq!(
        signaling.signals_for(&peers[2]).await,
        vec![ServerSignal::AllUsers(vec![peers[0].clone(), peers[1].clone()])]
    );
    assert_eq!(
        signaling.signals_for(&peers[0]).await,
        vec![
            ServerSignal::AllUsers(vec![]),
            ServerSignal::UserJoined(peers[1].clone()),
            ServerSignal::UserJoined(peers[2].clone()),
        ]
    );

    disconnect(&relay_tx, &peers[1]).await.unwrap();
    let left = next_signals(&mut signal_rx, 2).await.unwrap();
    assert!(left.iter().all(|m| m.signal == ServerSignal::UserLeft(peers[1].clone())));
    let mut told: Vec<PeerId> = left.into_iter().map(|m| m.to).collect();
    told.sort();
    assert_eq!(told, vec![peers[0].clone(), peers[2].clone()]);

    // A peer joining afterwards sees only who is still there.
    let d = PeerId::from("D");
    join_room(&relay_tx, &d, "r1").await.unwrap();
    next_signals(&mut signal_rx, 3).await.unwrap();
    assert_eq!(
        signaling.signals_for(&d).await,
        vec![ServerSignal::AllUsers(vec![peers[0].clone(), peers[2].clone()])]
    );
}
