#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

mod common;

use std::sync::Arc;

use axum::extract::ws::{CloseFrame, Message as Frame};
use tokio_util::sync::CancellationToken;

use dualcast_core::{ErrorKind, Message};
use dualcast_server::transport::ConnectionState;
use dualcast_server::{Connection, TransportKind};

use common::memory_stream;

fn numbered(opcode: i32, seq: u32) -> Message {
    Message::builder().opcode(opcode).raw(seq.to_le_bytes().to_vec()).build()
}

fn seq_of(m: &Message) -> u32 {
    u32::from_le_bytes(m.raw_payload[..4].try_into().unwrap())
}

#[tokio::test]
async fn single_sender_order_is_preserved() {
    let shutdown = CancellationToken::new();
    let (conn, mut peer) = memory_stream(&shutdown);
    assert_eq!(conn.transport(), TransportKind::Stream);

    for i in 0..100 {
        conn.send(numbered(1000, i)).await;
    }
    for i in 0..100 {
        assert_eq!(seq_of(&peer.next_message().await), i);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_senders_keep_their_own_order() {
    let shutdown = CancellationToken::new();
    let (conn, mut peer) = memory_stream(&shutdown);

    let mut tasks = Vec::new();
    for sender in 0..4 {
        let conn = Arc::clone(&conn);
        tasks.push(tokio::spawn(async move {
            for i in 0..50 {
                conn.send(numbered(1000 + sender, i)).await;
            }
        }));
    }
    for t in tasks {
        t.await.unwrap();
    }

    let mut next = [0u32; 4];
    for _ in 0..200 {
        let m = peer.next_message().await;
        let sender = (m.opcode - 1000) as usize;
        assert_eq!(seq_of(&m), next[sender], "sender {sender} out of order");
        next[sender] += 1;
    }
    assert_eq!(next, [50; 4]);
}

#[tokio::test]
async fn disconnect_releases_transport_exactly_once() {
    let shutdown = CancellationToken::new();
    let (conn, mut peer) = memory_stream(&shutdown);

    conn.send(numbered(1000, 0)).await;
    let _ = peer.next_message().await;

    let racers: Vec<_> = (0..5)
        .map(|_| {
            let conn = Arc::clone(&conn);
            tokio::spawn(async move { conn.disconnect().await })
        })
        .collect();
    for r in racers {
        r.await.unwrap();
    }
    conn.disconnect().await;

    assert!(!conn.is_connected());
    conn.send(numbered(1000, 1)).await;

    let frames = peer.drain().await;
    let closes = frames.iter().filter(|f| matches!(f, Frame::Close(_))).count();
    assert_eq!(closes, 1, "frames after disconnect: {frames:?}");
    assert!(frames.iter().all(|f| !matches!(f, Frame::Binary(_))));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn disconnect_racing_peer_close_releases_once() {
    for _ in 0..20 {
        let shutdown = CancellationToken::new();
        let (conn, mut peer) = memory_stream(&shutdown);

        peer.send_frame(Frame::Close(Some(CloseFrame {
            code: 1000,
            reason: "bye".into(),
        })));

        let receiver = {
            let conn = Arc::clone(&conn);
            tokio::spawn(async move { conn.receive().await })
        };
        let first = {
            let conn = Arc::clone(&conn);
            tokio::spawn(async move { conn.disconnect().await })
        };
        let second = {
            let conn = Arc::clone(&conn);
            tokio::spawn(async move { conn.disconnect().await })
        };

        assert!(receiver.await.unwrap().unwrap().is_none());
        first.await.unwrap();
        second.await.unwrap();
        conn.disconnect().await;

        assert!(!conn.is_connected());
        assert_eq!(conn.state(), ConnectionState::Closed);

        let frames = peer.drain().await;
        let closes = frames.iter().filter(|f| matches!(f, Frame::Close(_))).count();
        assert_eq!(closes, 1, "frames: {frames:?}");
    }
}

#[tokio::test]
async fn disconnect_moves_to_closed() {
    let shutdown = CancellationToken::new();
    let (conn, _peer) = memory_stream(&shutdown);
    assert_eq!(conn.state(), ConnectionState::Open);

    conn.disconnect().await;
    assert_eq!(conn.state(), ConnectionState::Closed);
}

#[tokio::test]
async fn peer_close_ends_receive() {
    let shutdown = CancellationToken::new();
    let (conn, peer) = memory_stream(&shutdown);

    peer.send_frame(Frame::Ping(vec![1]));
    peer.send_message(&Message::new(5));
    peer.send_frame(Frame::Close(Some(CloseFrame {
        code: 1000,
        reason: "bye".into(),
    })));

    assert_eq!(conn.receive().await.unwrap().unwrap().opcode, 5);
    assert!(conn.receive().await.unwrap().is_none());
    assert!(!conn.is_connected());
    assert!(conn.receive().await.unwrap().is_none());
}

#[tokio::test]
async fn dropped_peer_ends_receive() {
    let shutdown = CancellationToken::new();
    let (conn, peer) = memory_stream(&shutdown);
    drop(peer);

    assert!(conn.receive().await.unwrap().is_none());
    assert!(!conn.is_connected());
}

#[tokio::test]
async fn text_frames_carry_envelopes_too() {
    let shutdown = CancellationToken::new();
    let (conn, peer) = memory_stream(&shutdown);

    // Envelope bytes that happen to be valid UTF-8.
    let msg = Message::builder().opcode(0x41414141).from("a").to("b").build();
    let text = String::from_utf8(msg.encode().to_vec()).unwrap();
    peer.send_frame(Frame::Text(text));

    assert_eq!(conn.receive().await.unwrap().unwrap(), msg);
}

#[tokio::test]
async fn malformed_frame_is_a_decode_error() {
    let shutdown = CancellationToken::new();
    let (conn, peer) = memory_stream(&shutdown);

    peer.send_frame(Frame::Binary(vec![1, 2]));
    let err = conn.receive().await.expect_err("must fail");
    assert_eq!(err.kind(), ErrorKind::Decode);
}

#[tokio::test]
async fn shutdown_unblocks_receive() {
    let shutdown = CancellationToken::new();
    let (conn, mut peer) = memory_stream(&shutdown);

    let waiter = {
        let conn = Arc::clone(&conn);
        tokio::spawn(async move { conn.receive().await })
    };
    tokio::task::yield_now().await;
    shutdown.cancel();

    assert!(waiter.await.unwrap().unwrap().is_none());
    assert!(!conn.is_connected());

    let frames = peer.drain().await;
    assert_eq!(frames.iter().filter(|f| matches!(f, Frame::Close(_))).count(), 1);
}
