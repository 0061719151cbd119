// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::protocol::{Request, Response};

#[tokio::test]
async fn request_roundtrip_over_duplex() {
    let (mut client, mut server) = tokio::io::duplex(4096);

    let request = Request::new("add_repo").arg("name", "r1");
    write_request(&mut client, &request, DEFAULT_TIMEOUT)
        .await
        .unwrap();

    let received = read_request(&mut server, DEFAULT_TIMEOUT).await.unwrap();
    assert_eq!(received, request);
}

#[tokio::test]
async fn response_roundtrip_over_duplex() {
    let (mut client, mut server) = tokio::io::duplex(4096);

    let response = Response::ok("pong");
    write_response(&mut server, &response, DEFAULT_TIMEOUT)
        .await
        .unwrap();

    let received = read_response(&mut client, DEFAULT_TIMEOUT).await.unwrap();
    assert_eq!(received, response);
}

#[tokio::test]
async fn oversized_length_prefix_is_rejected() {
    let (mut client, mut server) = tokio::io::duplex(4096);

    let len = (MAX_MESSAGE_SIZE as u32 + 1).to_be_bytes();
    tokio::io::AsyncWriteExt::write_all(&mut client, &len)
        .await
        .unwrap();

    let err = read_message(&mut server).await.unwrap_err();
    assert!(matches!(err, ProtocolError::MessageTooLarge { .. }));
}

#[tokio::test]
async fn eof_reads_as_connection_closed() {
    let (client, mut server) = tokio::io::duplex(4096);
    drop(client);

    let err = read_message(&mut server).await.unwrap_err();
    assert!(matches!(err, ProtocolError::ConnectionClosed));
}

#[test]
fn encode_rejects_oversized_payloads() {
    let big = "x".repeat(MAX_MESSAGE_SIZE + 1);
    let err = encode(&big).unwrap_err();
    assert!(matches!(err, ProtocolError::MessageTooLarge { .. }));
}
