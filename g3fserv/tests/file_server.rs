/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::timeout;

use g3fserv::config::{FileServConfig, ListenConfig};
use g3fserv::listen;
use g3fserv::serve::FileServer;

const IO_TIMEOUT: Duration = Duration::from_secs(5);

async fn spawn_file_server(dir: &Path) -> (SocketAddr, broadcast::Sender<()>, JoinHandle<()>) {
    let config = FileServConfig::new(0, dir.to_path_buf());
    let server = FileServer::new(&config).unwrap();
    let listener = listen::bind(config.listen()).unwrap();
    let addr = listener.local_addr().unwrap();
    let (quit_sender, _) = broadcast::channel(1);
    let quit_receiver = quit_sender.subscribe();
    let handle = tokio::spawn(async move { server.into_running(listener, quit_receiver).await });
    (addr, quit_sender, handle)
}

async fn fetch(addr: SocketAddr, raw_request: &str) -> Vec<u8> {
    let mut stream = TcpStream::connect(("127.0.0.1", addr.port())).await.unwrap();
    stream.write_all(raw_request.as_bytes()).await.unwrap();
    let mut rsp = Vec::new();
    timeout(IO_TIMEOUT, stream.read_to_end(&mut rsp))
        .await
        .unwrap()
        .unwrap();
    rsp
}

fn split_response(rsp: &[u8]) -> (String, Vec<u8>) {
    let p = rsp
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .expect("no header/body separator");
    let head = String::from_utf8(rsp[..p].to_vec()).unwrap();
    (head, rsp[p + 4..].to_vec())
}

#[tokio::test]
async fn get_existing_file() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("hello.txt"), b"hello fixture").unwrap();
    let (addr, quit_sender, handle) = spawn_file_server(dir.path()).await;

    let rsp = fetch(addr, "GET /hello.txt HTTP/1.1\r\nHost: localhost\r\n\r\n").await;
    let (head, body) = split_response(&rsp);
    assert!(head.starts_with("HTTP/1.1 200 OK"));
    assert!(head.contains("Content-Type: text/plain"));
    assert!(head.contains("Content-Length: 13"));
    assert_eq!(body, b"hello fixture");

    let _ = quit_sender.send(());
    handle.await.unwrap();
}

#[tokio::test]
async fn get_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let (addr, quit_sender, handle) = spawn_file_server(dir.path()).await;

    let rsp = fetch(addr, "GET /missing.txt HTTP/1.1\r\nHost: localhost\r\n\r\n").await;
    let (head, _) = split_response(&rsp);
    assert!(head.starts_with("HTTP/1.1 404 Not Found"));

    let _ = quit_sender.send(());
    handle.await.unwrap();
}

#[tokio::test]
async fn head_request_has_no_body() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("hello.txt"), b"hello fixture").unwrap();
    let (addr, quit_sender, handle) = spawn_file_server(dir.path()).await;

    let rsp = fetch(addr, "HEAD /hello.txt HTTP/1.1\r\nHost: localhost\r\n\r\n").await;
    let (head, body) = split_response(&rsp);
    assert!(head.starts_with("HTTP/1.1 200 OK"));
    assert!(head.contains("Content-Length: 13"));
    assert!(body.is_empty());

    // error responses to HEAD keep the headers of the GET case but no body
    let rsp = fetch(addr, "HEAD /missing.txt HTTP/1.1\r\nHost: localhost\r\n\r\n").await;
    let (head, body) = split_response(&rsp);
    assert!(head.starts_with("HTTP/1.1 404 Not Found"));
    assert!(head.contains("Content-Length: 14"));
    assert!(body.is_empty());

    let _ = quit_sender.send(());
    handle.await.unwrap();
}

#[tokio::test]
async fn traversal_never_escapes_base_dir() {
    let dir = tempfile::tempdir().unwrap();
    let base = dir.path().join("base");
    std::fs::create_dir(&base).unwrap();
    std::fs::write(dir.path().join("secret.txt"), b"top secret").unwrap();
    let (addr, quit_sender, handle) = spawn_file_server(&base).await;

    for target in [
        "/../secret.txt",
        "/../../etc/passwd",
        "/%2e%2e/secret.txt",
        "/sub/../../secret.txt",
    ] {
        let rsp = fetch(addr, &format!("GET {target} HTTP/1.1\r\nHost: localhost\r\n\r\n")).await;
        let (head, body) = split_response(&rsp);
        assert!(head.starts_with("HTTP/1.1 404"), "target {target}: {head}");
        assert!(!body.windows(10).any(|w| w == b"top secret"));
    }

    let _ = quit_sender.send(());
    handle.await.unwrap();
}

#[tokio::test]
async fn directory_redirect_index_and_listing() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("a.txt"), b"a").unwrap();
    let sub = dir.path().join("sub");
    std::fs::create_dir(&sub).unwrap();
    std::fs::write(sub.join("index.html"), b"<html>index</html>").unwrap();
    let (addr, quit_sender, handle) = spawn_file_server(dir.path()).await;

    let rsp = fetch(addr, "GET /sub HTTP/1.1\r\nHost: localhost\r\n\r\n").await;
    let (head, _) = split_response(&rsp);
    assert!(head.starts_with("HTTP/1.1 301"));
    assert!(head.contains("Location: /sub/"));

    let rsp = fetch(addr, "GET /sub/ HTTP/1.1\r\nHost: localhost\r\n\r\n").await;
    let (head, body) = split_response(&rsp);
    assert!(head.starts_with("HTTP/1.1 200 OK"));
    assert_eq!(body, b"<html>index</html>");

    let rsp = fetch(addr, "GET / HTTP/1.1\r\nHost: localhost\r\n\r\n").await;
    let (head, body) = split_response(&rsp);
    assert!(head.starts_with("HTTP/1.1 200 OK"));
    assert!(head.contains("Content-Type: text/html"));
    let listing = String::from_utf8(body).unwrap();
    assert!(listing.contains("a.txt"));
    assert!(listing.contains("sub/"));

    let _ = quit_sender.send(());
    handle.await.unwrap();
}

#[tokio::test]
async fn unsupported_method() {
    let dir = tempfile::tempdir().unwrap();
    let (addr, quit_sender, handle) = spawn_file_server(dir.path()).await;

    let rsp = fetch(addr, "POST / HTTP/1.1\r\nHost: localhost\r\nContent-Length: 0\r\n\r\n").await;
    let (head, _) = split_response(&rsp);
    assert!(head.starts_with("HTTP/1.1 405"));
    assert!(head.contains("Allow: GET, HEAD"));

    let _ = quit_sender.send(());
    handle.await.unwrap();
}

#[tokio::test]
async fn slow_client_does_not_block_others() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("fast.txt"), b"fast").unwrap();
    let (addr, quit_sender, handle) = spawn_file_server(dir.path()).await;

    // connect and stall without ever sending a request
    let slow = TcpStream::connect(("127.0.0.1", addr.port())).await.unwrap();

    let rsp = timeout(
        IO_TIMEOUT,
        fetch(addr, "GET /fast.txt HTTP/1.1\r\nHost: localhost\r\n\r\n"),
    )
    .await
    .expect("fast client was blocked by the slow one");
    let (head, body) = split_response(&rsp);
    assert!(head.starts_with("HTTP/1.1 200 OK"));
    assert_eq!(body, b"fast");

    drop(slow);
    let _ = quit_sender.send(());
    handle.await.unwrap();
}

#[tokio::test]
async fn shutdown_releases_port() {
    let dir = tempfile::tempdir().unwrap();
    let (addr, quit_sender, handle) = spawn_file_server(dir.path()).await;

    let _ = quit_sender.send(());
    timeout(IO_TIMEOUT, handle).await.unwrap().unwrap();

    // the accept loop exited and dropped the listener, the port is free again
    let rebind_addr: SocketAddr = format!("0.0.0.0:{}", addr.port()).parse().unwrap();
    let listener = listen::bind(&ListenConfig::new(rebind_addr)).unwrap();
    assert_eq!(listener.local_addr().unwrap().port(), addr.port());
}
