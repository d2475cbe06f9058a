/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::net::SocketAddr;

use log::{debug, info, warn};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;

mod proto;
pub use proto::{POLICY_FILE, POLICY_REQUEST, is_policy_request};

const MAX_REQUEST_SIZE: usize = 1024;

/// Responder for legacy flash socket policy requests.
///
/// The protocol is frozen by the legacy client side: a single short request,
/// compared literally, answered with a fixed NUL terminated XML document.
pub struct PolicyServer {}

impl PolicyServer {
    pub fn new() -> Self {
        PolicyServer {}
    }

    pub async fn into_running(
        self,
        listener: TcpListener,
        mut quit_receiver: broadcast::Receiver<()>,
    ) {
        loop {
            tokio::select! {
                biased;

                _ = quit_receiver.recv() => {
                    info!("policy server will go offline");
                    break;
                }
                r = listener.accept() => {
                    match r {
                        Ok((stream, peer_addr)) => {
                            debug!("policy server: new client connection from {peer_addr}");
                            tokio::spawn(async move {
                                serve_connection(stream, peer_addr).await;
                            });
                        }
                        Err(e) => {
                            warn!("policy server accept: {e:?}");
                        }
                    }
                }
            }
        }
    }
}

impl Default for PolicyServer {
    fn default() -> Self {
        PolicyServer::new()
    }
}

/// Read the request with a single bounded read and answer it.
///
/// A request marker split across multiple TCP segments is treated as junk.
/// This matches what legacy plugin clients were verified against, do not
/// relax it to a read loop.
async fn serve_connection(mut stream: TcpStream, peer_addr: SocketAddr) {
    let mut buf = [0u8; MAX_REQUEST_SIZE];
    let len = match stream.read(&mut buf).await {
        Ok(len) => len,
        Err(e) => {
            warn!("policy server: read from {peer_addr} failed: {e:?}");
            return;
        }
    };

    if is_policy_request(&buf[..len]) {
        info!("policy server: policy file request from {peer_addr}");
        if let Err(e) = stream.write_all(POLICY_FILE).await {
            warn!("policy server: write to {peer_addr} failed: {e:?}");
        }
        let _ = stream.shutdown().await;
    } else {
        warn!(
            "policy server: junk request from {peer_addr}: {:?}",
            String::from_utf8_lossy(&buf[..len])
        );
    }
}
