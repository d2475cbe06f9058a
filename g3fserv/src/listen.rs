/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::net::SocketAddr;

use anyhow::anyhow;
use tokio::net::{TcpListener, TcpSocket};

use crate::config::ListenConfig;

const LISTEN_BACKLOG: u32 = 128;

/// Bind a listening socket according to the listen config.
///
/// Address reuse is applied before bind so the port can be taken over
/// immediately after a previous instance released it.
pub fn bind(config: &ListenConfig) -> anyhow::Result<TcpListener> {
    let addr = config.address();
    let socket = new_socket(addr)
        .map_err(|e| anyhow!("failed to create listen socket for {addr}: {e:?}"))?;
    if config.reuse_addr() && addr.port() != 0 {
        socket
            .set_reuseaddr(true)
            .map_err(|e| anyhow!("failed to set addr reuse on socket for {addr}: {e:?}"))?;
    }
    socket
        .bind(addr)
        .map_err(|e| anyhow!("failed to bind socket to {addr}: {e:?}"))?;
    socket
        .listen(LISTEN_BACKLOG)
        .map_err(|e| anyhow!("failed to listen on {addr}: {e:?}"))
}

fn new_socket(addr: SocketAddr) -> std::io::Result<TcpSocket> {
    if addr.is_ipv4() {
        TcpSocket::new_v4()
    } else {
        TcpSocket::new_v6()
    }
}
