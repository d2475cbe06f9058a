/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use log::{debug, info, warn};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use tokio_rustls::TlsAcceptor;

use crate::config::FileServConfig;

mod request;
mod task;
mod tls;

mod store;
pub use store::{FileStore, FileStoreError, FileStoreResponse};

use task::ServeTask;

/// Static file server over plaintext or TLS wrapped TCP.
pub struct FileServer {
    store: Arc<FileStore>,
    tls_acceptor: Option<TlsAcceptor>,
}

impl FileServer {
    /// Build the server. TLS credentials are loaded here, before any socket
    /// is bound, so missing credential files fail the startup.
    pub fn new(config: &FileServConfig) -> anyhow::Result<Self> {
        let tls_acceptor = match config.tls() {
            Some(paths) => Some(
                tls::build_acceptor(paths)
                    .context("failed to load TLS credentials for the file server")?,
            ),
            None => None,
        };
        Ok(FileServer {
            store: Arc::new(FileStore::new(config.base_dir())),
            tls_acceptor,
        })
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
                    info!("file server will go offline");
                    break;
                }
                r = listener.accept() => {
                    match r {
                        Ok((stream, peer_addr)) => {
                            debug!("file server: new client connection from {peer_addr}");
                            self.spawn_task(stream, peer_addr);
                        }
                        Err(e) => {
                            warn!("file server accept: {e:?}");
                        }
                    }
                }
            }
        }
    }

    fn spawn_task(&self, stream: TcpStream, peer_addr: SocketAddr) {
        let store = self.store.clone();
        match &self.tls_acceptor {
            Some(acceptor) => {
                let acceptor = acceptor.clone();
                tokio::spawn(async move {
                    // a failed handshake only closes this connection
                    match acceptor.accept(stream).await {
                        Ok(tls_stream) => {
                            ServeTask::new(store, peer_addr).into_running(tls_stream).await;
                        }
                        Err(e) => {
                            warn!("file server: TLS handshake with {peer_addr} failed: {e:?}");
                        }
                    }
                });
            }
            None => {
                tokio::spawn(async move {
                    ServeTask::new(store, peer_addr).into_running(stream).await;
                });
            }
        }
    }
}
