/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::net::SocketAddr;
use std::sync::Arc;

use http::{Method, StatusCode, Version};
use log::{debug, warn};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use super::request::HttpRequest;
use super::store::{FileStore, FileStoreError, FileStoreResponse};

const MAX_HEAD_SIZE: usize = 8192;

/// One accepted connection: a single request, a single response, close.
pub(super) struct ServeTask {
    store: Arc<FileStore>,
    peer_addr: SocketAddr,
}

impl ServeTask {
    pub(super) fn new(store: Arc<FileStore>, peer_addr: SocketAddr) -> Self {
        ServeTask { store, peer_addr }
    }

    pub(super) async fn into_running<S>(self, stream: S)
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let (r, mut writer) = tokio::io::split(stream);
        // Take bounds the head read even when no line end ever arrives
        let mut reader = BufReader::new(r).take((MAX_HEAD_SIZE + 1) as u64);

        let req = match HttpRequest::parse(&mut reader, MAX_HEAD_SIZE).await {
            Ok(req) => req,
            Err(e) => {
                debug!("file server: invalid request from {}: {e}", self.peer_addr);
                if let Some(status) = e.status_code() {
                    let _ = write_error(&mut writer, Version::HTTP_11, status, &[], true).await;
                }
                let _ = writer.shutdown().await;
                return;
            }
        };

        debug!(
            "file server: {} {} from {}",
            req.method, req.target, self.peer_addr
        );

        let send_body = match req.method {
            Method::GET => true,
            Method::HEAD => false,
            _ => {
                let _ = write_error(
                    &mut writer,
                    req.version,
                    StatusCode::METHOD_NOT_ALLOWED,
                    &[("Allow", "GET, HEAD")],
                    true,
                )
                .await;
                let _ = writer.shutdown().await;
                return;
            }
        };

        let r = match self.store.fetch(&req.target).await {
            Ok(FileStoreResponse::Content { body, content_type }) => {
                write_content(
                    &mut writer,
                    req.version,
                    StatusCode::OK,
                    &[],
                    &content_type,
                    &body,
                    send_body,
                )
                .await
            }
            Ok(FileStoreResponse::Redirect { location }) => {
                write_error(
                    &mut writer,
                    req.version,
                    StatusCode::MOVED_PERMANENTLY,
                    &[("Location", location.as_str())],
                    send_body,
                )
                .await
            }
            Err(FileStoreError::NotFound) => {
                write_error(&mut writer, req.version, StatusCode::NOT_FOUND, &[], send_body).await
            }
            Err(FileStoreError::Io(e)) => {
                warn!(
                    "file server: failed to serve {} to {}: {e:?}",
                    req.target, self.peer_addr
                );
                write_error(
                    &mut writer,
                    req.version,
                    StatusCode::INTERNAL_SERVER_ERROR,
                    &[],
                    send_body,
                )
                .await
            }
        };
        if let Err(e) = r {
            debug!("file server: write to {} failed: {e:?}", self.peer_addr);
        }
        let _ = writer.shutdown().await;
    }
}

fn version_str(version: Version) -> &'static str {
    match version {
        Version::HTTP_10 => "HTTP/1.0",
        _ => "HTTP/1.1",
    }
}

async fn write_content<W>(
    writer: &mut W,
    version: Version,
    status: StatusCode,
    extra_headers: &[(&str, &str)],
    content_type: &str,
    body: &[u8],
    send_body: bool,
) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut head = format!(
        "{} {} {}\r\n",
        version_str(version),
        status.as_str(),
        status.canonical_reason().unwrap_or_default()
    );
    for (name, value) in extra_headers {
        head.push_str(name);
        head.push_str(": ");
        head.push_str(value);
        head.push_str("\r\n");
    }
    head.push_str(&format!(
        "Content-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        body.len()
    ));

    writer.write_all(head.as_bytes()).await?;
    if send_body {
        writer.write_all(body).await?;
    }
    writer.flush().await
}

async fn write_error<W>(
    writer: &mut W,
    version: Version,
    status: StatusCode,
    extra_headers: &[(&str, &str)],
    send_body: bool,
) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let body = format!(
        "{} {}\n",
        status.as_str(),
        status.canonical_reason().unwrap_or_default()
    );
    write_content(
        writer,
        version,
        status,
        extra_headers,
        "text/plain; charset=utf-8",
        body.as_bytes(),
        send_body,
    )
    .await
}
