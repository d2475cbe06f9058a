/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::io;

use http::{Method, StatusCode, Version};
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

#[derive(Debug, Error)]
pub enum HttpRequestParseError {
    #[error("client closed")]
    ClientClosed,
    #[error("too large header, should be less than {0}")]
    TooLargeHeader(usize),
    #[error("no delimiter '{0}' found")]
    NoDelimiterFound(char),
    #[error("invalid method")]
    InvalidMethod,
    #[error("unsupported version")]
    UnsupportedVersion,
    #[error("invalid request target")]
    InvalidRequestTarget,
    #[error("io failed: {0:?}")]
    IoFailed(#[from] io::Error),
}

impl HttpRequestParseError {
    pub fn status_code(&self) -> Option<StatusCode> {
        match self {
            HttpRequestParseError::IoFailed(_) | HttpRequestParseError::ClientClosed => None,
            HttpRequestParseError::TooLargeHeader(_) => {
                Some(StatusCode::REQUEST_HEADER_FIELDS_TOO_LARGE)
            }
            HttpRequestParseError::UnsupportedVersion => {
                Some(StatusCode::HTTP_VERSION_NOT_SUPPORTED)
            }
            _ => Some(StatusCode::BAD_REQUEST),
        }
    }
}

pub struct HttpRequest {
    pub method: Method,
    pub target: String,
    pub version: Version,
}

impl HttpRequest {
    /// Read and parse one request head, discarding all header fields.
    ///
    /// The total head size is capped at `max_head_size`.
    pub async fn parse<R>(
        reader: &mut R,
        max_head_size: usize,
    ) -> Result<Self, HttpRequestParseError>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut line_buf = Vec::<u8>::with_capacity(1024);
        let nr = reader.read_until(b'\n', &mut line_buf).await?;
        if nr == 0 {
            return Err(HttpRequestParseError::ClientClosed);
        }
        if nr > max_head_size {
            return Err(HttpRequestParseError::TooLargeHeader(max_head_size));
        }
        let req = Self::parse_request_line(&line_buf)?;

        let mut head_size = nr;
        loop {
            line_buf.clear();
            let nr = reader.read_until(b'\n', &mut line_buf).await?;
            if nr == 0 {
                return Err(HttpRequestParseError::ClientClosed);
            }
            head_size += nr;
            if head_size > max_head_size {
                return Err(HttpRequestParseError::TooLargeHeader(max_head_size));
            }
            if is_end_of_head(&line_buf) {
                break;
            }
        }

        Ok(req)
    }

    fn parse_request_line(buf: &[u8]) -> Result<Self, HttpRequestParseError> {
        let Some(p) = memchr::memchr(b' ', buf) else {
            return Err(HttpRequestParseError::NoDelimiterFound(' '));
        };
        let method = Method::from_bytes(&buf[0..p])
            .map_err(|_| HttpRequestParseError::InvalidMethod)?;

        let left = &buf[p + 1..];
        let Some(p) = memchr::memchr(b' ', left) else {
            return Err(HttpRequestParseError::NoDelimiterFound(' '));
        };
        let target = std::str::from_utf8(&left[0..p])
            .map_err(|_| HttpRequestParseError::InvalidRequestTarget)?;
        if !target.starts_with('/') {
            return Err(HttpRequestParseError::InvalidRequestTarget);
        }

        let version = match trim_line_end(&left[p + 1..]) {
            b"HTTP/1.0" => Version::HTTP_10,
            b"HTTP/1.1" => Version::HTTP_11,
            _ => return Err(HttpRequestParseError::UnsupportedVersion),
        };

        Ok(HttpRequest {
            method,
            target: target.to_string(),
            version,
        })
    }
}

fn trim_line_end(buf: &[u8]) -> &[u8] {
    let mut end = buf.len();
    while end > 0 && (buf[end - 1] == b'\n' || buf[end - 1] == b'\r') {
        end -= 1;
    }
    &buf[..end]
}

fn is_end_of_head(line: &[u8]) -> bool {
    trim_line_end(line).is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_line_normal() {
        let req = HttpRequest::parse_request_line(b"GET /index.html HTTP/1.1\r\n").unwrap();
        assert_eq!(req.method, Method::GET);
        assert_eq!(req.target, "/index.html");
        assert_eq!(req.version, Version::HTTP_11);
    }

    #[test]
    fn request_line_http10() {
        let req = HttpRequest::parse_request_line(b"HEAD / HTTP/1.0\n").unwrap();
        assert_eq!(req.method, Method::HEAD);
        assert_eq!(req.target, "/");
        assert_eq!(req.version, Version::HTTP_10);
    }

    #[test]
    fn request_line_invalid() {
        assert!(matches!(
            HttpRequest::parse_request_line(b"GET\r\n"),
            Err(HttpRequestParseError::NoDelimiterFound(' '))
        ));
        assert!(matches!(
            HttpRequest::parse_request_line(b"GET index.html HTTP/1.1\r\n"),
            Err(HttpRequestParseError::InvalidRequestTarget)
        ));
        assert!(matches!(
            HttpRequest::parse_request_line(b"GET / HTTP/3\r\n"),
            Err(HttpRequestParseError::UnsupportedVersion)
        ));
    }

    #[tokio::test]
    async fn parse_head() {
        let data = b"GET /a.txt HTTP/1.1\r\nHost: localhost\r\nAccept: */*\r\n\r\n";
        let mut reader = &data[..];
        let req = HttpRequest::parse(&mut reader, 8192).await.unwrap();
        assert_eq!(req.method, Method::GET);
        assert_eq!(req.target, "/a.txt");
    }

    #[tokio::test]
    async fn parse_head_too_large() {
        let data = b"GET /a.txt HTTP/1.1\r\nHost: localhost\r\n\r\n";
        let mut reader = &data[..];
        let r = HttpRequest::parse(&mut reader, 16).await;
        assert!(matches!(r, Err(HttpRequestParseError::TooLargeHeader(16))));
    }

    #[tokio::test]
    async fn parse_client_closed() {
        let data = b"";
        let mut reader = &data[..];
        let r = HttpRequest::parse(&mut reader, 8192).await;
        assert!(matches!(r, Err(HttpRequestParseError::ClientClosed)));
    }
}
