/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::fmt::Write;
use std::io;
use std::path::{Path, PathBuf};

use percent_encoding::{AsciiSet, CONTROLS, percent_decode_str, utf8_percent_encode};
use thiserror::Error;

const INDEX_FILE_NAME: &str = "index.html";

const HREF_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'<')
    .add(b'>')
    .add(b'`')
    .add(b'#')
    .add(b'?')
    .add(b'%');

#[derive(Debug, Error)]
pub enum FileStoreError {
    #[error("not found")]
    NotFound,
    #[error("io failed: {0:?}")]
    Io(#[from] io::Error),
}

pub enum FileStoreResponse {
    Content { body: Vec<u8>, content_type: String },
    Redirect { location: String },
}

/// Static file lookup beneath an explicit base directory.
///
/// The base directory is configuration passed in at construction, the
/// process working directory is never consulted.
pub struct FileStore {
    base_dir: PathBuf,
}

impl FileStore {
    pub fn new<P: Into<PathBuf>>(base_dir: P) -> Self {
        FileStore {
            base_dir: base_dir.into(),
        }
    }

    /// Serve a request target.
    ///
    /// Directory targets without a trailing slash get a redirect adding it,
    /// so that relative links in generated listings resolve. Directory
    /// targets with a trailing slash serve `index.html` when present and a
    /// generated listing otherwise.
    pub async fn fetch(&self, target: &str) -> Result<FileStoreResponse, FileStoreError> {
        let raw_path = strip_query(target);
        let path = self.resolve(raw_path)?;

        let metadata = tokio::fs::metadata(&path)
            .await
            .map_err(map_lookup_error)?;
        if metadata.is_dir() {
            if !raw_path.ends_with('/') {
                return Ok(FileStoreResponse::Redirect {
                    location: format!("{raw_path}/"),
                });
            }
            let index_path = path.join(INDEX_FILE_NAME);
            if tokio::fs::metadata(&index_path)
                .await
                .map(|m| m.is_file())
                .unwrap_or(false)
            {
                return self.load_file(&index_path).await;
            }
            let decoded = decode_path(raw_path)?;
            let body = render_listing(&path, &decoded).await?;
            return Ok(FileStoreResponse::Content {
                body: body.into_bytes(),
                content_type: "text/html; charset=utf-8".to_string(),
            });
        }

        self.load_file(&path).await
    }

    /// Map a request path to a filesystem path strictly beneath the base dir.
    ///
    /// Any `..` segment rejects the whole request, before touching the
    /// filesystem, so traversal can not escape the base directory.
    fn resolve(&self, raw_path: &str) -> Result<PathBuf, FileStoreError> {
        let decoded = decode_path(raw_path)?;
        if decoded.contains('\0') {
            return Err(FileStoreError::NotFound);
        }

        let mut path = self.base_dir.clone();
        for segment in decoded.split('/') {
            match segment {
                "" | "." => {}
                ".." => return Err(FileStoreError::NotFound),
                _ => path.push(segment),
            }
        }
        Ok(path)
    }

    async fn load_file(&self, path: &Path) -> Result<FileStoreResponse, FileStoreError> {
        let body = tokio::fs::read(path).await.map_err(map_lookup_error)?;
        let content_type = mime_guess::from_path(path)
            .first_or_octet_stream()
            .to_string();
        Ok(FileStoreResponse::Content { body, content_type })
    }
}

fn strip_query(target: &str) -> &str {
    match target.find(['?', '#']) {
        Some(p) => &target[..p],
        None => target,
    }
}

fn decode_path(raw_path: &str) -> Result<String, FileStoreError> {
    percent_decode_str(raw_path)
        .decode_utf8()
        .map(|s| s.into_owned())
        .map_err(|_| FileStoreError::NotFound)
}

fn map_lookup_error(e: io::Error) -> FileStoreError {
    match e.kind() {
        io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied => FileStoreError::NotFound,
        _ => FileStoreError::Io(e),
    }
}

/// Render a directory listing, entries sorted by name for deterministic
/// output, directories marked with a trailing slash.
async fn render_listing(dir: &Path, display_path: &str) -> Result<String, FileStoreError> {
    let mut entries = Vec::new();
    let mut read_dir = tokio::fs::read_dir(dir).await.map_err(map_lookup_error)?;
    while let Some(entry) = read_dir.next_entry().await? {
        let mut name = entry.file_name().to_string_lossy().into_owned();
        if entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false) {
            name.push('/');
        }
        entries.push(name);
    }
    entries.sort();

    let title = format!("Directory listing for {}", escape_html(display_path));
    let mut body = String::with_capacity(512);
    let _ = write!(
        body,
        "<!DOCTYPE HTML>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n</head>\n<body>\n<h1>{title}</h1>\n<hr>\n<ul>\n"
    );
    for name in &entries {
        let href = utf8_percent_encode(name, HREF_ENCODE_SET);
        let _ = writeln!(body, "<li><a href=\"{href}\">{}</a></li>", escape_html(name));
    }
    body.push_str("</ul>\n<hr>\n</body>\n</html>\n");
    Ok(body)
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
