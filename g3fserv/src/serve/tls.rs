/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use anyhow::anyhow;
use rustls::ServerConfig;
use rustls_pki_types::{CertificateDer, PrivateKeyDer};
use tokio_rustls::TlsAcceptor;

use crate::config::TlsCredentialPaths;

pub(super) fn build_acceptor(paths: &TlsCredentialPaths) -> anyhow::Result<TlsAcceptor> {
    let certs = load_certs(&paths.cert)?;
    let key = load_key(&paths.key)?;
    let config = ServerConfig::builder()
        .with_no_client_auth()
        .with_single_cert(certs, key)
        .map_err(|e| anyhow!("failed to set server cert pair: {e:?}"))?;
    Ok(TlsAcceptor::from(Arc::new(config)))
}

fn load_certs(path: &Path) -> anyhow::Result<Vec<CertificateDer<'static>>> {
    let file =
        File::open(path).map_err(|e| anyhow!("unable to open file {}: {e}", path.display()))?;
    let certs = rustls_pemfile::certs(&mut BufReader::new(file))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| anyhow!("failed to read certs from file {}: {e}", path.display()))?;
    if certs.is_empty() {
        Err(anyhow!(
            "no valid certificate found in file {}",
            path.display()
        ))
    } else {
        Ok(certs)
    }
}

fn load_key(path: &Path) -> anyhow::Result<PrivateKeyDer<'static>> {
    let file =
        File::open(path).map_err(|e| anyhow!("unable to open file {}: {e}", path.display()))?;
    match rustls_pemfile::private_key(&mut BufReader::new(file)).map_err(|e| {
        anyhow!(
            "failed to read private key from file {}: {e}",
            path.display()
        )
    })? {
        Some(key) => Ok(key),
        None => Err(anyhow!(
            "no valid private key found in file {}",
            path.display()
        )),
    }
}
