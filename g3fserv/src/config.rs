/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};

use crate::opts::ProcArgs;

const TLS_CERT_FILE_NAME: &str = "server.crt";
const TLS_KEY_FILE_NAME: &str = "server.key";

/// Per-listener socket options, passed explicitly at construction.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ListenConfig {
    address: SocketAddr,
    reuse_addr: bool,
}

impl ListenConfig {
    pub fn new(address: SocketAddr) -> Self {
        ListenConfig {
            address,
            reuse_addr: true,
        }
    }

    #[inline]
    pub fn address(&self) -> SocketAddr {
        self.address
    }

    #[inline]
    pub fn reuse_addr(&self) -> bool {
        self.reuse_addr
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TlsCredentialPaths {
    pub cert: PathBuf,
    pub key: PathBuf,
}

impl TlsCredentialPaths {
    fn with_base_dir(dir: &Path) -> Self {
        TlsCredentialPaths {
            cert: dir.join(TLS_CERT_FILE_NAME),
            key: dir.join(TLS_KEY_FILE_NAME),
        }
    }
}

#[derive(Clone, Debug)]
pub struct FileServConfig {
    listen: ListenConfig,
    tls: Option<TlsCredentialPaths>,
    base_dir: PathBuf,
}

impl FileServConfig {
    pub fn new(port: u16, base_dir: PathBuf) -> Self {
        let address = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), port);
        FileServConfig {
            listen: ListenConfig::new(address),
            tls: None,
            base_dir,
        }
    }

    pub fn enable_tls(&mut self) {
        self.tls = Some(TlsCredentialPaths::with_base_dir(&self.base_dir));
    }

    #[inline]
    pub fn listen(&self) -> &ListenConfig {
        &self.listen
    }

    #[inline]
    pub fn tls(&self) -> Option<&TlsCredentialPaths> {
        self.tls.as_ref()
    }

    #[inline]
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn scheme(&self) -> &'static str {
        if self.tls.is_some() { "https" } else { "http" }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PolicyConfig {
    listen: ListenConfig,
}

impl PolicyConfig {
    pub fn new(port: u16) -> Self {
        let address = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), port);
        PolicyConfig {
            listen: ListenConfig::new(address),
        }
    }

    #[inline]
    pub fn listen(&self) -> &ListenConfig {
        &self.listen
    }
}

pub fn load(proc_args: &ProcArgs) -> (FileServConfig, PolicyConfig) {
    let mut file_serv = FileServConfig::new(proc_args.http_port, proc_args.base_dir.clone());
    if proc_args.tls {
        file_serv.enable_tls();
    }
    let policy = PolicyConfig::new(proc_args.policy_port);
    (file_serv, policy)
}
