/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::path::PathBuf;

use anyhow::Context;
use clap::{Arg, ArgAction, Command, ValueHint, value_parser};

const ARGS_VERSION: &str = "version";
const ARGS_VERBOSE: &str = "verbose";
const ARGS_PORT: &str = "port";
const ARGS_POLICY_PORT: &str = "policy-port";
const ARGS_TLS: &str = "tls";
const ARGS_DIR: &str = "dir";

const DEFAULT_HTTP_PORT: u16 = 19400;
const DEFAULT_POLICY_PORT: u16 = 19945;

#[derive(Debug)]
pub struct ProcArgs {
    pub verbose_level: u8,
    pub http_port: u16,
    pub policy_port: u16,
    pub tls: bool,
    pub base_dir: PathBuf,
}

impl Default for ProcArgs {
    fn default() -> Self {
        ProcArgs {
            verbose_level: 0,
            http_port: DEFAULT_HTTP_PORT,
            policy_port: DEFAULT_POLICY_PORT,
            tls: false,
            base_dir: PathBuf::from("."),
        }
    }
}

fn build_cli_args() -> Command {
    Command::new(crate::build::PKG_NAME)
        .disable_version_flag(true)
        .arg(
            Arg::new(ARGS_VERSION)
                .help("Show version")
                .action(ArgAction::SetTrue)
                .short('V')
                .long(ARGS_VERSION),
        )
        .arg(
            Arg::new(ARGS_VERBOSE)
                .help("Show verbose output")
                .num_args(0)
                .action(ArgAction::Count)
                .short('v')
                .long(ARGS_VERBOSE),
        )
        .arg(
            Arg::new(ARGS_PORT)
                .help("Port to serve files on")
                .value_name("PORT")
                .num_args(1)
                .value_parser(value_parser!(u16))
                .short('p')
                .long(ARGS_PORT),
        )
        .arg(
            Arg::new(ARGS_POLICY_PORT)
                .help("Port to serve the cross-domain policy file on")
                .value_name("PORT")
                .num_args(1)
                .value_parser(value_parser!(u16))
                .short('P')
                .long(ARGS_POLICY_PORT),
        )
        .arg(
            Arg::new(ARGS_TLS)
                .help("Serve HTTPS, using server.crt and server.key from the base dir")
                .action(ArgAction::SetTrue)
                .long(ARGS_TLS),
        )
        .arg(
            Arg::new(ARGS_DIR)
                .help("Base directory to serve files from")
                .value_name("DIR")
                .num_args(1)
                .value_hint(ValueHint::DirPath)
                .value_parser(value_parser!(PathBuf))
                .short('D')
                .long(ARGS_DIR),
        )
}

pub fn parse_clap() -> anyhow::Result<Option<ProcArgs>> {
    let args_parser = build_cli_args();
    let args = args_parser.get_matches();

    if args.get_flag(ARGS_VERSION) {
        crate::build::print_version();
        return Ok(None);
    }

    let mut proc_args = ProcArgs::default();
    proc_args.verbose_level = args.get_count(ARGS_VERBOSE);
    if let Some(port) = args.get_one::<u16>(ARGS_PORT) {
        proc_args.http_port = *port;
    }
    if let Some(port) = args.get_one::<u16>(ARGS_POLICY_PORT) {
        proc_args.policy_port = *port;
    }
    proc_args.tls = args.get_flag(ARGS_TLS);

    let base_dir = args
        .get_one::<PathBuf>(ARGS_DIR)
        .cloned()
        .unwrap_or_else(|| PathBuf::from("."));
    proc_args.base_dir = std::fs::canonicalize(&base_dir)
        .context(format!("invalid base dir {}", base_dir.display()))?;

    Ok(Some(proc_args))
}
