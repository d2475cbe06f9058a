/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use anyhow::Context;
use tokio::sync::broadcast;

pub mod config;
pub mod listen;
pub mod log;
pub mod opts;
pub mod policy;
pub mod serve;
pub mod signal;

mod build;

use opts::ProcArgs;
use policy::PolicyServer;
use serve::FileServer;

pub async fn run(proc_args: &ProcArgs) -> anyhow::Result<()> {
    let (file_serv_config, policy_config) = config::load(proc_args);

    // TLS credentials load during construction, before any socket is bound
    let file_server =
        FileServer::new(&file_serv_config).context("failed to build the file server")?;
    let policy_server = PolicyServer::new();

    let file_listener = listen::bind(file_serv_config.listen())
        .context("failed to bind the file server listener")?;
    let policy_listener = listen::bind(policy_config.listen())
        .context("failed to bind the policy server listener")?;

    println!(
        "Serving \"{}\".",
        file_serv_config.base_dir().display()
    );
    println!(
        "{}://localhost:{}/",
        file_serv_config.scheme(),
        file_serv_config.listen().address().port()
    );
    println!(
        "Policy file server on {}. Use Ctrl-C to exit.",
        policy_config.listen().address()
    );

    let (quit_sender, _) = broadcast::channel::<()>(1);

    let file_handle = tokio::spawn({
        let quit_receiver = quit_sender.subscribe();
        async move { file_server.into_running(file_listener, quit_receiver).await }
    });
    let policy_handle = tokio::spawn({
        let quit_receiver = quit_sender.subscribe();
        async move {
            policy_server
                .into_running(policy_listener, quit_receiver)
                .await
        }
    });

    signal::wait_for_quit().await?;

    println!("Shutting down.");
    let _ = quit_sender.send(());
    let _ = file_handle.await;
    let _ = policy_handle.await;

    Ok(())
}
