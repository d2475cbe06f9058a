/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use log::info;

/// Block until an interrupt is received.
#[cfg(unix)]
pub async fn wait_for_quit() -> anyhow::Result<()> {
    use anyhow::Context;
    use tokio::signal::unix::{SignalKind, signal};

    let mut interrupt =
        signal(SignalKind::interrupt()).context("failed to setup interrupt signal handler")?;
    let mut terminate =
        signal(SignalKind::terminate()).context("failed to setup terminate signal handler")?;

    tokio::select! {
        _ = interrupt.recv() => info!("got interrupt signal"),
        _ = terminate.recv() => info!("got terminate signal"),
    }
    Ok(())
}

#[cfg(not(unix))]
pub async fn wait_for_quit() -> anyhow::Result<()> {
    use anyhow::Context;

    tokio::signal::ctrl_c()
        .await
        .context("failed to wait for ctrl-c")?;
    info!("got interrupt signal");
    Ok(())
}
