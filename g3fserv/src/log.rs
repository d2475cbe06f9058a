/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use slog::Drain;
use slog_scope::GlobalLoggerGuard;

use crate::opts::ProcArgs;

const PROCESS_LOG_THREAD_NAME: &str = "log-process";

pub fn setup(args: &ProcArgs) -> Result<GlobalLoggerGuard, log::SetLoggerError> {
    let decorator = slog_term::TermDecorator::new().stderr().build();
    let drain = slog_term::FullFormat::new(decorator).build().fuse();
    let drain = slog_async::Async::new(drain)
        .thread_name(PROCESS_LOG_THREAD_NAME.to_string())
        .build()
        .fuse();
    let logger = slog::Logger::root(drain, slog::o!());

    let scope_guard = slog_scope::set_global_logger(logger);

    let log_level = match args.verbose_level {
        0 => log::Level::Warn,
        1 => log::Level::Info,
        2 => log::Level::Debug,
        _ => log::Level::Trace,
    };

    slog_stdlog::init_with_level(log_level)?;
    Ok(scope_guard)
}
