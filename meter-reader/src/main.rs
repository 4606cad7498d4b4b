//! Точка входа `meter-reader`.
//!
//! Жизненный цикл:
//! - парсинг CLI (`--api` или `API_HOST`)
//! - открытие P1-порта счётчика
//! - поток чтения собирает телеграммы, основной поток разбирает их
//!   и отправляет показания POST-ом в smartmeter-api
//! - если за idle-timeout нет ни одной разобранной телеграммы,
//!   конвейер пересоздаётся после паузы
//! - корректная остановка по `Ctrl+C`

mod cli;
mod config;
mod pipeline;
mod reader;
mod serial;
mod sink;
mod supervisor;

use std::sync::{Arc, atomic::AtomicBool, atomic::Ordering};

use clap::Parser;
use log::info;

use crate::sink::HttpSink;

fn main() -> anyhow::Result<()> {
    // Логи через RUST_LOG=debug/trace, по умолчанию info
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let shutdown = Arc::new(AtomicBool::new(false));

    // Ctrl+C => ставим shutdown=true
    {
        let shutdown = shutdown.clone();
        ctrlc::set_handler(move || {
            shutdown.store(true, Ordering::Relaxed);
            info!("shutting down...");
        })?;
    }

    let args = cli::Args::parse();
    args.validate()?;

    info!(
        "Starting meter-reader: device={}, baud={}, api={}, idle_timeout={:?}",
        args.device.display(),
        args.baud,
        args.api_url(),
        args.idle_timeout(),
    );

    supervisor::supervise(
        || serial::open_port(&args.device, args.baud),
        |port| {
            // адрес резолвим на каждый запуск: API мог переехать
            let mut sink = HttpSink::new(args.api_socket_addr()?, args.api_host());
            pipeline::run_pipeline(port, &mut sink, args.idle_timeout(), &shutdown)
        },
        args.restart_delay(),
        &shutdown,
    )
}
