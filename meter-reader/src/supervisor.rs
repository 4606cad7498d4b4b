use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use log::{info, warn};

use crate::config::TICK;

/// Цикл перезапуска конвейера.
///
/// - `open` открывает источник; ошибка открытия фатальна и уходит наверх
/// - `run` крутит конвейер; `Ok` только по shutdown, `Err` -> пауза и новый запуск
pub(crate) fn supervise<R>(
    mut open: impl FnMut() -> anyhow::Result<R>,
    mut run: impl FnMut(R) -> anyhow::Result<()>,
    restart_delay: Duration,
    shutdown: &AtomicBool,
) -> anyhow::Result<()> {
    let mut restarts: u64 = 0;

    while !shutdown.load(Ordering::Relaxed) {
        info!("starting reading data (restarts: {restarts})");

        let src = open()?;
        match run(src) {
            Ok(()) => break,
            Err(e) => warn!("pipeline stopped: {e:#}"),
        }

        restarts += 1;
        sleep_unless_shutdown(restart_delay, shutdown);
    }

    info!("supervisor stopped after {restarts} restarts");
    Ok(())
}

fn sleep_unless_shutdown(delay: Duration, shutdown: &AtomicBool) {
    let mut slept = Duration::ZERO;
    while slept < delay && !shutdown.load(Ordering::Relaxed) {
        let step = (delay - slept).min(TICK);
        std::thread::sleep(step);
        slept += step;
    }
}
