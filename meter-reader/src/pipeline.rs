use std::io::Read;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError};
use log::{debug, info, warn};
use thiserror::Error;

use meter_core::{Field, Frame, Reading};

use crate::config::{BACK_TO_BACK_SINK_ERR_LIMIT, TICK};
use crate::reader::run_read_loop;
use crate::sink::ReadingSink;

/// Причины, по которым конвейер надо пересоздать
#[derive(Debug, Error)]
pub(crate) enum PipelineError {
    /// за окно ожидания ни одна телеграмма не была разобрана и отдана в sink
    #[error("no telegram parsed for {idle:?}")]
    Liveness { idle: Duration },

    #[error("telegram source closed")]
    SourceClosed,

    #[error("giving up after {count} failed sends, last error: {last}")]
    Sink { count: usize, last: String },
}

/// Потребитель: разбирает телеграммы и отдаёт показания в sink.
///
/// Ошибка разбора - проблема качества данных, а не живости: телеграмма
/// выбрасывается, конвейер работает дальше. Окно `idle` отсчитывается
/// с момента, когда разобранные показания отданы в sink (успешно или нет),
/// так что медленная отправка не съедает окно следующей телеграммы.
pub(crate) fn run_consumer<S: ReadingSink>(
    rx: &Receiver<Frame>,
    sink: &mut S,
    idle: Duration,
    shutdown: &AtomicBool,
) -> Result<(), PipelineError> {
    let mut last_ok = Instant::now();
    let mut back_to_back_err_count = 0;

    loop {
        if shutdown.load(Ordering::Relaxed) {
            info!("shutting down consumer");
            return Ok(());
        }

        let elapsed = last_ok.elapsed();
        if elapsed >= idle {
            return Err(PipelineError::Liveness { idle: elapsed });
        }

        // ждём телеграмму, но не дольше тика, чтобы видеть shutdown
        let frame = match rx.recv_timeout((idle - elapsed).min(TICK)) {
            Ok(frame) => frame,
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => return Err(PipelineError::SourceClosed),
        };

        let mut reading = Reading::new(frame);
        if let Err(e) = reading.parse() {
            warn!("dropping telegram captured at {}: {e}", reading.time());
            debug!("raw telegram: {:?}", String::from_utf8_lossy(reading.raw()));
            continue;
        }

        debug!(
            "reading {}: +{} kWh / -{} kWh, tariff {}, +{} kW / -{} kW, gas {} m3",
            reading.time(),
            reading.get(Field::PlusEnergyTar1) + reading.get(Field::PlusEnergyTar2),
            reading.get(Field::MinEnergyTar1) + reading.get(Field::MinEnergyTar2),
            reading.get(Field::CurrentTarNumber),
            reading.get(Field::CurrentPlusPower),
            reading.get(Field::CurrentMinPower),
            reading.get(Field::GasUsed),
        );

        match sink.send(&reading) {
            Ok(()) => back_to_back_err_count = 0,
            Err(e) => {
                back_to_back_err_count += 1;
                warn!("failed to send reading ({back_to_back_err_count} in a row): {e:#}");
                if back_to_back_err_count >= BACK_TO_BACK_SINK_ERR_LIMIT {
                    return Err(PipelineError::Sink {
                        count: back_to_back_err_count,
                        last: format!("{e:#}"),
                    });
                }
            }
        }
        last_ok = Instant::now();
    }
}

/// Один запуск конвейера: поток чтения + потребитель в текущем потоке.
///
/// Возвращает `Ok` только по shutdown. Перед возвратом поток чтения
/// останавливается и join-ится, порт закрывается вместе с ним.
pub(crate) fn run_pipeline<R, S>(
    src: R,
    sink: &mut S,
    idle: Duration,
    shutdown: &AtomicBool,
) -> anyhow::Result<()>
where
    R: Read + Send + 'static,
    S: ReadingSink,
{
    // без буфера: чтение ждёт, пока предыдущая телеграмма обработана
    let (tx, rx) = crossbeam_channel::bounded::<Frame>(0);
    let stop = Arc::new(AtomicBool::new(false));

    let producer = {
        let stop = stop.clone();
        thread::spawn(move || run_read_loop(src, tx, stop))
    };

    let result = run_consumer(&rx, sink, idle, shutdown);

    stop.store(true, Ordering::Relaxed);
    drop(rx);

    let producer_result = match producer.join() {
        Ok(r) => r,
        Err(panic) => Err(anyhow::anyhow!("reader thread panicked: {:?}", panic)),
    };

    match (result, producer_result) {
        (Ok(()), Ok(())) => Ok(()),
        // источник закрылся из-за ошибки чтения: она информативнее
        (Err(PipelineError::SourceClosed), Err(e)) => Err(e.context("serial read failed")),
        (Err(e), producer_result) => {
            if let Err(pe) = producer_result {
                warn!("reader stopped with error: {pe:#}");
            }
            Err(e.into())
        }
        (Ok(()), Err(pe)) => {
            warn!("reader stopped with error: {pe:#}");
            Ok(())
        }
    }
}
