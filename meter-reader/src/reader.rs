use std::io::{ErrorKind, Read};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crossbeam_channel::Sender;
use log::{debug, warn};

use meter_core::{Frame, FrameAssembler, FrameEvent};

use crate::config::READ_BUF_SIZE;

/// Поток чтения:
/// - блокирующе читает чанки из порта
/// - собирает из них телеграммы
/// - отдаёт каждую готовую телеграмму потребителю (канал без буфера,
///   так что пока телеграмма разбирается и отправляется, порт не читаем)
///
/// Выходит, когда поднят `stop` или потребитель закрыл канал.
pub(crate) fn run_read_loop<R: Read>(
    mut src: R,
    tx: Sender<Frame>,
    stop: Arc<AtomicBool>,
) -> anyhow::Result<()> {
    let mut buf = vec![0u8; READ_BUF_SIZE];
    let mut asm = FrameAssembler::new();

    while !stop.load(Ordering::Relaxed) {
        let n = match src.read(&mut buf) {
            Ok(n) => n,
            Err(e)
                if e.kind() == ErrorKind::TimedOut
                    || e.kind() == ErrorKind::WouldBlock
                    || e.kind() == ErrorKind::Interrupted =>
            {
                // тик: просто проверим stop и продолжим
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        match asm.on_chunk(&buf[..n]) {
            FrameEvent::Continuing => {}
            FrameEvent::Complete(frame) => {
                debug!("telegram complete: {} bytes", frame.data.len());
                if tx.send(frame).is_err() {
                    // потребитель ушёл: конвейер останавливается
                    return Ok(());
                }
            }
            FrameEvent::Error(e) => {
                // не валим чтение из-за одной битой телеграммы
                warn!("dropping telegram: {e}");
            }
        }
    }

    Ok(())
}
