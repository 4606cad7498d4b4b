use std::path::Path;

use anyhow::Context;
use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};

use crate::config::SERIAL_READ_TIMEOUT;

/// Открывает P1-порт: 8N1, без управления потоком.
///
/// Таймаут на read() нужен только для того, чтобы поток чтения
/// периодически видел флаг остановки.
pub(crate) fn open_port(path: &Path, baud: u32) -> anyhow::Result<Box<dyn SerialPort>> {
    let name = path.to_string_lossy();

    serialport::new(&*name, baud)
        .data_bits(DataBits::Eight)
        .stop_bits(StopBits::One)
        .parity(Parity::None)
        .flow_control(FlowControl::None)
        .timeout(SERIAL_READ_TIMEOUT)
        .open()
        .with_context(|| format!("open serial port {name} at {baud} baud"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_missing_device_fails_with_context() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ttyMISSING");

        let err = open_port(&path, 115_200).unwrap_err();
        assert!(err.to_string().contains("ttyMISSING"), "{err}");
    }
}
