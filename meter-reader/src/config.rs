use std::time::Duration;

pub(crate) use meter_core::IDLE_TIMEOUT;

pub(crate) const DEFAULT_DEVICE: &str = "/dev/ttyUSB0";
pub(crate) const DEFAULT_BAUD: u32 = 115_200;

/// пауза перед перезапуском конвейера
pub(crate) const RESTART_DELAY: Duration = Duration::from_secs(4);

/// размер одного read() с порта
pub(crate) const READ_BUF_SIZE: usize = 1024;

/// таймаут read() на порту, чтобы поток чтения видел флаг остановки
pub(crate) const SERIAL_READ_TIMEOUT: Duration = Duration::from_secs(1);

/// как часто циклы проверяют shutdown
pub(crate) const TICK: Duration = Duration::from_millis(200);

pub(crate) const HTTP_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
pub(crate) const HTTP_IO_TIMEOUT: Duration = Duration::from_secs(5);
pub(crate) const API_PATH: &str = "/meterdata";

/// подряд неудачных отправок, после которых перезапускаемся
pub(crate) const BACK_TO_BACK_SINK_ERR_LIMIT: usize = 5;
