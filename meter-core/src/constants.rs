use std::time::Duration;

/// Начало телеграммы: чанк, первый байт которого `/`
pub const START_MARKER: u8 = b'/';

/// Терминатор: строка `!XXXX` (контрольная сумма не проверяется)
pub const TERMINATOR: u8 = b'!';

/// Максимальный размер кадра без терминатора
pub const MAX_FRAME_SIZE: usize = 4096;

/// Длина OBIS-префикса строки, например `1-0:1.8.1`
pub const PREFIX_LEN: usize = 9;

/// время без успешно разобранной телеграммы, после которого поток считается "мёртвым"
pub const IDLE_TIMEOUT: Duration = Duration::from_secs(60);
