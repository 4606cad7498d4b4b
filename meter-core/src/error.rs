use std::num::ParseFloatError;

use thiserror::Error;

use crate::fields::Field;

/// Верхнеуровневый тип ошибок крейта
#[derive(Debug, Error)]
pub enum MeterCoreError {
    /// Ошибки сборки кадра
    #[error(transparent)]
    Frame(#[from] FrameError),

    /// Ошибки разбора телеграммы
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Ошибки сериализации показаний
    #[error(transparent)]
    Reading(#[from] ReadingError),
}

/// Ошибки сборки кадра
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    /// Кадр перерос лимит, а терминатора так и не было
    #[error("buffer too big, receiving invalid data ({size} bytes, max {max})")]
    Overflow {
        /// сколько байт накопилось
        size: usize,
        /// лимит сборщика
        max: usize,
    },
}

/// Ошибки разбора телеграммы
#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    /// Строка короче, чем диапазон, из которого читается значение
    #[error("unexpected line length for {field}: {len} bytes, need at least {needed}")]
    FieldTooShort {
        /// поле, которое пытались прочитать
        field: Field,
        /// длина строки без `\r\n`
        len: usize,
        /// минимальная длина строки для этого поля
        needed: usize,
    },

    /// В диапазоне не число (или не конечное число)
    #[error("invalid number for {field}: {raw:?}")]
    NumberFormat {
        /// поле, которое пытались прочитать
        field: Field,
        /// содержимое диапазона как есть
        raw: String,
        /// ошибка парсинга; `None` для не-UTF-8 и inf/nan
        #[source]
        source: Option<ParseFloatError>,
    },
}

/// Ошибки сериализации показаний
#[derive(Debug, Error)]
pub enum ReadingError {
    /// Показания ещё не разобраны (или разбор упал)
    #[error("reading is not parsed")]
    NotParsed,

    /// Ошибка serde_json
    #[error("json encode error: {0}")]
    Json(#[from] serde_json::Error),
}
