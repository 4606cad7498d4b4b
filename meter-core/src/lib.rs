//! # meter-core
//!
//! Сборка и разбор телеграмм P1-порта умного счётчика.
//!
//! Этот крейт содержит:
//!
//! - [`frame`] - сборка телеграммы из чанков произвольного размера
//! - [`fields`] - таблица OBIS-префиксов и декодирование значений
//! - [`reading`] - показания счётчика и разбор телеграммы
//! - [`error`] - типы ошибок, которые возвращают компоненты `meter-core`
//!
//! ## Быстрый пример: от чанков до JSON
//!
//! ```rust
//! use meter_core::{Field, FrameAssembler, FrameEvent, Reading};
//!
//! let mut asm = FrameAssembler::new();
//! let chunks: [&[u8]; 3] = [
//!     b"/ABC\r\n",
//!     b"1-0:1.8.1(000123.456*kWh)\r\n",
//!     b"!1234\r\n",
//! ];
//!
//! let mut frames = Vec::new();
//! for chunk in chunks {
//!     if let FrameEvent::Complete(frame) = asm.on_chunk(chunk) {
//!         frames.push(frame);
//!     }
//! }
//! assert_eq!(frames.len(), 1);
//!
//! let mut reading = Reading::new(frames.remove(0));
//! reading.parse().unwrap();
//! assert!(reading.is_parsed());
//! assert_eq!(reading.get(Field::PlusEnergyTar1), 123.456);
//! assert_eq!(reading.get(Field::GasUsed), 0.0);
//!
//! let json = reading.to_json().unwrap();
//! assert!(json.starts_with(b"{\"Time\":"));
//! ```
//!
//! ## Пример: битая строка
//!
//! ```rust
//! use chrono::Utc;
//! use meter_core::{Frame, ParseError, Reading};
//!
//! let mut reading = Reading::new(Frame {
//!     data: b"/ABC\r\n1-0:1.8.1(00012\r\n!\r\n".to_vec(),
//!     captured_at: Utc::now(),
//! });
//!
//! let err = reading.parse().unwrap_err();
//! assert!(matches!(err, ParseError::FieldTooShort { needed: 20, .. }));
//! assert!(reading.to_json().is_err());
//! ```
//!
//! ## Дизайн
//!
//! `meter-core` не знает ни про последовательный порт, ни про потоки, ни про
//! HTTP: только чистые типы, сборка кадра и разбор. Сборщик владеет буфером
//! до конца кадра, дальше [`Frame`] передаётся по значению в [`Reading`],
//! поэтому никаких мьютексов внутри нет.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Сборка телеграммы из потока чанков.
pub mod frame;

/// Таблица правил декодирования полей.
pub mod fields;

/// Показания счётчика и разбор телеграммы.
pub mod reading;

/// Ошибки `meter-core`.
pub mod error;

/// Общие константы
mod constants;
pub use constants::{IDLE_TIMEOUT, MAX_FRAME_SIZE, PREFIX_LEN, START_MARKER, TERMINATOR};

// --- Re-exports (публичный фасад API) ---

pub use crate::error::{FrameError, MeterCoreError, ParseError, ReadingError};
pub use crate::fields::{Field, FieldRule, RULES};
pub use crate::frame::{Frame, FrameAssembler, FrameEvent};
pub use crate::reading::Reading;
