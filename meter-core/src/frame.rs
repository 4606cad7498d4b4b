use chrono::{DateTime, Utc};

use crate::constants::{MAX_FRAME_SIZE, START_MARKER, TERMINATOR};
use crate::error::FrameError;

/// типичная телеграмма DSMR укладывается в ~1 КБ
const INITIAL_CAPACITY: usize = 1024;

/// Сырая телеграмма: байты от `/` до чанка с `!` включительно
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// байты кадра, включая `/` и чанк с `!`
    pub data: Vec<u8>,
    /// момент, когда увидели начало кадра
    pub captured_at: DateTime<Utc>,
}

/// Результат обработки одного чанка
#[derive(Debug, PartialEq)]
pub enum FrameEvent {
    /// кадр ещё собирается (или данные вне кадра выброшены)
    Continuing,
    /// терминатор найден, кадр готов
    Complete(Frame),
    /// кадр выброшен, сборщик сброшен
    Error(FrameError),
}

/// Сборщик телеграмм из чанков произвольного размера.
///
/// Не синхронизирован: вызывать из одного потока.
#[derive(Debug)]
pub struct FrameAssembler {
    current: Option<Frame>,
    max_size: usize,
}

impl Default for FrameAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameAssembler {
    /// Сборщик с лимитом [`MAX_FRAME_SIZE`]
    pub fn new() -> Self {
        Self::with_max_size(MAX_FRAME_SIZE)
    }

    /// Сборщик со своим лимитом размера кадра
    pub fn with_max_size(max_size: usize) -> Self {
        Self {
            current: None,
            max_size,
        }
    }

    /// Скармливает очередной чанк.
    ///
    /// - `/` первым байтом начинает новый кадр (недособранный молча выбрасывается)
    /// - вне кадра данные считаются шумом
    /// - `!` в любом месте чанка завершает кадр
    /// - без `!` и больше `max_size` байт -> [`FrameEvent::Error`]
    pub fn on_chunk(&mut self, chunk: &[u8]) -> FrameEvent {
        let Some(&first) = chunk.first() else {
            return FrameEvent::Continuing;
        };

        if first == START_MARKER {
            self.current = Some(Frame {
                data: Vec::with_capacity(INITIAL_CAPACITY.min(self.max_size)),
                captured_at: Utc::now(),
            });
        }

        let Some(frame) = self.current.as_mut() else {
            return FrameEvent::Continuing;
        };

        frame.data.extend_from_slice(chunk);
        let size = frame.data.len();

        if chunk.contains(&TERMINATOR) {
            return self
                .current
                .take()
                .map_or(FrameEvent::Continuing, FrameEvent::Complete);
        }

        if size > self.max_size {
            self.current = None;
            return FrameEvent::Error(FrameError::Overflow {
                size,
                max: self.max_size,
            });
        }

        FrameEvent::Continuing
    }

    /// Идёт ли сейчас сборка кадра
    pub fn in_frame(&self) -> bool {
        self.current.is_some()
    }

    /// Сколько байт накоплено в текущем кадре
    pub fn buffered_len(&self) -> usize {
        self.current.as_ref().map_or(0, |f| f.data.len())
    }

    /// Выбросить недособранный кадр
    pub fn reset(&mut self) {
        self.current = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(asm: &mut FrameAssembler, chunks: &[&[u8]]) -> Vec<FrameEvent> {
        chunks.iter().map(|c| asm.on_chunk(c)).collect()
    }

    fn completed(events: Vec<FrameEvent>) -> Vec<Frame> {
        events
            .into_iter()
            .filter_map(|e| match e {
                FrameEvent::Complete(f) => Some(f),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn discards_everything_before_start_marker() {
        let mut asm = FrameAssembler::new();
        let events = feed(
            &mut asm,
            &[b"1-0:1.8.1(000123.456*kWh)\r\n", b"!1234\r\n", b"noise /x\r\n"],
        );

        assert!(events.iter().all(|e| *e == FrameEvent::Continuing));
        assert!(!asm.in_frame());
        assert_eq!(asm.buffered_len(), 0);
    }

    #[test]
    fn empty_chunk_is_continuing_and_keeps_state() {
        let mut asm = FrameAssembler::new();
        assert_eq!(asm.on_chunk(b"/ABC\r\n"), FrameEvent::Continuing);
        assert_eq!(asm.on_chunk(b""), FrameEvent::Continuing);
        assert!(asm.in_frame());
        assert_eq!(asm.buffered_len(), 6);
    }

    #[test]
    fn completes_with_exact_concatenation() {
        let mut asm = FrameAssembler::new();
        let before = Utc::now();
        let frames = completed(feed(
            &mut asm,
            &[
                b"garbage\r\n",
                b"/ABC\r\n",
                b"1-0:1.8.1(000123.456*kWh)\r\n",
                b"!1234\r\n",
            ],
        ));
        let after = Utc::now();

        assert_eq!(frames.len(), 1);
        assert_eq!(
            frames[0].data,
            b"/ABC\r\n1-0:1.8.1(000123.456*kWh)\r\n!1234\r\n".to_vec()
        );
        assert!(frames[0].captured_at >= before && frames[0].captured_at <= after);
        assert!(!asm.in_frame());
    }

    #[test]
    fn terminator_anywhere_in_chunk_ends_frame() {
        let mut asm = FrameAssembler::new();
        asm.on_chunk(b"/ABC\r\n");
        match asm.on_chunk(b"0-0:96.14.0(0002)\r\n!") {
            FrameEvent::Complete(f) => assert!(f.data.ends_with(b"!")),
            other => panic!("expected Complete, got {other:?}"),
        }
    }

    #[test]
    fn single_chunk_frame() {
        let mut asm = FrameAssembler::new();
        match asm.on_chunk(b"/ABC\r\n!1234\r\n") {
            FrameEvent::Complete(f) => assert_eq!(f.data, b"/ABC\r\n!1234\r\n".to_vec()),
            other => panic!("expected Complete, got {other:?}"),
        }
    }

    #[test]
    fn new_start_marker_abandons_partial_frame() {
        let mut asm = FrameAssembler::new();
        let frames = completed(feed(
            &mut asm,
            &[b"/OLD\r\n", b"1-0:1.8.1(0", b"/NEW\r\n", b"!0000\r\n"],
        ));

        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].data, b"/NEW\r\n!0000\r\n".to_vec());
    }

    #[test]
    fn overflow_yields_one_error_and_resets() {
        let mut asm = FrameAssembler::new();
        let filler = [b'x'; 1024];

        let mut events = vec![asm.on_chunk(b"/ABC\r\n")];
        for _ in 0..8 {
            events.push(asm.on_chunk(&filler));
        }

        let errors: Vec<_> = events
            .iter()
            .filter(|e| matches!(e, FrameEvent::Error(_)))
            .collect();
        assert_eq!(errors.len(), 1);
        assert_eq!(
            *errors[0],
            FrameEvent::Error(FrameError::Overflow {
                size: 6 + 4 * 1024,
                max: MAX_FRAME_SIZE,
            })
        );
        assert!(!asm.in_frame());

        // хвост мусора после ошибки выбрасывается, новый `/` стартует чистый кадр
        assert_eq!(asm.on_chunk(b"1-0:1.8.1\r\n!"), FrameEvent::Continuing);
        let frames = completed(feed(&mut asm, &[b"/NEW\r\n", b"!1234\r\n"]));
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].data, b"/NEW\r\n!1234\r\n".to_vec());
    }

    #[test]
    fn frame_at_exact_limit_is_not_overflow() {
        let mut asm = FrameAssembler::with_max_size(8);
        assert_eq!(asm.on_chunk(b"/1234567"), FrameEvent::Continuing);
        assert_eq!(asm.buffered_len(), 8);
        assert!(matches!(asm.on_chunk(b"x"), FrameEvent::Error(_)));
    }

    #[test]
    fn terminator_wins_over_size_limit() {
        let mut asm = FrameAssembler::with_max_size(8);
        asm.on_chunk(b"/1234567");
        assert!(matches!(asm.on_chunk(b"xx!"), FrameEvent::Complete(_)));
    }

    #[test]
    fn reset_drops_partial_frame() {
        let mut asm = FrameAssembler::new();
        asm.on_chunk(b"/ABC\r\n");
        asm.reset();
        assert!(!asm.in_frame());
        assert_eq!(asm.on_chunk(b"!1234\r\n"), FrameEvent::Continuing);
    }

    #[test]
    fn huge_limit_does_not_preallocate() {
        let mut asm = FrameAssembler::with_max_size(usize::MAX);
        assert_eq!(asm.on_chunk(b"/ABC\r\n"), FrameEvent::Continuing);
        assert!(matches!(asm.on_chunk(b"!1234\r\n"), FrameEvent::Complete(_)));
    }
}
