use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{ParseError, ReadingError};
use crate::fields::{Field, decode_value, rule_for};
use crate::frame::Frame;

/// Показания счётчика из одной телеграммы.
///
/// Пока не вызван [`Reading::parse`], все поля нулевые, а в JSON
/// такие показания не сериализуются.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Reading {
    time: DateTime<Utc>,
    #[serde(skip)]
    buf: Vec<u8>,
    #[serde(skip)]
    parsed: bool,
    plus_energy_tar1: f64,
    min_energy_tar1: f64,
    plus_energy_tar2: f64,
    min_energy_tar2: f64,
    current_tar_number: f64,
    current_plus_power: f64,
    current_min_power: f64,
    gas_used: f64,
}

impl From<Frame> for Reading {
    fn from(frame: Frame) -> Self {
        Self::new(frame)
    }
}

impl Reading {
    /// Неразобранные показания поверх кадра
    pub fn new(frame: Frame) -> Self {
        Self {
            time: frame.captured_at,
            buf: frame.data,
            parsed: false,
            plus_energy_tar1: 0.0,
            min_energy_tar1: 0.0,
            plus_energy_tar2: 0.0,
            min_energy_tar2: 0.0,
            current_tar_number: 0.0,
            current_plus_power: 0.0,
            current_min_power: 0.0,
            gas_used: 0.0,
        }
    }

    /// Разбирает буфер построчно и заполняет поля.
    ///
    /// Повторный вызов после успеха ничего не делает. Пустой буфер - тоже `Ok`.
    /// При первой же ошибке разбор прекращается; уже заполненные поля
    /// не откатываются, но показания остаются неразобранными.
    pub fn parse(&mut self) -> Result<(), ParseError> {
        if self.parsed || self.buf.is_empty() {
            return Ok(());
        }

        let buf = std::mem::take(&mut self.buf);
        if let Err(e) = self.apply_lines(&buf) {
            // сырые данные оставляем для диагностики
            self.buf = buf;
            return Err(e);
        }

        self.parsed = true;
        Ok(())
    }

    fn apply_lines(&mut self, buf: &[u8]) -> Result<(), ParseError> {
        for line in buf.split(|&b| b == b'\n') {
            let line = line.strip_suffix(b"\r").unwrap_or(line);

            let Some(rule) = rule_for(line) else {
                continue;
            };

            let value = decode_value(rule.field, line, rule.range.clone())?;
            *self.slot(rule.field) = value;
        }
        Ok(())
    }

    fn slot(&mut self, field: Field) -> &mut f64 {
        match field {
            Field::PlusEnergyTar1 => &mut self.plus_energy_tar1,
            Field::MinEnergyTar1 => &mut self.min_energy_tar1,
            Field::PlusEnergyTar2 => &mut self.plus_energy_tar2,
            Field::MinEnergyTar2 => &mut self.min_energy_tar2,
            Field::CurrentTarNumber => &mut self.current_tar_number,
            Field::CurrentPlusPower => &mut self.current_plus_power,
            Field::CurrentMinPower => &mut self.current_min_power,
            Field::GasUsed => &mut self.gas_used,
        }
    }

    /// Значение поля (0.0, пока не задано)
    pub fn get(&self, field: Field) -> f64 {
        match field {
            Field::PlusEnergyTar1 => self.plus_energy_tar1,
            Field::MinEnergyTar1 => self.min_energy_tar1,
            Field::PlusEnergyTar2 => self.plus_energy_tar2,
            Field::MinEnergyTar2 => self.min_energy_tar2,
            Field::CurrentTarNumber => self.current_tar_number,
            Field::CurrentPlusPower => self.current_plus_power,
            Field::CurrentMinPower => self.current_min_power,
            Field::GasUsed => self.gas_used,
        }
    }

    /// Разбор завершился успешно
    pub fn is_parsed(&self) -> bool {
        self.parsed
    }

    /// Момент начала кадра (UTC)
    pub fn time(&self) -> DateTime<Utc> {
        self.time
    }

    /// Сырые байты телеграммы. После успешного разбора пусто.
    pub fn raw(&self) -> &[u8] {
        &self.buf
    }

    /// JSON для коллектора. Только для разобранных показаний.
    pub fn to_json(&self) -> Result<Vec<u8>, ReadingError> {
        if !self.parsed {
            return Err(ReadingError::NotParsed);
        }
        Ok(serde_json::to_vec(self)?)
    }
}
