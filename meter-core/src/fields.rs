use std::fmt;
use std::ops::Range;

use crate::constants::PREFIX_LEN;
use crate::error::ParseError;

/// Величины, которые читаем из телеграммы
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    /// потреблённая энергия, тариф 1, kWh
    PlusEnergyTar1,
    /// отданная энергия, тариф 1, kWh
    MinEnergyTar1,
    /// потреблённая энергия, тариф 2, kWh
    PlusEnergyTar2,
    /// отданная энергия, тариф 2, kWh
    MinEnergyTar2,
    /// текущий номер тарифа
    CurrentTarNumber,
    /// текущая потребляемая мощность, kW
    CurrentPlusPower,
    /// текущая отдаваемая мощность, kW
    CurrentMinPower,
    /// расход газа, m3
    GasUsed,
}

impl Field {
    /// Имя поля в JSON
    pub fn json_name(self) -> &'static str {
        match self {
            Field::PlusEnergyTar1 => "PlusEnergyTar1",
            Field::MinEnergyTar1 => "MinEnergyTar1",
            Field::PlusEnergyTar2 => "PlusEnergyTar2",
            Field::MinEnergyTar2 => "MinEnergyTar2",
            Field::CurrentTarNumber => "CurrentTarNumber",
            Field::CurrentPlusPower => "CurrentPlusPower",
            Field::CurrentMinPower => "CurrentMinPower",
            Field::GasUsed => "GasUsed",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.json_name())
    }
}

/// Правило: префикс строки -> поле + диапазон байт со значением
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRule {
    /// первые 9 байт строки
    pub prefix: &'static str,
    /// куда пишем значение
    pub field: Field,
    /// байты значения внутри строки
    pub range: Range<usize>,
}

// диапазоны по формату строк счётчика:
//   1-0:1.8.1(001234.567*kWh)                 -> [10,20)
//   0-0:96.14.0(0002)                         -> [12,16)
//   1-0:1.7.0(01.193*kW)                      -> [10,16)
//   0-1:24.2.1(101209112500W)(12785.123*m3)   -> [26,35)
const KWH: Range<usize> = 10..20;
const KW: Range<usize> = 10..16;
const TARIFF: Range<usize> = 12..16;
const M3: Range<usize> = 26..35;

/// Таблица правил. Не меняется в runtime.
pub static RULES: [FieldRule; 8] = [
    FieldRule { prefix: "1-0:1.8.1", field: Field::PlusEnergyTar1, range: KWH },
    FieldRule { prefix: "1-0:1.8.2", field: Field::MinEnergyTar1, range: KWH },
    FieldRule { prefix: "1-0:2.8.1", field: Field::PlusEnergyTar2, range: KWH },
    FieldRule { prefix: "1-0:2.8.2", field: Field::MinEnergyTar2, range: KWH },
    FieldRule { prefix: "0-0:96.14", field: Field::CurrentTarNumber, range: TARIFF },
    FieldRule { prefix: "1-0:1.7.0", field: Field::CurrentPlusPower, range: KW },
    FieldRule { prefix: "1-0:2.7.0", field: Field::CurrentMinPower, range: KW },
    FieldRule { prefix: "0-1:24.2.", field: Field::GasUsed, range: M3 },
];

/// Ищет правило по первым 9 байтам строки.
/// Короткие строки и неизвестные префиксы -> `None`.
pub fn rule_for(line: &[u8]) -> Option<&'static FieldRule> {
    let prefix = line.get(..PREFIX_LEN)?;
    RULES.iter().find(|r| r.prefix.as_bytes() == prefix)
}

/// Достаёт `range` из строки и парсит как f64
pub fn decode_value(field: Field, line: &[u8], range: Range<usize>) -> Result<f64, ParseError> {
    if line.len() < range.end {
        return Err(ParseError::FieldTooShort {
            field,
            len: line.len(),
            needed: range.end,
        });
    }

    let raw = &line[range];
    let s = std::str::from_utf8(raw).map_err(|_| ParseError::NumberFormat {
        field,
        raw: String::from_utf8_lossy(raw).into_owned(),
        source: None,
    })?;

    let value = s.parse::<f64>().map_err(|e| ParseError::NumberFormat {
        field,
        raw: s.to_string(),
        source: Some(e),
    })?;

    // inf/nan и переполнение вроде 1e999 показаниями не бывают
    if !value.is_finite() {
        return Err(ParseError::NumberFormat {
            field,
            raw: s.to_string(),
            source: None,
        });
    }

    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefixes_are_unique_and_nine_bytes() {
        for (i, r) in RULES.iter().enumerate() {
            assert_eq!(r.prefix.len(), PREFIX_LEN, "{}", r.prefix);
            assert!(
                RULES[i + 1..].iter().all(|o| o.prefix != r.prefix),
                "duplicate prefix {}",
                r.prefix
            );
        }
    }

    #[test]
    fn rule_for_matches_known_prefix() {
        let r = rule_for(b"1-0:2.7.0(00.000*kW)").unwrap();
        assert_eq!(r.field, Field::CurrentMinPower);
        assert_eq!(r.range, 10..16);

        let r = rule_for(b"0-1:24.2.1(101209112500W)(12785.123*m3)").unwrap();
        assert_eq!(r.field, Field::GasUsed);
    }

    #[test]
    fn rule_for_skips_short_and_unknown_lines() {
        assert!(rule_for(b"").is_none());
        assert!(rule_for(b"1-0:1.8").is_none());
        assert!(rule_for(b"1-0:32.7.0(230.1*V)").is_none());
        assert!(rule_for(b"/XMX5LGBBFG1009394887").is_none());
    }

    #[test]
    fn decode_value_reads_configured_range() {
        let v = decode_value(Field::PlusEnergyTar1, b"1-0:1.8.1(000123.456*kWh)", KWH).unwrap();
        assert_eq!(v, 123.456);

        let v = decode_value(Field::CurrentTarNumber, b"0-0:96.14.0(0002)", TARIFF).unwrap();
        assert_eq!(v, 2.0);

        let v = decode_value(Field::CurrentPlusPower, b"1-0:1.7.0(01.193*kW)", KW).unwrap();
        assert_eq!(v, 1.193);

        let v = decode_value(
            Field::GasUsed,
            b"0-1:24.2.1(101209112500W)(12785.123*m3)",
            M3,
        )
        .unwrap();
        assert_eq!(v, 12785.123);
    }

    #[test]
    fn decode_value_short_line_is_field_too_short() {
        let err = decode_value(Field::PlusEnergyTar1, b"1-0:1.8.1(00012", KWH).unwrap_err();
        assert_eq!(
            err,
            ParseError::FieldTooShort {
                field: Field::PlusEnergyTar1,
                len: 15,
                needed: 20,
            }
        );
    }

    #[test]
    fn decode_value_garbage_is_number_format() {
        let err = decode_value(Field::PlusEnergyTar1, b"1-0:1.8.1(    abc.de*kWh)", KWH).unwrap_err();
        assert!(matches!(
            err,
            ParseError::NumberFormat { field: Field::PlusEnergyTar1, ref raw, source: Some(_) } if raw == "    abc.de"
        ));
    }

    #[test]
    fn decode_value_non_utf8_is_number_format() {
        let mut line = b"1-0:1.7.0(01.193*kW)".to_vec();
        line[11] = 0xff;
        let err = decode_value(Field::CurrentPlusPower, &line, KW).unwrap_err();
        assert!(matches!(
            err,
            ParseError::NumberFormat { source: None, .. }
        ));
    }

    #[test]
    fn decode_value_rejects_non_finite() {
        for (field, line, range) in [
            (Field::GasUsed, &b"0-1:24.2.1(170108160000W)(00001e999*m3)"[..], M3),
            (Field::CurrentTarNumber, &b"0-0:96.14.0(-nan)"[..], TARIFF),
            (Field::CurrentPlusPower, &b"1-0:1.7.0(1e9999*kW)"[..], KW),
        ] {
            let err = decode_value(field, line, range).unwrap_err();
            assert!(
                matches!(err, ParseError::NumberFormat { source: None, .. }),
                "{err:?}"
            );
        }
    }

    // старый формат счётчика: "00123.456*" в диапазоне kWh не число
    #[test]
    fn decode_value_includes_unit_marker_when_digits_are_short() {
        let err = decode_value(Field::PlusEnergyTar1, b"1-0:1.8.1(00123.456*kWh)", KWH).unwrap_err();
        assert!(matches!(err, ParseError::NumberFormat { .. }));
    }
}
