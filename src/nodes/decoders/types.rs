//! Common decoder types and enums

use std::fmt;

/// Transfer direction, from the debugger's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Debugger reads a ZDI register; the target drives the value bits
    Read,
    /// Debugger writes a ZDI register
    Write,
}

impl Direction {
    /// Direction encoded by the bit following the address (1 = read)
    pub fn from_bit(bit: u8) -> Self {
        if bit == 1 { Self::Read } else { Self::Write }
    }

    /// Single-letter display form
    pub fn letter(&self) -> &'static str {
        match self {
            Self::Read => "R",
            Self::Write => "W",
        }
    }
}

/// One complete ZDI exchange: start, address, direction, value, separators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transaction {
    /// ZDI register address (7 bits)
    pub address: u8,
    pub direction: Direction,
    /// Register value (8 bits)
    pub value: u8,
    /// Sample index of the start condition
    pub start_sample: u64,
    /// Sample index of the final separator bit
    pub end_sample: u64,
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {:#04x} = {:#04x} [{}..{})",
            self.direction.letter(),
            self.address,
            self.value,
            self.start_sample,
            self.end_sample
        )
    }
}

/// Annotation classes. The discriminants are the class ids hosts see.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum AnnotationClass {
    Start = 0,
    Bit = 1,
    Separator = 2,
    Direction = 3,
    Register = 4,
    Value = 5,
    Action = 6,
}

impl AnnotationClass {
    pub const ALL: [AnnotationClass; 7] = [
        Self::Start,
        Self::Bit,
        Self::Separator,
        Self::Direction,
        Self::Register,
        Self::Value,
        Self::Action,
    ];

    /// Numeric class id
    pub fn id(self) -> u8 {
        self as u8
    }

    /// Row this class is rendered in
    pub fn row(self) -> AnnotationRow {
        match self {
            Self::Start | Self::Bit | Self::Separator | Self::Direction => AnnotationRow::Bits,
            Self::Register | Self::Value => AnnotationRow::Command,
            Self::Action => AnnotationRow::Action,
        }
    }
}

/// Annotation rows grouping classes by verbosity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnnotationRow {
    Bits,
    Command,
    Action,
}

impl AnnotationRow {
    pub const ALL: [AnnotationRow; 3] = [Self::Bits, Self::Command, Self::Action];

    /// Classes shown in this row
    pub fn classes(self) -> &'static [AnnotationClass] {
        match self {
            Self::Bits => &[
                AnnotationClass::Start,
                AnnotationClass::Bit,
                AnnotationClass::Separator,
                AnnotationClass::Direction,
            ],
            Self::Command => &[AnnotationClass::Register, AnnotationClass::Value],
            Self::Action => &[AnnotationClass::Action],
        }
    }
}

/// Time-ranged annotation record `[start, end)` in sample indices
///
/// `texts` holds the alternative renderings, longest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    pub start: u64,
    pub end: u64,
    pub class: AnnotationClass,
    pub texts: Vec<String>,
}

impl Annotation {
    pub fn new(start: u64, end: u64, class: AnnotationClass, texts: Vec<String>) -> Self {
        Self {
            start,
            end,
            class,
            texts,
        }
    }

    /// Most verbose text, empty if none
    pub fn text(&self) -> &str {
        self.texts.first().map(String::as_str).unwrap_or("")
    }
}

impl fmt::Display for Annotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{} {:?}: {}",
            self.start,
            self.end,
            self.class,
            self.texts.join(" | ")
        )
    }
}

/// Semantic operation produced by the classifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    /// `NAME=value` form
    pub long: String,
    /// Bare value or flag string
    pub short: String,
}

impl Action {
    pub fn new(long: impl Into<String>, short: impl Into<String>) -> Self {
        Self {
            long: long.into(),
            short: short.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_ids_are_stable() {
        let ids: Vec<u8> = AnnotationClass::ALL.iter().map(|c| c.id()).collect();
        assert_eq!(ids, vec![0, 1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_rows_partition_classes() {
        for class in AnnotationClass::ALL {
            let rows: Vec<_> = AnnotationRow::ALL
                .iter()
                .filter(|row| row.classes().contains(&class))
                .collect();
            assert_eq!(rows, vec![&class.row()]);
        }
        let bits: Vec<u8> = AnnotationRow::Bits.classes().iter().map(|c| c.id()).collect();
        assert_eq!(bits, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_direction_from_bit() {
        assert_eq!(Direction::from_bit(1), Direction::Read);
        assert_eq!(Direction::from_bit(0), Direction::Write);
        assert_eq!(Direction::Write.letter(), "W");
    }
}
