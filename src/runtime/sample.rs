//! Core sample type for two-wire captures

use std::fmt;

/// One capture sample of the two ZDI lines
///
/// Unlike a run-length encoded edge stream, every sample position is
/// delivered: the decoder's bit timing counts individual samples (the read
/// phase samples data exactly one sample after the clock falls).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LogicSample {
    /// Position in the capture; strictly increasing within one stream
    pub index: u64,
    /// ZDA, the data line
    pub data: bool,
    /// ZCL, the clock line
    pub clock: bool,
}

impl LogicSample {
    /// Create a new sample
    pub fn new(index: u64, data: bool, clock: bool) -> Self {
        Self { index, data, clock }
    }

    /// Data line as a bit value
    #[inline]
    pub fn data_bit(&self) -> u8 {
        u8::from(self.data)
    }
}

impl fmt::Display for LogicSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Sample[#{}, zda={}, zcl={}]",
            self.index,
            u8::from(self.data),
            u8::from(self.clock)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_uses_bits() {
        let sample = LogicSample::new(12, true, false);
        assert_eq!(sample.to_string(), "Sample[#12, zda=1, zcl=0]");
        assert_eq!(sample.data_bit(), 1);
    }
}
