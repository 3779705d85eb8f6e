//! Test waveform builder producing ZDI sample traces

use crate::nodes::decoders::types::Direction;
use crate::runtime::LogicSample;

/// Builds a sample trace one line transition at a time.
///
/// Both lines idle high. Write value bits are driven on clock rising
/// edges; read value bits are driven on the sample after a falling edge.
/// A read frame closes on the rising edge that ends its last value bit,
/// so every sample of a frame is consumed by the decoder.
pub(crate) struct Waveform {
    samples: Vec<LogicSample>,
    data: bool,
    clock: bool,
}

impl Waveform {
    pub fn new() -> Self {
        let mut waveform = Self {
            samples: Vec::new(),
            data: true,
            clock: true,
        };
        waveform.idle(2);
        waveform
    }

    fn push(&mut self, data: bool, clock: bool) -> u64 {
        let index = self.samples.len() as u64;
        self.samples.push(LogicSample::new(index, data, clock));
        self.data = data;
        self.clock = clock;
        index
    }

    /// Hold the current line levels
    pub fn idle(&mut self, count: usize) -> &mut Self {
        for _ in 0..count {
            self.push(self.data, self.clock);
        }
        self
    }

    /// Data falls while clock is high; returns the start sample
    pub fn start(&mut self) -> u64 {
        self.push(true, true);
        self.push(false, true)
    }

    /// Bit latched on a clock rising edge; returns the edge sample
    pub fn rising_bit(&mut self, bit: bool) -> u64 {
        self.push(bit, false);
        self.push(bit, true)
    }

    /// Bit driven one sample after a clock falling edge; returns that sample
    pub fn falling_bit(&mut self, bit: bool) -> u64 {
        self.push(self.data, false);
        let index = self.push(bit, false);
        self.push(bit, true);
        index
    }

    /// Append one complete transaction
    pub fn transaction(&mut self, address: u8, direction: Direction, value: u8) -> &mut Self {
        self.start();
        for i in (0..7).rev() {
            self.rising_bit((address >> i) & 1 == 1);
        }
        self.rising_bit(direction == Direction::Read);
        self.rising_bit(false);
        let bits = (0..8).rev().map(|i| (value >> i) & 1 == 1);
        match direction {
            Direction::Read => {
                // the rising edge ending the last bit is the closing separator
                for bit in bits {
                    self.falling_bit(bit);
                }
            }
            Direction::Write => {
                for bit in bits {
                    self.rising_bit(bit);
                }
                self.rising_bit(true);
            }
        }
        self
    }

    pub fn write(&mut self, address: u8, value: u8) -> &mut Self {
        self.transaction(address, Direction::Write, value)
    }

    pub fn read(&mut self, address: u8, value: u8) -> &mut Self {
        self.transaction(address, Direction::Read, value)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn samples(&self) -> Vec<LogicSample> {
        self.samples.clone()
    }
}
