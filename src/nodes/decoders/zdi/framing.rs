//! Bit-level framing of one ZDI transaction
//!
//! A frame is a start condition (ZDA falls while ZCL is high), seven
//! address bits MSB first, a direction bit, a separator bit, eight value
//! bits and a closing separator bit. Address, direction and write value
//! bits are latched on ZCL rising edges. Read value bits are driven by the
//! target after a falling edge and are taken from the sample following it.

use super::scanner::{Condition, SampleStream, Scanner};
use crate::nodes::decoders::types::{Annotation, AnnotationClass, Direction, Transaction};
use crate::runtime::{LogicSample, WorkResult};
use tracing::trace;

pub const ADDRESS_BITS: usize = 7;
pub const VALUE_BITS: usize = 8;

/// A completed transaction and the bit-level annotations describing it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub transaction: Transaction,
    pub annotations: Vec<Annotation>,
}

/// Assembles one frame from a sample stream
///
/// Annotations are held back until the closing separator is seen, so a
/// capture that ends mid-frame yields `Err(Shutdown)` and nothing else.
pub struct FrameAssembler<'a, S: ?Sized> {
    scanner: &'a mut Scanner,
    stream: &'a mut S,
    annotations: Vec<Annotation>,
}

impl<'a, S: SampleStream + ?Sized> FrameAssembler<'a, S> {
    pub fn new(scanner: &'a mut Scanner, stream: &'a mut S) -> Self {
        Self {
            scanner,
            stream,
            annotations: Vec::with_capacity(ADDRESS_BITS + VALUE_BITS + 6),
        }
    }

    fn wait(&mut self, condition: Condition) -> WorkResult<LogicSample> {
        Ok(self.scanner.await_next(&mut *self.stream, &[condition])?.sample)
    }

    fn annotate(&mut self, start: u64, end: u64, class: AnnotationClass, texts: &[&str]) {
        self.annotations.push(Annotation::new(
            start,
            end,
            class,
            texts.iter().map(|t| t.to_string()).collect(),
        ));
    }

    fn annotate_bit(&mut self, start: u64, class: AnnotationClass, bit: u8) {
        self.annotations.push(Annotation::new(
            start,
            start + 1,
            class,
            vec![bit.to_string()],
        ));
    }

    /// Value bit as driven by the given direction; returns (bit, annotation start)
    fn value_bit(&mut self, direction: Direction) -> WorkResult<(u8, u64)> {
        match direction {
            Direction::Write => {
                let sample = self.wait(Condition::CLOCK_RISING)?;
                Ok((sample.data_bit(), sample.index))
            }
            Direction::Read => {
                self.wait(Condition::CLOCK_FALLING)?;
                let sample = self.wait(Condition::SKIP_ONE)?;
                Ok((sample.data_bit(), sample.index.saturating_sub(1)))
            }
        }
    }

    /// Run the frame state machine up to and including the closing separator
    pub fn assemble(mut self) -> WorkResult<Frame> {
        let start = self.wait(Condition::START)?.index;
        self.annotate(start, start + 1, AnnotationClass::Start, &["START", "S"]);

        let mut address = 0u8;
        let mut address_start = start;
        for i in 0..ADDRESS_BITS {
            let sample = self.wait(Condition::CLOCK_RISING)?;
            if i == 0 {
                address_start = sample.index;
            }
            address = (address << 1) | sample.data_bit();
            self.annotate_bit(sample.index, AnnotationClass::Bit, sample.data_bit());
        }

        let sample = self.wait(Condition::CLOCK_RISING)?;
        let direction = Direction::from_bit(sample.data_bit());
        self.annotate(
            address_start,
            sample.index,
            AnnotationClass::Register,
            &[format!("{:#x}", address).as_str()],
        );
        self.annotate(
            sample.index,
            sample.index + 1,
            AnnotationClass::Direction,
            &[direction.letter()],
        );

        let separator = self.wait(Condition::CLOCK_RISING)?;
        self.annotate_bit(separator.index, AnnotationClass::Separator, separator.data_bit());
        let value_start = separator.index + 1;

        let mut value = 0u8;
        for _ in 0..VALUE_BITS {
            let (bit, at) = self.value_bit(direction)?;
            value = (value << 1) | bit;
            self.annotate_bit(at, AnnotationClass::Bit, bit);
        }

        let end = self.wait(Condition::CLOCK_RISING)?;
        self.annotate_bit(end.index, AnnotationClass::Separator, end.data_bit());
        self.annotate(
            value_start,
            end.index,
            AnnotationClass::Value,
            &[format!("{:#x}", value).as_str()],
        );

        let transaction = Transaction {
            address,
            direction,
            value,
            start_sample: start,
            end_sample: end.index,
        };
        trace!("Frame complete: {}", transaction);

        Ok(Frame {
            transaction,
            annotations: self.annotations,
        })
    }
}
