//! ZDI decoder node
//!
//! Pulls [`LogicSample`]s, frames them into transactions, classifies each
//! transaction against the session state and emits [`Annotation`]s. One
//! transaction is decoded per `work()` call; scanner and session state
//! persist across calls.

use super::classifier::classify;
use super::framing::FrameAssembler;
use super::scanner::{IterStream, SampleStream, Scanner};
use super::session::SessionState;
use super::sink::AnnotationSink;
use crate::nodes::decoders::types::{Annotation, AnnotationClass, Transaction};
use crate::runtime::node::{InputPort, OutputPort, ProcessNode, WorkError, WorkResult};
use crate::runtime::ports::{PortDirection, PortSchema};
use crate::runtime::LogicSample;
use tracing::{debug, info, trace};

/// ZDI decoder node
///
/// Input: `samples` (LogicSample)
/// Output: `annotations` (Annotation)
pub struct ZdiDecoder {
    name: String,
    samplerate: Option<u64>,
    scanner: Scanner,
    session: SessionState,
    tx_count: u64,
}

impl ZdiDecoder {
    pub fn new() -> Self {
        Self {
            name: "zdi_decoder".to_string(),
            samplerate: None,
            scanner: Scanner::new(),
            session: SessionState::new(),
            tx_count: 0,
        }
    }

    /// With custom name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// With the capture sample rate in Hz
    pub fn with_samplerate(mut self, hz: u64) -> Self {
        self.set_samplerate(hz);
        self
    }

    /// Record the capture sample rate. ZDI is self-clocked, so this is
    /// informational only.
    pub fn set_samplerate(&mut self, hz: u64) {
        debug!("[{}] Sample rate {} Hz", self.name, hz);
        self.samplerate = Some(hz);
    }

    pub fn samplerate(&self) -> Option<u64> {
        self.samplerate
    }

    /// Discard scanner and session state ahead of a new capture
    pub fn reset(&mut self) {
        self.scanner.reset();
        self.session = SessionState::new();
        self.tx_count = 0;
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    /// Transactions decoded since creation or the last reset
    pub fn transactions_decoded(&self) -> u64 {
        self.tx_count
    }

    /// Decode one transaction, emitting its annotations into `sink`.
    ///
    /// Returns `Err(WorkError::Shutdown)` if the stream ends first; nothing
    /// is emitted for an unfinished transaction.
    pub fn decode_transaction<S, K>(&mut self, stream: &mut S, sink: &mut K) -> WorkResult<Transaction>
    where
        S: SampleStream + ?Sized,
        K: AnnotationSink + ?Sized,
    {
        let tx = Self::decode_with(&mut self.scanner, &mut self.session, stream, sink)?;
        self.tx_count += 1;
        Ok(tx)
    }

    /// Decode transactions until the stream ends; returns how many completed
    pub fn run<S, K>(&mut self, stream: &mut S, sink: &mut K) -> WorkResult<u64>
    where
        S: SampleStream + ?Sized,
        K: AnnotationSink + ?Sized,
    {
        let mut decoded = 0;
        loop {
            match self.decode_transaction(stream, sink) {
                Ok(_) => decoded += 1,
                Err(WorkError::Shutdown) => return Ok(decoded),
                Err(e) => return Err(e),
            }
        }
    }

    /// Decode an in-memory capture to a list of annotations
    pub fn decode(&mut self, samples: impl IntoIterator<Item = LogicSample>) -> WorkResult<Vec<Annotation>> {
        let mut stream = IterStream::new(samples);
        let mut annotations = Vec::new();
        self.run(&mut stream, &mut annotations)?;
        Ok(annotations)
    }

    fn decode_with<S, K>(
        scanner: &mut Scanner,
        session: &mut SessionState,
        stream: &mut S,
        sink: &mut K,
    ) -> WorkResult<Transaction>
    where
        S: SampleStream + ?Sized,
        K: AnnotationSink + ?Sized,
    {
        let frame = FrameAssembler::new(scanner, stream).assemble()?;
        let tx = frame.transaction;

        for annotation in frame.annotations {
            sink.emit(annotation)?;
        }

        if let Some(action) = classify(&tx, session) {
            trace!("{} -> {}", tx, action.long);
            sink.emit(Annotation::new(
                tx.start_sample,
                tx.end_sample,
                AnnotationClass::Action,
                vec![action.long, action.short],
            ))?;
        }

        Ok(tx)
    }
}

impl Default for ZdiDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessNode for ZdiDecoder {
    fn name(&self) -> &str {
        &self.name
    }

    fn num_inputs(&self) -> usize {
        1
    }

    fn num_outputs(&self) -> usize {
        1
    }

    fn input_schema(&self) -> Vec<PortSchema> {
        vec![PortSchema::new::<LogicSample>("samples", 0, PortDirection::Input)]
    }

    fn output_schema(&self) -> Vec<PortSchema> {
        vec![PortSchema::new::<Annotation>("annotations", 0, PortDirection::Output)]
    }

    fn work(&mut self, inputs: &[InputPort], outputs: &[OutputPort]) -> WorkResult<usize> {
        let mut output = outputs
            .first()
            .and_then(|p| p.get::<Annotation>())
            .ok_or_else(|| WorkError::NodeError("Missing annotation output".into()))?;

        let Self {
            name,
            scanner,
            session,
            tx_count,
            ..
        } = self;

        let mut input = inputs
            .first()
            .and_then(|p| p.get::<LogicSample>())
            .ok_or_else(|| WorkError::NodeError("Missing sample input".into()))?;

        match Self::decode_with(scanner, session, &mut input, &mut output) {
            Ok(tx) => {
                *tx_count += 1;
                debug!("[{}] Transaction #{}: {}", name, tx_count, tx);
                Ok(1)
            }
            Err(WorkError::Shutdown) => {
                info!(
                    "[{}] End of capture after {} transactions ({} samples)",
                    name,
                    tx_count,
                    scanner.samples_consumed()
                );
                output.close();
                Err(WorkError::Shutdown)
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::decoders::types::Direction;
    use crate::nodes::decoders::zdi::session::CpuRegister;
    use crate::nodes::decoders::zdi::waveform::Waveform;
    use crate::nodes::{AnnotationCollector, CaptureSource};
    use crate::runtime::Pipeline;

    fn actions(annotations: &[Annotation]) -> Vec<&str> {
        annotations
            .iter()
            .filter(|a| a.class == AnnotationClass::Action)
            .map(|a| a.text())
            .collect()
    }

    #[test]
    fn test_end_to_end_address_write() {
        let mut waveform = Waveform::new();
        waveform.write(0x00, 0x01);

        let annotations = ZdiDecoder::new().decode(waveform.samples()).unwrap();

        let register = annotations
            .iter()
            .find(|a| a.class == AnnotationClass::Register)
            .unwrap();
        assert_eq!(register.text(), "0x0");

        let action = annotations.last().unwrap();
        assert_eq!(
            *action,
            Annotation::new(
                3,
                39,
                AnnotationClass::Action,
                vec!["ZDI_ADDR0_L=0x1".into(), "0x1".into()]
            )
        );
    }

    fn annotation(start: u64, end: u64, class: AnnotationClass, texts: &[&str]) -> Annotation {
        Annotation::new(start, end, class, texts.iter().map(|t| t.to_string()).collect())
    }

    #[test]
    fn test_read_frame_annotation_sequence() {
        let mut waveform = Waveform::new();
        waveform.read(0x03, 0xb4);
        assert_eq!(waveform.len(), 46);

        let mut expected = vec![annotation(3, 4, AnnotationClass::Start, &["START", "S"])];
        // 0x03, MSB first, sampled on rising edges
        for (i, bit) in ["0", "0", "0", "0", "0", "1", "1"].into_iter().enumerate() {
            let at = 5 + 2 * i as u64;
            expected.push(annotation(at, at + 1, AnnotationClass::Bit, &[bit]));
        }
        expected.push(annotation(5, 19, AnnotationClass::Register, &["0x3"]));
        expected.push(annotation(19, 20, AnnotationClass::Direction, &["R"]));
        expected.push(annotation(21, 22, AnnotationClass::Separator, &["0"]));
        // 0xb4, each bit annotated over (falling edge, sample after it)
        for (i, bit) in ["1", "0", "1", "1", "0", "1", "0", "0"].into_iter().enumerate() {
            let falling = 22 + 3 * i as u64;
            expected.push(annotation(falling, falling + 1, AnnotationClass::Bit, &[bit]));
        }
        // Separator 2 is the rising edge closing the last value bit
        expected.push(annotation(45, 46, AnnotationClass::Separator, &["0"]));
        expected.push(annotation(22, 45, AnnotationClass::Value, &["0xb4"]));
        expected.push(annotation(
            3,
            45,
            AnnotationClass::Action,
            &["ZDI_STAT=ZHAmI", "ZHAmI"],
        ));

        let annotations = ZdiDecoder::new().decode(waveform.samples()).unwrap();
        assert_eq!(annotations, expected);
    }

    #[test]
    fn test_accumulator_across_transactions() {
        let mut waveform = Waveform::new();
        waveform
            .write(0x13, 0x34)
            .write(0x14, 0x12)
            .write(0x15, 0x00)
            .write(0x16, 0x80);

        let mut decoder = ZdiDecoder::new();
        let annotations = decoder.decode(waveform.samples()).unwrap();

        assert_eq!(
            actions(&annotations),
            vec![
                "ZDI_WR_L=0x34",
                "ZDI_WR_H=0x12",
                "ZDI_WR_U=0x0",
                "ZDI_RW_CTL:Write {MBASE, A, F}=0x1234",
            ]
        );
        assert_eq!(decoder.transactions_decoded(), 4);
        assert_eq!(decoder.session().pending_write_value(), 0x1234);
    }

    #[test]
    fn test_register_read_sequence() {
        let mut waveform = Waveform::new();
        waveform
            .write(0x16, 0x07)
            .read(0x10, 0x56)
            .read(0x11, 0x34)
            .read(0x12, 0x12)
            .read(0x03, 0xb4);

        let mut decoder = ZdiDecoder::new();
        let annotations = decoder.decode(waveform.samples()).unwrap();

        assert_eq!(
            actions(&annotations),
            vec![
                "ZDI_RW_CTL:Read PC",
                "ZDI_RD_L=0x56",
                "ZDI_RD_H=0x34",
                "ZDI_RD_U=0x12",
                "ZDI_STAT=ZHAmI",
            ]
        );
        assert_eq!(decoder.session().shadow().value(CpuRegister::Pc), Some(0x123456));
    }

    #[test]
    fn test_unknown_transaction_has_no_action() {
        let mut waveform = Waveform::new();
        waveform.transaction(0x7e, Direction::Read, 0x00);

        let annotations = ZdiDecoder::new().decode(waveform.samples()).unwrap();
        assert!(actions(&annotations).is_empty());
        assert_eq!(annotations.len(), 21);
    }

    #[test]
    fn test_decoding_is_deterministic() {
        let mut waveform = Waveform::new();
        waveform.write(0x10, 0x91).read(0x20, 0x3e).write(0x21, 0xed);

        let first = ZdiDecoder::new().decode(waveform.samples()).unwrap();
        let second = ZdiDecoder::new().decode(waveform.samples()).unwrap();
        assert_eq!(first, second);
        assert_eq!(
            actions(&first),
            vec!["ZDI_BRK_CTL=BNB1S", "ZDI_RD_MEM=0x3e", "ZDI_IS4=0xed"]
        );
    }

    #[test]
    fn test_truncated_transaction_emits_nothing() {
        let mut waveform = Waveform::new();
        waveform.write(0x13, 0x34);
        let complete = waveform.len();
        waveform.write(0x14, 0x12);

        let mut samples = waveform.samples();
        samples.truncate(samples.len() - 1);

        let mut decoder = ZdiDecoder::new();
        let annotations = decoder.decode(samples).unwrap();
        assert_eq!(actions(&annotations), vec!["ZDI_WR_L=0x34"]);
        assert!(annotations.iter().all(|a| a.end <= complete as u64));
        assert_eq!(decoder.session().pending_write_value(), 0x34);
    }

    #[test]
    fn test_run_counts_transactions() {
        let mut waveform = Waveform::new();
        waveform.write(0x00, 0x01).write(0x01, 0x02);
        waveform.idle(5);

        let mut decoder = ZdiDecoder::new();
        let mut stream = IterStream::new(waveform.samples());
        let mut annotations = Vec::new();
        assert_eq!(decoder.run(&mut stream, &mut annotations).unwrap(), 2);
        assert_eq!(actions(&annotations), vec!["ZDI_ADDR0_L=0x1", "ZDI_ADDR0_H=0x2"]);
    }

    #[test]
    fn test_reset_clears_session() {
        let mut waveform = Waveform::new();
        waveform.write(0x13, 0x34).write(0x16, 0x03);

        let mut decoder = ZdiDecoder::new().with_samplerate(8_000_000);
        decoder.decode(waveform.samples()).unwrap();
        assert_eq!(decoder.session().selected_register(), CpuRegister::Hl);

        decoder.reset();
        assert_eq!(decoder.session(), &SessionState::new());
        assert_eq!(decoder.transactions_decoded(), 0);
        assert_eq!(decoder.samplerate(), Some(8_000_000));
    }

    #[test]
    fn test_pipeline_matches_direct_decode() {
        let mut waveform = Waveform::new();
        waveform
            .write(0x13, 0x34)
            .write(0x14, 0x12)
            .write(0x16, 0x81)
            .read(0x03, 0x00);

        let expected = ZdiDecoder::new().decode(waveform.samples()).unwrap();

        let collector = AnnotationCollector::new();
        let collected = collector.annotations();

        let mut pipeline = Pipeline::new().with_default_buffer_size(64);
        pipeline
            .add_process("capture", CaptureSource::from_samples(waveform.samples()))
            .unwrap();
        pipeline.add_process("zdi", ZdiDecoder::new()).unwrap();
        pipeline.add_process("collector", collector).unwrap();
        pipeline.connect("capture", "samples", "zdi", "samples").unwrap();
        pipeline.connect("zdi", "annotations", "collector", "annotations").unwrap();
        pipeline.build().unwrap().wait();

        assert_eq!(*collected.lock().unwrap(), expected);
        assert_eq!(
            actions(&expected).last().copied(),
            Some("ZDI_STAT=zhami")
        );
    }
}
