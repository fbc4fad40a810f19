/*!
    Pull-based PCM decoding from the packet queue.
*/

use std::sync::Arc;

use crate::{PacketQueue, PopResult, Result};

/**
    The decode primitive turning compressed bytes into PCM bytes.

    `decode` consumes up to `input.len()` compressed bytes and writes up to
    `out.len()` PCM bytes, returning `(consumed, produced)`. A call may
    consume without producing (the codec needs more input before it can
    emit a frame) or produce without consuming (the decoder is draining
    output buffered from an earlier submission). An error means the input
    is undecodable at the current position; the caller discards the rest of
    that packet and moves on.
*/
pub trait PcmDecode {
    /// Decode from `input` into `out`, returning `(consumed, produced)` byte counts.
    fn decode(&mut self, input: &[u8], out: &mut [u8]) -> Result<(usize, usize)>;
}

/**
    Pull-based PCM reader: pops packets from the queue and decodes them,
    preserving partial-consumption state across calls.

    Runs entirely on the audio callback's execution context. Two states:

    - **Draining**: the held packet has unconsumed bytes; decode from the
      cursor position.
    - **Empty**: no held bytes remain; block on the queue for the next
      packet.

    A corrupt packet is discarded wholesale rather than surfaced, so one
    bad packet cannot stall the pipeline.
*/
pub struct PcmReader {
    queue: Arc<PacketQueue>,
    decoder: Box<dyn PcmDecode + Send>,
    /// Held packet payload; Draining while `cursor < held.len()`.
    held: Vec<u8>,
    /// Consumed-byte cursor into `held`.
    cursor: usize,
}

impl PcmReader {
    /**
        Create a reader pulling from `queue` and decoding with `decoder`.
    */
    pub fn new(queue: Arc<PacketQueue>, decoder: Box<dyn PcmDecode + Send>) -> Self {
        Self {
            queue,
            decoder,
            held: Vec::new(),
            cursor: 0,
        }
    }

    /**
        Decode the next chunk of PCM into `out`.

        Returns `Some(n)` with `n > 0` decoded bytes, or `None` once stop
        has been requested (treated as end of stream). Never returns
        `Some(0)`: the call loops internally, pulling further packets as
        needed, until it has output bytes or the terminal signal. The only
        suspension point is the blocking queue pop.
    */
    pub fn decode_into(&mut self, out: &mut [u8]) -> Option<usize> {
        loop {
            while self.cursor < self.held.len() {
                match self.decoder.decode(&self.held[self.cursor..], out) {
                    Err(err) => {
                        tracing::warn!("discarding undecodable packet: {err}");
                        self.cursor = self.held.len();
                    }
                    Ok((0, 0)) => {
                        tracing::warn!("decoder made no progress, discarding packet remainder");
                        self.cursor = self.held.len();
                    }
                    Ok((consumed, 0)) => {
                        // Codec swallowed input without emitting a frame yet.
                        self.cursor += consumed;
                    }
                    Ok((consumed, produced)) => {
                        self.cursor += consumed;
                        return Some(produced);
                    }
                }
            }

            // Empty: release the held payload and adopt the next packet.
            self.held.clear();
            self.cursor = 0;
            match self.queue.pop() {
                PopResult::Packet(packet) => self.held = packet.data,
                PopResult::Stopped => return None,
                // Blocking pop reports Empty only in theory; retry.
                PopResult::Empty => continue,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Packet, Rational, StopToken, StreamType};
    use parking_lot::Mutex;

    const TB: Rational = Rational { num: 1, den: 1000 };

    /// One scripted response of the fake decode primitive.
    enum Step {
        Ok { consumed: usize, produced: usize },
        Fail,
    }

    /// Fake decode primitive driven by a script, recording the input
    /// length it was handed on each call.
    struct Scripted {
        steps: Vec<Step>,
        next: usize,
        inputs: Arc<Mutex<Vec<usize>>>,
    }

    impl Scripted {
        fn new(steps: Vec<Step>) -> (Self, Arc<Mutex<Vec<usize>>>) {
            let inputs = Arc::new(Mutex::new(Vec::new()));
            (
                Self {
                    steps,
                    next: 0,
                    inputs: Arc::clone(&inputs),
                },
                inputs,
            )
        }
    }

    impl PcmDecode for Scripted {
        fn decode(&mut self, input: &[u8], out: &mut [u8]) -> Result<(usize, usize)> {
            self.inputs.lock().push(input.len());
            let step = self.steps.get(self.next).expect("script exhausted");
            self.next += 1;
            match *step {
                Step::Fail => Err(crate::Error::invalid_data("scripted failure")),
                Step::Ok { consumed, produced } => {
                    for byte in out.iter_mut().take(produced) {
                        *byte = 0xAB;
                    }
                    Ok((consumed, produced))
                }
            }
        }
    }

    fn queue_with_packets(payloads: &[&[u8]]) -> (Arc<StopToken>, Arc<PacketQueue>) {
        let stop = Arc::new(StopToken::new());
        let queue = PacketQueue::new(Arc::clone(&stop));
        for payload in payloads {
            let packet = Packet::new(payload.to_vec(), StreamType::Audio, None, None, TB, false);
            assert!(queue.push(packet));
        }
        (stop, queue)
    }

    #[test]
    fn partial_consumption_loops_within_one_call() {
        // First call eats 4 bytes without output, second finishes the
        // packet and produces; one decode_into must cover both.
        let (_stop, queue) = queue_with_packets(&[&[0u8; 10]]);
        let (decoder, inputs) = Scripted::new(vec![
            Step::Ok {
                consumed: 4,
                produced: 0,
            },
            Step::Ok {
                consumed: 6,
                produced: 8,
            },
        ]);
        let mut reader = PcmReader::new(queue, Box::new(decoder));

        let mut out = [0u8; 64];
        assert_eq!(reader.decode_into(&mut out), Some(8));
        assert_eq!(&out[..8], &[0xAB; 8]);
        assert_eq!(*inputs.lock(), vec![10, 6]);
    }

    #[test]
    fn corrupt_packet_is_skipped_for_the_next() {
        let (_stop, queue) = queue_with_packets(&[&[0u8; 7], &[0u8; 5]]);
        let (decoder, inputs) = Scripted::new(vec![
            Step::Fail,
            Step::Ok {
                consumed: 5,
                produced: 6,
            },
        ]);
        let mut reader = PcmReader::new(queue, Box::new(decoder));

        let mut out = [0u8; 64];
        assert_eq!(reader.decode_into(&mut out), Some(6));
        assert_eq!(*inputs.lock(), vec![7, 5]);
    }

    #[test]
    fn zero_progress_packet_is_discarded() {
        let (_stop, queue) = queue_with_packets(&[&[0u8; 9], &[0u8; 4]]);
        let (decoder, inputs) = Scripted::new(vec![
            Step::Ok {
                consumed: 0,
                produced: 0,
            },
            Step::Ok {
                consumed: 4,
                produced: 3,
            },
        ]);
        let mut reader = PcmReader::new(queue, Box::new(decoder));

        let mut out = [0u8; 16];
        assert_eq!(reader.decode_into(&mut out), Some(3));
        assert_eq!(*inputs.lock(), vec![9, 4]);
    }

    #[test]
    fn buffered_output_served_without_consuming() {
        // A decoder that buffered output from packet one serves it against
        // packet two's input without consuming any of it.
        let (_stop, queue) = queue_with_packets(&[&[0u8; 10], &[0u8; 12]]);
        let (decoder, inputs) = Scripted::new(vec![
            Step::Ok {
                consumed: 10,
                produced: 0,
            },
            Step::Ok {
                consumed: 0,
                produced: 16,
            },
        ]);
        let mut reader = PcmReader::new(queue, Box::new(decoder));

        let mut out = [0u8; 64];
        assert_eq!(reader.decode_into(&mut out), Some(16));
        assert_eq!(*inputs.lock(), vec![10, 12]);
    }

    #[test]
    fn stop_reports_end_of_stream() {
        let (stop, queue) = queue_with_packets(&[]);
        let (decoder, inputs) = Scripted::new(vec![]);
        let mut reader = PcmReader::new(queue, Box::new(decoder));

        stop.request_stop();
        let mut out = [0u8; 16];
        assert_eq!(reader.decode_into(&mut out), None);
        assert!(inputs.lock().is_empty());
    }
}
