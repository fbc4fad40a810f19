/*!
    Real-time audio render state.
*/

use crate::PcmReader;

/// Upper bound on the PCM bytes a single decode pull can produce.
pub const MAX_AUDIO_FRAME_BYTES: usize = 192_000;

/// Zero block substituted once the decode pipeline has terminated.
const SILENCE_BYTES: usize = 1024;

/**
    The render callback's persistent state: a residual buffer of decoded
    PCM plus the cursor tracking how much of it has been delivered.

    One instance is moved into the audio output stream's callback closure
    and invoked serially by the audio subsystem (`&mut self` rules out
    concurrent invocation). `fill` never leaves the output buffer partially
    written: when the pipeline terminates it degrades to silence instead of
    stalling the device.
*/
pub struct AudioRenderer {
    reader: PcmReader,
    residual: Vec<u8>,
    /// Valid bytes in `residual`.
    filled: usize,
    /// Delivered bytes in `residual`.
    cursor: usize,
}

impl AudioRenderer {
    /**
        Create a renderer pulling decoded PCM from `reader`.
    */
    pub fn new(reader: PcmReader) -> Self {
        Self {
            reader,
            residual: vec![0u8; (MAX_AUDIO_FRAME_BYTES * 3) / 2],
            filled: 0,
            cursor: 0,
        }
    }

    /**
        Fill `out` completely with decoded PCM bytes.

        Pulls from the decode pipeline whenever the residual buffer runs
        dry. Once the pipeline reports end of stream, each pull is replaced
        by a fixed block of zeroes, so the device keeps receiving (silent)
        data and the callback keeps returning promptly.
    */
    pub fn fill(&mut self, out: &mut [u8]) {
        let mut written = 0;
        while written < out.len() {
            if self.cursor >= self.filled {
                self.filled = match self.reader.decode_into(&mut self.residual) {
                    Some(n) => n,
                    None => {
                        self.residual[..SILENCE_BYTES].fill(0);
                        SILENCE_BYTES
                    }
                };
                self.cursor = 0;
            }
            let n = (self.filled - self.cursor).min(out.len() - written);
            out[written..written + n].copy_from_slice(&self.residual[self.cursor..self.cursor + n]);
            self.cursor += n;
            written += n;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Packet, PacketQueue, PcmDecode, Rational, Result, StopToken, StreamType};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const TB: Rational = Rational { num: 1, den: 1000 };

    /// Decodes every packet to `produced` bytes of 0x11, counting calls.
    struct FixedOutput {
        produced: usize,
        calls: Arc<AtomicUsize>,
    }

    impl PcmDecode for FixedOutput {
        fn decode(&mut self, input: &[u8], out: &mut [u8]) -> Result<(usize, usize)> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            for byte in out.iter_mut().take(self.produced) {
                *byte = 0x11;
            }
            Ok((input.len(), self.produced))
        }
    }

    fn setup(
        payloads: &[&[u8]],
        produced: usize,
    ) -> (Arc<StopToken>, AudioRenderer, Arc<AtomicUsize>) {
        let stop = Arc::new(StopToken::new());
        let queue = PacketQueue::new(Arc::clone(&stop));
        for payload in payloads {
            let packet = Packet::new(payload.to_vec(), StreamType::Audio, None, None, TB, false);
            assert!(queue.push(packet));
        }
        let calls = Arc::new(AtomicUsize::new(0));
        let decoder = FixedOutput {
            produced,
            calls: Arc::clone(&calls),
        };
        let renderer = AudioRenderer::new(PcmReader::new(queue, Box::new(decoder)));
        (stop, renderer, calls)
    }

    #[test]
    fn fill_spans_multiple_decode_pulls() {
        let (_stop, mut renderer, calls) = setup(&[&[0u8; 4], &[0u8; 4]], 12);

        let mut out = [0u8; 24];
        renderer.fill(&mut out);
        assert_eq!(out, [0x11; 24]);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn residual_persists_between_fills() {
        let (_stop, mut renderer, calls) = setup(&[&[0u8; 4]], 10);

        let mut first = [0u8; 4];
        renderer.fill(&mut first);
        assert_eq!(first, [0x11; 4]);

        // The remaining 6 bytes come from the residual, no second pull.
        let mut second = [0u8; 6];
        renderer.fill(&mut second);
        assert_eq!(second, [0x11; 6]);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn stopped_pipeline_yields_pure_silence() {
        let (stop, mut renderer, calls) = setup(&[], 0);
        stop.request_stop();

        let mut out = [0xFFu8; 4096];
        renderer.fill(&mut out);
        assert!(out.iter().all(|&b| b == 0));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn data_then_silence_after_stop() {
        let (stop, mut renderer, _calls) = setup(&[&[0u8; 4]], 8);

        let mut first = [0u8; 8];
        renderer.fill(&mut first);
        assert_eq!(first, [0x11; 8]);

        stop.request_stop();
        let mut second = [0xFFu8; 32];
        renderer.fill(&mut second);
        assert!(second.iter().all(|&b| b == 0));
    }
}
