/*!
    Audio decoder implementation.
*/

use ffmpeg_next::{
    ChannelLayout,
    codec::{self, decoder::Audio as AudioDecoderFFmpeg},
    format::{Sample, sample},
    software::resampling,
    util::frame::audio::Audio as AudioFrameFFmpeg,
};

use playhead_core::{Error, PcmDecode, Result};

/**
    Audio decoder.

    Decodes audio packets and resamples the result to interleaved f32 at
    the negotiated output rate and channel count, so the bytes it produces
    can be handed to the audio device without further conversion.

    A packet may decode to more PCM than the caller's buffer holds; the
    surplus is kept internally and served by later calls before any new
    input is consumed.
*/
pub struct AudioDecoder {
    decoder: AudioDecoderFFmpeg,
    resampler: Option<resampling::Context>,
    target_rate: u32,
    target_channels: u16,
    pending: Vec<u8>,
}

impl AudioDecoder {
    /**
        Create a new audio decoder from codec parameters.

        # Arguments

        * `parameters` - Codec parameters from the source's audio stream
        * `target_rate` - Negotiated output sample rate in Hz
        * `target_channels` - Negotiated output channel count (1 or 2)
    */
    pub fn new(
        parameters: codec::Parameters,
        target_rate: u32,
        target_channels: u16,
    ) -> Result<Self> {
        ffmpeg_next::init().map_err(|e| Error::codec(e.to_string()))?;

        let decoder_ctx = codec::context::Context::from_parameters(parameters)
            .map_err(|e| Error::codec(e.to_string()))?;

        let decoder = decoder_ctx
            .decoder()
            .audio()
            .map_err(|e| Error::codec(e.to_string()))?;

        Ok(Self {
            decoder,
            resampler: None,
            target_rate,
            target_channels,
            pending: Vec::new(),
        })
    }

    /**
        Create or recreate the resampler to match the frame's source format.

        Lazily initialized on the first decoded frame, and reinitialized if
        the source format changes mid-stream.
    */
    fn ensure_resampler(&mut self, frame: &AudioFrameFFmpeg) -> Result<()> {
        let src_format = frame.format();
        let src_rate = frame.rate();
        let src_layout = frame.channel_layout();

        let dst_format = Sample::F32(sample::Type::Packed);
        let dst_rate = self.target_rate;
        let dst_layout = match self.target_channels {
            1 => ChannelLayout::MONO,
            _ => ChannelLayout::STEREO,
        };

        let needs_recreate = match &self.resampler {
            None => true,
            Some(resampler) => {
                let input = resampler.input();
                input.format != src_format
                    || input.rate != src_rate
                    || input.channel_layout != src_layout
            }
        };

        if needs_recreate {
            let resampler = resampling::Context::get(
                src_format, src_layout, src_rate, dst_format, dst_layout, dst_rate,
            )
            .map_err(|e| Error::codec(e.to_string()))?;

            tracing::debug!(
                "audio resampler: {src_rate} Hz {src_format:?} -> {dst_rate} Hz f32 interleaved"
            );
            self.resampler = Some(resampler);
        }

        Ok(())
    }

    /**
        Resample a decoded frame and append the interleaved bytes to `pending`.
    */
    fn resample_into_pending(&mut self, frame: &AudioFrameFFmpeg) -> Result<()> {
        self.ensure_resampler(frame)?;

        let Some(resampler) = self.resampler.as_mut() else {
            return Err(Error::codec("resampler not initialized"));
        };

        let mut output = AudioFrameFFmpeg::empty();
        resampler
            .run(frame, &mut output)
            .map_err(|e| Error::codec(e.to_string()))?;

        let samples = output.samples();
        if samples == 0 {
            // Resampler is still buffering.
            return Ok(());
        }

        let bytes = samples * self.target_channels as usize * size_of::<f32>();
        let data = output.data(0);
        self.pending.extend_from_slice(&data[..bytes.min(data.len())]);

        Ok(())
    }

    /**
        Receive all frames the codec has ready and buffer their PCM.
    */
    fn receive_pending(&mut self) -> Result<()> {
        let mut decoded = AudioFrameFFmpeg::empty();

        loop {
            match self.decoder.receive_frame(&mut decoded) {
                Ok(()) => self.resample_into_pending(&decoded)?,
                Err(ffmpeg_next::Error::Other { errno })
                    if errno == ffmpeg_next::error::EAGAIN =>
                {
                    break;
                }
                Err(ffmpeg_next::Error::Eof) => {
                    break;
                }
                Err(e) => {
                    return Err(Error::codec(e.to_string()));
                }
            }
        }

        Ok(())
    }

    /**
        Move buffered PCM into `out`, returning the number of bytes copied.
    */
    fn drain_pending(&mut self, out: &mut [u8]) -> usize {
        let n = self.pending.len().min(out.len());
        out[..n].copy_from_slice(&self.pending[..n]);
        self.pending.drain(..n);
        n
    }
}

impl PcmDecode for AudioDecoder {
    fn decode(&mut self, input: &[u8], out: &mut [u8]) -> Result<(usize, usize)> {
        // Serve leftovers from the previous packet before touching new input.
        if !self.pending.is_empty() {
            return Ok((0, self.drain_pending(out)));
        }

        let packet = ffmpeg_next::Packet::copy(input);
        self.decoder
            .send_packet(&packet)
            .map_err(|e| Error::invalid_data(e.to_string()))?;

        self.receive_pending()?;

        Ok((input.len(), self.drain_pending(out)))
    }
}

impl std::fmt::Debug for AudioDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioDecoder")
            .field("target_rate", &self.target_rate)
            .field("target_channels", &self.target_channels)
            .field("pending_bytes", &self.pending.len())
            .finish_non_exhaustive()
    }
}

// SAFETY: AudioDecoder can be safely sent between threads because:
// - FFmpeg's codec and resampler contexts are not thread-safe for concurrent
//   access, but they CAN be safely moved between threads (single ownership
//   transfer)
// - After creation on the main thread, the decoder is moved into the audio
//   output callback where it has exclusive ownership and is never accessed
//   from other threads
// - The Send trait only guarantees safe ownership transfer, not concurrent
//   access, which matches this usage pattern
unsafe impl Send for AudioDecoder {}
