/*!
    Video decoder implementation.
*/

use ffmpeg_next::{
    codec::{self, decoder::Video as VideoDecoderFFmpeg},
    format::Pixel,
    software::scaling,
    util::frame::video::Video as VideoFrameFFmpeg,
};

use playhead_core::{Error, Packet, Pts, Rational, Result, VideoFrame};

/**
    Video decoder.

    Decodes video packets into frames and converts each one to tightly
    packed RGBA at the source resolution.
*/
pub struct VideoDecoder {
    decoder: VideoDecoderFFmpeg,
    scaler: Option<scaling::Context>,
    time_base: Rational,
}

impl VideoDecoder {
    /**
        Create a new video decoder from codec parameters.

        # Arguments

        * `parameters` - Codec parameters from the source's video stream
        * `time_base` - Time base for the video stream
    */
    pub fn new(parameters: codec::Parameters, time_base: Rational) -> Result<Self> {
        ffmpeg_next::init().map_err(|e| Error::codec(e.to_string()))?;

        let decoder_ctx = codec::context::Context::from_parameters(parameters)
            .map_err(|e| Error::codec(e.to_string()))?;

        let decoder = decoder_ctx
            .decoder()
            .video()
            .map_err(|e| Error::codec(e.to_string()))?;

        Ok(Self {
            decoder,
            scaler: None,
            time_base,
        })
    }

    /**
        Decode a packet, returning decoded frames.

        May return zero, one, or multiple frames depending on codec.
    */
    pub fn decode(&mut self, packet: &Packet) -> Result<Vec<VideoFrame>> {
        let mut ffmpeg_pkt = if packet.data.is_empty() {
            ffmpeg_next::Packet::empty()
        } else {
            ffmpeg_next::Packet::copy(&packet.data)
        };
        ffmpeg_pkt.set_pts(packet.pts.map(|pts| pts.0));
        ffmpeg_pkt.set_dts(packet.dts.map(|dts| dts.0));

        self.decoder
            .send_packet(&ffmpeg_pkt)
            .map_err(|e| Error::invalid_data(e.to_string()))?;

        self.receive_frames()
    }

    /**
        Flush the decoder to get any remaining buffered frames.

        Call this at end of stream to retrieve any buffered frames.
    */
    pub fn flush(&mut self) -> Result<Vec<VideoFrame>> {
        self.decoder
            .send_eof()
            .map_err(|e| Error::codec(e.to_string()))?;

        self.receive_frames()
    }

    /**
        Receive all available frames from the decoder.
    */
    fn receive_frames(&mut self) -> Result<Vec<VideoFrame>> {
        let mut frames = Vec::new();
        let mut decoded_frame = VideoFrameFFmpeg::empty();

        loop {
            match self.decoder.receive_frame(&mut decoded_frame) {
                Ok(()) => match self.convert_frame(&decoded_frame) {
                    Ok(frame) => frames.push(frame),
                    Err(e) => {
                        tracing::warn!("video frame conversion error: {e}");
                    }
                },
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

        Ok(frames)
    }

    /**
        Create or recreate the scaler to match the frame's source format.

        Lazily initialized on the first decoded frame, and reinitialized if
        the source format changes mid-stream.
    */
    fn ensure_scaler(&mut self, frame: &VideoFrameFFmpeg) -> Result<()> {
        let needs_recreate = match &self.scaler {
            None => true,
            Some(scaler) => {
                let input = scaler.input();
                input.format != frame.format()
                    || input.width != frame.width()
                    || input.height != frame.height()
            }
        };

        if needs_recreate {
            let scaler = scaling::Context::get(
                frame.format(),
                frame.width(),
                frame.height(),
                Pixel::RGBA,
                frame.width(),
                frame.height(),
                scaling::Flags::BILINEAR,
            )
            .map_err(|e| Error::codec(e.to_string()))?;

            tracing::debug!(
                "video scaler: {}x{} {:?} -> RGBA",
                frame.width(),
                frame.height(),
                frame.format()
            );
            self.scaler = Some(scaler);
        }

        Ok(())
    }

    /**
        Convert an FFmpeg video frame to our RGBA frame type.
    */
    fn convert_frame(&mut self, frame: &VideoFrameFFmpeg) -> Result<VideoFrame> {
        if frame.width() == 0 || frame.height() == 0 {
            return Err(Error::invalid_data("video frame has zero dimensions"));
        }

        self.ensure_scaler(frame)?;

        let Some(scaler) = self.scaler.as_mut() else {
            return Err(Error::codec("scaler not initialized"));
        };

        let mut rgba_frame = VideoFrameFFmpeg::empty();
        scaler
            .run(frame, &mut rgba_frame)
            .map_err(|e| Error::codec(e.to_string()))?;

        let width = rgba_frame.width() as usize;
        let height = rgba_frame.height() as usize;
        let data = pack_rows(rgba_frame.data(0), rgba_frame.stride(0), width, height);

        Ok(VideoFrame {
            data,
            width: rgba_frame.width(),
            height: rgba_frame.height(),
            pts: frame.pts().map(Pts),
            time_base: self.time_base,
        })
    }
}

/**
    Copy RGBA rows out of a strided frame buffer into a tightly packed vec.
*/
fn pack_rows(data: &[u8], stride: usize, width: usize, height: usize) -> Vec<u8> {
    let row_bytes = width * 4;
    let mut packed = Vec::with_capacity(row_bytes * height);

    for y in 0..height {
        let start = y * stride;
        packed.extend_from_slice(&data[start..start + row_bytes]);
    }

    packed
}

impl std::fmt::Debug for VideoDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoDecoder")
            .field("time_base", &self.time_base)
            .finish_non_exhaustive()
    }
}

// SAFETY: VideoDecoder can be safely sent between threads because:
// - FFmpeg's codec and scaler contexts are not thread-safe for concurrent
//   access, but they CAN be safely moved between threads (single ownership
//   transfer)
// - After creation on the main thread, the decoder is moved to the demux
//   thread where it has exclusive ownership and is never accessed from
//   other threads
// - The Send trait only guarantees safe ownership transfer, not concurrent
//   access, which matches this usage pattern
unsafe impl Send for VideoDecoder {}
