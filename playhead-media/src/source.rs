/*!
    Media input and demuxing.
*/

use ffmpeg_next::{codec, ffi, format, media};

use playhead_core::{Error, Packet, Pts, Rational, Result, StreamType};

/**
    Metadata for the audio stream of an opened input.
*/
#[derive(Debug, Clone)]
pub struct AudioStreamInfo {
    pub index: usize,
    pub time_base: Rational,
    pub sample_rate: u32,
    pub channels: u16,
    pub codec: String,
}

/**
    Metadata for the video stream of an opened input.
*/
#[derive(Debug, Clone)]
pub struct VideoStreamInfo {
    pub index: usize,
    pub time_base: Rational,
    pub width: u32,
    pub height: u32,
    pub codec: String,
}

/**
    An opened media input.

    Wraps the demuxer: picks the best audio and video streams at open time
    and hands out their packets one at a time as owned [`Packet`] values,
    so downstream consumers never borrow from the demuxer.
*/
pub struct MediaSource {
    input: format::context::Input,
    audio: Option<AudioStreamInfo>,
    video: Option<VideoStreamInfo>,
}

impl MediaSource {
    /**
        Open a media file or URL and probe its streams.

        Fails if the input cannot be opened, if a selected stream's codec
        cannot be initialized, or if the input carries neither an audio nor
        a video stream.
    */
    pub fn open(path: &str) -> Result<Self> {
        ffmpeg_next::init().map_err(|e| Error::open(e.to_string()))?;

        let input = format::input(&path).map_err(|e| Error::open(format!("{path}: {e}")))?;

        let audio = match input.streams().best(media::Type::Audio) {
            Some(stream) => Some(probe_audio(&stream)?),
            None => None,
        };
        let video = match input.streams().best(media::Type::Video) {
            Some(stream) => Some(probe_video(&stream)?),
            None => None,
        };

        if audio.is_none() && video.is_none() {
            return Err(Error::no_stream(format!(
                "{path} has neither an audio nor a video stream"
            )));
        }

        tracing::debug!(
            "opened {path}: audio={:?} video={:?}",
            audio.as_ref().map(|a| a.index),
            video.as_ref().map(|v| v.index),
        );

        Ok(Self {
            input,
            audio,
            video,
        })
    }

    /**
        Metadata for the selected audio stream, if any.
    */
    pub fn audio(&self) -> Option<&AudioStreamInfo> {
        self.audio.as_ref()
    }

    /**
        Metadata for the selected video stream, if any.
    */
    pub fn video(&self) -> Option<&VideoStreamInfo> {
        self.video.as_ref()
    }

    /**
        Codec parameters of the audio stream, for constructing a decoder.
    */
    pub fn audio_parameters(&self) -> Option<codec::Parameters> {
        let index = self.audio.as_ref()?.index;
        self.input.stream(index).map(|stream| stream.parameters())
    }

    /**
        Codec parameters of the video stream, for constructing a decoder.
    */
    pub fn video_parameters(&self) -> Option<codec::Parameters> {
        let index = self.video.as_ref()?.index;
        self.input.stream(index).map(|stream| stream.parameters())
    }

    /**
        Total duration in seconds, when the container reports one.
    */
    pub fn duration_seconds(&self) -> Option<f64> {
        let duration = self.input.duration();
        if duration > 0 {
            Some(duration as f64 / f64::from(ffi::AV_TIME_BASE))
        } else {
            None
        }
    }

    /**
        Read the next packet belonging to a selected stream.

        Packets from other streams (subtitles, data tracks) are skipped.
        The payload is copied out of the demuxer's buffer, so the returned
        packet is free to outlive any internal reuse of that buffer.

        Returns `None` at end of stream.
    */
    pub fn next_packet(&mut self) -> Option<Packet> {
        let audio_index = self.audio.as_ref().map(|info| info.index);
        let video_index = self.video.as_ref().map(|info| info.index);

        for (stream, packet) in self.input.packets() {
            let (stream_type, time_base) = if Some(stream.index()) == audio_index {
                (StreamType::Audio, stream_time_base(&stream))
            } else if Some(stream.index()) == video_index {
                (StreamType::Video, stream_time_base(&stream))
            } else {
                continue;
            };

            let Some(data) = packet.data() else {
                continue;
            };

            return Some(Packet::new(
                data.to_vec(),
                stream_type,
                packet.pts().map(Pts),
                packet.dts().map(Pts),
                time_base,
                packet.is_key(),
            ));
        }

        None
    }
}

fn probe_audio(stream: &format::stream::Stream<'_>) -> Result<AudioStreamInfo> {
    let decoder = codec::context::Context::from_parameters(stream.parameters())
        .map_err(|e| Error::codec(e.to_string()))?
        .decoder()
        .audio()
        .map_err(|e| Error::codec(e.to_string()))?;

    Ok(AudioStreamInfo {
        index: stream.index(),
        time_base: stream_time_base(stream),
        sample_rate: decoder.rate(),
        channels: decoder.channels() as u16,
        codec: decoder
            .codec()
            .map(|c| c.name().to_string())
            .unwrap_or_else(|| "unknown".to_string()),
    })
}

fn probe_video(stream: &format::stream::Stream<'_>) -> Result<VideoStreamInfo> {
    let decoder = codec::context::Context::from_parameters(stream.parameters())
        .map_err(|e| Error::codec(e.to_string()))?
        .decoder()
        .video()
        .map_err(|e| Error::codec(e.to_string()))?;

    Ok(VideoStreamInfo {
        index: stream.index(),
        time_base: stream_time_base(stream),
        width: decoder.width(),
        height: decoder.height(),
        codec: decoder
            .codec()
            .map(|c| c.name().to_string())
            .unwrap_or_else(|| "unknown".to_string()),
    })
}

fn stream_time_base(stream: &format::stream::Stream<'_>) -> Rational {
    let time_base = stream.time_base();
    // Broken containers report 0/0; fall back to milliseconds.
    if time_base.1 == 0 {
        return Rational::new(1, 1000);
    }
    Rational::new(time_base.0, time_base.1)
}

// SAFETY: MediaSource can be safely sent between threads because:
// - FFmpeg's Input context is not thread-safe for concurrent access, but it
//   CAN be safely moved between threads (single ownership transfer)
// - After probing on the main thread, the source is moved to the demux thread
//   where it has exclusive ownership and is never accessed from other threads
// - The Send trait only guarantees safe ownership transfer, not concurrent
//   access, which matches this usage pattern
unsafe impl Send for MediaSource {}
