/*!
    Audio output device negotiation and stream management.

    The device rarely offers exactly the layout a media file was encoded
    with, so playback opens the output in two steps. [`AudioOutput::negotiate`]
    picks an f32 stream configuration as close to the source as the device
    allows, and the caller sizes its decoder for that configuration before
    [`AudioOutput::start`] moves the renderer onto the audio thread.
*/

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use playhead_core::{AudioRenderer, Error, Result};

/// Frames per hardware buffer, i.e. per render callback invocation.
const AUDIO_BUFFER_FRAMES: cpal::FrameCount = 1024;

/**
    An audio output device together with its negotiated stream configuration.

    Created by [`AudioOutput::negotiate`], consumed by [`AudioOutput::start`].
*/
pub struct AudioOutput {
    device: cpal::Device,
    config: cpal::StreamConfig,
}

impl AudioOutput {
    /**
        Opens the default output device and negotiates an f32 stream
        configuration for it.

        The preferred rate and channel count come from the media file.
        If the device supports them directly they are used as-is, otherwise
        playback falls back to the device's default configuration. Devices
        that cannot produce f32 samples at all are rejected.

        # Arguments

        * `preferred_rate` - Sample rate of the source audio, in Hz
        * `preferred_channels` - Channel count of the source audio
    */
    pub fn negotiate(preferred_rate: u32, preferred_channels: u16) -> Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| Error::device("no audio output device available"))?;

        let default = device
            .default_output_config()
            .map_err(|e| Error::device(format!("could not query audio device config: {e}")))?;

        let mut channels = preferred_channels.clamp(1, 2);
        let mut sample_rate = cpal::SampleRate(preferred_rate);

        if !is_config_supported(&device, channels, sample_rate) {
            if default.sample_format() != cpal::SampleFormat::F32 {
                return Err(Error::unsupported_format(format!(
                    "audio device offers {:?}, only f32 output is supported",
                    default.sample_format()
                )));
            }
            tracing::warn!(
                "device does not support {channels} ch at {} Hz, using device defaults",
                sample_rate.0
            );
            channels = default.channels().clamp(1, 2);
            sample_rate = default.sample_rate();
        }

        // Ask for the fixed buffer only when the device can grant it.
        let buffer_size = match default.buffer_size() {
            cpal::SupportedBufferSize::Range { min, max }
                if *min <= AUDIO_BUFFER_FRAMES && AUDIO_BUFFER_FRAMES <= *max =>
            {
                cpal::BufferSize::Fixed(AUDIO_BUFFER_FRAMES)
            }
            _ => cpal::BufferSize::Default,
        };

        let config = cpal::StreamConfig {
            channels,
            sample_rate,
            buffer_size,
        };

        tracing::debug!(
            "negotiated audio output: {} ch at {} Hz",
            config.channels,
            config.sample_rate.0
        );

        Ok(Self { device, config })
    }

    /**
        The negotiated output sample rate, in Hz.
    */
    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate.0
    }

    /**
        The negotiated output channel count.
    */
    pub fn channels(&self) -> u16 {
        self.config.channels
    }

    /**
        Builds the output stream and starts playback.

        The renderer moves onto the audio thread and is polled for samples
        from there until the returned [`AudioStream`] is dropped.
    */
    pub fn start(self, mut renderer: AudioRenderer) -> Result<AudioStream> {
        let stream = self
            .device
            .build_output_stream(
                &self.config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    renderer.fill(bytemuck::cast_slice_mut(data));
                },
                |err| tracing::error!("audio stream error: {err}"),
                None,
            )
            .map_err(|e| Error::device(format!("could not build audio stream: {e}")))?;

        stream
            .play()
            .map_err(|e| Error::device(format!("could not start audio stream: {e}")))?;

        Ok(AudioStream { _stream: stream })
    }
}

impl std::fmt::Debug for AudioOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioOutput")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/**
    Handle for a running audio output stream.

    Playback continues for as long as this value is kept alive and stops
    when it is dropped.
*/
pub struct AudioStream {
    // Dropping the stream tears down the audio thread.
    _stream: cpal::Stream,
}

impl std::fmt::Debug for AudioStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioStream").finish_non_exhaustive()
    }
}

fn is_config_supported(
    device: &cpal::Device,
    channels: u16,
    sample_rate: cpal::SampleRate,
) -> bool {
    let Ok(mut configs) = device.supported_output_configs() else {
        return false;
    };
    configs.any(|cfg| {
        cfg.channels() == channels
            && cfg.sample_format() == cpal::SampleFormat::F32
            && sample_rate >= cfg.min_sample_rate()
            && sample_rate <= cfg.max_sample_rate()
    })
}
