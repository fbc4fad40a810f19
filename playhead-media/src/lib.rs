/*!
    FFmpeg-backed demuxing and decoding for the playhead player.

    This crate owns every FFmpeg touchpoint: opening inputs, reading packets,
    and turning packets back into PCM bytes and RGBA frames. Everything it
    hands out is an owned `playhead-core` value, so the rest of the player
    never sees an FFmpeg type.

    # Example

    ```ignore
    use playhead_media::{AudioDecoder, MediaSource, VideoDecoder};

    // Open a source and probe its streams
    let mut source = MediaSource::open("video.mp4")?;

    // Build decoders from the probed parameters
    let audio = AudioDecoder::new(source.audio_parameters().unwrap(), 48_000, 2)?;

    let video_info = source.video().unwrap().clone();
    let mut video = VideoDecoder::new(source.video_parameters().unwrap(), video_info.time_base)?;

    // Demux packets
    while let Some(packet) = source.next_packet() {
        if packet.is_video() {
            for frame in video.decode(&packet)? {
                // Process RGBA frame
            }
        }
    }

    // Flush remaining frames
    let remaining = video.flush()?;
    ```
*/

pub use playhead_core::{Error, Packet, Result, StreamType, VideoFrame};

mod audio;
mod source;
mod video;

pub use audio::AudioDecoder;
pub use source::{AudioStreamInfo, MediaSource, VideoStreamInfo};
pub use video::VideoDecoder;
