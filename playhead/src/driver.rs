/*!
    The demux and decode driver loop.

    A single thread pulls packets from the media source and routes them by
    stream type. Audio packets go onto the shared packet queue for the audio
    callback to drain, video packets are decoded inline and their frames
    accounted for. The loop ends when the source runs dry or the stop token
    fires, whichever comes first.
*/

use std::{sync::Arc, thread, time::Duration};

use playhead_core::{PacketQueue, StopToken, StreamType, VideoFrame};
use playhead_media::{MediaSource, VideoDecoder};

/// Demuxing pauses while the audio queue holds at least this many bytes.
const MAX_AUDIO_QUEUE_BYTES: usize = 5 * 16 * 1024;

/// How long to wait before re-checking a full audio queue.
const QUEUE_FULL_BACKOFF: Duration = Duration::from_millis(10);

/**
    Counters describing what a finished driver run processed.
*/
#[derive(Debug, Default, Clone, Copy)]
pub struct DemuxSummary {
    /// Audio packets routed to the packet queue
    pub audio_packets: u64,
    /// Video packets fed to the video decoder
    pub video_packets: u64,
    /// Video frames produced by decoding
    pub video_frames: u64,
    /// Presentation time of the most recent video frame, in seconds
    pub last_video_pts: Option<f64>,
}

/**
    Runs the demux loop until end of stream or until `stop` fires.

    Returns counters for the packets and frames processed. Reaching end of
    stream is not a shutdown condition, so a finished run leaves `stop`
    untouched and audio keeps draining whatever the queue still holds.
*/
pub fn run(
    mut source: MediaSource,
    audio_queue: Option<Arc<PacketQueue>>,
    mut video_decoder: Option<VideoDecoder>,
    stop: Arc<StopToken>,
) -> DemuxSummary {
    let mut summary = DemuxSummary::default();

    while !stop.is_stopped() {
        if let Some(queue) = &audio_queue {
            if queue.size_bytes() >= MAX_AUDIO_QUEUE_BYTES {
                thread::sleep(QUEUE_FULL_BACKOFF);
                continue;
            }
        }

        let Some(packet) = source.next_packet() else {
            break;
        };

        match packet.stream_type {
            StreamType::Audio => {
                summary.audio_packets += 1;
                if let Some(queue) = &audio_queue {
                    if !queue.push(packet) {
                        tracing::debug!("dropped audio packet pushed after stop");
                    }
                }
            }
            StreamType::Video => {
                summary.video_packets += 1;
                if let Some(decoder) = &mut video_decoder {
                    match decoder.decode(&packet) {
                        Ok(frames) => present_frames(&frames, &mut summary),
                        Err(err) => {
                            tracing::warn!("dropping undecodable video packet: {err}");
                        }
                    }
                }
            }
        }
    }

    if !stop.is_stopped() {
        if let Some(decoder) = &mut video_decoder {
            match decoder.flush() {
                Ok(frames) => present_frames(&frames, &mut summary),
                Err(err) => tracing::warn!("video decoder flush failed: {err}"),
            }
        }
        tracing::info!(
            "end of stream after {} audio and {} video packets",
            summary.audio_packets,
            summary.video_packets
        );
    }

    summary
}

fn present_frames(frames: &[VideoFrame], summary: &mut DemuxSummary) {
    for frame in frames {
        summary.video_frames += 1;
        if let Some(seconds) = frame.presentation_time() {
            summary.last_video_pts = Some(seconds);
        }
        if summary.video_frames == 1 {
            tracing::info!("first video frame: {}x{}", frame.width, frame.height);
        }
        tracing::debug!(
            "video frame {} at {:.3}s ({} bytes)",
            summary.video_frames,
            summary.last_video_pts.unwrap_or(0.0),
            frame.size_bytes()
        );
    }
}
