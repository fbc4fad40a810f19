/*!
    Playback primitives for the playhead player.

    This crate holds the concurrency core and the vocabulary types that cross
    thread boundaries. It has no dependency on FFmpeg or on any audio backend,
    so each half of the player can be tested against it in isolation.

    # Packet Transport

    - [`Packet`] - Encoded packet data with timing metadata
    - [`PacketQueue`] - Thread-safe FIFO between demuxer and decoder
    - [`PopResult`] - Outcome of a queue pop

    # Decoding

    - [`PcmDecode`] - Trait for packet-to-PCM decoders
    - [`PcmReader`] - Pulls packets and drives a decoder to completion
    - [`VideoFrame`] - Decoded RGBA frame data

    # Rendering

    - [`AudioRenderer`] - Residual-buffered state behind the output callback

    # Shutdown

    - [`StopToken`] - Cooperative stop flag with waiter broadcast
    - [`StopWaiter`] - Trait for blocking primitives woken on stop

    # Error Handling

    - [`Error`] and [`Result`] - Common error types
*/

mod error;
mod frame;
mod packet;
mod pcm;
mod queue;
mod render;
mod stop;
mod time;

pub use error::{Error, Result};
pub use frame::VideoFrame;
pub use packet::{Packet, StreamType};
pub use pcm::{PcmDecode, PcmReader};
pub use queue::{PacketQueue, PopResult};
pub use render::{AudioRenderer, MAX_AUDIO_FRAME_BYTES};
pub use stop::{StopToken, StopWaiter};
pub use time::{Pts, Rational};
