/*!
    Encoded packet type.
*/

use crate::{Pts, Rational};

/**
    Type of media stream.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StreamType {
    /// Video stream
    Video,
    /// Audio stream
    Audio,
}

/**
    An encoded media packet.

    Holds a compressed data payload from a single stream plus timing
    information. The payload is owned: constructing a `Packet` from the
    demuxer's transient buffer is the deep copy, so the demuxer's buffer can
    be reused immediately and the packet can cross thread boundaries freely.
*/
#[derive(Clone, Debug)]
pub struct Packet {
    /// Compressed data payload.
    pub data: Vec<u8>,
    /// Type of stream this packet belongs to.
    pub stream_type: StreamType,
    /// Presentation timestamp (when to display/play).
    pub pts: Option<Pts>,
    /// Decode timestamp (may differ from PTS for B-frames).
    pub dts: Option<Pts>,
    /// Time base for interpreting the timestamps.
    pub time_base: Rational,
    /// Whether this packet starts a keyframe.
    pub is_keyframe: bool,
}

impl Packet {
    /**
        Create a new packet owning the given payload.
    */
    pub fn new(
        data: Vec<u8>,
        stream_type: StreamType,
        pts: Option<Pts>,
        dts: Option<Pts>,
        time_base: Rational,
        is_keyframe: bool,
    ) -> Self {
        Self {
            data,
            stream_type,
            pts,
            dts,
            time_base,
            is_keyframe,
        }
    }

    /**
        Returns the payload size in bytes.

        This is the quantity the packet queue accounts for in its
        cumulative byte size.
    */
    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }

    /**
        Returns the presentation time as a Duration, if PTS is set.
    */
    pub fn presentation_time(&self) -> Option<std::time::Duration> {
        self.pts.map(|pts| pts.to_duration(self.time_base))
    }

    /**
        Returns true if this packet contains video data.
    */
    pub fn is_video(&self) -> bool {
        self.stream_type == StreamType::Video
    }

    /**
        Returns true if this packet contains audio data.
    */
    pub fn is_audio(&self) -> bool {
        self.stream_type == StreamType::Audio
    }
}

// Packets cross the demux/audio thread boundary
static_assertions::assert_impl_all!(Packet: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    const TB_MILLIS: Rational = Rational { num: 1, den: 1000 };

    #[test]
    fn packet_owns_payload() {
        let packet = Packet::new(
            vec![7u8; 256],
            StreamType::Audio,
            Some(Pts(40)),
            Some(Pts(40)),
            TB_MILLIS,
            false,
        );

        assert_eq!(packet.size_bytes(), 256);
        assert!(packet.is_audio());
        assert!(!packet.is_video());
    }

    #[test]
    fn packet_presentation_time() {
        let packet = Packet::new(
            vec![],
            StreamType::Video,
            Some(Pts(750)),
            None,
            TB_MILLIS,
            true,
        );

        assert_eq!(packet.presentation_time(), Some(Duration::from_millis(750)));
        assert!(packet.is_keyframe);
    }

    #[test]
    fn packet_without_pts() {
        let packet = Packet::new(vec![1, 2, 3], StreamType::Audio, None, None, TB_MILLIS, false);

        assert_eq!(packet.presentation_time(), None);
        assert_eq!(packet.size_bytes(), 3);
    }
}
