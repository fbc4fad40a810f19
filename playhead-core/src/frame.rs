/*!
    Decoded video frame in a fixed interchange format.
*/

use crate::time::{Pts, Rational};

/**
    A single decoded video frame as tightly packed RGBA pixels.

    `data` holds exactly `width * height * 4` bytes with no row padding,
    regardless of the stride the decoder produced internally.
*/
#[derive(Debug, Clone)]
pub struct VideoFrame {
    /// Tightly packed RGBA bytes, row-major.
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// Presentation timestamp in `time_base` units, if the stream carried one.
    pub pts: Option<Pts>,
    pub time_base: Rational,
}

impl VideoFrame {
    /**
        Total pixel payload size in bytes.
    */
    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }

    /**
        Presentation time in seconds, derived from `pts` and `time_base`.
    */
    pub fn presentation_time(&self) -> Option<f64> {
        self.pts.map(|pts| pts.0 as f64 * self.time_base.to_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TB: Rational = Rational { num: 1, den: 25 };

    #[test]
    fn presentation_time_uses_time_base() {
        let frame = VideoFrame {
            data: vec![0; 16],
            width: 2,
            height: 2,
            pts: Some(Pts(50)),
            time_base: TB,
        };
        assert_eq!(frame.presentation_time(), Some(2.0));
        assert_eq!(frame.size_bytes(), 16);
    }

    #[test]
    fn missing_pts_has_no_presentation_time() {
        let frame = VideoFrame {
            data: vec![0; 4],
            width: 1,
            height: 1,
            pts: None,
            time_base: TB,
        };
        assert_eq!(frame.presentation_time(), None);
    }
}
