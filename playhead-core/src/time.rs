/*!
    Time base and timestamp vocabulary.
*/

use std::fmt;
use std::time::Duration;

/**
    A stream time base as a numerator/denominator pair.

    Container timestamps are integers counted in units of the stream's
    time base, e.g. 1/90000 for MPEG-TS or 1/48000 for 48kHz audio.
*/
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rational {
    pub num: i32,
    pub den: i32,
}

impl Rational {
    /**
        Create a new rational number.

        # Panics

        Panics if `den` is zero.
    */
    #[inline]
    pub const fn new(num: i32, den: i32) -> Self {
        assert!(den != 0, "denominator cannot be zero");
        Self { num, den }
    }

    /**
        Convert to f64.
    */
    #[inline]
    pub fn to_f64(self) -> f64 {
        self.num as f64 / self.den as f64
    }
}

impl fmt::Debug for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.num, self.den)
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.num, self.den)
    }
}

impl From<(i32, i32)> for Rational {
    fn from((num, den): (i32, i32)) -> Self {
        Self::new(num, den)
    }
}

/**
    Presentation timestamp in time_base units.

    This is the raw timestamp value from the media stream; combine it with
    the stream's time base to obtain a wall-clock offset.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Pts(pub i64);

impl Pts {
    /**
        Convert this PTS to a Duration using the given time base.

        Negative PTS values are clamped to zero.
    */
    #[inline]
    pub fn to_duration(self, time_base: Rational) -> Duration {
        if self.0 <= 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.0 as f64 * time_base.to_f64())
    }
}

impl From<i64> for Pts {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<Pts> for i64 {
    fn from(pts: Pts) -> Self {
        pts.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TB_MPEG_TS: Rational = Rational { num: 1, den: 90000 };
    const TB_MILLIS: Rational = Rational { num: 1, den: 1000 };

    #[test]
    fn rational_to_f64() {
        assert_eq!(Rational::new(1, 4).to_f64(), 0.25);
        assert_eq!(Rational::new(1, 90000).to_f64(), 1.0 / 90000.0);
    }

    #[test]
    #[should_panic(expected = "denominator cannot be zero")]
    fn rational_zero_denominator_panics() {
        Rational::new(5, 0);
    }

    #[test]
    fn rational_from_tuple() {
        let tb: Rational = (1, 48000).into();
        assert_eq!(tb.num, 1);
        assert_eq!(tb.den, 48000);
    }

    #[test]
    fn rational_display() {
        assert_eq!(format!("{}", Rational::new(1001, 30000)), "1001/30000");
    }

    #[test]
    fn pts_to_duration() {
        assert_eq!(
            Pts(45000).to_duration(TB_MPEG_TS),
            Duration::from_millis(500)
        );
        assert_eq!(Pts(2500).to_duration(TB_MILLIS), Duration::from_millis(2500));
    }

    #[test]
    fn pts_zero_and_negative_clamp() {
        assert_eq!(Pts(0).to_duration(TB_MILLIS), Duration::ZERO);
        assert_eq!(Pts(-42).to_duration(TB_MILLIS), Duration::ZERO);
    }

    #[test]
    fn pts_ordering() {
        assert!(Pts(10) < Pts(20));
        assert_eq!(Pts(7), Pts(7));
    }

    #[test]
    fn pts_i64_round_trip() {
        let pts: Pts = 1234i64.into();
        assert_eq!(i64::from(pts), 1234);
    }
}
