//! Example payloads carried by SIO blocks.
//!
//! The codec is agnostic to what blocks contain; these types show the three
//! ways a payload can be connected. [`RunHeader`] relies on the structural
//! (serde) encoding, [`Points2D`] ships its own versioned [`Block`] codec.

use serde::{Deserialize, Serialize};
use sio_core::{BinaryCodec, Block};

/// Per-event header of a physics record.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunHeader {
    /// Run number.
    pub run_nbr: i64,
    /// Event number.
    pub evt_nbr: i64,
    /// Trigger word.
    pub trigger: i64,
}

impl RunHeader {
    pub fn new(run_nbr: i64, evt_nbr: i64, trigger: i64) -> Self {
        Self {
            run_nbr,
            evt_nbr,
            trigger,
        }
    }
}

/// A 2-D point with asymmetric errors on both axes.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
    pub xerr_low: f64,
    pub xerr_high: f64,
    pub yerr_low: f64,
    pub yerr_high: f64,
}

impl Point2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            ..Default::default()
        }
    }

    pub fn with_errors(mut self, xerr: (f64, f64), yerr: (f64, f64)) -> Self {
        (self.xerr_low, self.xerr_high) = xerr;
        (self.yerr_low, self.yerr_high) = yerr;
        self
    }

    fn fields(&self) -> [f64; 6] {
        [
            self.x,
            self.y,
            self.xerr_low,
            self.xerr_high,
            self.yerr_low,
            self.yerr_high,
        ]
    }
}

/// Bytes per encoded point: six `f64`.
const POINT_SIZE: usize = 6 * 8;

/// A set of 2-D points with errors, e.g. the data behind a scatter plot.
///
/// # Layout (version 1)
/// ```text
/// [count:u32][point 0: 6 × f64] ... [point count-1]
/// ```
/// Big-endian throughout.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Points2D {
    pub points: Vec<Point2D>,
}

impl Points2D {
    pub const VERSION: u32 = 1;

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

impl FromIterator<Point2D> for Points2D {
    fn from_iter<I: IntoIterator<Item = Point2D>>(iter: I) -> Self {
        Self {
            points: iter.into_iter().collect(),
        }
    }
}

impl BinaryCodec for Points2D {
    fn marshal_binary(&self, buf: &mut Vec<u8>) -> anyhow::Result<()> {
        let count = u32::try_from(self.points.len())?;
        buf.reserve(4 + self.points.len() * POINT_SIZE);
        buf.extend_from_slice(&count.to_be_bytes());
        for p in &self.points {
            for v in p.fields() {
                buf.extend_from_slice(&v.to_be_bytes());
            }
        }
        Ok(())
    }

    fn unmarshal_binary(&mut self, buf: &mut &[u8]) -> anyhow::Result<()> {
        if buf.len() < 4 {
            anyhow::bail!("points payload needs a 4-byte count, have {} bytes", buf.len());
        }
        let count = u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]) as usize;
        let need = count
            .checked_mul(POINT_SIZE)
            .ok_or_else(|| anyhow::anyhow!("point count {} overflows", count))?;
        let body = &buf[4..];
        if body.len() < need {
            anyhow::bail!(
                "{} points need {} bytes, have {}",
                count,
                need,
                body.len()
            );
        }

        self.points = body[..need]
            .chunks_exact(POINT_SIZE)
            .map(|chunk| {
                let mut v = [0f64; 6];
                for (dst, raw) in v.iter_mut().zip(chunk.chunks_exact(8)) {
                    let mut b = [0u8; 8];
                    b.copy_from_slice(raw);
                    *dst = f64::from_be_bytes(b);
                }
                Point2D {
                    x: v[0],
                    y: v[1],
                    xerr_low: v[2],
                    xerr_high: v[3],
                    yerr_low: v[4],
                    yerr_high: v[5],
                }
            })
            .collect();
        *buf = &buf[4 + need..];
        Ok(())
    }
}

impl Block for Points2D {
    fn version(&self) -> u32 {
        Self::VERSION
    }
}
