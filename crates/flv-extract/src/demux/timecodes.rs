use std::io::{self, Write};

use flv::tag::FlvTag;

pub const TIMECODE_HEADER: &str = "# timecode format v2";

/// Collects presentation timestamps of video frames and writes them as a
/// Matroska "timecode format v2" file: sorted, starting at zero, one
/// millisecond value per line.
pub struct TimecodeWriter<W: Write> {
    out: W,
    timestamps: Vec<i64>,
}

impl<W: Write> TimecodeWriter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            timestamps: Vec::new(),
        }
    }

    /// Records one frame. The presentation time is the decode time plus the
    /// composition offset.
    pub fn push(&mut self, tag: &FlvTag) {
        let composition_time = tag.video_header().map_or(0, |header| header.composition_time);
        self.timestamps
            .push(tag.timestamp_ms as i64 + composition_time as i64);
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn into_inner(mut self) -> io::Result<W> {
        self.timestamps.sort_unstable();
        let base = self.timestamps.first().copied().unwrap_or(0);

        writeln!(self.out, "{TIMECODE_HEADER}")?;
        for timestamp in &self.timestamps {
            writeln!(self.out, "{}", timestamp - base)?;
        }
        self.out.flush()?;
        Ok(self.out)
    }
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use super::*;
    use crate::test_utils::{avc_frame, video_tag};

    #[test]
    fn test_presentation_order() {
        let mut writer = TimecodeWriter::new(Vec::new());
        // I P B B with composition offsets, starting at 1000 ms
        for (dts, cts) in [(1000, 40), (1040, 120), (1080, 0), (1120, 0)] {
            let (tag, _) = video_tag(dts, &avc_frame(false, cts, &[&[0x41]]));
            writer.push(&tag);
        }
        assert_eq!(writer.len(), 4);

        let out = String::from_utf8(writer.into_inner().unwrap()).unwrap();
        assert_eq!(out, "# timecode format v2\n0\n40\n80\n120\n");
    }

    #[test]
    fn test_negative_composition_offset() {
        let mut writer = TimecodeWriter::new(Vec::new());
        for (dts, cts) in [(0, -20), (40, 0)] {
            let (tag, _) = video_tag(dts, &avc_frame(false, cts, &[&[0x41]]));
            writer.push(&tag);
        }
        let out = String::from_utf8(writer.into_inner().unwrap()).unwrap();
        assert_eq!(out, "# timecode format v2\n0\n60\n");
    }
}
