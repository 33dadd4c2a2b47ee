use crate::types::{RawSample, ScreenRotation};
use std::collections::VecDeque;
use thiserror::Error;

/// Longest accepted line in bytes, excluding the newline.
pub const MAX_LINE_LEN: usize = 256;

#[derive(Debug, Error, PartialEq)]
pub enum FeedError {
    #[error("line {line}: expected 3 or 4 fields, found {found}")]
    FieldCount { line: usize, found: usize },
    #[error("line {line}: invalid number {field:?}")]
    InvalidNumber { line: usize, field: String },
    #[error("line {line}: non-finite accelerometer value")]
    NonFinite { line: usize },
    #[error("line {line}: not valid UTF-8")]
    InvalidUtf8 { line: usize },
    #[error("line {line}: longer than {max} bytes")]
    LineTooLong { line: usize, max: usize },
}

/// Streaming parser for textual accelerometer samples.
///
/// One sample per line: `x y z [rotation_degrees]`, separated by whitespace
/// and/or commas. Blank lines and `#` comments are skipped. Feed raw bytes via
/// `push_data`, then drain parsed samples via `next_sample`. Lines longer than
/// [`MAX_LINE_LEN`] are reported once and dropped up to the next newline.
pub struct SampleFeed {
    buffer: VecDeque<u8>,
    default_rotation: ScreenRotation,
    line: usize,
    /// Leading bytes of `buffer` already known to hold no newline.
    scanned: usize,
    /// Dropping the rest of an over-long line.
    discarding: bool,
    finished: bool,
}

impl SampleFeed {
    pub fn new(default_rotation: ScreenRotation) -> Self {
        Self {
            buffer: VecDeque::with_capacity(1024),
            default_rotation,
            line: 0,
            scanned: 0,
            discarding: false,
            finished: false,
        }
    }

    /// Append received bytes to the internal buffer.
    pub fn push_data(&mut self, data: &[u8]) {
        self.buffer.extend(data);
    }

    /// Mark end of stream so a final unterminated line can be parsed.
    pub fn finish(&mut self) {
        self.finished = true;
    }

    /// Try to extract the next sample from the buffer.
    /// Returns `None` if no complete line is available yet.
    pub fn next_sample(&mut self) -> Option<Result<(RawSample, ScreenRotation), FeedError>> {
        loop {
            let raw_line = match self.take_line()? {
                Ok(raw_line) => raw_line,
                Err(e) => return Some(Err(e)),
            };
            self.line += 1;

            let text = match std::str::from_utf8(&raw_line) {
                Ok(text) => text.trim(),
                Err(_) => return Some(Err(FeedError::InvalidUtf8 { line: self.line })),
            };
            if text.is_empty() || text.starts_with('#') {
                continue;
            }

            return Some(parse_line(text, self.line, self.default_rotation));
        }
    }

    fn take_line(&mut self) -> Option<Result<Vec<u8>, FeedError>> {
        loop {
            let buf = self.buffer.make_contiguous();
            let newline = buf[self.scanned..]
                .iter()
                .position(|&b| b == b'\n')
                .map(|pos| self.scanned + pos);

            match newline {
                Some(pos) => {
                    let raw_line: Vec<u8> = self.buffer.drain(..=pos).collect();
                    self.scanned = 0;
                    if std::mem::take(&mut self.discarding) {
                        continue;
                    }
                    if pos > MAX_LINE_LEN {
                        return Some(Err(self.too_long()));
                    }
                    return Some(Ok(raw_line));
                }
                None if self.discarding => {
                    self.buffer.clear();
                    self.scanned = 0;
                    return None;
                }
                None if self.buffer.len() > MAX_LINE_LEN => {
                    self.buffer.clear();
                    self.scanned = 0;
                    self.discarding = !self.finished;
                    return Some(Err(self.too_long()));
                }
                None if self.finished && !self.buffer.is_empty() => {
                    self.scanned = 0;
                    return Some(Ok(self.buffer.drain(..).collect()));
                }
                None => {
                    self.scanned = self.buffer.len();
                    return None;
                }
            }
        }
    }

    fn too_long(&mut self) -> FeedError {
        self.line += 1;
        FeedError::LineTooLong {
            line: self.line,
            max: MAX_LINE_LEN,
        }
    }
}

fn parse_line(
    text: &str,
    line: usize,
    default_rotation: ScreenRotation,
) -> Result<(RawSample, ScreenRotation), FeedError> {
    let fields: Vec<&str> = text
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|f| !f.is_empty())
        .collect();

    if !(3..=4).contains(&fields.len()) {
        return Err(FeedError::FieldCount {
            line,
            found: fields.len(),
        });
    }

    let number = |field: &str| -> Result<f32, FeedError> {
        field.parse::<f32>().map_err(|_| FeedError::InvalidNumber {
            line,
            field: field.to_string(),
        })
    };

    let sample = RawSample::new(number(fields[0])?, number(fields[1])?, number(fields[2])?);
    if !sample.is_finite() {
        return Err(FeedError::NonFinite { line });
    }

    let rotation = match fields.get(3) {
        Some(field) => {
            let degrees = field.parse::<i32>().map_err(|_| FeedError::InvalidNumber {
                line,
                field: field.to_string(),
            })?;
            ScreenRotation::from_degrees(degrees)
        }
        None => default_rotation,
    };

    Ok((sample, rotation))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_single_line() {
        let mut feed = SampleFeed::new(ScreenRotation::Rotation0);
        feed.push_data(b"0.5 -1.25 9.8 90\n");

        let (sample, rotation) = feed.next_sample().unwrap().unwrap();
        assert!((sample.x - 0.5).abs() < 1e-6);
        assert!((sample.y + 1.25).abs() < 1e-6);
        assert!((sample.z - 9.8).abs() < 1e-6);
        assert_eq!(rotation, ScreenRotation::Rotation90);

        assert!(feed.next_sample().is_none());
    }

    #[test]
    fn parse_fragmented_data() {
        let data = b"1.0, 2.0, 3.0\n";
        let mid = data.len() / 2;
        let mut feed = SampleFeed::new(ScreenRotation::Rotation270);

        // First half has no newline yet.
        feed.push_data(&data[..mid]);
        assert!(feed.next_sample().is_none());

        feed.push_data(&data[mid..]);
        let (sample, rotation) = feed.next_sample().unwrap().unwrap();
        assert_eq!(sample, RawSample::new(1.0, 2.0, 3.0));
        assert_eq!(rotation, ScreenRotation::Rotation270);
    }

    #[test]
    fn skips_comments_and_blank_lines() {
        let mut feed = SampleFeed::new(ScreenRotation::Rotation0);
        feed.push_data(b"# x y z rot\n\n   \n0 0 9.8\r\n");
        let (sample, _) = feed.next_sample().unwrap().unwrap();
        assert_eq!(sample, RawSample::new(0.0, 0.0, 9.8));
        assert!(feed.next_sample().is_none());
    }

    #[test]
    fn bad_lines_are_reported_and_skipped() {
        let mut feed = SampleFeed::new(ScreenRotation::Rotation0);
        feed.push_data(b"1 2\n1 two 3\n1 2 inf\n1 2 3 ninety\n4 5 6\n");

        assert_eq!(
            feed.next_sample().unwrap(),
            Err(FeedError::FieldCount { line: 1, found: 2 })
        );
        assert_eq!(
            feed.next_sample().unwrap(),
            Err(FeedError::InvalidNumber {
                line: 2,
                field: "two".into()
            })
        );
        assert_eq!(feed.next_sample().unwrap(), Err(FeedError::NonFinite { line: 3 }));
        assert!(matches!(
            feed.next_sample().unwrap(),
            Err(FeedError::InvalidNumber { line: 4, .. })
        ));
        let (sample, _) = feed.next_sample().unwrap().unwrap();
        assert_eq!(sample, RawSample::new(4.0, 5.0, 6.0));
    }

    #[test]
    fn unknown_rotation_degrades_to_natural() {
        let mut feed = SampleFeed::new(ScreenRotation::Rotation180);
        feed.push_data(b"0 0 9.8 45\n");
        let (_, rotation) = feed.next_sample().unwrap().unwrap();
        assert_eq!(rotation, ScreenRotation::Rotation0);
    }

    #[test]
    fn trailing_line_needs_finish() {
        let mut feed = SampleFeed::new(ScreenRotation::Rotation0);
        feed.push_data(b"1 2 3\n4 5 6");

        assert!(feed.next_sample().unwrap().is_ok());
        assert!(feed.next_sample().is_none());

        feed.finish();
        let (sample, _) = feed.next_sample().unwrap().unwrap();
        assert_eq!(sample, RawSample::new(4.0, 5.0, 6.0));
        assert!(feed.next_sample().is_none());
    }

    #[test]
    fn invalid_utf8_is_reported_and_skipped() {
        let mut feed = SampleFeed::new(ScreenRotation::Rotation0);
        feed.push_data(b"\xff 1 2\n0 0 9.8\n");

        assert_eq!(feed.next_sample().unwrap(), Err(FeedError::InvalidUtf8 { line: 1 }));
        let (sample, _) = feed.next_sample().unwrap().unwrap();
        assert_eq!(sample, RawSample::new(0.0, 0.0, 9.8));
        assert!(feed.next_sample().is_none());
    }

    #[test]
    fn endless_line_is_capped_and_dropped() {
        let mut feed = SampleFeed::new(ScreenRotation::Rotation0);
        let chunk = [b'1'; 100];

        // Nothing to report until the line outgrows the limit.
        feed.push_data(&chunk);
        assert!(feed.next_sample().is_none());
        feed.push_data(&chunk);
        assert!(feed.next_sample().is_none());
        feed.push_data(&chunk);
        assert_eq!(
            feed.next_sample().unwrap(),
            Err(FeedError::LineTooLong {
                line: 1,
                max: MAX_LINE_LEN
            })
        );

        // The rest of the line is dropped without growing the buffer.
        for _ in 0..50 {
            feed.push_data(&chunk);
            assert!(feed.next_sample().is_none());
            assert!(feed.buffer.len() <= chunk.len());
        }

        feed.push_data(b"1 2 3\n4 5 6\n");
        let (sample, _) = feed.next_sample().unwrap().unwrap();
        assert_eq!(sample, RawSample::new(4.0, 5.0, 6.0));
        assert!(feed.next_sample().is_none());
    }

    #[test]
    fn long_complete_line_is_rejected() {
        let mut feed = SampleFeed::new(ScreenRotation::Rotation0);
        let mut data = vec![b' '; MAX_LINE_LEN + 10];
        data.extend_from_slice(b"0 0 9.8\n1 2 3\n");
        feed.push_data(&data);

        assert!(matches!(
            feed.next_sample().unwrap(),
            Err(FeedError::LineTooLong { line: 1, .. })
        ));
        let (sample, _) = feed.next_sample().unwrap().unwrap();
        assert_eq!(sample, RawSample::new(1.0, 2.0, 3.0));
    }
}
