//! The reader consumes the source in chunks and never holds more than one token in memory besides
//! the pixel buffer. A token is a maximal run of bytes that are neither ASCII whitespace nor `#`.
use std::io::BufRead;
use std::io::BufReader;
use std::io::Read;

use crate::PgmError;
use crate::PgmImage;
use crate::FORMAT_CODE;
use crate::MAX_VALUE_LIMIT;

/// Parse a plain PGM image from `source`.
///
/// The whole source has to be consumed: content other than whitespace and comments after the last
/// intensity is rejected, as is an intensity larger than the declared maximal value.
///
/// # Example
/// ```
/// let source = "P2\n# a comment\n3 1\n10\n0 5 10\n";
/// let image = pgm_format::decode(source.as_bytes()).expect("valid image");
///
/// assert_eq!(3, image.width);
/// assert_eq!(1, image.height);
/// assert_eq!(10, image.max_value);
/// assert_eq!(vec![0, 5, 10], image.pixels);
/// ```
pub fn decode(source: impl Read) -> Result<PgmImage, PgmError> {
    let mut reader = BufReader::new(source);
    let mut parser = PgmParser::default();

    loop {
        let num_bytes = {
            let data = reader.fill_buf()?;

            if data.is_empty() {
                return parser.complete();
            }

            parser.parse_chunk(data)?;
            data.len()
        };

        reader.consume(num_bytes);
    }
}

#[derive(Debug, Default)]
enum ParseState {
    #[default]
    Separator,
    Token,
    Comment,
}

#[derive(Debug, Default)]
struct PgmParser {
    state: ParseState,
    buffer: String,
    has_format_tag: bool,
    width: Option<usize>,
    height: Option<usize>,
    max_value: Option<u32>,
    pixels: Vec<u32>,
}

impl PgmParser {
    /// Parse the next chunk of bytes. A chunk may start or end in the middle of a token or a
    /// comment.
    fn parse_chunk(&mut self, chunk: &[u8]) -> Result<(), PgmError> {
        for &byte in chunk {
            match self.state {
                ParseState::Separator => match byte {
                    b if b.is_ascii_whitespace() => {}

                    b'#' => self.state = ParseState::Comment,

                    b => {
                        self.buffer.clear();
                        self.buffer.push(b as char);
                        self.state = ParseState::Token;
                    }
                },

                ParseState::Token => match byte {
                    b if b.is_ascii_whitespace() => {
                        self.finish_token()?;
                        self.state = ParseState::Separator;
                    }

                    b'#' => {
                        self.finish_token()?;
                        self.state = ParseState::Comment;
                    }

                    b => self.buffer.push(b as char),
                },

                ParseState::Comment => {
                    if byte == b'\n' {
                        self.state = ParseState::Separator;
                    }
                }
            }
        }

        Ok(())
    }

    fn finish_token(&mut self) -> Result<(), PgmError> {
        if !self.has_format_tag {
            if self.buffer != FORMAT_CODE {
                return Err(PgmError::InvalidFormatTag {
                    expected: FORMAT_CODE,
                    found: self.buffer.clone(),
                });
            }
            self.has_format_tag = true;
            return Ok(());
        }

        let Some(width) = self.width else {
            self.width = Some(self.parse_number("width")?);
            return Ok(());
        };

        let Some(height) = self.height else {
            self.height = Some(self.parse_number("height")?);
            return Ok(());
        };

        let Some(max_value) = self.max_value else {
            let max_value = self.parse_number("maximal value")?;
            if max_value > MAX_VALUE_LIMIT {
                return Err(PgmError::MaxValueTooLarge {
                    max_value,
                    limit: MAX_VALUE_LIMIT,
                });
            }

            // Nothing is reserved up front; the pixel buffer only grows with the values read.
            if width.checked_mul(height).is_none() {
                return Err(PgmError::DimensionsTooLarge { width, height });
            }
            self.max_value = Some(max_value);
            return Ok(());
        };

        if self.pixels.len() == width * height {
            return Err(PgmError::TrailingData(self.buffer.clone()));
        }

        let value = self.parse_number("pixel value")?;
        if value > max_value {
            return Err(PgmError::ValueTooLarge {
                value,
                position: self.pixels.len(),
                max_value,
            });
        }
        self.pixels.push(value);

        Ok(())
    }

    fn parse_number<Num: std::str::FromStr>(&self, field: &'static str) -> Result<Num, PgmError> {
        self.buffer
            .parse::<Num>()
            .map_err(|_| PgmError::InvalidNumber {
                field,
                token: self.buffer.clone(),
            })
    }

    fn complete(mut self) -> Result<PgmImage, PgmError> {
        if matches!(self.state, ParseState::Token) {
            self.finish_token()?;
        }

        if !self.has_format_tag {
            return Err(PgmError::IncompleteHeader("format tag"));
        }
        let width = self.width.ok_or(PgmError::IncompleteHeader("width"))?;
        let height = self.height.ok_or(PgmError::IncompleteHeader("height"))?;
        let max_value = self
            .max_value
            .ok_or(PgmError::IncompleteHeader("maximal value"))?;

        if self.pixels.len() != width * height {
            return Err(PgmError::TooFewValues {
                expected: width * height,
                parsed: self.pixels.len(),
            });
        }

        Ok(PgmImage::new(width, height, max_value, self.pixels))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_image_is_read() {
        let image = decode_source("P2\n3 2\n2\n0 1 2\n2 0 1\n");

        assert_eq!(PgmImage::new(3, 2, 2, vec![0, 1, 2, 2, 0, 1]), image);
    }

    #[test]
    fn indented_image_is_read() {
        let source = r#"
            P2
            3 2
            256
            0   127 256
            256 127 0
        "#;
        let image = decode_source(source);

        assert_eq!(PgmImage::new(3, 2, 256, vec![0, 127, 256, 256, 127, 0]), image);
    }

    #[test]
    fn comments_are_ignored() {
        let source = "# leading\nP2 # tag\n3 1 # size\n#only comment\n10\n4 5#glued\n10\n# trailing";
        let image = decode_source(source);

        assert_eq!(PgmImage::new(3, 1, 10, vec![4, 5, 10]), image);
    }

    #[test]
    fn values_may_span_lines_arbitrarily() {
        let image = decode_source("P2 2 2 9 1\n2 3\n\n4");

        assert_eq!(vec![1, 2, 3, 4], image.pixels);
    }

    #[test]
    fn chunk_boundaries_do_not_split_tokens() {
        let mut parser = PgmParser::default();
        parser.parse_chunk(b"P2 2 1 1").expect("valid chunk");
        parser.parse_chunk(b"00 12").expect("valid chunk");
        parser.parse_chunk(b"3 7").expect("valid chunk");
        let image = parser.complete().expect("valid image");

        assert_eq!(100, image.max_value);
        assert_eq!(vec![123, 7], image.pixels);
    }

    #[test]
    fn wrong_format_tag_is_rejected() {
        let err = get_decode_error("P5\n1 1\n1\n0\n");

        assert!(matches!(err, PgmError::InvalidFormatTag { found, .. } if found == "P5"));
    }

    #[test]
    fn non_numeric_value_is_rejected() {
        let err = get_decode_error("P2\n2 1\n5\n1 x\n");

        assert!(matches!(err, PgmError::InvalidNumber { field: "pixel value", .. }));
    }

    #[test]
    fn negative_value_is_rejected() {
        let err = get_decode_error("P2\n2 1\n5\n1 -1\n");

        assert!(matches!(err, PgmError::InvalidNumber { .. }));
    }

    #[test]
    fn value_above_maximum_is_rejected() {
        let err = get_decode_error("P2\n2 1\n5\n1 6\n");

        assert!(matches!(
            err,
            PgmError::ValueTooLarge {
                value: 6,
                position: 1,
                max_value: 5
            }
        ));
    }

    #[test]
    fn maximum_above_limit_is_rejected() {
        let err = get_decode_error("P2\n1 1\n65537\n0\n");

        assert!(matches!(err, PgmError::MaxValueTooLarge { max_value: 65537, .. }));
    }

    #[test]
    fn maximum_at_limit_is_accepted() {
        let image = decode_source("P2\n1 1\n65536\n65536\n");

        assert_eq!(vec![65536], image.pixels);
    }

    #[test]
    fn too_few_values_are_rejected() {
        let err = get_decode_error("P2\n2 2\n5\n1 2 3\n");

        assert!(matches!(
            err,
            PgmError::TooFewValues {
                expected: 4,
                parsed: 3
            }
        ));
    }

    #[test]
    fn too_many_values_are_rejected() {
        let err = get_decode_error("P2\n2 1\n5\n1 2 3\n");

        assert!(matches!(err, PgmError::TrailingData(token) if token == "3"));
    }

    #[test]
    fn huge_declared_dimensions_are_rejected_without_allocating() {
        let err = get_decode_error("P2 1000000000 1000000000 255\n");

        assert!(matches!(
            err,
            PgmError::TooFewValues {
                expected: 1_000_000_000_000_000_000,
                parsed: 0
            }
        ));
    }

    #[test]
    fn overflowing_dimensions_are_rejected() {
        let err = get_decode_error(&format!("P2 {} 2 255\n", usize::MAX));

        assert!(matches!(err, PgmError::DimensionsTooLarge { height: 2, .. }));
    }

    #[test]
    fn empty_source_is_rejected() {
        let err = get_decode_error("  # nothing here\n");

        assert!(matches!(err, PgmError::IncompleteHeader("format tag")));
    }

    #[test]
    fn truncated_header_is_rejected() {
        let err = get_decode_error("P2 3");

        assert!(matches!(err, PgmError::IncompleteHeader("height")));
    }

    fn decode_source(source: &str) -> PgmImage {
        decode(source.as_bytes()).expect("valid pgm")
    }

    fn get_decode_error(source: &str) -> PgmError {
        decode(source.as_bytes()).expect_err("invalid pgm")
    }
}
