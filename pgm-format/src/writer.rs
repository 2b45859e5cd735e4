use std::io;
use std::io::BufWriter;
use std::io::Write;

use crate::PgmImage;
use crate::FORMAT_CODE;

/// The number of intensities written on one line. Every value takes at most six characters
/// (five digits and a separator), which keeps lines within 70 columns.
const VALUES_PER_LINE: usize = 11;

/// Write `image` in the plain PGM format.
///
/// The header is written on three lines (format tag, dimensions and maximal value), after which
/// every row of the image starts on a new line and is wrapped after 11 values.
pub fn encode(image: &PgmImage, writer: impl Write) -> io::Result<()> {
    let mut writer = BufWriter::new(writer);

    writeln!(writer, "{FORMAT_CODE}")?;
    writeln!(writer, "{} {}", image.width, image.height)?;
    writeln!(writer, "{}", image.max_value)?;

    if image.width > 0 {
        for row in image.pixels.chunks(image.width) {
            for line in row.chunks(VALUES_PER_LINE) {
                let mut values = line.iter();
                if let Some(first) = values.next() {
                    write!(writer, "{first}")?;
                }
                for value in values {
                    write!(writer, " {value}")?;
                }
                writeln!(writer)?;
            }
        }
    }

    writer.flush()
}
