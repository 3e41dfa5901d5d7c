//! Input opening for entries files and address lists
//!
//! Paths ending in `.gz` (any case) are decompressed on the fly, and `-`
//! reads standard input.
//!
//! ```rust,no_run
//! use std::io::BufRead;
//! use subnettree::file_reader;
//!
//! for line in file_reader::open("networks.txt.gz")?.lines() {
//!     println!("{}", line?);
//! }
//! # Ok::<(), std::io::Error>(())
//! ```

use flate2::read::MultiGzDecoder;
use std::fs::File;
use std::io::{self, stdin, BufRead, BufReader};
use std::path::Path;

/// Buffer size for file reading (128KB)
const BUFFER_SIZE: usize = 128 * 1024;

/// True if `path` names a gzip file by extension
pub fn is_gzip_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("gz"))
        .unwrap_or(false)
}

/// Open `path` for buffered line reading
///
/// # Errors
///
/// Returns an error if the file cannot be opened. Corrupt gzip data
/// surfaces as an error from the first read.
pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Box<dyn BufRead + Send>> {
    let path = path.as_ref();

    if path.to_str() == Some("-") {
        return Ok(Box::new(BufReader::with_capacity(BUFFER_SIZE, stdin())));
    }

    let file = File::open(path)?;
    if is_gzip_path(path) {
        // Multi-member aware: concatenated .gz files decode fully
        Ok(Box::new(BufReader::with_capacity(
            BUFFER_SIZE,
            MultiGzDecoder::new(file),
        )))
    } else {
        Ok(Box::new(BufReader::with_capacity(BUFFER_SIZE, file)))
    }
}
