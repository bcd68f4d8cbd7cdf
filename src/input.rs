//! Line-oriented file input with transparent gzip support.
//!
//! Pattern and query files may arrive gzip-compressed. Compression is
//! detected by sniffing the two magic bytes rather than trusting the file
//! extension, matching how operational catalogs tend to be shipped around.

use std::fs::File;
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use flate2::read::GzDecoder;

use crate::error::Result;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Check whether a file starts with the gzip magic bytes.
pub fn is_gzip_file(path: &Path) -> bool {
    let mut magic = [0u8; 2];
    match File::open(path) {
        Ok(mut file) => matches!(file.read_exact(&mut magic), Ok(()) if magic == GZIP_MAGIC),
        Err(_) => false,
    }
}

/// Open a file as a buffered line source, decompressing when the content
/// is gzip.
pub fn open_lines(path: &Path) -> Result<Box<dyn BufRead + Send>> {
    let mut file = File::open(path)?;

    let mut magic = [0u8; 2];
    let gzip = matches!(file.read_exact(&mut magic), Ok(()) if magic == GZIP_MAGIC);
    file.seek(SeekFrom::Start(0))?;

    if gzip {
        Ok(Box::new(BufReader::new(GzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}
