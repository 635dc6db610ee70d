//! Row-byte-aligned 1-bit packing codec.
//!
//! Each image row starts on a byte boundary; within a byte the leftmost
//! pixel is the most significant bit, 1 = white and 0 = black, and unused
//! trailing bits in a row's last byte are zero. This layout is the wire
//! format shipped to the display and must stay bit-exact.
//!
//! [`unpack_1bit`] is the exact inverse of [`pack_1bit`] and never fails:
//! reads past the end of the buffer come back as black.

use image::{GrayImage, Luma};
use tracing::debug;

/// Bytes occupied by one packed row.
pub fn bytes_per_row(width: u32) -> usize {
    (width as usize + 7) / 8
}

/// Total packed length for a `width` x `height` bitmap.
pub fn packed_len(width: u32, height: u32) -> usize {
    bytes_per_row(width) * height as usize
}

/// Pack a black-and-white bitmap into the row-byte-aligned 1-bit layout.
///
/// A bit is set when its pixel is white (255). Pixel positions past the
/// image width inside a row's final byte stay zero.
pub fn pack_1bit(bitmap: &GrayImage) -> Vec<u8> {
    let (width, height) = bitmap.dimensions();
    let row_bytes = bytes_per_row(width);
    debug!(width, height, bytes = row_bytes * height as usize, "Packing 1-bit data");

    let mut data = Vec::with_capacity(row_bytes * height as usize);
    for y in 0..height {
        for byte_x in 0..row_bytes {
            let mut byte = 0u8;
            for bit in 0..8u32 {
                let x = byte_x as u32 * 8 + bit;
                if x < width && bitmap.get_pixel(x, y).0[0] == 255 {
                    byte |= 1 << (7 - bit);
                }
            }
            data.push(byte);
        }
    }
    data
}

/// Reconstruct a grayscale image (pixels 0 or 255) from packed 1-bit data.
///
/// Out-of-range reads yield black instead of an error; this is a best-effort
/// preview path.
pub fn unpack_1bit(data: &[u8], width: u32, height: u32) -> GrayImage {
    let row_bytes = bytes_per_row(width);
    GrayImage::from_fn(width, height, |x, y| {
        let byte_idx = y as usize * row_bytes + x as usize / 8;
        let bit_pos = 7 - (x % 8);
        let white = data
            .get(byte_idx)
            .is_some_and(|byte| (byte >> bit_pos) & 1 == 1);
        Luma([if white { 255 } else { 0 }])
    })
}
