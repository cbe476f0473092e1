//! `FlateDecode`: zlib-inflate, retry as raw deflate on failure, and fall
//! back to the original bytes (with a warning) if both fail.

use std::io::Read;

use flate2::read::{DeflateDecoder, ZlibDecoder};
use log::warn;

pub(super) fn decode(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    if ZlibDecoder::new(data).read_to_end(&mut out).is_ok() {
        return out;
    }

    out.clear();
    if DeflateDecoder::new(data).read_to_end(&mut out).is_ok() {
        return out;
    }

    warn!("FlateDecode failed on {} byte stream; passing through undecoded", data.len());
    data.to_vec()
}
