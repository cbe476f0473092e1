//! Stream filter pipeline. Applies the ordered `/Filter` list
//! named in a stream's dictionary, feeding the output of one filter into
//! the next. Every stage degrades to a pass-through on failure rather than
//! aborting the chain — a single bad filter must not lose the rest of the
//! stream.

mod ascii;
mod flate;
mod runlength;

use log::warn;

use crate::object::Dictionary;

/// Decodes `raw` through every filter named in `dict`'s `/Filter` entry (a
/// single name or an array of names), applying them left to right. Returns
/// the raw bytes unchanged if there is no `/Filter` entry at all.
pub(crate) fn decode_stream(raw: &[u8], dict: &Dictionary) -> Vec<u8> {
    let names = match filter_names(dict) {
        Some(names) => names,
        None => return raw.to_vec(),
    };

    let mut data = raw.to_vec();
    for name in names {
        data = apply_filter(&name, &data);
    }
    data
}

fn filter_names(dict: &Dictionary) -> Option<Vec<Vec<u8>>> {
    let filter = dict.get(b"Filter").ok()?;
    if let Ok(name) = filter.as_name() {
        return Some(vec![name.to_vec()]);
    }
    if let Ok(arr) = filter.as_array() {
        return Some(arr.iter().filter_map(|o| o.as_name().ok().map(|n| n.to_vec())).collect());
    }
    None
}

fn apply_filter(name: &[u8], data: &[u8]) -> Vec<u8> {
    match name {
        b"FlateDecode" | b"Fl" => flate::decode(data),
        b"ASCII85Decode" | b"A85" => ascii::decode_ascii85(data),
        b"ASCIIHexDecode" | b"AHx" => ascii::decode_ascii_hex(data),
        b"RunLengthDecode" | b"RL" => runlength::decode(data),
        b"DCTDecode" | b"DCT" | b"JPXDecode" | b"CCITTFaxDecode" | b"CCF" | b"JBIG2Decode" => {
            data.to_vec()
        }
        b"LZWDecode" | b"LZW" => {
            warn!("LZWDecode is not implemented; passing stream through undecoded");
            data.to_vec()
        }
        other => {
            warn!(
                "unknown filter {:?}; passing stream through undecoded",
                String::from_utf8_lossy(other)
            );
            data.to_vec()
        }
    }
}
