//! Embedded TrueType/OpenType `cmap` table walk for CIDFontType2 fonts
//! with an Identity `CIDToGIDMap`. Supported subtable formats:
//! 4 (segmented BMP) and 12 (sequential full-Unicode groups), selected in
//! preference order (3,10) > (3,1) > (0,*) > first.

use std::collections::HashMap;

use ttf_parser::{Face, PlatformId};

pub(crate) fn build_gid_to_unicode(font_data: &[u8]) -> Option<HashMap<u32, String>> {
    let face = Face::parse(font_data, 0).ok()?;
    let cmap = face.tables().cmap?;

    let chosen = cmap
        .subtables
        .into_iter()
        .filter(|s| matches!(s.format, ttf_parser::cmap::Format::SegmentMappingToDeltaValues | ttf_parser::cmap::Format::SegmentedCoverage))
        .max_by_key(|s| subtable_priority(s.platform_id, s.encoding_id))?;

    let mut map = HashMap::new();
    chosen.codepoints(|codepoint| {
        if let Some(c) = char::from_u32(codepoint) {
            if let Some(gid) = chosen.glyph_index(codepoint) {
                map.insert(gid.0 as u32, c.to_string());
            }
        }
    });

    if map.is_empty() {
        None
    } else {
        Some(map)
    }
}

fn subtable_priority(platform: PlatformId, encoding: u16) -> i32 {
    match (platform, encoding) {
        (PlatformId::Windows, 10) => 3,
        (PlatformId::Windows, 1) => 2,
        (PlatformId::Unicode, _) => 1,
        _ => 0,
    }
}
