use unicode_normalization::UnicodeNormalization;

/// Normalize text assembled from a page region.
///
/// Applies NFC (PDF producers often emit decomposed Hangul jamo and
/// combining accents), expands Latin ligatures and drops replacement
/// characters left by undecodable codes. Line structure is preserved
/// exactly: callers segment on line starts.
pub fn normalize_region_text(text: &str) -> String {
    let mut result: String = text.nfc().collect();

    for (lig, replacement) in [
        ("\u{FB00}", "ff"),
        ("\u{FB01}", "fi"),
        ("\u{FB02}", "fl"),
        ("\u{FB03}", "ffi"),
        ("\u{FB04}", "ffl"),
    ] {
        result = result.replace(lig, replacement);
    }

    result.replace('\u{FFFD}', "")
}
