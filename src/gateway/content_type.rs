//! Content-type sniffing for attachment uploads.
//!
//! Attachments are uploaded as raw bytes without a caller-supplied MIME type,
//! so the type is inferred from the first bytes of the payload. The rules
//! follow the WHATWG MIME sniffing algorithm for the common binary and font
//! formats, falling back to `text/plain` or `application/octet-stream`.

/// Only this many leading bytes are inspected.
const SNIFF_LEN: usize = 512;

pub const OCTET_STREAM: &str = "application/octet-stream";
pub const TEXT_PLAIN: &str = "text/plain; charset=utf-8";

/// Fixed prefixes mapped to their MIME type.
const EXACT_SIGNATURES: &[(&[u8], &str)] = &[
    (b"%PDF-", "application/pdf"),
    (b"%!PS-Adobe-", "application/postscript"),
    (b"\xFE\xFF", "text/plain; charset=utf-16be"),
    (b"\xFF\xFE", "text/plain; charset=utf-16le"),
    (b"\xEF\xBB\xBF", TEXT_PLAIN),
    (b"\x00\x00\x01\x00", "image/x-icon"),
    (b"\x00\x00\x02\x00", "image/x-icon"),
    (b"BM", "image/bmp"),
    (b"GIF87a", "image/gif"),
    (b"GIF89a", "image/gif"),
    (b"\x89PNG\x0D\x0A\x1A\x0A", "image/png"),
    (b"\xFF\xD8\xFF", "image/jpeg"),
    (b".snd", "audio/basic"),
    (b"ID3", "audio/mpeg"),
    (b"OggS\x00", "application/ogg"),
    (b"MThd\x00\x00\x00\x06", "audio/midi"),
    (b"\x1A\x45\xDF\xA3", "video/webm"),
];

/// Fonts and archives, checked after the container formats.
const TRAILING_SIGNATURES: &[(&[u8], &str)] = &[
    (b"\x00\x01\x00\x00", "font/ttf"),
    (b"OTTO", "font/otf"),
    (b"ttcf", "font/collection"),
    (b"wOFF", "font/woff"),
    (b"wOF2", "font/woff2"),
    (b"\x1F\x8B\x08", "application/x-gzip"),
    (b"PK\x03\x04", "application/zip"),
    (b"Rar!\x1A\x07\x00", "application/x-rar-compressed"),
    (b"Rar!\x1A\x07\x01\x00", "application/x-rar-compressed"),
    (b"\x00\x61\x73\x6D", "application/wasm"),
];

/// RIFF containers: bytes 8..12 name the format.
const RIFF_SIGNATURES: &[(&[u8], &str)] = &[
    (b"WEBPVP", "image/webp"),
    (b"WAVE", "audio/wave"),
    (b"AVI ", "video/avi"),
];

/// Markup openers, matched case-insensitively after leading whitespace and
/// terminated by a space or `>`.
const HTML_TAGS: &[&[u8]] = &[
    b"<!DOCTYPE HTML",
    b"<HTML",
    b"<HEAD",
    b"<SCRIPT",
    b"<IFRAME",
    b"<H1",
    b"<DIV",
    b"<FONT",
    b"<TABLE",
    b"<A",
    b"<STYLE",
    b"<TITLE",
    b"<B",
    b"<BODY",
    b"<BR",
    b"<P",
    b"<!--",
];

/// Infers a MIME type from the leading bytes of `content`.
///
/// Never fails: unknown binary data is `application/octet-stream`, anything
/// free of control bytes is `text/plain; charset=utf-8`.
pub fn sniff_content_type(content: &[u8]) -> &'static str {
    let data = &content[..content.len().min(SNIFF_LEN)];

    let trimmed = skip_whitespace(data);
    if let Some(mime) = sniff_markup(trimmed) {
        return mime;
    }

    for &(signature, mime) in EXACT_SIGNATURES {
        if data.starts_with(signature) {
            return mime;
        }
    }

    if data.len() >= 12 && data.starts_with(b"RIFF") {
        for &(signature, mime) in RIFF_SIGNATURES {
            if data[8..].starts_with(signature) {
                return mime;
            }
        }
    }

    if data.len() >= 12 && data.starts_with(b"FORM") && &data[8..12] == b"AIFF" {
        return "audio/aiff";
    }

    if is_mp4(data) {
        return "video/mp4";
    }

    // Embedded OpenType carries its magic number at offset 34.
    if data.len() >= 36 && &data[34..36] == b"LP" {
        return "application/vnd.ms-fontobject";
    }

    for &(signature, mime) in TRAILING_SIGNATURES {
        if data.starts_with(signature) {
            return mime;
        }
    }

    if data.iter().any(|b| is_binary_byte(*b)) {
        OCTET_STREAM
    } else {
        TEXT_PLAIN
    }
}

fn skip_whitespace(data: &[u8]) -> &[u8] {
    let start = data
        .iter()
        .position(|&b| !matches!(b, b'\t' | b'\n' | 0x0C | b'\r' | b' '))
        .unwrap_or(data.len());
    &data[start..]
}

fn sniff_markup(data: &[u8]) -> Option<&'static str> {
    if data.starts_with(b"<?xml") {
        return Some("text/xml; charset=utf-8");
    }

    HTML_TAGS
        .iter()
        .any(|tag| {
            data.len() > tag.len()
                && data[..tag.len()].eq_ignore_ascii_case(tag)
                && matches!(data[tag.len()], b' ' | b'>')
        })
        .then_some("text/html; charset=utf-8")
}

/// ISO base media file with an `mp4` brand in its `ftyp` box.
fn is_mp4(data: &[u8]) -> bool {
    if data.len() < 12 {
        return false;
    }
    let box_size = u32::from_be_bytes([data[0], data[1], data[2], data[3]]) as usize;
    if box_size % 4 != 0 || data.len() < box_size || &data[4..8] != b"ftyp" {
        return false;
    }

    // Major brand at 8..12, then compatible brands from 16 in 4-byte steps.
    let brands = std::iter::once(8).chain((16..box_size).step_by(4));
    for offset in brands {
        if offset + 3 > data.len() {
            break;
        }
        if &data[offset..offset + 3] == b"mp4" {
            return true;
        }
    }
    false
}

fn is_binary_byte(b: u8) -> bool {
    matches!(b, 0x00..=0x08 | 0x0B | 0x0E..=0x1A | 0x1C..=0x1F)
}
