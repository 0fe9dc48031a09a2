//! UTF-8 byte-offset ↔ LSP `Position` conversion.
//!
//! The server negotiates the `utf-8` position encoding exclusively (see the
//! external interfaces section of the specification), so a `Position`'s
//! `character` field counts bytes within its line, not UTF-16 code units.

use tower_lsp_server::ls_types::{Position, Range};

/// Converts a byte offset into a document to an LSP `Position`, counting
/// lines and in-line byte offsets from `content`.
///
/// Returns `None` if `offset` is past the end of `content`.
pub fn position_at_offset(content: &str, offset: usize) -> Option<Position> {
    if offset > content.len() {
        return None;
    }
    let mut line = 0u32;
    let mut line_start = 0usize;
    for (idx, byte) in content.as_bytes().iter().enumerate() {
        if idx == offset {
            break;
        }
        if *byte == b'\n' {
            line += 1;
            line_start = idx + 1;
        }
    }
    let character = (offset - line_start) as u32;
    Some(Position::new(line, character))
}

/// Converts an LSP `Position` to a byte offset into `content`.
///
/// Returns `None` if the line is out of range; a `character` past the end
/// of its line is clamped to the line's length (mirroring how editors
/// commonly send an end-of-line position).
pub fn offset_at_position(content: &str, position: Position) -> Option<usize> {
    let mut current_line = 0u32;
    let mut line_start = 0usize;
    for (idx, byte) in content.as_bytes().iter().enumerate() {
        if current_line == position.line {
            let line_end = content[idx..]
                .find('\n')
                .map_or(content.len(), |rel| idx + rel);
            let offset = (idx + position.character as usize).min(line_end);
            return Some(offset);
        }
        if *byte == b'\n' {
            current_line += 1;
            line_start = idx + 1;
        }
    }
    if current_line == position.line {
        let offset = (line_start + position.character as usize).min(content.len());
        return Some(offset);
    }
    None
}

/// Builds an LSP `Range` from a half-open byte range `[start, end)`.
pub fn range_from_bytes(content: &str, start: usize, end: usize) -> Option<Range> {
    Some(Range::new(
        position_at_offset(content, start)?,
        position_at_offset(content, end)?,
    ))
}

/// Returns `true` if `position` falls within `[range.start, range.end)`.
pub fn position_in_range(position: Position, range: Range) -> bool {
    position >= range.start && position < range.end
}

/// Returns `true` if two ranges overlap at all (share at least one byte).
pub fn ranges_overlap(a: Range, b: Range) -> bool {
    a.start < b.end && b.start < a.end
}
