use serde_json::Value;

use crate::document::BufferView;
use crate::loader::BufferPayload;

#[derive(Debug, thiserror::Error)]
pub enum Err {
    #[error("bufferView {view} refers to buffer {buffer}, but the document loaded {buffer_count} buffer(s)")]
    BufferOutOfRange {
        view: usize,
        buffer: usize,
        buffer_count: usize,
    },
    #[error("bufferView {view} spans bytes {start}..{end}, past the end of its {payload_len}-byte buffer")]
    SliceOutOfBounds {
        view: usize,
        start: usize,
        end: usize,
        payload_len: usize,
    },
}

/// One bufferView's byte range plus the metadata that takes part in the
/// equality check. Bytes borrow the loaded payloads; metadata is copied out
/// of the document so the document stays freely mutable afterwards.
#[derive(Debug)]
pub struct ViewSlice<'a> {
    pub original_index: usize,
    pub bytes: &'a [u8],
    pub byte_stride: Option<usize>,
    pub target: Option<u32>,
    pub extensions: Option<Value>,
    pub extras: Option<Value>,
}

impl ViewSlice<'_> {
    /// Equality as carried over from the original logic: stride, target and
    /// the raw extension/extras values must match exactly, with a field
    /// absent on both sides counting as equal and a field present on only
    /// one side counting as unequal. Byte length equality is implied by the
    /// content comparison.
    fn matches(&self, other: &Self) -> bool {
        self.byte_stride == other.byte_stride
            && self.target == other.target
            && self.extensions == other.extensions
            && self.extras == other.extras
            && self.bytes == other.bytes
    }
}

/// Result of the view scan: the retained representatives in first-seen order
/// and a map from every original view index to its unique index.
#[derive(Debug)]
pub struct ViewDedup<'a> {
    pub unique: Vec<ViewSlice<'a>>,
    pub remap: Vec<usize>,
}

impl ViewDedup<'_> {
    pub fn had_duplicates(&self) -> bool {
        self.unique.len() < self.remap.len()
    }
}

/// Slices every bufferView out of its payload and groups byte-identical
/// views. Linear first-match-wins scan; the earliest view of a duplicate
/// group is always the representative, so downstream indices stay stable.
pub fn dedupe_views<'a>(
    payloads: &'a [BufferPayload],
    buffer_views: &[BufferView],
) -> Result<ViewDedup<'a>, Err> {
    let mut unique: Vec<ViewSlice<'a>> = Vec::with_capacity(buffer_views.len());
    let mut remap = Vec::with_capacity(buffer_views.len());
    for (index, view) in buffer_views.iter().enumerate() {
        let payload = payloads.get(view.buffer).ok_or(Err::BufferOutOfRange {
            view: index,
            buffer: view.buffer,
            buffer_count: payloads.len(),
        })?;
        let start = view.byte_offset;
        let end = start.saturating_add(view.byte_length);
        let bytes = payload
            .as_bytes()
            .get(start..end)
            .ok_or(Err::SliceOutOfBounds {
                view: index,
                start,
                end,
                payload_len: payload.len(),
            })?;
        let slice = ViewSlice {
            original_index: index,
            bytes,
            byte_stride: view.byte_stride,
            target: view.target,
            extensions: view.extensions.clone(),
            extras: view.extras.clone(),
        };
        match unique.iter().position(|candidate| candidate.matches(&slice)) {
            Some(found) => remap.push(found),
            None => {
                remap.push(unique.len());
                unique.push(slice);
            }
        }
    }
    Ok(ViewDedup { unique, remap })
}
