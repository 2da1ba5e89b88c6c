use crate::document::{Buffer, Document};
use crate::views::ViewDedup;

/// glTF requires bufferView start offsets to be 4-byte aligned.
const ALIGNMENT: usize = 4;

#[derive(Debug, thiserror::Error)]
pub enum Err {
    #[error("accessor {accessor} refers to bufferView {view}, but the document has {view_count} bufferView(s)")]
    AccessorViewOutOfRange {
        accessor: usize,
        view: usize,
        view_count: usize,
    },
}

/// Concatenates the unique views into one new buffer, zero-padding after
/// every view (the last one included) so each start offset stays aligned.
/// Rewrites the document in place: the bufferView list shrinks to the
/// representatives with their new offsets, `buffers` collapses to a single
/// entry pointing at `bin_file_name`, and every accessor's view index is
/// routed through the dedup remap table.
pub fn repack(
    document: &mut Document,
    dedup: &ViewDedup<'_>,
    bin_file_name: &str,
) -> Result<Vec<u8>, Err> {
    let total: usize = dedup.unique.iter().map(|slice| slice.bytes.len()).sum();
    let mut payload = Vec::with_capacity(total + dedup.unique.len() * (ALIGNMENT - 1));
    let mut buffer_views = Vec::with_capacity(dedup.unique.len());
    for slice in &dedup.unique {
        let mut view = document.buffer_views[slice.original_index].clone();
        view.buffer = 0;
        view.byte_offset = payload.len();
        payload.extend_from_slice(slice.bytes);
        while payload.len() % ALIGNMENT != 0 {
            payload.push(0);
        }
        buffer_views.push(view);
    }
    document.buffer_views = buffer_views;
    document.buffers = vec![Buffer {
        byte_length: payload.len(),
        uri: Some(bin_file_name.to_string()),
        rest: serde_json::Map::new(),
    }];
    for (index, accessor) in document.accessors.iter_mut().enumerate() {
        if let Some(view) = accessor.buffer_view {
            let remapped = *dedup
                .remap
                .get(view)
                .ok_or(Err::AccessorViewOutOfRange {
                    accessor: index,
                    view,
                    view_count: dedup.remap.len(),
                })?;
            accessor.buffer_view = Some(remapped);
        }
    }
    Ok(payload)
}
