use crate::document::{Accessor, BufferView, Document};

#[derive(Debug, thiserror::Error)]
pub enum Err {
    #[error("accessor {0} uses sparse storage, which is not supported")]
    Sparse(usize),
    #[error("accessor {index} is interleaved (bufferView stride {stride}, element size {element_size}); interleaved accessors are not supported")]
    Interleaved {
        index: usize,
        stride: usize,
        element_size: usize,
    },
    #[error("accessor {0} has no bufferView")]
    MissingView(usize),
    #[error("accessor {index} refers to bufferView {view}, but the document has {view_count} bufferView(s)")]
    ViewOutOfRange {
        index: usize,
        view: usize,
        view_count: usize,
    },
    #[error("accessor {index} spans bytes {start}..{end} of a {view_len}-byte bufferView")]
    OutOfBounds {
        index: usize,
        start: usize,
        end: usize,
        view_len: usize,
    },
    #[error("mesh {mesh} primitive {primitive} refers to accessor {accessor}, but the document has {accessor_count} accessor(s)")]
    PrimitiveAccessorOutOfRange {
        mesh: usize,
        primitive: usize,
        accessor: usize,
        accessor_count: usize,
    },
}

/// One accessor's element data as laid out in the repacked payload, together
/// with the accessor it came from for the metadata side of the comparison.
struct ElementView<'a> {
    accessor: &'a Accessor,
    bytes: &'a [u8],
}

impl ElementView<'_> {
    /// Same absence/presence rule as the view comparison: optional fields
    /// absent on both sides are equal, present on one side only are not.
    /// Sparse never shows up here, it is rejected before slicing.
    fn matches(&self, other: &Self) -> bool {
        let (a, b) = (self.accessor, other.accessor);
        a.byte_offset == b.byte_offset
            && a.component_type == b.component_type
            && a.normalized == b.normalized
            && a.element_type == b.element_type
            && a.count == b.count
            && a.min == b.min
            && a.max == b.max
            && a.extensions == b.extensions
            && a.extras == b.extras
            && self.bytes == other.bytes
    }
}

/// First-seen representatives (as indices into the original accessor list)
/// and the map from every original accessor index to its unique index.
#[derive(Debug)]
pub struct AccessorDedup {
    pub unique: Vec<usize>,
    pub remap: Vec<usize>,
}

/// Groups byte- and metadata-identical accessors over the repacked payload.
/// `buffer_views` must already be the rewritten (post-repack) list, so a
/// view's byte range is a valid slice of `payload` by construction.
pub fn dedupe_accessors(
    payload: &[u8],
    buffer_views: &[BufferView],
    accessors: &[Accessor],
) -> Result<AccessorDedup, Err> {
    let mut unique: Vec<ElementView<'_>> = Vec::with_capacity(accessors.len());
    let mut unique_indices = Vec::with_capacity(accessors.len());
    let mut remap = Vec::with_capacity(accessors.len());
    for (index, accessor) in accessors.iter().enumerate() {
        if accessor.sparse.is_some() {
            return Err(Err::Sparse(index));
        }
        let view_index = accessor.buffer_view.ok_or(Err::MissingView(index))?;
        let view = buffer_views.get(view_index).ok_or(Err::ViewOutOfRange {
            index,
            view: view_index,
            view_count: buffer_views.len(),
        })?;
        let element_size = accessor.element_byte_size();
        match view.byte_stride {
            Some(stride) if stride != 0 && stride != element_size => {
                return Err(Err::Interleaved {
                    index,
                    stride,
                    element_size,
                });
            }
            _ => {}
        }
        let start = accessor.byte_offset;
        let end = start.saturating_add(accessor.count.saturating_mul(element_size));
        if end > view.byte_length {
            return Err(Err::OutOfBounds {
                index,
                start,
                end,
                view_len: view.byte_length,
            });
        }
        let bytes = &payload[view.byte_offset + start..view.byte_offset + end];
        let element_view = ElementView { accessor, bytes };
        match unique
            .iter()
            .position(|candidate| candidate.matches(&element_view))
        {
            Some(found) => remap.push(found),
            None => {
                remap.push(unique.len());
                unique_indices.push(index);
                unique.push(element_view);
            }
        }
    }
    Ok(AccessorDedup {
        unique: unique_indices,
        remap,
    })
}

/// Routes every mesh primitive reference (indices and attribute values)
/// through the remap table and shrinks `document.accessors` to the
/// representatives, keeping their first-seen order.
pub fn apply_remap(document: &mut Document, dedup: &AccessorDedup) -> Result<(), Err> {
    let accessor_count = dedup.remap.len();
    for (mesh_index, mesh) in document.meshes.iter_mut().enumerate() {
        for (primitive_index, primitive) in mesh.primitives.iter_mut().enumerate() {
            let out_of_range = |accessor: usize| Err::PrimitiveAccessorOutOfRange {
                mesh: mesh_index,
                primitive: primitive_index,
                accessor,
                accessor_count,
            };
            if let Some(indices) = primitive.indices {
                primitive.indices =
                    Some(*dedup.remap.get(indices).ok_or_else(|| out_of_range(indices))?);
            }
            for value in primitive.attributes.values_mut() {
                *value = *dedup.remap.get(*value).ok_or_else(|| out_of_range(*value))?;
            }
        }
    }
    let unique: Vec<_> = dedup
        .unique
        .iter()
        .map(|&index| document.accessors[index].clone())
        .collect();
    document.accessors = unique;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn views(value: serde_json::Value) -> Vec<BufferView> {
        serde_json::from_value(value).unwrap()
    }

    fn accessor_list(value: serde_json::Value) -> Vec<Accessor> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn merges_identical_accessors_across_views() {
        // Two 8-byte views with identical content at offsets 0 and 8.
        let payload: Vec<u8> = vec![1, 0, 2, 0, 3, 0, 4, 0, 1, 0, 2, 0, 3, 0, 4, 0];
        let buffer_views = views(json!([
            {"buffer": 0, "byteOffset": 0, "byteLength": 8},
            {"buffer": 0, "byteOffset": 8, "byteLength": 8}
        ]));
        let accessors = accessor_list(json!([
            {"bufferView": 0, "componentType": 5123, "count": 4, "type": "SCALAR"},
            {"bufferView": 1, "componentType": 5123, "count": 4, "type": "SCALAR"},
            {"bufferView": 0, "componentType": 5123, "count": 4, "type": "SCALAR"}
        ]));
        let dedup = dedupe_accessors(&payload, &buffer_views, &accessors).unwrap();
        assert_eq!(dedup.unique, vec![0]);
        assert_eq!(dedup.remap, vec![0, 0, 0]);
    }

    #[test]
    fn metadata_differences_keep_accessors_apart() {
        let payload: Vec<u8> = vec![1, 0, 2, 0, 3, 0, 4, 0];
        let buffer_views = views(json!([
            {"buffer": 0, "byteOffset": 0, "byteLength": 8}
        ]));
        let accessors = accessor_list(json!([
            {"bufferView": 0, "componentType": 5123, "count": 4, "type": "SCALAR", "min": [1], "max": [4]},
            {"bufferView": 0, "componentType": 5123, "count": 4, "type": "SCALAR"},
            {"bufferView": 0, "componentType": 5123, "count": 4, "type": "SCALAR", "min": [1], "max": [4]},
            {"bufferView": 0, "componentType": 5123, "count": 4, "type": "SCALAR", "normalized": true}
        ]));
        let dedup = dedupe_accessors(&payload, &buffer_views, &accessors).unwrap();
        assert_eq!(dedup.unique, vec![0, 1, 3]);
        assert_eq!(dedup.remap, vec![0, 1, 0, 2]);
    }

    #[test]
    fn sparse_accessor_is_rejected() {
        let payload: Vec<u8> = vec![0; 8];
        let buffer_views = views(json!([{"buffer": 0, "byteOffset": 0, "byteLength": 8}]));
        let accessors = accessor_list(json!([
            {"bufferView": 0, "componentType": 5123, "count": 4, "type": "SCALAR",
             "sparse": {"count": 1, "indices": {}, "values": {}}}
        ]));
        assert!(matches!(
            dedupe_accessors(&payload, &buffer_views, &accessors),
            Err(Err::Sparse(0))
        ));
    }

    #[test]
    fn interleaved_accessor_is_rejected() {
        let payload: Vec<u8> = vec![0; 24];
        let buffer_views = views(json!([
            {"buffer": 0, "byteOffset": 0, "byteLength": 24, "byteStride": 24}
        ]));
        let accessors = accessor_list(json!([
            {"bufferView": 0, "componentType": 5126, "count": 1, "type": "VEC3"}
        ]));
        assert!(matches!(
            dedupe_accessors(&payload, &buffer_views, &accessors),
            Err(Err::Interleaved { index: 0, stride: 24, element_size: 12 })
        ));
    }

    #[test]
    fn natural_stride_is_accepted() {
        let payload: Vec<u8> = vec![0; 24];
        let buffer_views = views(json!([
            {"buffer": 0, "byteOffset": 0, "byteLength": 24, "byteStride": 12}
        ]));
        let accessors = accessor_list(json!([
            {"bufferView": 0, "componentType": 5126, "count": 2, "type": "VEC3"}
        ]));
        let dedup = dedupe_accessors(&payload, &buffer_views, &accessors).unwrap();
        assert_eq!(dedup.unique, vec![0]);
    }

    #[test]
    fn accessor_extent_past_view_is_malformed() {
        let payload: Vec<u8> = vec![0; 8];
        let buffer_views = views(json!([{"buffer": 0, "byteOffset": 0, "byteLength": 8}]));
        let accessors = accessor_list(json!([
            {"bufferView": 0, "byteOffset": 4, "componentType": 5123, "count": 4, "type": "SCALAR"}
        ]));
        assert!(matches!(
            dedupe_accessors(&payload, &buffer_views, &accessors),
            Err(Err::OutOfBounds { index: 0, .. })
        ));
    }

    #[test]
    fn remap_rewrites_primitives_and_shrinks_accessors() {
        let mut document: Document = serde_json::from_value(json!({
            "accessors": [
                {"bufferView": 0, "componentType": 5123, "count": 4, "type": "SCALAR"},
                {"bufferView": 0, "componentType": 5126, "count": 2, "type": "VEC3"},
                {"bufferView": 0, "componentType": 5123, "count": 4, "type": "SCALAR"}
            ],
            "meshes": [{
                "primitives": [
                    {"attributes": {"POSITION": 1}, "indices": 0},
                    {"attributes": {"POSITION": 1}, "indices": 2}
                ]
            }]
        }))
        .unwrap();
        let dedup = AccessorDedup {
            unique: vec![0, 1],
            remap: vec![0, 1, 0],
        };
        apply_remap(&mut document, &dedup).unwrap();
        assert_eq!(document.accessors.len(), 2);
        assert_eq!(document.meshes[0].primitives[0].indices, Some(0));
        assert_eq!(document.meshes[0].primitives[1].indices, Some(0));
        assert_eq!(document.meshes[0].primitives[1].attributes["POSITION"], 1);
    }
}
