//! Helpers for reading lopdf objects: reference resolution, numbers,
//! stream decoding, resource lookup and page-tree inheritance.

use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use pdfshapes_core::{BBox, Ctm};

use crate::error::BackendError;

/// Resolve an indirect reference, returning the referenced object.
/// If the object is not a reference, returns it as-is.
pub fn resolve_ref<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
    match obj {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        _ => obj,
    }
}

/// Convert a lopdf numeric object (Integer or Real) to f64.
pub fn object_to_f64(obj: &Object) -> Result<f64, BackendError> {
    match obj {
        Object::Integer(i) => Ok(*i as f64),
        Object::Real(f) => Ok(*f as f64),
        _ => Err(BackendError::Parse(format!("expected number, got {obj:?}"))),
    }
}

/// Numeric value after resolving references.
pub fn number(doc: &Document, obj: &Object) -> Option<f64> {
    object_to_f64(resolve_ref(doc, obj)).ok()
}

/// A resolved array of numbers. Non-numeric entries make the whole array
/// invalid.
pub fn number_array(doc: &Document, obj: &Object) -> Option<Vec<f64>> {
    resolve_ref(doc, obj)
        .as_array()
        .ok()?
        .iter()
        .map(|o| number(doc, o))
        .collect()
}

/// Same as [`number_array`], narrowed to f32.
pub fn f32_array(doc: &Document, obj: &Object) -> Option<Vec<f32>> {
    number_array(doc, obj).map(|v| v.into_iter().map(|x| x as f32).collect())
}

/// Numeric dictionary entry.
pub fn dict_number(doc: &Document, dict: &Dictionary, key: &[u8]) -> Option<f64> {
    dict.get(key).ok().and_then(|o| number(doc, o))
}

/// Numeric array dictionary entry.
pub fn dict_numbers(doc: &Document, dict: &Dictionary, key: &[u8]) -> Option<Vec<f64>> {
    dict.get(key).ok().and_then(|o| number_array(doc, o))
}

/// Name dictionary entry, as a string.
pub fn dict_name(doc: &Document, dict: &Dictionary, key: &[u8]) -> Option<String> {
    let obj = resolve_ref(doc, dict.get(key).ok()?);
    obj.as_name()
        .ok()
        .map(|n| String::from_utf8_lossy(n).into_owned())
}

/// Dictionary entry resolved to a dictionary. Streams yield their dictionary.
pub fn dict_dict<'a>(doc: &'a Document, dict: &'a Dictionary, key: &[u8]) -> Option<&'a Dictionary> {
    as_dict(resolve_ref(doc, dict.get(key).ok()?))
}

/// The dictionary of a dictionary or stream object.
pub fn as_dict(obj: &Object) -> Option<&Dictionary> {
    match obj {
        Object::Dictionary(d) => Some(d),
        Object::Stream(s) => Some(&s.dict),
        _ => None,
    }
}

/// Boolean pair such as /Extend, defaulting to `[false, false]`.
pub fn dict_bool_pair(doc: &Document, dict: &Dictionary, key: &[u8]) -> [bool; 2] {
    let Some(arr) = dict
        .get(key)
        .ok()
        .and_then(|o| resolve_ref(doc, o).as_array().ok())
    else {
        return [false, false];
    };
    let flag = |i: usize| arr.get(i).and_then(|o| o.as_bool().ok()).unwrap_or(false);
    [flag(0), flag(1)]
}

/// A 6-number matrix entry such as /Matrix.
pub fn dict_matrix(doc: &Document, dict: &Dictionary, key: &[u8]) -> Option<Ctm> {
    let v = dict_numbers(doc, dict, key)?;
    (v.len() == 6).then(|| Ctm::new(v[0], v[1], v[2], v[3], v[4], v[5]))
}

/// A 4-number rectangle entry such as /BBox, normalized.
pub fn dict_rect(doc: &Document, dict: &Dictionary, key: &[u8]) -> Option<BBox> {
    let v = dict_numbers(doc, dict, key)?;
    (v.len() == 4).then(|| {
        BBox::new(
            v[0].min(v[2]),
            v[1].min(v[3]),
            v[0].max(v[2]),
            v[1].max(v[3]),
        )
    })
}

/// Decode a PDF stream, decompressing if necessary.
pub fn decode_stream(stream: &Stream) -> Result<Vec<u8>, BackendError> {
    if stream.dict.get(b"Filter").is_ok() {
        stream
            .decompressed_content()
            .map_err(|e| BackendError::Interpreter(format!("stream decompression failed: {e}")))
    } else {
        Ok(stream.content.clone())
    }
}

/// Look up `/Resources/<category>/<name>`, resolving references on the way.
///
/// Returns the target object and its id when it was stored indirectly.
pub fn lookup_resource<'a>(
    doc: &'a Document,
    resources: &'a Dictionary,
    category: &[u8],
    name: &str,
) -> Option<(&'a Object, Option<ObjectId>)> {
    let group = as_dict(resolve_ref(doc, resources.get(category).ok()?))?;
    let entry = group.get(name.as_bytes()).ok()?;
    let id = entry.as_reference().ok();
    Some((resolve_ref(doc, entry), id))
}

/// Look up a key in the page dictionary, walking up the page tree
/// (via /Parent) if the key is not found on the page itself.
///
/// Returns `None` if the key is not found anywhere in the tree.
pub fn resolve_inherited<'a>(
    doc: &'a Document,
    page_id: ObjectId,
    key: &[u8],
) -> Result<Option<&'a Object>, BackendError> {
    let mut current_id = page_id;
    // page trees are shallow; a cycle must not hang the walk
    for _ in 0..64 {
        let dict = doc
            .get_object(current_id)
            .and_then(|o| o.as_dict())
            .map_err(|e| BackendError::Parse(format!("failed to get page dictionary: {e}")))?;

        if let Ok(value) = dict.get(key) {
            return Ok(Some(value));
        }

        match dict.get(b"Parent") {
            Ok(parent_obj) => {
                current_id = parent_obj
                    .as_reference()
                    .map_err(|e| BackendError::Parse(format!("invalid /Parent reference: {e}")))?;
            }
            Err(_) => return Ok(None),
        }
    }
    Err(BackendError::Parse("page tree /Parent chain too deep".to_string()))
}

/// Get the content stream bytes from a page dictionary.
///
/// Handles both single stream references and arrays of stream references,
/// joined with a space so tokens never fuse across stream boundaries.
pub fn page_content_bytes(doc: &Document, page_dict: &Dictionary) -> Result<Vec<u8>, BackendError> {
    let Ok(contents_obj) = page_dict.get(b"Contents") else {
        return Ok(Vec::new());
    };

    match resolve_ref(doc, contents_obj) {
        Object::Stream(stream) => decode_stream(stream),
        Object::Array(arr) => {
            let mut content = Vec::new();
            for item in arr {
                let stream = resolve_ref(doc, item).as_stream().map_err(|e| {
                    BackendError::Parse(format!("/Contents array item is not a stream: {e}"))
                })?;
                let bytes = decode_stream(stream)?;
                if !content.is_empty() {
                    content.push(b' ');
                }
                content.extend_from_slice(&bytes);
            }
            Ok(content)
        }
        _ => Err(BackendError::Parse(
            "/Contents is not a stream or array".to_string(),
        )),
    }
}
