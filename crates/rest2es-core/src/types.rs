use serde_json::{Map, Value};

/// A normalized document ready to be indexed.
pub type Document = Map<String, Value>;

/// Field carrying an explicit document identifier.
pub const ID_FIELD: &str = "_id";

/// Look up a dotted field path (`properties.time`, `tags.0`) in a document.
///
/// Numeric segments index into arrays. Returns `None` when any segment is missing.
pub fn get_path<'a>(doc: &'a Document, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let first = segments.next()?;
    let mut current = doc.get(first)?;

    for segment in segments {
        current = match current {
            Value::Object(obj) => obj.get(segment)?,
            Value::Array(arr) => arr.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }

    Some(current)
}
