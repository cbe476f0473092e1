use std::cell::RefCell;

use indexmap::IndexMap;

use crate::error::{ObjectError, OResult};

/// `(object number, generation number)`.
pub type ObjectId = (u32, u16);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringFormat {
    Literal,
    Hex,
}

#[derive(Debug, Clone)]
pub enum Object {
    Null,
    Boolean(bool),
    Integer(i64),
    Real(f64),
    String(Vec<u8>, StringFormat),
    Name(Vec<u8>),
    Array(Vec<Object>),
    Dictionary(Dictionary),
    Stream(Stream),
    Reference(ObjectId),
}

impl Object {
    pub fn as_bool(&self) -> OResult<bool> {
        match self {
            Object::Boolean(b) => Ok(*b),
            _ => Err(ObjectError::TypeMismatch((0, 0))),
        }
    }

    pub fn as_i64(&self) -> OResult<i64> {
        match self {
            Object::Integer(i) => Ok(*i),
            Object::Real(r) => Ok(*r as i64),
            _ => Err(ObjectError::TypeMismatch((0, 0))),
        }
    }

    pub fn as_f64(&self) -> OResult<f64> {
        match self {
            Object::Integer(i) => Ok(*i as f64),
            Object::Real(r) => Ok(*r),
            _ => Err(ObjectError::TypeMismatch((0, 0))),
        }
    }

    pub fn as_name(&self) -> OResult<&[u8]> {
        match self {
            Object::Name(n) => Ok(n),
            _ => Err(ObjectError::TypeMismatch((0, 0))),
        }
    }

    pub fn as_name_str(&self) -> OResult<&str> {
        self.as_name()
            .and_then(|n| std::str::from_utf8(n).map_err(|_| ObjectError::TypeMismatch((0, 0))))
    }

    pub fn as_str(&self) -> OResult<&[u8]> {
        match self {
            Object::String(s, _) => Ok(s),
            _ => Err(ObjectError::TypeMismatch((0, 0))),
        }
    }

    pub fn as_array(&self) -> OResult<&[Object]> {
        match self {
            Object::Array(a) => Ok(a),
            _ => Err(ObjectError::TypeMismatch((0, 0))),
        }
    }

    pub fn as_array_mut(&mut self) -> OResult<&mut Vec<Object>> {
        match self {
            Object::Array(a) => Ok(a),
            _ => Err(ObjectError::TypeMismatch((0, 0))),
        }
    }

    pub fn as_dict(&self) -> OResult<&Dictionary> {
        match self {
            Object::Dictionary(d) => Ok(d),
            Object::Stream(s) => Ok(&s.dict),
            _ => Err(ObjectError::TypeMismatch((0, 0))),
        }
    }

    pub fn as_dict_mut(&mut self) -> OResult<&mut Dictionary> {
        match self {
            Object::Dictionary(d) => Ok(d),
            Object::Stream(s) => Ok(&mut s.dict),
            _ => Err(ObjectError::TypeMismatch((0, 0))),
        }
    }

    pub fn as_stream(&self) -> OResult<&Stream> {
        match self {
            Object::Stream(s) => Ok(s),
            _ => Err(ObjectError::TypeMismatch((0, 0))),
        }
    }

    pub fn as_stream_mut(&mut self) -> OResult<&mut Stream> {
        match self {
            Object::Stream(s) => Ok(s),
            _ => Err(ObjectError::TypeMismatch((0, 0))),
        }
    }

    pub fn as_reference(&self) -> OResult<ObjectId> {
        match self {
            Object::Reference(id) => Ok(*id),
            _ => Err(ObjectError::TypeMismatch((0, 0))),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Object::Null)
    }
}

impl From<bool> for Object {
    fn from(v: bool) -> Self {
        Object::Boolean(v)
    }
}
impl From<i64> for Object {
    fn from(v: i64) -> Self {
        Object::Integer(v)
    }
}
impl From<f64> for Object {
    fn from(v: f64) -> Self {
        Object::Real(v)
    }
}

/// Strips a single leading `/` so lookups by `"Key"` and `"/Key"` coincide,
/// per the canonicalized-key invariant on dictionary access.
fn canonical_key(key: &[u8]) -> &[u8] {
    key.strip_prefix(b"/").unwrap_or(key)
}

/// An insertion-ordered PDF dictionary. Order is preserved purely so
/// round-tripping and diagnostics stay stable; lookups are by canonical
/// (slash-stripped) key.
#[derive(Debug, Clone, Default)]
pub struct Dictionary(IndexMap<Vec<u8>, Object>);

impl Dictionary {
    pub fn new() -> Self {
        Dictionary(IndexMap::new())
    }

    pub fn get(&self, key: &[u8]) -> OResult<&Object> {
        self.0
            .get(canonical_key(key))
            .ok_or(ObjectError::TypeMismatch((0, 0)))
    }

    pub fn set<K, V>(&mut self, key: K, value: V)
    where
        K: Into<Vec<u8>>,
        V: Into<Object>,
    {
        let key: Vec<u8> = key.into();
        let key = canonical_key(&key).to_vec();
        self.0.insert(key, value.into());
    }

    pub fn remove(&mut self, key: &[u8]) -> Option<Object> {
        self.0.shift_remove(canonical_key(key))
    }

    pub fn has_key(&self, key: &[u8]) -> bool {
        self.0.contains_key(canonical_key(key))
    }

    /// True if `/Type` (or `/Subtype` as a fallback) equals `name`.
    pub fn has_type(&self, name: &[u8]) -> bool {
        self.get(b"Type")
            .or_else(|_| self.get(b"Subtype"))
            .and_then(Object::as_name)
            .map(|n| n == name)
            .unwrap_or(false)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Vec<u8>, &Object)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A stream object: its dictionary plus undecoded bytes. Decoded bytes are
/// memoized lazily in a `RefCell` so `decompressed_content` can take `&self`
/// the way call sites that only hold a shared `&Stream` expect.
#[derive(Debug, Clone)]
pub struct Stream {
    pub dict: Dictionary,
    pub raw: Vec<u8>,
    pub start_position: Option<usize>,
    decoded: RefCell<Option<Vec<u8>>>,
}

impl Stream {
    pub fn new(dict: Dictionary, raw: Vec<u8>) -> Self {
        Stream {
            dict,
            raw,
            start_position: None,
            decoded: RefCell::new(None),
        }
    }

    pub fn set_content(&mut self, raw: Vec<u8>) {
        self.raw = raw;
        self.decoded = RefCell::new(None);
    }

    pub fn content(&self) -> &[u8] {
        &self.raw
    }

    /// Returns the filter-decoded bytes, decoding and caching on first call.
    /// Decode failures degrade to the raw bytes (logged by the filter
    /// pipeline) rather than propagating.
    pub fn decompressed_content(&self) -> Vec<u8> {
        if let Some(cached) = self.decoded.borrow().as_ref() {
            return cached.clone();
        }
        let decoded = crate::filters::decode_stream(&self.raw, &self.dict);
        *self.decoded.borrow_mut() = Some(decoded.clone());
        decoded
    }
}
