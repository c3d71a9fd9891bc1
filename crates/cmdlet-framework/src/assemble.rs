//! # Request Assembly
//!
//! Requests are built from bound parameters with one rule: a field is copied
//! into the request only when the caller bound it. Flat fields are handled by
//! `Option` itself; nested sub-structures use [`Group`].
//!
//! A [`Group`] starts empty. Each bound member is written into it and marks
//! it populated. When every member was unbound the group finishes as `None`
//! and is omitted from the request, even if some of its own members are
//! required by the remote API. Groups nest: an inner group's `finish()` is
//! just another optional source for the outer group.
//!
//! ```rust
//! use cmdlet_framework::assemble::Group;
//!
//! #[derive(Debug, Default, PartialEq)]
//! struct Destination { to: Option<Vec<String>>, cc: Option<Vec<String>> }
//!
//! let bound: Option<Vec<String>> = Some(vec!["a@example.com".into()]);
//! let dest = Group::<Destination>::new()
//!     .field(bound, |d, v| d.to = Some(v))
//!     .field(None, |d, v| d.cc = Some(v))
//!     .finish();
//! assert_eq!(dest.unwrap().cc, None);
//!
//! let empty = Group::<Destination>::new()
//!     .field(None::<Vec<String>>, |d, v| d.to = Some(v))
//!     .finish();
//! assert!(empty.is_none());
//! ```

/// Optional sub-structure under construction.
#[derive(Debug)]
pub struct Group<T> {
    value: T,
    populated: bool,
}

impl<T: Default> Default for Group<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Default> Group<T> {
    pub fn new() -> Self {
        Self {
            value: T::default(),
            populated: false,
        }
    }
}

impl<T> Group<T> {
    /// Writes `source` into the group when it is bound.
    pub fn field<V>(mut self, source: Option<V>, assign: impl FnOnce(&mut T, V)) -> Self {
        if let Some(v) = source {
            assign(&mut self.value, v);
            self.populated = true;
        }
        self
    }

    pub fn is_populated(&self) -> bool {
        self.populated
    }

    /// `Some` only if at least one member was bound.
    pub fn finish(self) -> Option<T> {
        self.populated.then_some(self.value)
    }
}
