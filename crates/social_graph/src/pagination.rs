//! Offset windows over ordered relations.
//!
//! A [`Page`] carries optional `first` (start) and `last` (end) offsets. Both
//! arrive as GraphQL numbers and are truncated toward zero. The window is the
//! half-open range `first..last` with these rules:
//!
//! - `first` absent means 0. A `first` past the end is an error.
//! - `last` absent, `0`, or past the end means "up to the end". In
//!   particular `last: 0` is not an empty window.
//! - `first > last` gives an empty window.

use crate::error::{ResolveError, ResolveResult};
use serde::{Deserialize, Serialize};

/// The `Pagination` input object.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Page {
    #[serde(default)]
    pub first: Option<f64>,
    #[serde(default)]
    pub last: Option<f64>,
}

impl Page {
    pub fn new(first: Option<f64>, last: Option<f64>) -> Self {
        Self { first, last }
    }

    pub fn first(first: f64) -> Self {
        Self::new(Some(first), None)
    }

    pub fn last(last: f64) -> Self {
        Self::new(None, Some(last))
    }

    /// Computes the index range this page selects from `len` items.
    pub fn window(&self, len: usize) -> ResolveResult<std::ops::Range<usize>> {
        let from = match self.first {
            Some(first) => offset("first", first)?,
            None => 0,
        };
        if from > len {
            return Err(ResolveError::OutOfRange { offset: from, len });
        }

        let to = match self.last {
            Some(last) => match offset("last", last)? {
                0 => len,
                to => to.min(len),
            },
            None => len,
        };

        // An inverted range selects nothing.
        Ok(from..to.max(from))
    }
}

fn offset(name: &str, value: f64) -> ResolveResult<usize> {
    if !value.is_finite() || value < 0.0 {
        return Err(ResolveError::invalid_argument(
            name,
            format!("expected a non-negative offset, got {value}"),
        ));
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let offset = value.trunc() as usize;
    Ok(offset)
}

/// Applies an optional page to `items`.
pub fn paginate<'a, T>(items: &'a [T], page: Option<&Page>) -> ResolveResult<&'a [T]> {
    match page {
        Some(page) => Ok(&items[page.window(items.len())?]),
        None => Ok(items),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRIENDS: [&str; 3] = ["0x01", "0x03", "0x04"];

    fn page(first: Option<f64>, last: Option<f64>) -> Page {
        Page::new(first, last)
    }

    #[test]
    fn test_no_page_returns_everything() {
        assert_eq!(paginate(&FRIENDS, None).unwrap(), &FRIENDS);
        assert_eq!(paginate(&FRIENDS, Some(&Page::default())).unwrap(), &FRIENDS);
    }

    #[test]
    fn test_first_skips() {
        assert_eq!(
            paginate(&FRIENDS, Some(&Page::first(1.0))).unwrap(),
            &["0x03", "0x04"]
        );
        assert!(paginate(&FRIENDS, Some(&Page::first(3.0))).unwrap().is_empty());
    }

    #[test]
    fn test_first_past_end_fails() {
        let err = paginate(&FRIENDS, Some(&Page::first(5.0))).unwrap_err();
        assert_eq!(err, ResolveError::OutOfRange { offset: 5, len: 3 });
        assert_eq!(err.code(), "OUT_OF_RANGE");
    }

    #[test]
    fn test_last_zero_means_unbounded() {
        assert_eq!(paginate(&FRIENDS, Some(&Page::last(0.0))).unwrap(), &FRIENDS);
        assert_eq!(
            paginate(&FRIENDS, Some(&Page::last(0.0))).unwrap(),
            paginate(&FRIENDS, None).unwrap()
        );
    }

    #[test]
    fn test_last_bounds() {
        assert_eq!(paginate(&FRIENDS, Some(&Page::last(2.0))).unwrap(), &["0x01", "0x03"]);
        assert_eq!(paginate(&FRIENDS, Some(&Page::last(10.0))).unwrap(), &FRIENDS);
        assert_eq!(
            paginate(&FRIENDS, Some(&page(Some(1.0), Some(2.0)))).unwrap(),
            &["0x03"]
        );
    }

    #[test]
    fn test_inverted_window_is_empty() {
        assert!(paginate(&FRIENDS, Some(&page(Some(2.0), Some(1.0))))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_offsets_are_truncated() {
        assert_eq!(
            paginate(&FRIENDS, Some(&Page::first(1.9))).unwrap(),
            &["0x03", "0x04"]
        );
        assert_eq!(paginate(&FRIENDS, Some(&Page::last(1.5))).unwrap(), &["0x01"]);
    }

    #[test]
    fn test_empty_sequence() {
        let empty: [&str; 0] = [];
        assert!(paginate(&empty, Some(&Page::first(0.0))).unwrap().is_empty());
        assert!(paginate(&empty, Some(&Page::first(1.0))).is_err());
    }

    #[test]
    fn test_negative_offsets_rejected() {
        let err = paginate(&FRIENDS, Some(&Page::first(-1.0))).unwrap_err();
        assert_eq!(err.code(), "BAD_USER_INPUT");

        let err = paginate(&FRIENDS, Some(&Page::last(f64::NAN))).unwrap_err();
        assert!(matches!(err, ResolveError::InvalidArgument { ref name, .. } if name == "last"));
    }

    #[test]
    fn test_page_from_json() {
        let page: Page = serde_json::from_value(serde_json::json!({"first": 1})).unwrap();
        assert_eq!(page, Page::first(1.0));

        let page: Page = serde_json::from_value(serde_json::json!({"last": null})).unwrap();
        assert_eq!(page, Page::default());
    }
}
