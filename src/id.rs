//! Composed identifiers.
//!
//! Child resources such as listeners and repository bindings are identified
//! by their parent's id and their own, joined into a single string that the
//! runtime stores as the resource id:
//!
//! ```
//! use controlplane_provider::id::{compose_id, decompose_id, SLASH};
//!
//! let id = compose_id(&["sidecar-1", "listener-7"], SLASH);
//! assert_eq!(id, "sidecar-1/listener-7");
//!
//! let parts = decompose_id(&id, SLASH, 2).unwrap();
//! assert_eq!(parts, vec!["sidecar-1", "listener-7"]);
//! ```
//!
//! No escaping is performed. A component that itself contains the separator
//! produces an id that decodes into the wrong components (or fails the arity
//! check), so separators must be chosen so they never occur in the ids the
//! control plane hands out.

use crate::error::ProviderError;

/// Separator used by most hierarchical resources.
pub const SLASH: &str = "/";

/// Separator used by resources whose components are known to be slash-free
/// but may contain other punctuation.
pub const DASH: &str = "-";

/// Join `components` with `separator`.
pub fn compose_id<S: AsRef<str>>(components: &[S], separator: &str) -> String {
    components
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(separator)
}

/// Split `id` by `separator`, requiring exactly `expected` components.
///
/// Empty components are kept in place, so `"a//c"` decodes into three parts.
/// An empty id decodes into zero parts when `expected` is zero, and into a
/// single empty part otherwise.
pub fn decompose_id(
    id: &str,
    separator: &str,
    expected: usize,
) -> Result<Vec<String>, ProviderError> {
    let parts: Vec<String> = if id.is_empty() && expected == 0 {
        Vec::new()
    } else {
        id.split(separator).map(str::to_string).collect()
    };
    if parts.len() != expected {
        return Err(ProviderError::Structural(format!(
            "unexpected format for id '{}': found {} part(s) separated by '{}', expected {}",
            id,
            parts.len(),
            separator,
            expected
        )));
    }
    Ok(parts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_zero_components() {
        let empty: [&str; 0] = [];
        let id = compose_id(&empty, SLASH);
        assert_eq!(id, "");
        assert!(decompose_id(&id, SLASH, 0).unwrap().is_empty());
        assert_eq!(decompose_id("", SLASH, 1).unwrap(), vec![""]);
        assert!(decompose_id("a", SLASH, 0).is_err());
    }

    #[test]
    fn test_compose_id() {
        assert_eq!(compose_id(&["a", "b"], SLASH), "a/b");
        assert_eq!(compose_id(&["a", "b", "c"], DASH), "a-b-c");
        assert_eq!(compose_id(&["only"], SLASH), "only");
        assert_eq!(compose_id(&[String::from("x"), String::new()], SLASH), "x/");
    }

    #[test]
    fn test_decompose_arity_guard() {
        let err = decompose_id("a/b/c", SLASH, 2).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Structural);
        assert!(err.to_string().contains("found 3 part(s)"));
        assert!(err.to_string().contains("expected 2"));

        assert!(decompose_id("abc", SLASH, 2).is_err());
    }

    #[test]
    fn test_decompose_keeps_empty_components() {
        assert_eq!(decompose_id("a//c", SLASH, 3).unwrap(), vec!["a", "", "c"]);
        assert_eq!(decompose_id("/b", SLASH, 2).unwrap(), vec!["", "b"]);
        assert_eq!(decompose_id("", SLASH, 1).unwrap(), vec![""]);
    }

    #[test]
    fn test_separator_inside_component_is_ambiguous() {
        // Known gap: nothing escapes the separator.
        let id = compose_id(&["sidecar/eu", "listener"], SLASH);
        assert!(decompose_id(&id, SLASH, 2).is_err());
        assert_eq!(
            decompose_id(&id, SLASH, 3).unwrap(),
            vec!["sidecar", "eu", "listener"]
        );
    }
}
