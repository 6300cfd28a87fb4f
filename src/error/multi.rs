//! Partial-failure aggregation.

use std::fmt;

use super::types::LlmError;

/// Ordered, non-empty list of errors produced by one partially failed operation.
///
/// Renders as the member messages joined with `"; "`.
#[derive(Debug, Clone)]
pub struct MultiError {
    errors: Vec<LlmError>,
}

impl MultiError {
    /// Wrap the given errors, or `None` if there are none.
    pub fn from_errors(errors: Vec<LlmError>) -> Option<Self> {
        if errors.is_empty() {
            None
        } else {
            Some(Self { errors })
        }
    }

    pub fn errors(&self) -> &[LlmError] {
        &self.errors
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LlmError> {
        self.errors.iter()
    }

    pub fn into_errors(self) -> Vec<LlmError> {
        self.errors
    }
}

impl fmt::Display for MultiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.errors.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{err}")?;
        }
        Ok(())
    }
}

impl std::error::Error for MultiError {}

impl<'a> IntoIterator for &'a MultiError {
    type Item = &'a LlmError;
    type IntoIter = std::slice::Iter<'a, LlmError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}

impl IntoIterator for MultiError {
    type Item = LlmError;
    type IntoIter = std::vec::IntoIter<LlmError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_list_is_not_an_error() {
        assert!(MultiError::from_errors(Vec::new()).is_none());
    }

    #[test]
    fn display_joins_in_order() {
        let multi = MultiError::from_errors(vec![
            LlmError::InternalError("first".into()),
            LlmError::EmptyContent { index: 2 },
        ])
        .unwrap();
        assert_eq!(multi.len(), 2);
        assert_eq!(
            multi.to_string(),
            "Internal error: first; content item 2 is empty"
        );
    }
}
