//! Parsing canonical strings back into trees.

use super::{Primitive, PrimitiveSet, Tree};
use crate::error::GpError;

impl<P: Primitive> Tree<P> {
    /// Parses a canonical string such as `(AND D0 (NOT D1))`.
    ///
    /// Parentheses only delimit tokens; the shape is rebuilt from each
    /// primitive's arity. Tokens are resolved through `set`, falling back
    /// to [`Primitive::from_literal`] for constants.
    pub fn parse(text: &str, set: &PrimitiveSet<P>) -> Result<Self, GpError> {
        let spaced = text.replace(['(', ')'], " ");
        let primitives = spaced
            .split_whitespace()
            .map(|token| set.resolve(token))
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_preorder(primitives)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Bool, Math};

    #[test]
    fn test_round_trip() {
        let set = Bool::set(3);
        for text in [
            "D0",
            "(NOT D2)",
            "(AND D0 D1)",
            "(IF (AND D0 D1) (OR D2 (NOT D0)) D1)",
        ] {
            assert_eq!(Tree::parse(text, &set).unwrap().to_string(), text);
        }
    }

    #[test]
    fn test_whitespace_is_normalised() {
        let set = Bool::set(2);
        let t = Tree::parse("  ( AND   D0\n(NOT D1 ) )", &set).unwrap();
        assert_eq!(t.to_string(), "(AND D0 (NOT D1))");
    }

    #[test]
    fn test_constants() {
        let t = Tree::parse("(* x -0.5)", &Math::set()).unwrap();
        assert_eq!(t.to_string(), "(* x -0.5)");
        assert!((t.evaluate(&(), &4.0) + 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_unknown_token() {
        let err = Tree::parse("(AND D0 XOR)", &Bool::set(2)).unwrap_err();
        assert_eq!(err, GpError::UnknownToken { token: "XOR".into() });
    }

    #[test]
    fn test_arity_mismatch() {
        let set = Bool::set(2);
        assert!(matches!(
            Tree::parse("(AND D0)", &set),
            Err(GpError::MalformedGenome(_))
        ));
        assert!(matches!(
            Tree::parse("(NOT D0 D1)", &set),
            Err(GpError::MalformedGenome(_))
        ));
        assert!(matches!(Tree::parse("", &set), Err(GpError::MalformedGenome(_))));
    }
}
