//! Static type-compatibility checks for operator chains.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::definition::Operator;
use crate::typing::TypeDesc;

/// A 1-indexed position rendered as an English ordinal ("1st", "2nd", "11th").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ordinal(pub usize);

impl fmt::Display for Ordinal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let n = self.0;
        let suffix = match (n % 10, n % 100) {
            (_, 11..=13) => "th",
            (1, _) => "st",
            (2, _) => "nd",
            (3, _) => "rd",
            _ => "th",
        };
        write!(f, "{}{}", n, suffix)
    }
}

#[derive(Debug, Error)]
pub enum ChainError {
    #[error("type {actual} is not assignable to {expected}, the input type of the {position} operator")]
    InType {
        position: Ordinal,
        expected: TypeDesc,
        actual: TypeDesc,
    },

    #[error("output type {actual} of the {position} operator is not assignable to {expected}")]
    OutType {
        position: Ordinal,
        expected: TypeDesc,
        actual: TypeDesc,
    },
}

/// Verifies `input → op[0] → … → op[n-1] → output` is assignable at every link.
///
/// An empty chain always passes; callers compare `input` and `output` directly.
pub fn check_chain(
    input: &TypeDesc,
    output: &TypeDesc,
    operators: &[Arc<dyn Operator>],
) -> Result<(), ChainError> {
    let mut current = input;
    for (index, op) in operators.iter().enumerate() {
        if !current.assignable_to(op.input()) {
            return Err(ChainError::InType {
                position: Ordinal(index + 1),
                expected: op.input().clone(),
                actual: current.clone(),
            });
        }
        current = op.output();
    }
    if let Some(last) = operators.last() {
        if !last.output().assignable_to(output) {
            return Err(ChainError::OutType {
                position: Ordinal(operators.len()),
                expected: output.clone(),
                actual: last.output().clone(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::operator;

    fn passthrough(input: TypeDesc, output: TypeDesc) -> Arc<dyn Operator> {
        operator("convert", input, output, |_, v| Ok(v))
    }

    #[test]
    fn test_ordinals() {
        let rendered: Vec<String> = [1, 2, 3, 4, 11, 12, 13, 21, 22, 101, 111]
            .into_iter()
            .map(|n| Ordinal(n).to_string())
            .collect();
        assert_eq!(
            rendered,
            vec!["1st", "2nd", "3rd", "4th", "11th", "12th", "13th", "21st", "22nd", "101st", "111th"]
        );
    }

    #[test]
    fn test_valid_chain() {
        let ops = vec![
            passthrough(TypeDesc::string(), TypeDesc::int()),
            passthrough(TypeDesc::any(), TypeDesc::bool()),
        ];
        assert!(check_chain(&TypeDesc::string(), &TypeDesc::bool(), &ops).is_ok());
        assert!(check_chain(&TypeDesc::int(), &TypeDesc::string(), &[]).is_ok());
    }

    #[test]
    fn test_input_mismatch_position() {
        let ops = vec![
            passthrough(TypeDesc::string(), TypeDesc::int()),
            passthrough(TypeDesc::int(), TypeDesc::float()),
            passthrough(TypeDesc::string(), TypeDesc::bool()),
        ];
        let err = check_chain(&TypeDesc::string(), &TypeDesc::bool(), &ops).unwrap_err();
        match &err {
            ChainError::InType {
                position,
                expected,
                actual,
            } => {
                assert_eq!(*position, Ordinal(3));
                assert_eq!(expected.name(), "string");
                assert_eq!(actual.name(), "float");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.to_string().contains("3rd operator"));
    }

    #[test]
    fn test_first_step_mismatch() {
        let ops = vec![passthrough(TypeDesc::int(), TypeDesc::int())];
        let err = check_chain(&TypeDesc::string(), &TypeDesc::int(), &ops).unwrap_err();
        assert!(matches!(err, ChainError::InType { position: Ordinal(1), .. }));
    }

    #[test]
    fn test_output_mismatch() {
        let ops = vec![
            passthrough(TypeDesc::string(), TypeDesc::string()),
            passthrough(TypeDesc::string(), TypeDesc::json("User")),
        ];
        let err = check_chain(&TypeDesc::string(), &TypeDesc::int(), &ops).unwrap_err();
        assert!(matches!(err, ChainError::OutType { position: Ordinal(2), .. }));
        assert!(err.to_string().contains("2nd operator"));
    }
}
