use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AmortizationError {
    #[error("Invalid loan terms: {field} - {reason}")]
    InvalidLoanTerms { field: &'static str, reason: String },
}

impl AmortizationError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        AmortizationError::InvalidLoanTerms {
            field,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AmortizationError>;

#[cfg(test)]
mod tests {
    use super::AmortizationError;
    use test_log::test;

    #[test]
    fn test_invalid_terms_message() {
        let err = AmortizationError::invalid("years", "must be at least 1, got 0");
        assert_eq!(
            err.to_string(),
            "Invalid loan terms: years - must be at least 1, got 0"
        );
    }
}
