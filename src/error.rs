pub type BuildResult<T> = Result<T, BuildError>;

#[derive(thiserror::Error, Debug)]
pub enum BuildError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl BuildError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefix_is_stable() {
        assert!(
            BuildError::validation("x")
                .to_string()
                .contains("validation error:")
        );
    }

    #[test]
    fn other_preserves_source() {
        let base = std::io::Error::other("boom");
        let err = BuildError::Other(anyhow::Error::new(base));
        assert!(err.to_string().contains("boom"));
    }
}
