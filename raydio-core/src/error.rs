use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Not found: {0}")]
    NotFound(String),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::NotFound("livestream #4".to_string());
        assert_eq!(err.to_string(), "Not found: livestream #4");

        let err: Error = serde_json::from_str::<u32>("{").unwrap_err().into();
        assert!(err.to_string().starts_with("Serialization error:"));
    }
}
