use thiserror::Error;

/// A provider lookup that failed for one symbol.
#[derive(Debug, Error)]
#[error("Error fetching data for {symbol}: {cause}")]
pub struct FetchError {
    pub symbol: String,
    pub cause: FetchCause,
}

impl FetchError {
    pub fn new(symbol: &str, cause: FetchCause) -> Self {
        FetchError {
            symbol: symbol.to_string(),
            cause,
        }
    }
}

#[derive(Debug, Error)]
pub enum FetchCause {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("API rate limit exceeded (try again later)")]
    RateLimited,

    #[error("invalid ticker symbol")]
    NotFound,

    #[error("provider answered with HTTP {0}")]
    Status(u16),

    /// Error description reported by the provider itself.
    #[error("{0}")]
    Provider(String),

    #[error("unexpected provider response: {0}")]
    Decode(String),
}

#[derive(Debug, Error)]
pub enum PortfolioError {
    #[error("No valid tickers entered")]
    NoValidTickers,

    #[error("Could not fetch data for any of the {} tickers", .0.len())]
    AllFailed(Vec<FetchError>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_error_message_names_symbol_and_cause() {
        let err = FetchError::new("BADTICKER", FetchCause::Provider("Quote not found for symbol: BADTICKER".into()));
        assert_eq!(
            err.to_string(),
            "Error fetching data for BADTICKER: Quote not found for symbol: BADTICKER"
        );
    }

    #[test]
    fn rate_limit_message_is_human_readable() {
        let err = FetchError::new("AAPL", FetchCause::RateLimited);
        assert!(err.to_string().contains("AAPL"));
        assert!(err.to_string().contains("rate limit"));
    }
}
