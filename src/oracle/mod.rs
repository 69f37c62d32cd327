//! USD price lookups

pub mod http;

pub use http::*;

use async_trait::async_trait;
use rust_decimal::Decimal;
use crate::{
    errors::{ApyError, ApyResult},
    types::OracleNamespace,
};

#[async_trait]
pub trait PriceOracle: Send + Sync {
    async fn price(&self, namespace: OracleNamespace, id: &str) -> ApyResult<Decimal>;
}

/// A missing price only makes the affected pools undefined; any other
/// oracle failure is passed through.
pub fn optional_price(result: ApyResult<Decimal>) -> ApyResult<Option<Decimal>> {
    match result {
        Ok(price) if price > Decimal::ZERO => Ok(Some(price)),
        Ok(_) => Ok(None),
        Err(ApyError::PriceUnavailable { .. }) => Ok(None),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_optional_price() {
        assert_eq!(optional_price(Ok(dec!(1.25))).unwrap(), Some(dec!(1.25)));
        assert_eq!(optional_price(Ok(dec!(0))).unwrap(), None);

        let missing = Err(ApyError::PriceUnavailable {
            namespace: OracleNamespace::Lps,
            id: "gone".to_string(),
        });
        assert_eq!(optional_price(missing).unwrap(), None);

        let down = Err(ApyError::Oracle { message: "HTTP 502".to_string() });
        assert!(optional_price(down).is_err());
    }
}
