//! Limit-order construction.
//!
//! # Sizing
//!
//! | action | quantity_type | size                                  |
//! |--------|---------------|---------------------------------------|
//! | Buy    | Cash          | quote_size = quantity                 |
//! | Buy    | Units         | base_size = quantity                  |
//! | Sell   | Units         | base_size = quantity                  |
//! | Sell   | Cash          | base_size = quantity / reference      |
//!
//! Quote sizes and the limit price truncate to `quote_increment`, base sizes
//! to `base_increment`. Anything that truncates to zero is refused, as is
//! anything whose conversion or step count leaves `Decimal`'s range.

use rust_decimal::Decimal;
use tvhook_core::{
    ClientOrderId, OrderRequest, OrderSide, Price, QuantityType, Signal, Size, SizeKind,
    TimeInForce,
};
use tvhook_exchange::PrecisionSpec;

use crate::error::BuildError;

/// Stateless order builder.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrderBuilder;

impl OrderBuilder {
    /// Build a GTC limit order at the signal's reference price.
    pub fn build(signal: &Signal, precision: &PrecisionSpec) -> Result<OrderRequest, BuildError> {
        let (size_kind, raw_size) = match (signal.action, signal.quantity_type) {
            (_, QuantityType::Percent) => {
                return Err(BuildError::UnsupportedSizing(QuantityType::Percent))
            }
            (OrderSide::Buy, QuantityType::Cash) => {
                (SizeKind::QuoteSize, Size::new(signal.quantity))
            }
            (_, QuantityType::Units) => (SizeKind::BaseSize, Size::new(signal.quantity)),
            (OrderSide::Sell, QuantityType::Cash) => {
                let units = Size::new(signal.quantity)
                    .in_units_at(signal.reference_price)
                    .ok_or(BuildError::SizeOutOfRange {
                        field: SizeKind::BaseSize.field_name(),
                        value: signal.quantity,
                    })?;
                (SizeKind::BaseSize, units)
            }
        };

        let size_increment = match size_kind {
            SizeKind::QuoteSize => precision.quote_increment,
            SizeKind::BaseSize => precision.base_increment,
        };
        let size = raw_size
            .quantize(size_increment)
            .ok_or(BuildError::SizeOutOfRange {
                field: size_kind.field_name(),
                value: raw_size.inner(),
            })?;
        if !size.is_positive() {
            return Err(BuildError::SizeBelowIncrement {
                field: size_kind.field_name(),
                value: raw_size.inner(),
                increment: size_increment,
            });
        }

        let limit_price: Price = signal
            .reference_price
            .quantize(precision.quote_increment)
            .ok_or(BuildError::SizeOutOfRange {
                field: "limit_price",
                value: signal.reference_price.inner(),
            })?;
        if !limit_price.is_positive() {
            return Err(BuildError::SizeBelowIncrement {
                field: "limit_price",
                value: signal.reference_price.inner(),
                increment: precision.quote_increment,
            });
        }

        Ok(OrderRequest {
            client_order_id: ClientOrderId::new(),
            pair: signal.pair.clone(),
            side: signal.action,
            size_kind,
            size,
            limit_price,
            time_in_force: TimeInForce::GoodTilCancelled,
        })
    }

    /// Size before quantization, for logging and invariants.
    pub fn unquantized_size(signal: &Signal) -> Option<Decimal> {
        match (signal.action, signal.quantity_type) {
            (_, QuantityType::Percent) => None,
            (OrderSide::Sell, QuantityType::Cash) => signal
                .quantity
                .checked_div(signal.reference_price.inner()),
            _ => Some(signal.quantity),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tvhook_core::TradingPair;

    fn btc_precision() -> PrecisionSpec {
        PrecisionSpec::new(dec!(0.00000001), dec!(0.01))
    }

    fn signal(action: OrderSide, quantity_type: QuantityType, quantity: Decimal, close: Decimal) -> Signal {
        Signal {
            symbol: "BTCUSD".to_string(),
            pair: TradingPair::new("BTC", "USD"),
            action,
            quantity_type,
            quantity,
            reference_price: Price::new(close),
        }
    }

    #[test]
    fn test_buy_cash_uses_quote_size() {
        let s = signal(OrderSide::Buy, QuantityType::Cash, dec!(100), dec!(50000.00));
        let order = OrderBuilder::build(&s, &btc_precision()).unwrap();

        assert_eq!(order.pair.to_string(), "BTC-USD");
        assert_eq!(order.side, OrderSide::Buy);
        assert_eq!(order.size_kind, SizeKind::QuoteSize);
        assert_eq!(order.size.inner().to_string(), "100.00");
        assert_eq!(order.limit_price.inner().to_string(), "50000.00");
        assert_eq!(order.time_in_force, TimeInForce::GoodTilCancelled);
    }

    #[test]
    fn test_buy_cash_size_independent_of_price() {
        for close in [dec!(0.5), dec!(1), dec!(123.45), dec!(50000), dec!(99999.99)] {
            let s = signal(OrderSide::Buy, QuantityType::Cash, dec!(100), close);
            assert_eq!(OrderBuilder::unquantized_size(&s), Some(dec!(100)));
            let order = OrderBuilder::build(&s, &btc_precision()).unwrap();
            assert_eq!(order.size.inner(), dec!(100));
        }
    }

    #[test]
    fn test_sell_cash_converts_to_base_units() {
        let s = signal(OrderSide::Sell, QuantityType::Cash, dec!(100), dec!(50000.00));
        assert_eq!(
            OrderBuilder::unquantized_size(&s),
            Some(dec!(100) / dec!(50000.00))
        );
        let order = OrderBuilder::build(&s, &btc_precision()).unwrap();
        assert_eq!(order.size_kind, SizeKind::BaseSize);
        assert_eq!(order.size.inner().to_string(), "0.00200000");
    }

    #[test]
    fn test_sell_cash_truncates_not_rounds() {
        // 100 / 30000 = 0.0033333...
        let s = signal(OrderSide::Sell, QuantityType::Cash, dec!(100), dec!(30000));
        let order = OrderBuilder::build(&s, &btc_precision()).unwrap();
        assert_eq!(order.size.inner(), dec!(0.00333333));
    }

    #[test]
    fn test_units_use_base_size() {
        for action in [OrderSide::Buy, OrderSide::Sell] {
            let s = signal(action, QuantityType::Units, dec!(0.123456789), dec!(50000));
            let order = OrderBuilder::build(&s, &btc_precision()).unwrap();
            assert_eq!(order.size_kind, SizeKind::BaseSize);
            assert_eq!(order.size.inner(), dec!(0.12345678));
        }
    }

    #[test]
    fn test_limit_price_truncated_to_quote_increment() {
        let s = signal(OrderSide::Buy, QuantityType::Units, dec!(1), dec!(50000.129));
        let order = OrderBuilder::build(&s, &btc_precision()).unwrap();
        assert_eq!(order.limit_price.inner(), dec!(50000.12));
    }

    #[test]
    fn test_percent_fails_closed() {
        let s = signal(OrderSide::Buy, QuantityType::Percent, dec!(50), dec!(50000));
        assert_eq!(
            OrderBuilder::build(&s, &btc_precision()),
            Err(BuildError::UnsupportedSizing(QuantityType::Percent))
        );
        assert_eq!(OrderBuilder::unquantized_size(&s), None);
    }

    #[test]
    fn test_size_below_increment() {
        let s = signal(OrderSide::Buy, QuantityType::Units, dec!(0.000000001), dec!(50000));
        let err = OrderBuilder::build(&s, &btc_precision()).unwrap_err();
        assert!(matches!(
            err,
            BuildError::SizeBelowIncrement { field: "base_size", .. }
        ));

        let s = signal(OrderSide::Buy, QuantityType::Cash, dec!(0.001), dec!(50000));
        let err = OrderBuilder::build(&s, &btc_precision()).unwrap_err();
        assert!(matches!(
            err,
            BuildError::SizeBelowIncrement { field: "quote_size", .. }
        ));
    }

    #[test]
    fn test_price_below_increment() {
        let s = signal(OrderSide::Buy, QuantityType::Units, dec!(1), dec!(0.001));
        let err = OrderBuilder::build(&s, &btc_precision()).unwrap_err();
        assert!(matches!(
            err,
            BuildError::SizeBelowIncrement { field: "limit_price", .. }
        ));
    }

    #[test]
    fn test_quantization_idempotent_on_built_orders() {
        let s = signal(OrderSide::Sell, QuantityType::Cash, dec!(777.77), dec!(31337.337));
        let order = OrderBuilder::build(&s, &btc_precision()).unwrap();
        assert_eq!(order.size.quantize(dec!(0.00000001)), Some(order.size));
        assert_eq!(order.limit_price.quantize(dec!(0.01)), Some(order.limit_price));
    }

    #[test]
    fn test_out_of_range_sizes_are_refused() {
        let huge: Decimal = "1000000000000000000000".parse().unwrap();
        let s = signal(OrderSide::Buy, QuantityType::Units, huge, dec!(50000));
        assert_eq!(
            OrderBuilder::build(&s, &btc_precision()),
            Err(BuildError::SizeOutOfRange {
                field: "base_size",
                value: huge,
            })
        );

        let cash: Decimal = "79000000000000000000000000".parse().unwrap();
        let s = signal(OrderSide::Sell, QuantityType::Cash, cash, dec!(0.0001));
        assert!(matches!(
            OrderBuilder::build(&s, &btc_precision()),
            Err(BuildError::SizeOutOfRange { field: "base_size", .. })
        ));
        assert_eq!(OrderBuilder::unquantized_size(&s), None);
    }
}
