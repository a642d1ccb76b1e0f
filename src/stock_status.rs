use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use utoipa::ToSchema;

/// Derived stock health for an inventory item.
///
/// Every endpoint that reports a status goes through [`derive_stock_status`];
/// the thresholds live here and nowhere else.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum StockStatusLevel {
    Critical,
    Low,
    Adequate,
    Overstocked,
}

const CRITICAL_DAYS_OF_SUPPLY: Decimal = Decimal::from_parts(7, 0, 0, false, 0);
const LOW_DAYS_OF_SUPPLY: Decimal = Decimal::from_parts(30, 0, 0, false, 0);
const OVERSTOCK_DAYS_OF_SUPPLY: Decimal = Decimal::from_parts(180, 0, 0, false, 0);

/// Days of stock remaining at the current sales velocity, or `None` when the
/// item is not selling (velocity zero or negative).
pub fn days_of_supply(current_stock: i32, sales_velocity: Decimal) -> Option<Decimal> {
    if sales_velocity <= Decimal::ZERO {
        return None;
    }
    Some(Decimal::from(current_stock) / sales_velocity)
}

/// Pure derivation of the stock status from (stock, reorder point, velocity).
pub fn derive_stock_status(
    current_stock: i32,
    reorder_point: i32,
    sales_velocity: Decimal,
) -> StockStatusLevel {
    if current_stock <= 0 {
        return StockStatusLevel::Critical;
    }

    match days_of_supply(current_stock, sales_velocity) {
        Some(days) => {
            if days <= CRITICAL_DAYS_OF_SUPPLY {
                StockStatusLevel::Critical
            } else if days <= LOW_DAYS_OF_SUPPLY || current_stock <= reorder_point {
                StockStatusLevel::Low
            } else if days > OVERSTOCK_DAYS_OF_SUPPLY && current_stock > reorder_point {
                StockStatusLevel::Overstocked
            } else {
                StockStatusLevel::Adequate
            }
        }
        // Not selling: only the reorder-point rules apply
        None => {
            if current_stock <= reorder_point {
                StockStatusLevel::Low
            } else {
                StockStatusLevel::Adequate
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn zero_stock_is_critical() {
        assert_eq!(
            derive_stock_status(0, 10, dec!(5)),
            StockStatusLevel::Critical
        );
        assert_eq!(
            derive_stock_status(0, 0, Decimal::ZERO),
            StockStatusLevel::Critical
        );
    }

    #[test]
    fn seven_days_of_supply_is_critical() {
        // 35 units at 5/day = 7 days
        assert_eq!(
            derive_stock_status(35, 0, dec!(5)),
            StockStatusLevel::Critical
        );
    }

    #[test]
    fn thirty_days_of_supply_is_low() {
        // 150 units at 5/day = 30 days
        assert_eq!(derive_stock_status(150, 0, dec!(5)), StockStatusLevel::Low);
    }

    #[test]
    fn below_reorder_point_is_low_even_with_supply() {
        // 200 units at 5/day = 40 days, but reorder point is 250
        assert_eq!(
            derive_stock_status(200, 250, dec!(5)),
            StockStatusLevel::Low
        );
    }

    #[test]
    fn half_year_of_supply_is_overstocked() {
        // 1000 units at 5/day = 200 days
        assert_eq!(
            derive_stock_status(1000, 10, dec!(5)),
            StockStatusLevel::Overstocked
        );
    }

    #[test]
    fn healthy_band_is_adequate() {
        // 300 units at 5/day = 60 days
        assert_eq!(
            derive_stock_status(300, 50, dec!(5)),
            StockStatusLevel::Adequate
        );
    }

    #[test]
    fn non_selling_item_uses_reorder_point_only() {
        assert_eq!(
            derive_stock_status(5, 10, Decimal::ZERO),
            StockStatusLevel::Low
        );
        assert_eq!(
            derive_stock_status(50, 10, Decimal::ZERO),
            StockStatusLevel::Adequate
        );
    }

    #[test]
    fn derivation_is_deterministic() {
        for _ in 0..3 {
            assert_eq!(
                derive_stock_status(42, 20, dec!(1.5)),
                derive_stock_status(42, 20, dec!(1.5))
            );
        }
    }
}
