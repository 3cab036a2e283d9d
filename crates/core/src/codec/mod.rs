//! Wire forms of currencies and money.
//!
//! - `json` - minimal and full JSON maps
//! - `text` - single-line strings such as `"12.30 PLN"`
//!
//! Decoded money keeps every digit of the wire amount unless a rounding mode
//! is in effect: an amount finer than the currency's nominal scale decodes
//! into an overriding-scale currency, as arithmetic would have produced it.

pub mod json;
pub mod text;

use rust_decimal::Decimal;

use mintage_shared::RoundingMode;

use crate::context;
use crate::currency::Currency;
use crate::error::MoneyResult;
use crate::money::Money;

pub use json::{
    CurrencyRecord, currency_from_json, currency_to_full, currency_to_minimal, money_from_json, money_to_full,
    money_to_minimal,
};
pub use text::{currency_to_string, money_to_string, parse_currency, parse_money};

/// Money from a resolved currency and a wire amount.
fn decoded_money(currency: Currency, amount: Decimal, rounding: Option<RoundingMode>) -> MoneyResult<Money> {
    let rounding = rounding.or_else(context::rounding_mode);
    match currency.scale() {
        Some(scale) if rounding.is_none() && amount.scale() > scale => {
            Money::with_currency(currency.with_scale(Some(amount.scale())), amount, None)
        }
        _ => Money::with_currency(currency, amount, rounding),
    }
}
