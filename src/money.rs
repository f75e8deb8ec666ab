// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Money is stored as integer cents so SQL aggregates stay exact; the rest of
//! the crate works in `Decimal`.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use crate::error::{QuantumError, QuantumResult};

pub const SCALE: u32 = 2;

pub fn from_cents(cents: i64) -> Decimal {
    Decimal::new(cents, SCALE)
}

pub fn to_cents(amount: Decimal) -> QuantumResult<i64> {
    if amount.normalize().scale() > SCALE {
        return Err(QuantumError::validation(format!(
            "amount {} has more than {} decimal places",
            amount, SCALE
        )));
    }
    amount
        .checked_mul(Decimal::ONE_HUNDRED)
        .and_then(|cents| cents.to_i64())
        .ok_or_else(|| QuantumError::validation(format!("amount {} is out of range", amount)))
}

pub fn to_cents_opt(amount: Option<Decimal>) -> QuantumResult<Option<i64>> {
    amount.map(to_cents).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn cents_keep_two_places() {
        assert_eq!(to_cents(dec!(12.34)).unwrap(), 1234);
        assert_eq!(to_cents(dec!(-0.5)).unwrap(), -50);
        assert_eq!(to_cents(dec!(7.100)).unwrap(), 710);
        assert_eq!(from_cents(-1999).to_string(), "-19.99");
    }

    #[test]
    fn sub_cent_amounts_are_rejected() {
        let err = to_cents(dec!(0.001)).unwrap_err();
        assert!(matches!(err, QuantumError::Validation(_)));
    }
}
