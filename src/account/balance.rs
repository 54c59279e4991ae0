use crate::errors::BalanceErr;
use rust_decimal::Decimal;

/// Represents current account balance. Never negative.
#[derive(Debug, Clone, Default)]
pub struct Balance {
    available: Decimal,
}

impl Balance {
    pub fn try_deposit(&mut self, amount: &Decimal) -> Result<(), BalanceErr> {
        self.available = self
            .available
            .checked_add(*amount)
            .ok_or(BalanceErr::Overflow)?;
        Ok(())
    }

    pub fn try_withdraw(&mut self, amount: &Decimal) -> Result<(), BalanceErr> {
        if self.available < *amount {
            return Err(BalanceErr::NotEnoughAvailableFunds);
        }

        self.available -= amount;
        Ok(())
    }

    /// check that a deposit of `amount` would succeed without applying it
    pub fn can_accept(&self, amount: &Decimal) -> Result<(), BalanceErr> {
        self.available
            .checked_add(*amount)
            .map(|_| ())
            .ok_or(BalanceErr::Overflow)
    }
}

impl Balance {
    pub fn available(&self) -> Decimal {
        self.available
    }
}

#[cfg(test)]
mod test {
    use super::Balance;
    use crate::errors::BalanceErr;
    use rust_decimal::Decimal;

    #[test]
    fn withdraw_more_than_available_keeps_balance() {
        let mut b = Balance::default();
        b.try_deposit(&Decimal::new(100, 0)).unwrap();

        let e = b.try_withdraw(&Decimal::new(10001, 2)).unwrap_err();
        assert_eq!(e, BalanceErr::NotEnoughAvailableFunds);
        assert_eq!(b.available(), Decimal::new(100, 0));

        b.try_withdraw(&Decimal::new(100, 0)).unwrap();
        assert_eq!(b.available(), Decimal::ZERO);
    }

    #[test]
    fn overflow_is_rejected() {
        let mut b = Balance::default();
        b.try_deposit(&Decimal::MAX).unwrap();

        assert_eq!(b.can_accept(&Decimal::ONE), Err(BalanceErr::Overflow));
        assert_eq!(b.try_deposit(&Decimal::ONE), Err(BalanceErr::Overflow));
        assert_eq!(b.available(), Decimal::MAX);
    }
}
