use serde::{Deserialize, Serialize};

use crate::num::Amount;
use crate::org::Party;
use crate::pay::{Advance, Instructions, Terms};
use crate::tax::{Context, Normalizers, Object, ObjectMut};
use crate::validation::{Errors, Validate, nested, validate_struct};

/// How and when the document should be paid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PaymentDetails {
    /// Who receives the payment, when not the supplier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payee: Option<Party>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terms: Option<Terms>,
    /// Payments already made.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub advances: Vec<Advance>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<Instructions>,
}

impl PaymentDetails {
    pub fn normalize(&mut self, n: &Normalizers<'_>) {
        if let Some(p) = &mut self.payee {
            p.normalize(n);
        }
        if let Some(t) = &mut self.terms {
            t.normalize(n);
        }
        for a in &mut self.advances {
            a.normalize(n);
        }
        if let Some(i) = &mut self.instructions {
            i.normalize(n);
        }
        n.each(ObjectMut::PaymentDetails(self));
    }

    /// Work out advance and instalment amounts from the payable total.
    /// Returns the sum of the advances, if any.
    pub(crate) fn calculate(&mut self, payable: Amount) -> Option<Amount> {
        if let Some(t) = &mut self.terms {
            t.calculate_due_dates(payable);
        }
        if self.advances.is_empty() {
            return None;
        }
        let mut sum = Amount::zero(payable.exp());
        for a in &mut self.advances {
            a.calculate_from(payable);
            sum = sum + a.amount;
        }
        Some(sum)
    }

    pub(crate) fn invert(&mut self) {
        for a in &mut self.advances {
            a.amount = a.amount.invert();
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &PaymentDetails::default()
    }
}

impl Validate for PaymentDetails {
    fn validate_with(&self, ctx: &Context<'_>) -> Result<(), Errors> {
        validate_struct()
            .field("payee", &self.payee, vec![nested(ctx)])
            .field("terms", &self.terms, vec![nested(ctx)])
            .field("advances", &self.advances, vec![nested(ctx)])
            .field("instructions", &self.instructions, vec![nested(ctx)])
            .with(ctx.validate(Object::PaymentDetails(self)))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advances_summed() {
        let mut pd = PaymentDetails {
            advances: vec![Advance::new("Deposit", "100".parse().unwrap()), {
                let mut a = Advance::new("Second", Amount::zero(2));
                a.percent = Some("10%".parse().unwrap());
                a
            }],
            ..Default::default()
        };
        let sum = pd.calculate("1210.00".parse().unwrap()).unwrap();
        assert_eq!(pd.advances[1].amount.to_string(), "121.00");
        assert_eq!(sum.to_string(), "221.00");
    }

    #[test]
    fn no_advances() {
        let mut pd = PaymentDetails::default();
        assert!(pd.calculate("10.00".parse().unwrap()).is_none());
        assert!(pd.is_empty());
    }
}
