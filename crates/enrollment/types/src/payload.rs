//! Per-transition payload supplied by the caller

use crate::PaymentReference;
use serde::{Deserialize, Serialize};

/// Extra data accompanying a transition request.
///
/// `remarks` may annotate any edge; `payment` is only meaningful on
/// the payment-submission edge and is ignored elsewhere.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment: Option<PaymentReference>,
}

impl TransitionPayload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_remarks(mut self, remarks: impl Into<String>) -> Self {
        self.remarks = Some(remarks.into());
        self
    }

    pub fn with_payment(mut self, payment: PaymentReference) -> Self {
        self.payment = Some(payment);
        self
    }
}
