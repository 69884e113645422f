use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::money::Money;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum PaymentMethod {
    Visa,
    Mastercard,
    Amex,
    Discover,
    Cash,
    Debit,
    Credit,
    Check,
    ApplePay,
    GooglePay,
    PayPal,
    Other(String),
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentMethod::Visa => write!(f, "Visa"),
            PaymentMethod::Mastercard => write!(f, "Mastercard"),
            PaymentMethod::Amex => write!(f, "Amex"),
            PaymentMethod::Discover => write!(f, "Discover"),
            PaymentMethod::Cash => write!(f, "Cash"),
            PaymentMethod::Debit => write!(f, "Debit"),
            PaymentMethod::Credit => write!(f, "Credit"),
            PaymentMethod::Check => write!(f, "Check"),
            PaymentMethod::ApplePay => write!(f, "Apple Pay"),
            PaymentMethod::GooglePay => write!(f, "Google Pay"),
            PaymentMethod::PayPal => write!(f, "PayPal"),
            PaymentMethod::Other(s) => write!(f, "{s}"),
        }
    }
}

impl PaymentMethod {
    /// Map a tender keyword as printed on a receipt.
    pub fn from_keyword(keyword: &str) -> Self {
        let key: String = keyword
            .chars()
            .filter(|c| c.is_alphanumeric())
            .flat_map(char::to_lowercase)
            .collect();
        match key.as_str() {
            "visa" => PaymentMethod::Visa,
            "mastercard" | "mc" => PaymentMethod::Mastercard,
            "amex" | "americanexpress" => PaymentMethod::Amex,
            "discover" => PaymentMethod::Discover,
            "cash" => PaymentMethod::Cash,
            "debit" => PaymentMethod::Debit,
            "credit" => PaymentMethod::Credit,
            "check" | "cheque" => PaymentMethod::Check,
            "applepay" => PaymentMethod::ApplePay,
            "googlepay" | "gpay" => PaymentMethod::GooglePay,
            "paypal" => PaymentMethod::PayPal,
            _ => PaymentMethod::Other(keyword.trim().to_string()),
        }
    }
}

/// The persisted receipt as the caller stores it. The engine never writes
/// this directly; changes only arrive through an explicit review merge.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReceiptRecord {
    pub title: Option<String>,
    pub store: Option<String>,
    pub price: Option<Money>,
    pub tax_amount: Option<Money>,
    pub total_amount: Option<Money>,
    pub purchase_date: Option<NaiveDate>,
    pub warranty_info: Option<String>,
    pub payment_method: Option<PaymentMethod>,
    pub receipt_number: Option<String>,
    pub store_address: Option<String>,
    pub store_phone: Option<String>,
    pub store_website: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payment_method_display() {
        assert_eq!(PaymentMethod::Visa.to_string(), "Visa");
        assert_eq!(PaymentMethod::ApplePay.to_string(), "Apple Pay");
        assert_eq!(PaymentMethod::Other("Zelle".into()).to_string(), "Zelle");
    }

    #[test]
    fn payment_method_from_keyword() {
        assert_eq!(PaymentMethod::from_keyword("VISA"), PaymentMethod::Visa);
        assert_eq!(PaymentMethod::from_keyword("Master Card"), PaymentMethod::Mastercard);
        assert_eq!(PaymentMethod::from_keyword("American Express"), PaymentMethod::Amex);
        assert_eq!(PaymentMethod::from_keyword("cheque"), PaymentMethod::Check);
        assert_eq!(PaymentMethod::from_keyword("Apple Pay"), PaymentMethod::ApplePay);
        assert_eq!(
            PaymentMethod::from_keyword("Zelle"),
            PaymentMethod::Other("Zelle".into())
        );
    }

    #[test]
    fn empty_record_has_no_values() {
        let record = ReceiptRecord::default();
        assert!(record.store.is_none());
        assert!(record.total_amount.is_none());
    }
}
