//! Payment details and per-method validation.
//!
//! [`PaymentDetails`] is what the shopper types on the payment step. It is
//! never stored: validation turns it into a [`PaymentMethod`], which keeps
//! only what the order and the review page need (the card's last four
//! digits, the UPI id, the wallet provider).

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a set of payment details was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PaymentError {
    #[error("card number must be 16 digits")]
    CardNumber,
    #[error("cardholder name must be at least 2 characters")]
    HolderName,
    #[error("expiry must be in MM/YY format")]
    ExpiryFormat,
    #[error("card has expired")]
    Expired,
    #[error("CVV must be 3 or 4 digits")]
    Cvv,
    #[error("UPI id must contain @")]
    UpiId,
    #[error("select a wallet")]
    WalletNotSelected,
}

/// Supported wallet providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Wallet {
    #[serde(rename = "paytm")]
    Paytm,
    #[serde(rename = "phonepe")]
    PhonePe,
    #[serde(rename = "amazon_pay")]
    AmazonPay,
    #[serde(rename = "mobikwik")]
    Mobikwik,
}

impl Wallet {
    pub const ALL: [Self; 4] = [Self::Paytm, Self::PhonePe, Self::AmazonPay, Self::Mobikwik];

    /// Form value of the provider.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Paytm => "paytm",
            Self::PhonePe => "phonepe",
            Self::AmazonPay => "amazon_pay",
            Self::Mobikwik => "mobikwik",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Paytm => "Paytm",
            Self::PhonePe => "PhonePe",
            Self::AmazonPay => "Amazon Pay",
            Self::Mobikwik => "MobiKwik",
        }
    }

    /// Look up a provider by its form value.
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|wallet| wallet.code() == code)
    }
}

/// Raw card fields from the payment form.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct CardDetails {
    pub number: String,
    pub holder_name: String,
    /// `MM/YY`.
    pub expiry: String,
    pub cvv: String,
}

impl std::fmt::Debug for CardDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CardDetails")
            .field("number", &"[REDACTED]")
            .field("holder_name", &self.holder_name)
            .field("expiry", &self.expiry)
            .field("cvv", &"[REDACTED]")
            .finish()
    }
}

/// Payment details typed on the payment step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentDetails {
    Card(CardDetails),
    Upi { vpa: String },
    Wallet { provider: Option<Wallet> },
    CashOnDelivery,
}

impl PaymentDetails {
    /// Validate the details for their method.
    ///
    /// `today` decides whether a card expiry is in the past; the current
    /// month itself is still valid.
    ///
    /// # Errors
    ///
    /// Returns the first rule the details break.
    pub fn validate(&self, today: NaiveDate) -> Result<PaymentMethod, PaymentError> {
        match self {
            Self::Card(card) => {
                let digits = card_digits(&card.number).ok_or(PaymentError::CardNumber)?;
                if card.holder_name.trim().chars().count() < 2 {
                    return Err(PaymentError::HolderName);
                }
                validate_expiry(&card.expiry, today)?;
                let cvv = card.cvv.trim();
                if !(3..=4).contains(&cvv.len()) || !cvv.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(PaymentError::Cvv);
                }
                let last4 = digits.get(12..).unwrap_or_default().to_owned();
                Ok(PaymentMethod::Card { last4 })
            }
            Self::Upi { vpa } => {
                let vpa = vpa.trim();
                if vpa.contains('@') {
                    Ok(PaymentMethod::Upi {
                        vpa: vpa.to_owned(),
                    })
                } else {
                    Err(PaymentError::UpiId)
                }
            }
            Self::Wallet { provider } => provider
                .map(|provider| PaymentMethod::Wallet { provider })
                .ok_or(PaymentError::WalletNotSelected),
            Self::CashOnDelivery => Ok(PaymentMethod::CashOnDelivery),
        }
    }

    #[must_use]
    pub fn is_valid(&self, today: NaiveDate) -> bool {
        self.validate(today).is_ok()
    }
}

/// Strip spaces and dashes; `Some` only for exactly 16 ASCII digits.
fn card_digits(number: &str) -> Option<String> {
    let digits: String = number
        .chars()
        .filter(|c| !matches!(c, ' ' | '-'))
        .collect();
    (digits.len() == 16 && digits.bytes().all(|b| b.is_ascii_digit())).then_some(digits)
}

/// Check an `MM/YY` expiry against `today`.
///
/// # Errors
///
/// [`PaymentError::ExpiryFormat`] for anything that is not a real month,
/// [`PaymentError::Expired`] for a month strictly before today's.
pub fn validate_expiry(expiry: &str, today: NaiveDate) -> Result<(), PaymentError> {
    let (month, year) = expiry
        .trim()
        .split_once('/')
        .ok_or(PaymentError::ExpiryFormat)?;
    if month.len() != 2 || year.len() != 2 {
        return Err(PaymentError::ExpiryFormat);
    }
    let month: u32 = month.parse().map_err(|_| PaymentError::ExpiryFormat)?;
    let year: i32 = year.parse().map_err(|_| PaymentError::ExpiryFormat)?;
    if !(1..=12).contains(&month) {
        return Err(PaymentError::ExpiryFormat);
    }

    if (2000 + year, month) < (today.year(), today.month()) {
        return Err(PaymentError::Expired);
    }
    Ok(())
}

/// The validated payment method that survives past the payment step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PaymentMethod {
    Card { last4: String },
    Upi { vpa: String },
    Wallet { provider: Wallet },
    #[serde(rename = "cod")]
    CashOnDelivery,
}

impl PaymentMethod {
    #[must_use]
    pub const fn is_cod(&self) -> bool {
        matches!(self, Self::CashOnDelivery)
    }

    /// Human-readable description for the review and success pages.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Card { last4 } => format!("Card ending in {last4}"),
            Self::Upi { vpa } => format!("UPI ({vpa})"),
            Self::Wallet { provider } => format!("{} wallet", provider.label()),
            Self::CashOnDelivery => "Cash on Delivery".to_owned(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 14).unwrap()
    }

    fn card() -> CardDetails {
        CardDetails {
            number: "4111 1111 1111 1234".to_owned(),
            holder_name: "Asha Rao".to_owned(),
            expiry: "12/27".to_owned(),
            cvv: "123".to_owned(),
        }
    }

    #[test]
    fn test_valid_card_keeps_last_four() {
        let method = PaymentDetails::Card(card()).validate(today()).unwrap();
        assert_eq!(
            method,
            PaymentMethod::Card {
                last4: "1234".to_owned()
            }
        );
    }

    #[test]
    fn test_card_number_rules() {
        let mut details = card();
        details.number = "4111-1111-1111-1111".to_owned();
        assert!(PaymentDetails::Card(details.clone()).is_valid(today()));

        details.number = "4111 1111 1111 111".to_owned();
        assert_eq!(
            PaymentDetails::Card(details.clone()).validate(today()),
            Err(PaymentError::CardNumber)
        );

        details.number = "4111 1111 1111 111a".to_owned();
        assert_eq!(
            PaymentDetails::Card(details).validate(today()),
            Err(PaymentError::CardNumber)
        );
    }

    #[test]
    fn test_holder_name_needs_two_chars() {
        let mut details = card();
        details.holder_name = " A ".to_owned();
        assert_eq!(
            PaymentDetails::Card(details).validate(today()),
            Err(PaymentError::HolderName)
        );
    }

    #[test]
    fn test_cvv_three_or_four_digits() {
        let cases = [
            ("12", false),
            ("123", true),
            ("1234", true),
            ("12345", false),
            ("12a", false),
        ];
        for (cvv, ok) in cases {
            let mut details = card();
            details.cvv = cvv.to_owned();
            assert_eq!(PaymentDetails::Card(details).is_valid(today()), ok, "cvv {cvv}");
        }
    }

    #[test]
    fn test_expiry_current_month_accepted() {
        assert_eq!(validate_expiry("10/26", today()), Ok(()));
        assert_eq!(validate_expiry("01/27", today()), Ok(()));
    }

    #[test]
    fn test_expiry_past_rejected() {
        assert_eq!(validate_expiry("09/26", today()), Err(PaymentError::Expired));
        assert_eq!(validate_expiry("12/25", today()), Err(PaymentError::Expired));
    }

    #[test]
    fn test_expiry_format() {
        for bad in ["1026", "13/26", "00/26", "1/26", "10/2026", "ab/cd", ""] {
            assert_eq!(
                validate_expiry(bad, today()),
                Err(PaymentError::ExpiryFormat),
                "expiry {bad:?}"
            );
        }
    }

    #[test]
    fn test_upi_requires_at() {
        assert!(
            PaymentDetails::Upi {
                vpa: "asha@okbank".to_owned()
            }
            .is_valid(today())
        );
        assert_eq!(
            PaymentDetails::Upi {
                vpa: "asha".to_owned()
            }
            .validate(today()),
            Err(PaymentError::UpiId)
        );
    }

    #[test]
    fn test_wallet_requires_selection() {
        assert_eq!(
            PaymentDetails::Wallet { provider: None }.validate(today()),
            Err(PaymentError::WalletNotSelected)
        );
        assert_eq!(
            PaymentDetails::Wallet {
                provider: Some(Wallet::PhonePe)
            }
            .validate(today()),
            Ok(PaymentMethod::Wallet {
                provider: Wallet::PhonePe
            })
        );
    }

    #[test]
    fn test_cod_always_valid() {
        assert!(PaymentDetails::CashOnDelivery.is_valid(today()));
    }

    #[test]
    fn test_card_debug_redacts_number() {
        let debug = format!("{:?}", card());
        assert!(!debug.contains("1234"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_method_wire_format() {
        let json = serde_json::to_value(PaymentMethod::Wallet {
            provider: Wallet::AmazonPay,
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({"type": "wallet", "provider": "amazon_pay"}));
        let json = serde_json::to_value(PaymentMethod::CashOnDelivery).unwrap();
        assert_eq!(json, serde_json::json!({"type": "cod"}));
    }
}
