use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;

/// A ticket bought for an event at a place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PurchaseRecord {
    pub user_token: String,
    pub place_id: i32,
    pub event_time: Option<DateTime<Utc>>,
    // Filled with the insertion time by the store when absent
    pub purchase_time: Option<DateTime<Utc>>,
    pub cost: i32,
}

/// A donation made to a fundraising collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DonationRecord {
    pub user_token: String,
    pub collection_id: i32,
    pub donation_time: Option<DateTime<Utc>>,
    pub amount: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Purchase,
    Donation,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Purchase => "purchase",
            RecordKind::Donation => "donation",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Producers that cannot fill a timestamp sometimes send the zero time,
/// `0001-01-01T00:00:00Z`, which counts as absent.
pub fn is_zero_time(time: &DateTime<Utc>) -> bool {
    NaiveDate::from_ymd_opt(1, 1, 1)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .is_some_and(|zero| time.naive_utc() == zero)
}

fn is_set(time: &Option<DateTime<Utc>>) -> bool {
    time.as_ref().is_some_and(|t| !is_zero_time(t))
}

/// Optional timestamps holding the zero time are treated as absent.
fn non_zero(time: Option<DateTime<Utc>>) -> Option<DateTime<Utc>> {
    time.filter(|t| !is_zero_time(t))
}

impl PurchaseRecord {
    pub fn is_valid(&self) -> bool {
        self.invalid_fields().is_empty()
    }

    /// Names of the required fields holding a default value.
    pub fn invalid_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.user_token.is_empty() {
            fields.push("user_token");
        }
        if self.place_id == 0 {
            fields.push("place_id");
        }
        if !is_set(&self.event_time) {
            fields.push("event_time");
        }
        if self.cost == 0 {
            fields.push("cost");
        }
        fields
    }

    pub fn purchase_time(&self) -> Option<DateTime<Utc>> {
        non_zero(self.purchase_time)
    }
}

impl DonationRecord {
    pub fn is_valid(&self) -> bool {
        self.invalid_fields().is_empty()
    }

    /// Names of the required fields holding a default value.
    pub fn invalid_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.user_token.is_empty() {
            fields.push("user_token");
        }
        if self.collection_id == 0 {
            fields.push("collection_id");
        }
        if self.amount == 0 {
            fields.push("amount");
        }
        fields
    }

    pub fn donation_time(&self) -> Option<DateTime<Utc>> {
        non_zero(self.donation_time)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;

    fn valid_purchase() -> PurchaseRecord {
        PurchaseRecord {
            user_token: "u1".to_string(),
            place_id: 42,
            event_time: Some(Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap()),
            purchase_time: None,
            cost: 500,
        }
    }

    fn valid_donation() -> DonationRecord {
        DonationRecord {
            user_token: "u2".to_string(),
            collection_id: 7,
            donation_time: None,
            amount: 100,
        }
    }

    #[test]
    fn test_purchase_missing_fields_decode_to_defaults() {
        let purchase: PurchaseRecord =
            serde_json::from_value(json!({"place_id": 42, "cost": 500, "extra": true})).unwrap();

        assert_eq!(purchase.user_token, "");
        assert_eq!(purchase.event_time, None);
        assert_eq!(purchase.purchase_time, None);
        assert!(!purchase.is_valid());
        assert_eq!(purchase.invalid_fields(), vec!["user_token", "event_time"]);
    }

    #[test]
    fn test_purchase_decodes_rfc3339_timestamps() {
        let purchase: PurchaseRecord = serde_json::from_value(json!({
            "user_token": "u1",
            "place_id": 42,
            "event_time": "2024-01-01T12:00:00+02:00",
            "purchase_time": "2023-12-24T08:30:00Z",
            "cost": 500,
        }))
        .unwrap();

        assert_eq!(
            purchase.event_time,
            Some(Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap())
        );
        assert_eq!(
            purchase.purchase_time(),
            Some(Utc.with_ymd_and_hms(2023, 12, 24, 8, 30, 0).unwrap())
        );
        assert!(purchase.is_valid());
    }

    #[test]
    fn test_purchase_type_mismatch_is_an_error() {
        let res = serde_json::from_value::<PurchaseRecord>(json!({"place_id": "42"}));
        assert!(res.is_err());

        let res =
            serde_json::from_value::<PurchaseRecord>(json!({"place_id": 1, "cost": 1u64 << 40}));
        assert!(res.is_err());

        let res = serde_json::from_value::<PurchaseRecord>(json!({"event_time": "yesterday"}));
        assert!(res.is_err());
    }

    #[test]
    fn test_purchase_validation() {
        assert!(valid_purchase().is_valid());

        let purchase = PurchaseRecord {
            place_id: 0,
            ..valid_purchase()
        };
        assert_eq!(purchase.invalid_fields(), vec!["place_id"]);

        let purchase = PurchaseRecord {
            cost: 0,
            ..valid_purchase()
        };
        assert_eq!(purchase.invalid_fields(), vec!["cost"]);

        let purchase = PurchaseRecord {
            event_time: None,
            ..valid_purchase()
        };
        assert_eq!(purchase.invalid_fields(), vec!["event_time"]);

        // Negative amounts are not the zero value, so they pass
        let purchase = PurchaseRecord {
            cost: -1,
            ..valid_purchase()
        };
        assert!(purchase.is_valid());
    }

    #[test]
    fn test_zero_time_counts_as_missing() {
        let purchase: PurchaseRecord = serde_json::from_value(json!({
            "user_token": "u1",
            "place_id": 42,
            "event_time": "0001-01-01T00:00:00Z",
            "purchase_time": "0001-01-01T00:00:00Z",
            "cost": 500,
        }))
        .unwrap();

        assert_eq!(purchase.invalid_fields(), vec!["event_time"]);
        assert_eq!(purchase.purchase_time(), None);

        let donation: DonationRecord = serde_json::from_value(json!({
            "user_token": "u2",
            "collection_id": 7,
            "donation_time": "0001-01-01T00:00:00Z",
            "amount": 100,
        }))
        .unwrap();

        assert!(donation.is_valid());
        assert_eq!(donation.donation_time(), None);
    }

    #[test]
    fn test_donation_validation() {
        assert!(valid_donation().is_valid());

        let donation: DonationRecord = serde_json::from_value(json!({"collection_id": 7})).unwrap();
        assert_eq!(donation.invalid_fields(), vec!["user_token", "amount"]);

        let donation = DonationRecord {
            collection_id: 0,
            ..valid_donation()
        };
        assert!(!donation.is_valid());
    }
}
