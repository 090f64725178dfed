use serde_json::{Map, Value};

use crate::types::{DonationRecord, PurchaseRecord, RecordKind};

/// Optional explicit discriminant. Payloads without it are classified by shape.
pub const TYPE_FIELD: &str = "type";

// Checked in order, the first key present wins.
const SHAPE_KEYS: [(&str, RecordKind); 2] = [
    ("place_id", RecordKind::Purchase),
    ("collection_id", RecordKind::Donation),
];

/// A payload parsed once into a JSON object, ready to be classified and decoded.
#[derive(Debug, Clone, PartialEq)]
pub struct Payload(Map<String, Value>);

#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    Purchase(PurchaseRecord),
    Donation(DonationRecord),
}

impl Payload {
    /// Fails when the bytes are not a well-formed JSON object.
    pub fn parse(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes).map(Payload)
    }

    pub fn classify(&self) -> Option<RecordKind> {
        self.declared_kind().or_else(|| self.shape_kind())
    }

    fn declared_kind(&self) -> Option<RecordKind> {
        match self.0.get(TYPE_FIELD)?.as_str()? {
            "purchase" => Some(RecordKind::Purchase),
            "donation" => Some(RecordKind::Donation),
            _ => None,
        }
    }

    fn shape_kind(&self) -> Option<RecordKind> {
        SHAPE_KEYS
            .iter()
            .find(|(key, _)| self.0.contains_key(*key))
            .map(|(_, kind)| *kind)
    }

    pub fn decode(self, kind: RecordKind) -> Result<Record, serde_json::Error> {
        let value = Value::Object(self.0);
        match kind {
            RecordKind::Purchase => serde_json::from_value(value).map(Record::Purchase),
            RecordKind::Donation => serde_json::from_value(value).map(Record::Donation),
        }
    }
}

impl Record {
    pub fn kind(&self) -> RecordKind {
        match self {
            Record::Purchase(_) => RecordKind::Purchase,
            Record::Donation(_) => RecordKind::Donation,
        }
    }

    pub fn invalid_fields(&self) -> Vec<&'static str> {
        match self {
            Record::Purchase(purchase) => purchase.invalid_fields(),
            Record::Donation(donation) => donation.invalid_fields(),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.invalid_fields().is_empty()
    }
}
