//! Registry data model.
//!
//! The upstream API is loose about optional fields: any of them may be absent
//! or `null`, so everything except `id` is optional and decoding never fails on
//! a missing field.

use serde::{Deserialize, Deserializer};

/// A full tender record as returned by `GET /tenders/{id}`.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TenderRecord {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    /// Public identifier (`UA-2024-05-01-000001-a`).
    #[serde(rename = "tenderID", default)]
    pub tender_id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub items: Vec<LineItem>,
    #[serde(default)]
    pub procuring_entity: Option<ProcuringEntity>,
    #[serde(default)]
    pub value: Option<MonetaryValue>,
    #[serde(default)]
    pub tender_period: Option<Period>,
}

impl TenderRecord {
    /// Raw CPV codes of all line items, in item order.
    pub fn cpv_codes(&self) -> impl Iterator<Item = &str> {
        self.items
            .iter()
            .filter_map(|item| item.classification.as_ref())
            .filter_map(|c| c.id.as_deref())
    }

    pub fn region(&self) -> Option<&str> {
        self.procuring_entity
            .as_ref()
            .and_then(|e| e.address.as_ref())
            .and_then(|a| a.region.as_deref())
    }

    pub fn deadline(&self) -> Option<&str> {
        self.tender_period
            .as_ref()
            .and_then(|p| p.end_date.as_deref())
    }
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct LineItem {
    #[serde(default)]
    pub classification: Option<Classification>,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct Classification {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub scheme: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct ProcuringEntity {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub identifier: Option<EntityIdentifier>,
    #[serde(default)]
    pub address: Option<Address>,
}

/// Tax identifier of the procuring entity (ЄДРПОУ).
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct EntityIdentifier {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub scheme: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub locality: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct MonetaryValue {
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(default)]
    pub currency: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Period {
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
}

/// Entry of the paginated `GET /tenders` listing.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TenderSummary {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default)]
    pub date_modified: Option<String>,
}

/// Opaque pagination token returned by the registry.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PageCursor(pub String);

impl PageCursor {
    /// Build a cursor from the wire value. The registry emits either a string or
    /// a float timestamp; empty values mean "no more pages".
    pub fn from_wire(v: &serde_json::Value) -> Option<Self> {
        let s = match v {
            serde_json::Value::String(s) => s.trim().to_string(),
            serde_json::Value::Number(n) => n.to_string(),
            _ => return None,
        };
        if s.is_empty() {
            None
        } else {
            Some(Self(s))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// One page of the listing.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TenderPage {
    pub data: Vec<TenderSummary>,
    pub next: Option<PageCursor>,
}

impl<'de> Deserialize<'de> for TenderPage {
    fn deserialize<D: Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct Wire {
            #[serde(default, deserialize_with = "null_as_default")]
            data: Vec<TenderSummary>,
            #[serde(default)]
            next_page: Option<NextPage>,
        }

        #[derive(Deserialize)]
        struct NextPage {
            #[serde(default)]
            offset: Option<serde_json::Value>,
        }

        let wire = Wire::deserialize(d)?;
        let next = wire
            .next_page
            .and_then(|p| p.offset)
            .and_then(|v| PageCursor::from_wire(&v));

        Ok(Self {
            data: wire.data,
            next,
        })
    }
}

/// Envelope of `GET /tenders/{id}`.
#[derive(Clone, Debug, Deserialize)]
pub struct TenderEnvelope {
    pub data: TenderRecord,
}

fn null_as_default<'de, D, T>(d: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(d)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_detail_envelope_with_nulls() {
        let json = r#"{
          "data": {
            "id": "abc123",
            "tenderID": "UA-2024-05-01-000001-a",
            "title": "Молоко",
            "status": "active.tendering",
            "items": [
              {"classification": {"id": "15510000-6", "scheme": "ДК021"}},
              {"classification": null}
            ],
            "procuringEntity": {
              "name": "Школа №1",
              "identifier": {"id": "12345678", "scheme": "UA-EDR"},
              "address": {"region": "Черкаська область", "locality": null}
            },
            "value": {"amount": 1500.5, "currency": "UAH"},
            "tenderPeriod": {"endDate": "2024-05-01T10:00:00Z"}
          }
        }"#;

        let env: TenderEnvelope = serde_json::from_str(json).unwrap();
        let t = env.data;
        assert_eq!(t.id, "abc123");
        assert_eq!(t.cpv_codes().collect::<Vec<_>>(), vec!["15510000-6"]);
        assert_eq!(t.region(), Some("Черкаська область"));
        assert_eq!(t.deadline(), Some("2024-05-01T10:00:00Z"));
        assert_eq!(t.value.unwrap().amount, Some(1500.5));
    }

    #[test]
    fn decodes_sparse_record() {
        let t: TenderRecord = serde_json::from_str(r#"{"id": "x", "items": null}"#).unwrap();
        assert!(t.items.is_empty());
        assert!(t.region().is_none());
        assert!(t.deadline().is_none());
    }

    #[test]
    fn page_cursor_accepts_string_and_number() {
        let page: TenderPage = serde_json::from_str(
            r#"{"data": [{"id": "a", "dateModified": "2024-05-01T10:00:00Z"}],
                "next_page": {"offset": "2024-05-01T09:00:00.000+03:00", "path": "/x"}}"#,
        )
        .unwrap();
        assert_eq!(page.data.len(), 1);
        assert_eq!(
            page.next.as_ref().map(|c| c.as_str()),
            Some("2024-05-01T09:00:00.000+03:00")
        );

        let page: TenderPage =
            serde_json::from_str(r#"{"data": [], "next_page": {"offset": 1714550400.5}}"#)
                .unwrap();
        assert_eq!(page.next, Some(PageCursor("1714550400.5".to_string())));
    }

    #[test]
    fn empty_or_missing_cursor_ends_pagination() {
        let page: TenderPage =
            serde_json::from_str(r#"{"data": [], "next_page": {"offset": ""}}"#).unwrap();
        assert!(page.next.is_none());

        let page: TenderPage = serde_json::from_str(r#"{"data": null}"#).unwrap();
        assert!(page.next.is_none());
        assert!(page.data.is_empty());
    }
}
