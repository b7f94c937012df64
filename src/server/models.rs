//! Persisted entities, their relation summaries and the repository filters.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

/// A farm. `ponds` is filled in by the repository, not read from the `farms` row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct Farm {
    pub id: i64,
    pub name: String,
    #[sqlx(skip)]
    #[serde(default)]
    pub ponds: Vec<PondSummary>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<NaiveDateTime>,
}

/// A pond belonging to a farm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct Pond {
    pub id: i64,
    pub name: String,
    pub farm_id: i64,
    #[sqlx(skip)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub farm: Option<FarmSummary>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<NaiveDateTime>,
}

/// Farm as embedded in a pond, without its own pond list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct FarmSummary {
    pub id: i64,
    pub name: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Pond as embedded in a farm, without the farm back-reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct PondSummary {
    pub id: i64,
    pub name: String,
    pub farm_id: i64,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl From<&Farm> for FarmSummary {
    fn from(farm: &Farm) -> Self {
        Self {
            id: farm.id,
            name: farm.name.clone(),
            created_at: farm.created_at,
            updated_at: farm.updated_at,
        }
    }
}

impl From<&Pond> for PondSummary {
    fn from(pond: &Pond) -> Self {
        Self {
            id: pond.id,
            name: pond.name.clone(),
            farm_id: pond.farm_id,
            created_at: pond.created_at,
            updated_at: pond.updated_at,
        }
    }
}

/// One traffic counter row, keyed by path, client, status and referer.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct RecordApi {
    pub id: i64,
    pub request_path: String,
    pub client_ip: String,
    pub status: i32,
    pub referer: String,
    pub count: i64,
    #[serde(skip)]
    pub created_at: NaiveDateTime,
    #[serde(skip)]
    pub updated_at: NaiveDateTime,
}

impl RecordApi {
    pub fn key(&self) -> RecordApiKey {
        RecordApiKey {
            request_path: self.request_path.clone(),
            client_ip: self.client_ip.clone(),
            status: self.status,
            referer: self.referer.clone(),
        }
    }
}

/// Values for a farm insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewFarm {
    pub name: String,
}

/// Values for a pond insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPond {
    pub name: String,
    pub farm_id: i64,
}

/// Natural key of a [`RecordApi`] row.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordApiKey {
    pub request_path: String,
    pub client_ip: String,
    pub status: i32,
    pub referer: String,
}

/// Probe for `get_by_model`; `None` fields match anything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FarmFilter {
    pub id: Option<i64>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PondFilter {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub farm_id: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordApiFilter {
    pub request_path: Option<String>,
    pub client_ip: Option<String>,
    pub status: Option<i32>,
    pub referer: Option<String>,
}

impl From<&RecordApiKey> for RecordApiFilter {
    fn from(key: &RecordApiKey) -> Self {
        Self {
            request_path: Some(key.request_path.clone()),
            client_ip: Some(key.client_ip.clone()),
            status: Some(key.status),
            referer: Some(key.referer.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    #[test]
    fn farm_serializes_ponds_and_hides_live_tombstone() {
        let farm = Farm {
            id: 1,
            name: "North".to_string(),
            ponds: vec![PondSummary {
                id: 4,
                name: "P1".to_string(),
                farm_id: 1,
                created_at: at(1),
                updated_at: at(1),
            }],
            created_at: at(1),
            updated_at: at(2),
            deleted_at: None,
        };

        let value = serde_json::to_value(&farm).unwrap();
        assert_eq!(value["ponds"][0]["name"], "P1");
        assert!(value.get("deleted_at").is_none());
    }

    #[test]
    fn record_api_hides_timestamps() {
        let record = RecordApi {
            id: 1,
            request_path: "/api/v1/farm".to_string(),
            client_ip: "10.0.0.1".to_string(),
            status: 200,
            referer: String::new(),
            count: 3,
            created_at: at(1),
            updated_at: at(1),
        };

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["count"], 3);
        assert!(value.get("created_at").is_none());
        assert_eq!(RecordApiFilter::from(&record.key()).status, Some(200));
    }
}
