use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of venue a parking site serves.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    utoipa::ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LocationCategory {
    Mall,
    Hospital,
    Theatre,
    Airport,
    Stadium,
    Other,
}

impl LocationCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            LocationCategory::Mall => "mall",
            LocationCategory::Hospital => "hospital",
            LocationCategory::Theatre => "theatre",
            LocationCategory::Airport => "airport",
            LocationCategory::Stadium => "stadium",
            LocationCategory::Other => "other",
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, utoipa::ToSchema)]
#[sea_orm(table_name = "locations")]
#[schema(as = Location)]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub name: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub total_slots: i32,

    // Denormalized mirror of COUNT(slots WHERE is_available); refreshed by
    // recount inside every transaction that flips a slot
    pub available_slots: i32,

    pub floors: i32,
    pub category: String,
    pub price_per_hour_car: Decimal,
    pub price_per_hour_bike: Decimal,
    pub open_time: String,
    pub close_time: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::slot::Entity")]
    Slots,
}

impl Related<super::slot::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Slots.def()
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C: ConnectionTrait>(self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut active = self;
        let now = Utc::now();
        if insert {
            if let ActiveValue::NotSet = active.id {
                active.id = Set(Uuid::new_v4());
            }
            if let ActiveValue::NotSet = active.created_at {
                active.created_at = Set(now);
            }
        } else {
            active.updated_at = Set(Some(now));
        }
        Ok(active)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn category_round_trips_through_strings() {
        for (cat, s) in [
            (LocationCategory::Mall, "mall"),
            (LocationCategory::Hospital, "hospital"),
            (LocationCategory::Theatre, "theatre"),
            (LocationCategory::Airport, "airport"),
            (LocationCategory::Stadium, "stadium"),
            (LocationCategory::Other, "other"),
        ] {
            assert_eq!(cat.as_str(), s);
            assert_eq!(LocationCategory::from_str(s).unwrap(), cat);
        }
        assert!(LocationCategory::from_str("garage").is_err());
    }
}
