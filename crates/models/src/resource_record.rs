use chrono::Utc;
use sea_orm::{entity::prelude::*, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::ModelError;
use crate::record::Record;

/// Storage row for any resource: `resource` names the collection, business
/// fields are kept as a JSONB object.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "resource_record")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub resource: String,
    pub status: String,
    #[sea_orm(column_type = "JsonBinary")]
    pub fields: Json,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn into_record(self) -> Result<Record, ModelError> {
        let Json::Object(fields) = self.fields else {
            return Err(ModelError::Db(format!("record {} has non-object fields column", self.id)));
        };
        Ok(Record {
            id: self.id,
            status: self.status,
            fields,
            created_at: self.created_at.with_timezone(&Utc),
            updated_at: self.updated_at.with_timezone(&Utc),
        })
    }
}

impl ActiveModel {
    pub fn from_record(resource: &str, record: &Record) -> Self {
        Self {
            id: Set(record.id),
            resource: Set(resource.to_string()),
            status: Set(record.status.clone()),
            fields: Set(Json::Object(record.fields.clone())),
            created_at: Set(record.created_at.into()),
            updated_at: Set(record.updated_at.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::NewRecord;
    use sea_orm::ActiveValue;
    use serde_json::json;

    #[test]
    fn model_round_trips_record() {
        let record = Record::new(NewRecord {
            status: "PENDING".into(),
            fields: json!({"vin": "X", "customer_id": 1}).as_object().cloned().unwrap(),
        });
        let am = ActiveModel::from_record("claims", &record);
        let ActiveValue::Set(resource) = am.resource.clone() else { panic!("resource not set") };
        assert_eq!(resource, "claims");

        let model = Model {
            id: record.id,
            resource,
            status: record.status.clone(),
            fields: Json::Object(record.fields.clone()),
            created_at: record.created_at.into(),
            updated_at: record.updated_at.into(),
        };
        assert_eq!(model.into_record().unwrap(), record);
    }

    #[test]
    fn non_object_fields_are_rejected() {
        let now = Utc::now();
        let model = Model {
            id: Uuid::new_v4(),
            resource: "claims".into(),
            status: "PENDING".into(),
            fields: json!([1, 2]),
            created_at: now.into(),
            updated_at: now.into(),
        };
        assert!(matches!(model.into_record(), Err(ModelError::Db(_))));
    }
}
