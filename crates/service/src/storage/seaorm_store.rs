use std::collections::BTreeMap;

use async_trait::async_trait;
use models::record::{Patch, Record};
use models::resource_record::{self, ActiveModel, Column, Entity};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
    TransactionTrait,
};
use uuid::Uuid;

use super::RecordStore;
use crate::errors::ServiceError;
use crate::pagination::{Window, MAX_OFFSET};

/// SeaORM-backed store: every resource shares the `resource_record` table,
/// partitioned by the `resource` column.
pub struct SeaOrmRecordStore {
    pub db: DatabaseConnection,
}

impl SeaOrmRecordStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn to_record(model: resource_record::Model) -> Result<Record, ServiceError> {
    Ok(model.into_record()?)
}

#[async_trait]
impl RecordStore for SeaOrmRecordStore {
    async fn insert(&self, resource: &str, record: Record) -> Result<Record, ServiceError> {
        Entity::insert(ActiveModel::from_record(resource, &record))
            .exec_without_returning(&self.db)
            .await?;
        Ok(record)
    }

    async fn find(&self, resource: &str, id: Uuid) -> Result<Option<Record>, ServiceError> {
        Entity::find_by_id(id)
            .filter(Column::Resource.eq(resource))
            .one(&self.db)
            .await?
            .map(to_record)
            .transpose()
    }

    async fn update(&self, resource: &str, id: Uuid, patch: Patch) -> Result<Option<Record>, ServiceError> {
        let txn = self.db.begin().await?;
        let Some(row) = Entity::find_by_id(id)
            .filter(Column::Resource.eq(resource))
            .lock_exclusive()
            .one(&txn)
            .await?
        else {
            txn.rollback().await?;
            return Ok(None);
        };

        let mut record = to_record(row)?;
        record.apply(&patch);
        let saved = ActiveModel::from_record(resource, &record).update(&txn).await?;
        txn.commit().await?;
        to_record(saved).map(Some)
    }

    async fn delete(&self, resource: &str, id: Uuid) -> Result<bool, ServiceError> {
        let res = Entity::delete_many()
            .filter(Column::Id.eq(id))
            .filter(Column::Resource.eq(resource))
            .exec(&self.db)
            .await?;
        Ok(res.rows_affected > 0)
    }

    async fn list(&self, resource: &str, filters: &BTreeMap<String, String>, window: Window) -> Result<Vec<Record>, ServiceError> {
        let mut query = Entity::find().filter(Column::Resource.eq(resource));
        for (key, value) in filters {
            query = if key == "status" {
                query.filter(Column::Status.eq(value.as_str()))
            } else {
                query.filter(Expr::cust_with_values("fields ->> ? = ?", [key.clone(), value.clone()]))
            };
        }
        let rows = query
            .order_by_desc(Column::CreatedAt)
            .order_by_asc(Column::Id)
            .offset(window.offset.min(MAX_OFFSET))
            .limit(window.limit.min(MAX_OFFSET))
            .all(&self.db)
            .await?;
        rows.into_iter().map(to_record).collect()
    }
}
