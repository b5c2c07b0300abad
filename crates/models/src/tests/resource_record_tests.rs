use crate::db::connect_and_migrate;
use crate::record::{NewRecord, Record};
use crate::resource_record::{self, ActiveModel, Entity as ResourceRecordEntity};
use anyhow::Result;
use configs::DatabaseConfig;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use serde_json::json;

use super::db_tests_enabled;

async fn setup_test_db() -> Result<DatabaseConnection> {
    let cfg = DatabaseConfig { url: crate::db::DATABASE_URL.clone(), min_connections: 1, ..DatabaseConfig::default() };
    connect_and_migrate(&cfg).await
}

fn claim(vin: &str) -> Record {
    Record::new(NewRecord {
        status: "PENDING".into(),
        fields: json!({"vin": vin, "customer_id": 1}).as_object().cloned().unwrap(),
    })
}

/// Insert, read back, and delete a record row.
#[tokio::test]
async fn test_resource_record_crud() -> Result<()> {
    if !db_tests_enabled() {
        return Ok(());
    }
    let db = setup_test_db().await?;
    let resource = format!("test_claims_{}", uuid::Uuid::new_v4().simple());

    let record = claim("VF3ABCDEF12345678");
    ResourceRecordEntity::insert(ActiveModel::from_record(&resource, &record))
        .exec_without_returning(&db)
        .await?;

    let found = ResourceRecordEntity::find_by_id(record.id).one(&db).await?;
    let found = found.expect("row inserted");
    assert_eq!(found.resource, resource);
    assert_eq!(found.into_record()?, record);

    let res = ResourceRecordEntity::delete_by_id(record.id).exec(&db).await?;
    assert_eq!(res.rows_affected, 1);
    Ok(())
}

/// Rows are scoped by `resource` and ordered newest first.
#[tokio::test]
async fn test_resource_scoping_and_order() -> Result<()> {
    if !db_tests_enabled() {
        return Ok(());
    }
    let db = setup_test_db().await?;
    let resource = format!("test_claims_{}", uuid::Uuid::new_v4().simple());

    let first = claim("A");
    let mut second = claim("B");
    second.created_at = first.created_at + chrono::Duration::seconds(1);
    let other = claim("C");
    for (res, r) in [(resource.as_str(), &first), (resource.as_str(), &second), ("other_resource", &other)] {
        ResourceRecordEntity::insert(ActiveModel::from_record(res, r)).exec_without_returning(&db).await?;
    }

    let rows = ResourceRecordEntity::find()
        .filter(resource_record::Column::Resource.eq(resource.clone()))
        .order_by_desc(resource_record::Column::CreatedAt)
        .all(&db)
        .await?;
    let ids: Vec<_> = rows.iter().map(|m| m.id).collect();
    assert_eq!(ids, vec![second.id, first.id]);

    for r in [&first, &second, &other] {
        ResourceRecordEntity::delete_by_id(r.id).exec(&db).await?;
    }
    Ok(())
}
