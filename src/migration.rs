//! DDL for the declared entities: tables first, then indexes.
//! Every statement is `IF NOT EXISTS`, so applying twice is a no-op.

use crate::models::{ColumnDef, EntitySchema};
use crate::sql::quoted;
use sqlx::{Connection, PgConnection};

fn column_sql(c: &ColumnDef) -> String {
    let mut def = format!("{} {}", quoted(c.name), c.sql_type);
    if !c.nullable {
        def.push_str(" NOT NULL");
    }
    if let Some(expr) = c.default {
        def.push_str(" DEFAULT ");
        def.push_str(expr);
    }
    def
}

/// CREATE TABLE plus one CREATE INDEX per indexed column, in execution order.
pub fn schema_statements(entity: &EntitySchema) -> Vec<String> {
    let table = quoted(entity.table);
    let mut defs: Vec<String> = entity.columns().map(column_sql).collect();
    let pk: Vec<String> = entity.primary_key().into_iter().map(quoted).collect();
    if !pk.is_empty() {
        defs.push(format!(
            "CONSTRAINT {} PRIMARY KEY ({})",
            quoted(&entity.primary_key_name()),
            pk.join(", ")
        ));
    }
    let mut out = vec![format!("CREATE TABLE IF NOT EXISTS {} ({})", table, defs.join(", "))];
    for c in entity.columns().filter(|c| c.indexed) {
        out.push(format!(
            "CREATE INDEX IF NOT EXISTS {} ON {} ({})",
            quoted(&entity.index_name(c.name)),
            table,
            quoted(c.name)
        ));
    }
    out
}

/// Apply every entity's DDL in a single transaction.
pub async fn apply_schema(conn: &mut PgConnection, entities: &[&EntitySchema]) -> Result<(), sqlx::Error> {
    let mut tx = conn.begin().await?;
    for entity in entities {
        for sql in schema_statements(entity) {
            tracing::debug!(sql = %sql, "migration");
            sqlx::query(&sql).execute(&mut *tx).await?;
        }
        tracing::info!(table = entity.table, "schema applied");
    }
    tx.commit().await
}
