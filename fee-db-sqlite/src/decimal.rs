use fee_core::RepositoryError;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use sqlx::{Row, TypeInfo, ValueRef};

/// Read a money column, accepting both INTEGER and REAL storage.
pub fn get_decimal(
    row: &sqlx::sqlite::SqliteRow,
    column: &str,
) -> Result<Decimal, RepositoryError> {
    let value_ref = row
        .try_get_raw(column)
        .map_err(|e| RepositoryError::Database(format!("Column '{}' not found: {}", column, e)))?;

    let type_info = value_ref.type_info();
    let type_name = type_info.name();

    match type_name {
        "INTEGER" => {
            let val: i64 = row.try_get(column).map_err(|e| {
                RepositoryError::Database(format!("Failed to get INTEGER from '{}': {}", column, e))
            })?;
            Ok(Decimal::from(val))
        }
        "REAL" => {
            let val: f64 = row.try_get(column).map_err(|e| {
                RepositoryError::Database(format!("Failed to get REAL from '{}': {}", column, e))
            })?;
            Decimal::try_from(val).map_err(|e| {
                RepositoryError::Database(format!("Failed to convert {} to Decimal: {}", val, e))
            })
        }
        _ => Err(RepositoryError::Database(format!(
            "Unexpected type '{}' for money column '{}'",
            type_name, column
        ))),
    }
}

/// Fees are whole rupees; store them as INTEGER.
pub fn decimal_to_i64(d: Decimal) -> Result<i64, RepositoryError> {
    if !d.fract().is_zero() {
        return Err(RepositoryError::Database(format!(
            "Refusing to store fractional amount {} as whole rupees",
            d
        )));
    }
    d.to_i64()
        .ok_or_else(|| RepositoryError::Database(format!("Amount {} is out of range", d)))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;
    use sqlx::sqlite::SqlitePoolOptions;

    use super::*;

    async fn setup_test_db() -> sqlx::sqlite::SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("Failed to create in-memory database");
        sqlx::query(
            "CREATE TABLE test_money (
                id INTEGER PRIMARY KEY,
                int_value INTEGER,
                real_value REAL,
                text_value TEXT
            )",
        )
        .execute(&pool)
        .await
        .expect("Failed to create test table");
        pool
    }

    async fn fetch(
        pool: &sqlx::sqlite::SqlitePool,
        insert: &str,
        column: &str,
    ) -> Result<Decimal, RepositoryError> {
        sqlx::query(insert)
            .execute(pool)
            .await
            .expect("Failed to insert test data");
        let row = sqlx::query("SELECT * FROM test_money WHERE id = 1")
            .fetch_one(pool)
            .await
            .expect("Failed to fetch row");
        get_decimal(&row, column)
    }

    #[tokio::test]
    async fn test_get_decimal_from_integer() {
        let pool = setup_test_db().await;

        let result = fetch(&pool, "INSERT INTO test_money (id, int_value) VALUES (1, 25000)", "int_value").await;

        assert_eq!(result, Ok(dec!(25000)));
    }

    #[tokio::test]
    async fn test_get_decimal_from_real() {
        let pool = setup_test_db().await;

        let result = fetch(&pool, "INSERT INTO test_money (id, real_value) VALUES (1, 7500.0)", "real_value").await;

        assert_eq!(result, Ok(dec!(7500)));
    }

    #[tokio::test]
    async fn test_get_decimal_rejects_text() {
        let pool = setup_test_db().await;

        let result = fetch(&pool, "INSERT INTO test_money (id, text_value) VALUES (1, 'lots')", "text_value").await;

        assert!(matches!(result, Err(RepositoryError::Database(_))));
    }

    #[tokio::test]
    async fn test_get_decimal_column_not_found() {
        let pool = setup_test_db().await;

        let result = fetch(&pool, "INSERT INTO test_money (id) VALUES (1)", "missing").await;

        assert!(matches!(result, Err(RepositoryError::Database(msg)) if msg.contains("missing")));
    }

    #[test]
    fn test_decimal_to_i64() {
        assert_eq!(decimal_to_i64(dec!(50000)), Ok(50000));
        assert_eq!(decimal_to_i64(dec!(1000.00)), Ok(1000));
        assert!(decimal_to_i64(dec!(99.5)).is_err());
    }
}
