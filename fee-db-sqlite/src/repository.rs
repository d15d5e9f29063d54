use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fee_core::db::RequestFilter;
use fee_core::{
    Message, NewMessage, NewServicePackage, NewServiceRequest, NewUser, PortalRepository, RateCardKey,
    RepositoryError, RequestStatus, ServiceCategory, ServicePackage, ServicePackageRecord,
    ServiceRequest, ServiceRequestRecord, User, UserRole,
};
use sqlx::error::ErrorKind;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{QueryBuilder, Row, Sqlite};
use tracing::debug;

use crate::decimal::{decimal_to_i64, get_decimal};

const USER_COLUMNS: &str = "id, email, name, role, specializations, is_active, created_at";

const PACKAGE_COLUMNS: &str = "id, name, description, slab_id, entity_type, service_type, \
     price, is_active, created_at, updated_at";

const REQUEST_COLUMNS: &str = "id, customer_id, title, description, category, slab_id, \
     entity_type, service_type, fee, status, assigned_to, created_at, updated_at";

const MESSAGE_COLUMNS: &str = "id, request_id, sender_id, content, is_read, created_at";

pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    /// Open a database by file path, `sqlite:` URL or `:memory:`.
    /// Files are created on first use.
    pub async fn new(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("Invalid database location: {}", database_url))?
            .create_if_missing(true)
            .foreign_keys(true);

        // Every connection to `:memory:` is a separate database, so keep a
        // single connection alive for the life of the pool.
        let in_memory = matches!(database_url, ":memory:" | "sqlite::memory:");
        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new()
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .with_context(|| format!("Failed to connect to database: {}", database_url))?;
        Ok(Self { pool })
    }

    pub async fn new_with_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run database migrations")?;
        Ok(())
    }

    /// Load and execute all SQL seed files from the specified directory.
    /// Files are executed in alphabetical order by filename.
    pub async fn run_seeds(
        &self,
        seeds_dir: &Path,
    ) -> Result<()> {
        let mut entries: Vec<_> = std::fs::read_dir(seeds_dir)
            .with_context(|| format!("Failed to read seeds directory '{}'", seeds_dir.display()))?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "sql"))
            .collect();

        entries.sort_by_key(|entry| entry.file_name());

        for entry in entries {
            let path = entry.path();
            let sql = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read seed file '{}'", path.display()))?;

            sqlx::raw_sql(&sql)
                .execute(&self.pool)
                .await
                .with_context(|| format!("Failed to execute seed file '{}'", path.display()))?;
            debug!(file = %path.display(), "seed file applied");
        }

        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// Unique and foreign-key violations are caller errors, not storage faults.
fn db_error(e: sqlx::Error) -> RepositoryError {
    if let Some(db) = e.as_database_error() {
        match db.kind() {
            ErrorKind::UniqueViolation | ErrorKind::ForeignKeyViolation => {
                return RepositoryError::Conflict(db.message().to_string());
            }
            _ => {}
        }
    }
    RepositoryError::Database(e.to_string())
}

fn get<'r, T>(
    row: &'r SqliteRow,
    column: &str,
) -> Result<T, RepositoryError>
where
    T: sqlx::Decode<'r, Sqlite> + sqlx::Type<Sqlite>,
{
    row.try_get(column)
        .map_err(|e| RepositoryError::Database(format!("Failed to get {}: {}", column, e)))
}

fn parse_column<T>(
    row: &SqliteRow,
    column: &str,
) -> Result<T, RepositoryError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw: String = get(row, column)?;
    raw.parse()
        .map_err(|e| RepositoryError::Database(format!("Bad value in {}: {}", column, e)))
}

fn row_to_key(row: &SqliteRow) -> Result<RateCardKey, RepositoryError> {
    let slab_id: i64 = get(row, "slab_id")?;
    let slab_id = u8::try_from(slab_id)
        .map_err(|_| RepositoryError::Database(format!("slab_id {} out of range", slab_id)))?;
    let entity_type: String = get(row, "entity_type")?;
    let service_type: String = get(row, "service_type")?;
    RateCardKey::parse(slab_id, &entity_type, &service_type)
        .map_err(|e| RepositoryError::Database(format!("Stored rate-card key rejected: {}", e)))
}

fn join_specializations(specializations: &[ServiceCategory]) -> String {
    specializations
        .iter()
        .map(ServiceCategory::as_str)
        .collect::<Vec<_>>()
        .join(",")
}

fn row_to_user(row: &SqliteRow) -> Result<User, RepositoryError> {
    let specializations: String = get(row, "specializations")?;
    let specializations = specializations
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<ServiceCategory>()
                .map_err(|e| RepositoryError::Database(e.to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(User {
        id: get(row, "id")?,
        email: get(row, "email")?,
        name: get(row, "name")?,
        role: parse_column::<UserRole>(row, "role")?,
        specializations,
        is_active: get(row, "is_active")?,
        created_at: get::<DateTime<Utc>>(row, "created_at")?,
    })
}

fn row_to_package(row: &SqliteRow) -> Result<ServicePackage, RepositoryError> {
    Ok(ServicePackageRecord {
        id: get(row, "id")?,
        name: get(row, "name")?,
        description: get(row, "description")?,
        key: row_to_key(row)?,
        stored_price: get_decimal(row, "price")?,
        is_active: get(row, "is_active")?,
        created_at: get::<DateTime<Utc>>(row, "created_at")?,
        updated_at: get::<DateTime<Utc>>(row, "updated_at")?,
    }
    .into())
}

fn row_to_request(row: &SqliteRow) -> Result<ServiceRequest, RepositoryError> {
    Ok(ServiceRequestRecord {
        id: get(row, "id")?,
        customer_id: get(row, "customer_id")?,
        title: get(row, "title")?,
        description: get(row, "description")?,
        category: parse_column::<ServiceCategory>(row, "category")?,
        key: row_to_key(row)?,
        stored_fee: get_decimal(row, "fee")?,
        status: parse_column::<RequestStatus>(row, "status")?,
        assigned_to: get(row, "assigned_to")?,
        created_at: get::<DateTime<Utc>>(row, "created_at")?,
        updated_at: get::<DateTime<Utc>>(row, "updated_at")?,
    }
    .into())
}

fn row_to_message(row: &SqliteRow) -> Result<Message, RepositoryError> {
    Ok(Message {
        id: get(row, "id")?,
        request_id: get(row, "request_id")?,
        sender_id: get(row, "sender_id")?,
        content: get(row, "content")?,
        is_read: get(row, "is_read")?,
        created_at: get::<DateTime<Utc>>(row, "created_at")?,
    })
}

#[async_trait]
impl PortalRepository for SqliteRepository {
    async fn create_user(
        &self,
        user: NewUser,
    ) -> Result<User, RepositoryError> {
        let result = sqlx::query(
            "INSERT INTO users (email, name, role, specializations, is_active, created_at)
             VALUES (?, ?, ?, ?, 1, ?)",
        )
        .bind(&user.email)
        .bind(&user.name)
        .bind(user.role.as_str())
        .bind(join_specializations(&user.specializations))
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        self.get_user(result.last_insert_rowid()).await
    }

    async fn get_user(
        &self,
        id: i64,
    ) -> Result<User, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?
            .ok_or(RepositoryError::NotFound)?;

        row_to_user(&row)
    }

    async fn get_user_by_email(
        &self,
        email: &str,
    ) -> Result<User, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?"))
            .bind(email.trim().to_lowercase())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?
            .ok_or(RepositoryError::NotFound)?;

        row_to_user(&row)
    }

    async fn list_users(
        &self,
        role: Option<UserRole>,
    ) -> Result<Vec<User>, RepositoryError> {
        let rows = match role {
            Some(role) => {
                sqlx::query(&format!(
                    "SELECT {USER_COLUMNS} FROM users WHERE role = ? ORDER BY id"
                ))
                .bind(role.as_str())
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY id"))
                    .fetch_all(&self.pool)
                    .await
            }
        }
        .map_err(db_error)?;

        rows.iter().map(row_to_user).collect()
    }

    async fn update_user(
        &self,
        user: &User,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE users SET email = ?, name = ?, role = ?, specializations = ?, is_active = ?
             WHERE id = ?",
        )
        .bind(&user.email)
        .bind(&user.name)
        .bind(user.role.as_str())
        .bind(join_specializations(&user.specializations))
        .bind(user.is_active)
        .bind(user.id)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn create_package(
        &self,
        package: NewServicePackage,
    ) -> Result<ServicePackage, RepositoryError> {
        let now = Utc::now();
        let key = package.key();

        let result = sqlx::query(
            "INSERT INTO service_packages (
                name, description, slab_id, entity_type, service_type,
                price, is_active, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&package.name)
        .bind(&package.description)
        .bind(i64::from(key.slab.get()))
        .bind(key.entity_type.as_str())
        .bind(key.service_type.as_str())
        .bind(decimal_to_i64(package.price())?)
        .bind(package.is_active)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        self.get_package(result.last_insert_rowid()).await
    }

    async fn create_packages(
        &self,
        packages: Vec<NewServicePackage>,
    ) -> Result<Vec<ServicePackage>, RepositoryError> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await.map_err(db_error)?;
        let mut ids = Vec::with_capacity(packages.len());

        for package in &packages {
            let key = package.key();
            let result = sqlx::query(
                "INSERT INTO service_packages (
                    name, description, slab_id, entity_type, service_type,
                    price, is_active, created_at, updated_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(&package.name)
            .bind(&package.description)
            .bind(i64::from(key.slab.get()))
            .bind(key.entity_type.as_str())
            .bind(key.service_type.as_str())
            .bind(decimal_to_i64(package.price())?)
            .bind(package.is_active)
            .bind(now)
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;
            ids.push(result.last_insert_rowid());
        }

        // Dropping `tx` on an early return rolls every insert back.
        tx.commit().await.map_err(db_error)?;
        debug!(count = ids.len(), "packages inserted");

        let mut created = Vec::with_capacity(ids.len());
        for id in ids {
            created.push(self.get_package(id).await?);
        }
        Ok(created)
    }

    async fn get_package(
        &self,
        id: i64,
    ) -> Result<ServicePackage, RepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT {PACKAGE_COLUMNS} FROM service_packages WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?
        .ok_or(RepositoryError::NotFound)?;

        row_to_package(&row)
    }

    async fn update_package(
        &self,
        package: &ServicePackage,
    ) -> Result<(), RepositoryError> {
        let key = package.key();

        let result = sqlx::query(
            "UPDATE service_packages SET
                name = ?, description = ?, slab_id = ?, entity_type = ?, service_type = ?,
                price = ?, is_active = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(&package.name)
        .bind(&package.description)
        .bind(i64::from(key.slab.get()))
        .bind(key.entity_type.as_str())
        .bind(key.service_type.as_str())
        .bind(decimal_to_i64(package.price())?)
        .bind(package.is_active)
        .bind(Utc::now())
        .bind(package.id)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn delete_package(
        &self,
        id: i64,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM service_packages WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn list_packages(
        &self,
        active_only: bool,
    ) -> Result<Vec<ServicePackage>, RepositoryError> {
        let filter = if active_only { " WHERE is_active = 1" } else { "" };
        let rows = sqlx::query(&format!(
            "SELECT {PACKAGE_COLUMNS} FROM service_packages{filter} ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        rows.iter().map(row_to_package).collect()
    }

    async fn create_request(
        &self,
        request: NewServiceRequest,
    ) -> Result<ServiceRequest, RepositoryError> {
        let now = Utc::now();
        let key = request.key();

        let result = sqlx::query(
            "INSERT INTO service_requests (
                customer_id, title, description, category, slab_id, entity_type,
                service_type, fee, status, assigned_to, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, NULL, ?, ?)",
        )
        .bind(request.customer_id)
        .bind(&request.title)
        .bind(&request.description)
        .bind(request.category.as_str())
        .bind(i64::from(key.slab.get()))
        .bind(key.entity_type.as_str())
        .bind(key.service_type.as_str())
        .bind(decimal_to_i64(request.fee())?)
        .bind(RequestStatus::Pending.as_str())
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        self.get_request(result.last_insert_rowid()).await
    }

    async fn get_request(
        &self,
        id: i64,
    ) -> Result<ServiceRequest, RepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT {REQUEST_COLUMNS} FROM service_requests WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?
        .ok_or(RepositoryError::NotFound)?;

        row_to_request(&row)
    }

    async fn update_request(
        &self,
        request: &ServiceRequest,
    ) -> Result<(), RepositoryError> {
        let key = request.key();

        let result = sqlx::query(
            "UPDATE service_requests SET
                title = ?, description = ?, category = ?, slab_id = ?, entity_type = ?,
                service_type = ?, fee = ?, status = ?, assigned_to = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(&request.title)
        .bind(&request.description)
        .bind(request.category.as_str())
        .bind(i64::from(key.slab.get()))
        .bind(key.entity_type.as_str())
        .bind(key.service_type.as_str())
        .bind(decimal_to_i64(request.fee())?)
        .bind(request.status().as_str())
        .bind(request.assigned_to())
        .bind(request.updated_at)
        .bind(request.id)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn delete_request(
        &self,
        id: i64,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM service_requests WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn list_requests(
        &self,
        filter: RequestFilter,
    ) -> Result<Vec<ServiceRequest>, RepositoryError> {
        let mut query: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {REQUEST_COLUMNS} FROM service_requests WHERE 1 = 1"));
        if let Some(customer_id) = filter.customer_id {
            query.push(" AND customer_id = ").push_bind(customer_id);
        }
        if let Some(assigned_to) = filter.assigned_to {
            query.push(" AND assigned_to = ").push_bind(assigned_to);
        }
        if let Some(status) = filter.status {
            query.push(" AND status = ").push_bind(status.as_str());
        }
        query.push(" ORDER BY id");

        let rows = query
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;

        rows.iter().map(row_to_request).collect()
    }

    async fn create_message(
        &self,
        message: NewMessage,
    ) -> Result<Message, RepositoryError> {
        let result = sqlx::query(
            "INSERT INTO messages (request_id, sender_id, content, is_read, created_at)
             VALUES (?, ?, ?, 0, ?)",
        )
        .bind(message.request_id)
        .bind(message.sender_id)
        .bind(&message.content)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        self.get_message(result.last_insert_rowid()).await
    }

    async fn get_message(
        &self,
        id: i64,
    ) -> Result<Message, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {MESSAGE_COLUMNS} FROM messages WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?
            .ok_or(RepositoryError::NotFound)?;

        row_to_message(&row)
    }

    async fn list_messages(
        &self,
        request_id: i64,
    ) -> Result<Vec<Message>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages WHERE request_id = ? ORDER BY id"
        ))
        .bind(request_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        rows.iter().map(row_to_message).collect()
    }

    async fn set_message_read(
        &self,
        id: i64,
        is_read: bool,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE messages SET is_read = ? WHERE id = ?")
            .bind(is_read)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn delete_message(
        &self,
        id: i64,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM messages WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}
