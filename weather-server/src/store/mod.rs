//! Record store gateway: weather records over a sea-orm connection.

use chrono::Utc;
use sea_orm::sea_query::LikeExpr;
use sea_orm::{
    ColumnTrait, ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select, Set, Statement,
};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;
use weather_core::model::{
    ConditionCount, ConditionSummary, Coordinates, NewWeatherRecord, Pagination, WeatherRecord,
};

pub mod entity;
pub mod migrator;

use entity::{Column, Entity as WeatherRecords};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("database error: {0}")]
    Database(#[from] DbErr),

    #[error("record encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

const MAX_SQL_INT: u64 = i64::MAX as u64;

#[derive(Clone, Debug)]
pub struct WeatherStore {
    conn: DatabaseConnection,
}

impl WeatherStore {
    /// Connect to `db_url` and bring the schema up to date.
    pub async fn connect(db_url: &str) -> StoreResult<Self> {
        // An in-memory database lives only as long as its connections.
        let (max, min) = if db_url.contains(":memory:") {
            (1, 1)
        } else {
            (5, 1)
        };
        Self::with_pool_options(db_url, max, min).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> StoreResult<Self> {
        use sea_orm_migration::MigratorTrait;

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self::new(conn))
    }

    /// Wrap an already-migrated connection.
    pub fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn ping(&self) -> StoreResult<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    /// Close every pooled connection.
    pub async fn close(self) -> StoreResult<()> {
        self.conn.close().await?;
        info!("Database connection closed");
        Ok(())
    }

    pub async fn save(&self, input: NewWeatherRecord) -> StoreResult<WeatherRecord> {
        let input = input
            .validate()
            .map_err(|e| StoreError::Validation(e.to_string()))?;

        let now = Utc::now();
        let record = WeatherRecord {
            id: Uuid::now_v7().to_string(),
            city: input.city,
            country: input.country,
            temperature: input.temperature,
            humidity: input.humidity,
            wind_speed: input.wind_speed,
            condition: input.condition,
            description: input.description,
            forecast: input.forecast,
            coordinates: input.coordinates,
            created_at: now,
            updated_at: now,
        };

        let active_model = entity::ActiveModel {
            id: Set(record.id.clone()),
            city: Set(record.city.clone()),
            city_folded: Set(record.city.to_lowercase()),
            country: Set(record.country.clone()),
            temperature: Set(record.temperature),
            humidity: Set(record.humidity),
            wind_speed: Set(record.wind_speed),
            condition: Set(record.condition.clone()),
            description: Set(record.description.clone()),
            forecast: Set(serde_json::to_value(&record.forecast)?),
            lat: Set(record.coordinates.map(|c| c.lat)),
            lon: Set(record.coordinates.map(|c| c.lon)),
            created_at: Set(record.created_at),
            updated_at: Set(record.updated_at),
        };

        WeatherRecords::insert(active_model)
            .exec_without_returning(&self.conn)
            .await?;

        info!("Saved weather record {} for {}", record.id, record.city);
        Ok(record)
    }

    pub async fn find_latest(&self) -> StoreResult<WeatherRecord> {
        newest_first(WeatherRecords::find())
            .one(&self.conn)
            .await?
            .ok_or_else(|| StoreError::NotFound("No weather data found".to_string()))
            .and_then(map_model)
    }

    /// Most recent record whose city contains `fragment`, ignoring case.
    pub async fn find_by_city(&self, fragment: &str) -> StoreResult<WeatherRecord> {
        let pattern = format!("%{}%", escape_like(&fragment.trim().to_lowercase()));

        newest_first(WeatherRecords::find())
            .filter(Column::CityFolded.like(LikeExpr::new(pattern).escape('\\')))
            .one(&self.conn)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("No weather data found for {fragment}")))
            .and_then(map_model)
    }

    pub async fn find_by_id(&self, id: &str) -> StoreResult<WeatherRecord> {
        WeatherRecords::find_by_id(id.to_string())
            .one(&self.conn)
            .await?
            .ok_or_else(|| StoreError::NotFound("Weather record not found".to_string()))
            .and_then(map_model)
    }

    /// One page of records, newest first. `page` and `limit` start at 1.
    pub async fn find_all(
        &self,
        page: u64,
        limit: u64,
    ) -> StoreResult<(Vec<WeatherRecord>, Pagination)> {
        let total = self.count().await?;
        let pagination = Pagination::new(page.max(1), limit.clamp(1, MAX_SQL_INT), total);

        // SQLite binds OFFSET as a signed 64-bit integer.
        if pagination.offset() > MAX_SQL_INT {
            debug!(page = pagination.page, "Requested page lies past the end");
            return Ok((Vec::new(), pagination));
        }

        let rows = newest_first(WeatherRecords::find())
            .offset(pagination.offset())
            .limit(pagination.limit)
            .all(&self.conn)
            .await?;

        debug!(
            page = pagination.page,
            limit = pagination.limit,
            total,
            returned = rows.len(),
            "Listed weather records"
        );

        let records = rows
            .into_iter()
            .map(map_model)
            .collect::<StoreResult<Vec<_>>>()?;
        Ok((records, pagination))
    }

    pub async fn delete_by_id(&self, id: &str) -> StoreResult<()> {
        let result = WeatherRecords::delete_by_id(id.to_string())
            .exec(&self.conn)
            .await?;

        if result.rows_affected == 0 {
            return Err(StoreError::NotFound(
                "Weather record not found".to_string(),
            ));
        }

        info!("Deleted weather record {}", id);
        Ok(())
    }

    pub async fn count(&self) -> StoreResult<u64> {
        Ok(WeatherRecords::find().count(&self.conn).await?)
    }

    /// Condition frequencies across every stored record, most frequent first.
    pub async fn condition_summary(&self) -> StoreResult<ConditionSummary> {
        let rows: Vec<(String, i64)> = WeatherRecords::find()
            .select_only()
            .column(Column::Condition)
            .column_as(Column::Id.count(), "count")
            .group_by(Column::Condition)
            .into_tuple()
            .all(&self.conn)
            .await?;

        let mut conditions: Vec<ConditionCount> = rows
            .into_iter()
            .map(|(condition, count)| ConditionCount {
                condition,
                count: u64::try_from(count).unwrap_or(0),
            })
            .collect();
        conditions.sort_by(|a, b| {
            b.count
                .cmp(&a.count)
                .then_with(|| a.condition.cmp(&b.condition))
        });

        Ok(ConditionSummary {
            total: conditions.iter().map(|c| c.count).sum(),
            conditions,
        })
    }
}

/// Greatest `created_at` first; the time-ordered key breaks ties.
fn newest_first(select: Select<WeatherRecords>) -> Select<WeatherRecords> {
    select
        .order_by_desc(Column::CreatedAt)
        .order_by_desc(Column::Id)
}

fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn map_model(m: entity::Model) -> StoreResult<WeatherRecord> {
    let coordinates = match (m.lat, m.lon) {
        (Some(lat), Some(lon)) => Some(Coordinates { lat, lon }),
        _ => None,
    };

    Ok(WeatherRecord {
        id: m.id,
        city: m.city,
        country: m.country,
        temperature: m.temperature,
        humidity: m.humidity,
        wind_speed: m.wind_speed,
        condition: m.condition,
        description: m.description,
        forecast: serde_json::from_value(m.forecast)?,
        coordinates,
        created_at: m.created_at,
        updated_at: m.updated_at,
    })
}
