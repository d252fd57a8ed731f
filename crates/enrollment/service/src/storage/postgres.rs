//! PostgreSQL enrollment store
//!
//! The status lives in its own column so the compare-and-swap is a
//! single `UPDATE ... WHERE id = $1 AND status = $2`; the full record
//! rides along as JSONB. Transition records append inside the same
//! transaction as the status swap, so readers never observe one
//! without the other. A partial unique index enforces the
//! one-open-cycle-per-period invariant at the database.

use async_trait::async_trait;
use enrollment_engine::{EnrollmentStore, StoreError, StoreResult};
use enrollment_types::{Enrollment, EnrollmentId, EnrollmentStatus, TransitionRecord};
use serde_json::Value;
use sqlx::{postgres::PgPoolOptions, PgPool, Row};
use std::str::FromStr;
use std::time::Duration;

/// PostgreSQL-backed enrollment store
#[derive(Debug, Clone)]
pub struct PostgresEnrollmentStore {
    pool: PgPool,
}

impl PostgresEnrollmentStore {
    /// Connect to PostgreSQL and initialize the schema
    pub async fn new(
        url: &str,
        max_connections: u32,
        connect_timeout_secs: u64,
    ) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(connect_timeout_secs))
            .connect(url)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        let store = Self { pool };
        store.initialize_schema().await?;
        Ok(store)
    }

    async fn initialize_schema(&self) -> StoreResult<()> {
        let statements = [
            r#"
            CREATE TABLE IF NOT EXISTS enrollments (
                id UUID PRIMARY KEY,
                student_id TEXT NOT NULL,
                school_year TEXT NOT NULL,
                semester TEXT NOT NULL,
                status TEXT NOT NULL,
                data JSONB NOT NULL,
                created_at TIMESTAMPTZ NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL
            );
            "#,
            r#"
            CREATE UNIQUE INDEX IF NOT EXISTS enrollments_open_period
            ON enrollments(student_id, school_year, semester)
            WHERE status NOT IN ('Completed', 'Rejected');
            "#,
            r#"CREATE INDEX IF NOT EXISTS enrollments_student_id ON enrollments(student_id);"#,
            r#"
            CREATE TABLE IF NOT EXISTS transitions (
                enrollment_id UUID NOT NULL,
                sequence BIGINT NOT NULL,
                data JSONB NOT NULL,
                recorded_at TIMESTAMPTZ NOT NULL,
                PRIMARY KEY (enrollment_id, sequence)
            );
            "#,
        ];

        for stmt in statements {
            sqlx::query(stmt)
                .execute(&self.pool)
                .await
                .map_err(query_err)?;
        }

        Ok(())
    }

    fn to_json<T: serde::Serialize>(value: &T) -> StoreResult<Value> {
        serde_json::to_value(value)
            .map_err(|e| StoreError::Unavailable(format!("json serialize error: {}", e)))
    }

    fn from_json<T: serde::de::DeserializeOwned>(value: Value) -> StoreResult<T> {
        serde_json::from_value(value)
            .map_err(|e| StoreError::Unavailable(format!("json deserialize error: {}", e)))
    }

    fn parse_status(raw: &str) -> StoreResult<EnrollmentStatus> {
        EnrollmentStatus::from_str(raw)
            .map_err(|e| StoreError::Unavailable(format!("corrupt status column: {}", e)))
    }
}

fn query_err(e: sqlx::Error) -> StoreError {
    StoreError::Unavailable(e.to_string())
}

#[async_trait]
impl EnrollmentStore for PostgresEnrollmentStore {
    async fn insert(&self, enrollment: Enrollment) -> StoreResult<()> {
        let data = Self::to_json(&enrollment)?;
        let result = sqlx::query(
            r#"
            INSERT INTO enrollments
                (id, student_id, school_year, semester, status, data, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(enrollment.id.as_uuid())
        .bind(enrollment.student_id.as_str())
        .bind(&enrollment.school_year)
        .bind(enrollment.semester.to_string())
        .bind(enrollment.status.as_str())
        .bind(data)
        .bind(enrollment.created_at)
        .bind(enrollment.updated_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) => {
                let unique_violation = e
                    .as_database_error()
                    .map(|db| db.is_unique_violation())
                    .unwrap_or(false);
                if unique_violation {
                    Err(StoreError::DuplicateEnrollment {
                        student_id: enrollment.student_id.clone(),
                        school_year: enrollment.school_year.clone(),
                        semester: enrollment.semester,
                    })
                } else {
                    Err(query_err(e))
                }
            }
        }
    }

    async fn get(&self, id: &EnrollmentId) -> StoreResult<Enrollment> {
        let row = sqlx::query("SELECT data FROM enrollments WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(query_err)?;

        match row {
            Some(record) => {
                let data: Value = record.try_get("data").map_err(query_err)?;
                Self::from_json(data)
            }
            None => Err(StoreError::NotFound(*id)),
        }
    }

    async fn history(&self, id: &EnrollmentId) -> StoreResult<Vec<TransitionRecord>> {
        // The enrollment must exist before its history is meaningful
        self.get(id).await?;

        let rows = sqlx::query(
            "SELECT data FROM transitions WHERE enrollment_id = $1 ORDER BY sequence",
        )
        .bind(id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(query_err)?;

        rows.into_iter()
            .map(|row| {
                let data: Value = row.try_get("data").map_err(query_err)?;
                Self::from_json(data)
            })
            .collect()
    }

    async fn commit_transition(
        &self,
        expected_from: EnrollmentStatus,
        updated: Enrollment,
        mut record: TransitionRecord,
    ) -> StoreResult<Enrollment> {
        let mut tx = self.pool.begin().await.map_err(query_err)?;

        let data = Self::to_json(&updated)?;
        let result = sqlx::query(
            r#"
            UPDATE enrollments
            SET status = $1, data = $2, updated_at = $3
            WHERE id = $4 AND status = $5
            "#,
        )
        .bind(updated.status.as_str())
        .bind(data)
        .bind(updated.updated_at)
        .bind(updated.id.as_uuid())
        .bind(expected_from.as_str())
        .execute(&mut *tx)
        .await
        .map_err(query_err)?;

        if result.rows_affected() == 0 {
            // Distinguish a missing row from a lost race
            let row = sqlx::query("SELECT status FROM enrollments WHERE id = $1")
                .bind(updated.id.as_uuid())
                .fetch_optional(&mut *tx)
                .await
                .map_err(query_err)?;
            tx.rollback().await.map_err(query_err)?;
            return match row {
                None => Err(StoreError::NotFound(updated.id)),
                Some(record) => {
                    let raw: String = record.try_get("status").map_err(query_err)?;
                    Err(StoreError::StaleState {
                        expected: expected_from,
                        actual: Self::parse_status(&raw)?,
                    })
                }
            };
        }

        let sequence: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM transitions WHERE enrollment_id = $1")
                .bind(updated.id.as_uuid())
                .fetch_one(&mut *tx)
                .await
                .map_err(query_err)?;
        record.sequence = sequence as u64;

        let record_data = Self::to_json(&record)?;
        sqlx::query(
            r#"
            INSERT INTO transitions (enrollment_id, sequence, data, recorded_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(updated.id.as_uuid())
        .bind(sequence)
        .bind(record_data)
        .bind(record.timestamp)
        .execute(&mut *tx)
        .await
        .map_err(query_err)?;

        tx.commit().await.map_err(query_err)?;
        Ok(updated)
    }

    async fn update_in_state(
        &self,
        expected_status: EnrollmentStatus,
        updated: Enrollment,
    ) -> StoreResult<Enrollment> {
        let data = Self::to_json(&updated)?;
        let result = sqlx::query(
            r#"
            UPDATE enrollments
            SET data = $1, updated_at = $2
            WHERE id = $3 AND status = $4
            "#,
        )
        .bind(data)
        .bind(updated.updated_at)
        .bind(updated.id.as_uuid())
        .bind(expected_status.as_str())
        .execute(&self.pool)
        .await
        .map_err(query_err)?;

        if result.rows_affected() == 0 {
            let row = sqlx::query("SELECT status FROM enrollments WHERE id = $1")
                .bind(updated.id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(query_err)?;
            return match row {
                None => Err(StoreError::NotFound(updated.id)),
                Some(record) => {
                    let raw: String = record.try_get("status").map_err(query_err)?;
                    Err(StoreError::StaleState {
                        expected: expected_status,
                        actual: Self::parse_status(&raw)?,
                    })
                }
            };
        }

        Ok(updated)
    }
}
