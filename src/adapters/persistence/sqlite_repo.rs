//! SQLite-backed store via libsql. Implements GeofenceStore, SessionStore and OverrideStore.
//!
//! One database file (attendance.db) in the data directory. The open-session invariant is
//! enforced by the schema: a partial unique index allows one `out_at IS NULL` row per user,
//! and check-out is a conditional UPDATE that only touches a still-open row.
//! Timestamps are stored as Unix milliseconds (UTC) so ordering is a plain integer sort.

use crate::domain::{AttendanceSession, Coordinate, DomainError, Geofence, OverrideRequest};
use crate::ports::{GeofenceStore, OverrideStore, SessionStore};
use chrono::{DateTime, NaiveDate, Utc};
use libsql::{Connection, Database, Row, params};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const GEOFENCES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS geofences (
    class_name TEXT PRIMARY KEY,
    center_lat REAL NOT NULL,
    center_lng REAL NOT NULL,
    radius_m REAL NOT NULL,
    advisor_id TEXT NOT NULL,
    updated_at INTEGER NOT NULL
)"#;

const ATTENDANCE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS attendance (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    user_name TEXT NOT NULL,
    class_name TEXT NOT NULL,
    date TEXT NOT NULL,
    in_at INTEGER NOT NULL,
    in_lat REAL NOT NULL,
    in_lng REAL NOT NULL,
    out_at INTEGER,
    out_lat REAL,
    out_lng REAL,
    hours REAL
)"#;

/// At most one open session per user, enforced by storage rather than by callers.
const ATTENDANCE_OPEN_INDEX: &str = "CREATE UNIQUE INDEX IF NOT EXISTS idx_attendance_one_open ON attendance (user_id) WHERE out_at IS NULL";
const ATTENDANCE_USER_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_attendance_user_in ON attendance (user_id, in_at DESC)";
const ATTENDANCE_CLASS_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_attendance_class_in ON attendance (class_name, in_at DESC)";

const REQUESTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS requests (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    student_name TEXT NOT NULL,
    class_name TEXT NOT NULL,
    reason TEXT NOT NULL,
    from_at INTEGER NOT NULL,
    to_at INTEGER NOT NULL,
    status TEXT NOT NULL DEFAULT 'pending',
    created_at INTEGER NOT NULL
)"#;

const SESSION_COLUMNS: &str = "id, user_id, user_name, class_name, date, in_at, in_lat, in_lng, out_at, out_lat, out_lng, hours";

fn store_err(e: impl std::fmt::Display) -> DomainError {
    DomainError::StoreUnavailable(e.to_string())
}

fn from_millis(ms: i64) -> Result<DateTime<Utc>, DomainError> {
    DateTime::<Utc>::from_timestamp_millis(ms)
        .ok_or_else(|| store_err(format!("timestamp out of range: {}", ms)))
}

/// SQLite store. Safe to share via Arc; each call opens a cheap connection handle.
pub struct SqliteRepo {
    db: Database,
    db_path: PathBuf,
}

impl SqliteRepo {
    /// Connect to (or create) the database and ensure the schema exists.
    /// Sets WAL mode and synchronous=NORMAL.
    pub async fn connect(base_dir: impl AsRef<Path>) -> Result<Self, DomainError> {
        let base = base_dir.as_ref();
        std::fs::create_dir_all(base).map_err(store_err)?;
        let db_path = base.join("attendance.db");
        let path_str = db_path.to_string_lossy();
        let db = libsql::Builder::new_local(path_str.as_ref())
            .build()
            .await
            .map_err(store_err)?;
        let conn = db.connect().map_err(store_err)?;

        // PRAGMA returns a row; use query and drain it (execute fails when rows are returned).
        for pragma in ["PRAGMA journal_mode=WAL", "PRAGMA synchronous=NORMAL"] {
            let mut rows = conn
                .query(pragma, ())
                .await
                .map_err(|e| store_err(format!("{} failed: {}", pragma, e)))?;
            while rows.next().await.map_err(store_err)?.is_some() {}
        }

        for ddl in [
            GEOFENCES_TABLE,
            ATTENDANCE_TABLE,
            ATTENDANCE_OPEN_INDEX,
            ATTENDANCE_USER_INDEX,
            ATTENDANCE_CLASS_INDEX,
            REQUESTS_TABLE,
        ] {
            conn.execute(ddl, ()).await.map_err(store_err)?;
        }

        info!(path = %db_path.display(), "SQLite connected with WAL mode");

        Ok(Self { db, db_path })
    }

    pub fn path(&self) -> &Path {
        &self.db_path
    }

    fn conn(&self) -> Result<Connection, DomainError> {
        self.db.connect().map_err(store_err)
    }

    fn row_to_session(row: &Row) -> Result<AttendanceSession, DomainError> {
        let date_str: String = row.get(4).map_err(store_err)?;
        let date = NaiveDate::parse_from_str(&date_str, "%Y-%m-%d").map_err(store_err)?;
        let in_at: i64 = row.get(5).map_err(store_err)?;
        let in_lat: f64 = row.get(6).map_err(store_err)?;
        let in_lng: f64 = row.get(7).map_err(store_err)?;
        let out_at: Option<i64> = row.get(8).map_err(store_err)?;
        let out_lat: Option<f64> = row.get(9).map_err(store_err)?;
        let out_lng: Option<f64> = row.get(10).map_err(store_err)?;
        let hours: Option<f64> = row.get(11).map_err(store_err)?;

        let check_out_location = match (out_lat, out_lng) {
            (Some(lat), Some(lng)) => Some(Coordinate::new(lat, lng).map_err(store_err)?),
            _ => None,
        };
        Ok(AttendanceSession {
            id: row.get(0).map_err(store_err)?,
            subject_id: row.get(1).map_err(store_err)?,
            subject_name: row.get(2).map_err(store_err)?,
            class_name: row.get(3).map_err(store_err)?,
            date,
            check_in_at: from_millis(in_at)?,
            check_in_location: Coordinate::new(in_lat, in_lng).map_err(store_err)?,
            check_out_at: out_at.map(from_millis).transpose()?,
            check_out_location,
            duration_hours: hours,
        })
    }

    fn row_to_request(row: &Row) -> Result<OverrideRequest, DomainError> {
        let status: String = row.get(7).map_err(store_err)?;
        Ok(OverrideRequest {
            id: row.get(0).map_err(store_err)?,
            subject_id: row.get(1).map_err(store_err)?,
            subject_name: row.get(2).map_err(store_err)?,
            class_name: row.get(3).map_err(store_err)?,
            reason: row.get(4).map_err(store_err)?,
            requested_from: from_millis(row.get(5).map_err(store_err)?)?,
            requested_to: from_millis(row.get(6).map_err(store_err)?)?,
            status: status.parse().map_err(store_err)?,
            created_at: from_millis(row.get(8).map_err(store_err)?)?,
        })
    }

    async fn query_sessions(
        &self,
        filter_column: &str,
        value: &str,
    ) -> Result<Vec<AttendanceSession>, DomainError> {
        let sql = format!(
            "SELECT {} FROM attendance WHERE {} = ?1 ORDER BY in_at DESC",
            SESSION_COLUMNS, filter_column
        );
        let conn = self.conn()?;
        let mut rows = conn
            .query(&sql, params![value])
            .await
            .map_err(store_err)?;
        let mut sessions = Vec::new();
        while let Some(row) = rows.next().await.map_err(store_err)? {
            sessions.push(Self::row_to_session(&row)?);
        }
        Ok(sessions)
    }
}

#[async_trait::async_trait]
impl GeofenceStore for SqliteRepo {
    async fn geofence_for(&self, class_name: &str) -> Result<Option<Geofence>, DomainError> {
        let conn = self.conn()?;
        let mut rows = conn
            .query(
                "SELECT class_name, center_lat, center_lng, radius_m, advisor_id FROM geofences WHERE class_name = ?1",
                params![class_name],
            )
            .await
            .map_err(store_err)?;

        let Some(row) = rows.next().await.map_err(store_err)? else {
            return Ok(None);
        };
        let lat: f64 = row.get(1).map_err(store_err)?;
        let lng: f64 = row.get(2).map_err(store_err)?;
        let radius: f64 = row.get(3).map_err(store_err)?;
        let center = Coordinate::new(lat, lng).map_err(store_err)?;
        let fence = Geofence::new(
            row.get::<String>(0).map_err(store_err)?,
            center,
            radius,
            row.get::<String>(4).map_err(store_err)?,
        )
        .map_err(store_err)?;
        Ok(Some(fence))
    }

    async fn save_geofence(&self, fence: &Geofence) -> Result<(), DomainError> {
        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO geofences (class_name, center_lat, center_lng, radius_m, advisor_id, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT (class_name) DO UPDATE SET
                center_lat = excluded.center_lat,
                center_lng = excluded.center_lng,
                radius_m = excluded.radius_m,
                advisor_id = excluded.advisor_id,
                updated_at = excluded.updated_at
            "#,
            params![
                fence.class_name.as_str(),
                fence.center.latitude(),
                fence.center.longitude(),
                fence.radius_meters,
                fence.advisor_id.as_str(),
                Utc::now().timestamp_millis()
            ],
        )
        .await
        .map_err(store_err)?;
        debug!(class_name = %fence.class_name, radius_m = fence.radius_meters, "geofence saved");
        Ok(())
    }
}

#[async_trait::async_trait]
impl SessionStore for SqliteRepo {
    async fn create(&self, session: &AttendanceSession) -> Result<(), DomainError> {
        let conn = self.conn()?;
        let result = conn
            .execute(
                r#"
                INSERT INTO attendance (id, user_id, user_name, class_name, date, in_at, in_lat, in_lng)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
                params![
                    session.id.as_str(),
                    session.subject_id.as_str(),
                    session.subject_name.as_str(),
                    session.class_name.as_str(),
                    session.date.format("%Y-%m-%d").to_string(),
                    session.check_in_at.timestamp_millis(),
                    session.check_in_location.latitude(),
                    session.check_in_location.longitude()
                ],
            )
            .await;
        match result {
            Ok(_) => Ok(()),
            // Partial unique index on open rows: another check-in won the race.
            Err(e) if e.to_string().contains("UNIQUE constraint failed") => {
                Err(DomainError::SessionAlreadyOpen)
            }
            Err(e) => Err(store_err(e)),
        }
    }

    async fn find_open_session(
        &self,
        subject_id: &str,
    ) -> Result<Option<AttendanceSession>, DomainError> {
        let sql = format!(
            "SELECT {} FROM attendance WHERE user_id = ?1 AND out_at IS NULL ORDER BY in_at DESC LIMIT 1",
            SESSION_COLUMNS
        );
        let conn = self.conn()?;
        let mut rows = conn
            .query(&sql, params![subject_id])
            .await
            .map_err(store_err)?;
        match rows.next().await.map_err(store_err)? {
            Some(row) => Ok(Some(Self::row_to_session(&row)?)),
            None => Ok(None),
        }
    }

    async fn close(&self, session: &AttendanceSession) -> Result<(), DomainError> {
        let (Some(out_at), Some(out_loc), Some(hours)) = (
            session.check_out_at,
            session.check_out_location,
            session.duration_hours,
        ) else {
            return Err(DomainError::NoActiveSession);
        };
        let conn = self.conn()?;
        let affected = conn
            .execute(
                r#"
                UPDATE attendance
                SET out_at = ?1, out_lat = ?2, out_lng = ?3, hours = ?4
                WHERE id = ?5 AND out_at IS NULL
                "#,
                params![
                    out_at.timestamp_millis(),
                    out_loc.latitude(),
                    out_loc.longitude(),
                    hours,
                    session.id.as_str()
                ],
            )
            .await
            .map_err(store_err)?;
        if affected == 0 {
            return Err(DomainError::NoActiveSession);
        }
        Ok(())
    }

    async fn list_for_subject(
        &self,
        subject_id: &str,
    ) -> Result<Vec<AttendanceSession>, DomainError> {
        self.query_sessions("user_id", subject_id).await
    }

    async fn list_for_class(&self, class_name: &str) -> Result<Vec<AttendanceSession>, DomainError> {
        self.query_sessions("class_name", class_name).await
    }
}

#[async_trait::async_trait]
impl OverrideStore for SqliteRepo {
    async fn create(&self, request: &OverrideRequest) -> Result<(), DomainError> {
        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO requests (id, user_id, student_name, class_name, reason, from_at, to_at, status, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                request.id.as_str(),
                request.subject_id.as_str(),
                request.subject_name.as_str(),
                request.class_name.as_str(),
                request.reason.as_str(),
                request.requested_from.timestamp_millis(),
                request.requested_to.timestamp_millis(),
                request.status.as_str(),
                request.created_at.timestamp_millis()
            ],
        )
        .await
        .map_err(store_err)?;
        Ok(())
    }

    async fn requests_for_subject(
        &self,
        subject_id: &str,
    ) -> Result<Vec<OverrideRequest>, DomainError> {
        let conn = self.conn()?;
        let mut rows = conn
            .query(
                r#"
                SELECT id, user_id, student_name, class_name, reason, from_at, to_at, status, created_at
                FROM requests
                WHERE user_id = ?1
                ORDER BY created_at DESC
                "#,
                params![subject_id],
            )
            .await
            .map_err(store_err)?;
        let mut requests = Vec::new();
        while let Some(row) = rows.next().await.map_err(store_err)? {
            requests.push(Self::row_to_request(&row)?);
        }
        Ok(requests)
    }
}
