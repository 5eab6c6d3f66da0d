//! Marked-place repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Mirror the saved-place collection into the `marked_places` table.
//! - Map rows back into `Place` records in storage order.
//!
//! # Invariants
//! - `place_id` uniqueness is enforced by a unique index; inserts resolve
//!   conflicts with `DO NOTHING` instead of a read-then-write check.
//! - Coordinates are stored rounded to 6 decimal places.
//! - `fetch_all` returns rows ordered by surrogate key (insertion order).
//!   Rows that cannot form a valid `Place` are skipped and logged.

use crate::db::migrations::MARKED_PLACES_SCHEMA_SQL;
use crate::model::place::Place;
use crate::repo::{RepoError, RepoResult};
use log::{debug, error, warn};
use rusqlite::{params, Connection, Row};

const STORAGE_SCALE: f64 = 1_000_000.0;

/// Repository interface for the durable marked-place mirror.
pub trait MarkedPlaceRepository {
    /// Creates the table and unique index when absent. Idempotent.
    fn ensure_schema(&self) -> RepoResult<()>;
    /// Inserts one place; returns `false` when `place.id` is already stored.
    fn insert(&self, place: &Place) -> RepoResult<bool>;
    /// Returns every stored place in storage order.
    fn fetch_all(&self) -> RepoResult<Vec<Place>>;
    /// Deletes the row for `place_id`; returns `false` when nothing matched.
    fn delete_by_place_id(&self, place_id: &str) -> RepoResult<bool>;
    /// Deletes every row; returns how many were removed.
    fn delete_all(&self) -> RepoResult<usize>;
    fn contains(&self, place_id: &str) -> RepoResult<bool>;
    fn count(&self) -> RepoResult<usize>;
}

/// SQLite-backed marked-place repository.
pub struct SqliteMarkedPlaceRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteMarkedPlaceRepository<'conn> {
    /// Wraps a connection without touching the schema.
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Wraps a connection and makes sure the schema exists.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        let repo = Self::new(conn);
        repo.ensure_schema()?;
        Ok(repo)
    }
}

impl MarkedPlaceRepository for SqliteMarkedPlaceRepository<'_> {
    fn ensure_schema(&self) -> RepoResult<()> {
        self.conn.execute_batch(MARKED_PLACES_SCHEMA_SQL)?;
        Ok(())
    }

    fn insert(&self, place: &Place) -> RepoResult<bool> {
        place.validate()?;

        let changed = self
            .conn
            .execute(
                "INSERT INTO marked_places (place_id, name, latitude, longitude, address)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(place_id) DO NOTHING;",
                params![
                    place.id.as_str(),
                    place.name.as_str(),
                    round_coordinate(place.latitude),
                    round_coordinate(place.longitude),
                    place.address.as_deref(),
                ],
            )
            .map_err(|err| {
                error!(
                    "event=marked_place_insert module=repo status=error place_id={} error={}",
                    place.id, err
                );
                RepoError::from(err)
            })?;

        debug!(
            "event=marked_place_insert module=repo status=ok place_id={} inserted={}",
            place.id,
            changed == 1
        );
        Ok(changed == 1)
    }

    fn fetch_all(&self) -> RepoResult<Vec<Place>> {
        // Legacy tables declare `string` columns (NUMERIC affinity) and allow
        // NULLs, so text columns are coerced here.
        let mut stmt = self.conn.prepare(
            "SELECT mp_id,
                    CAST(place_id AS TEXT) AS place_id,
                    COALESCE(CAST(name AS TEXT), '') AS name,
                    latitude,
                    longitude,
                    CAST(address AS TEXT) AS address
             FROM marked_places
             ORDER BY mp_id ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut places = Vec::new();
        while let Some(row) = rows.next()? {
            match parse_place_row(row) {
                Ok(place) => places.push(place),
                Err(err) => {
                    let mp_id = row.get::<_, i64>("mp_id").unwrap_or_default();
                    warn!(
                        "event=marked_place_fetch module=repo status=skipped mp_id={} error={}",
                        mp_id, err
                    );
                }
            }
        }
        Ok(places)
    }

    fn delete_by_place_id(&self, place_id: &str) -> RepoResult<bool> {
        let changed = self
            .conn
            .execute(
                "DELETE FROM marked_places WHERE place_id = ?1;",
                [place_id],
            )
            .map_err(|err| {
                error!(
                    "event=marked_place_delete module=repo status=error place_id={} error={}",
                    place_id, err
                );
                RepoError::from(err)
            })?;
        Ok(changed > 0)
    }

    fn delete_all(&self) -> RepoResult<usize> {
        let changed = self.conn.execute("DELETE FROM marked_places;", [])?;
        Ok(changed)
    }

    fn contains(&self, place_id: &str) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM marked_places WHERE place_id = ?1);",
            [place_id],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn count(&self) -> RepoResult<usize> {
        let count: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM marked_places;", [], |row| row.get(0))?;
        usize::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative row count `{count}`")))
    }
}

/// Rounds a coordinate to the 6 decimal places kept by storage.
pub fn round_coordinate(value: f64) -> f64 {
    (value * STORAGE_SCALE).round() / STORAGE_SCALE
}

fn parse_place_row(row: &Row<'_>) -> RepoResult<Place> {
    let place_id: Option<String> = row.get("place_id")?;
    let place = Place {
        id: place_id.unwrap_or_default(),
        name: row.get("name")?,
        latitude: row.get("latitude")?,
        longitude: row.get("longitude")?,
        address: row.get("address")?,
    };
    place.validate()?;
    Ok(place)
}
