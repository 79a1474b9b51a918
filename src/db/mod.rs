// Database access layer (SQLite via sqlx): the durable car store.

use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

use crate::error::{Error, Result};
use crate::metrics;
use crate::scoring;

/// A registered car with its attributes and cumulative race statistics.
///
/// `car_class` is derived from horsepower and weight once at creation
/// and never recomputed. `wins <= races` always holds; both counters are
/// only ever advanced by `record_race_result`.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Car {
    pub id: i64,
    pub make: String,
    pub model: String,
    pub year: i64,
    pub horsepower: i64,
    /// Curb weight in pounds.
    pub weight: f64,
    /// 0-60 mph time in seconds.
    pub zero_to_sixty: f64,
    /// Top speed in mph.
    pub top_speed: i64,
    /// Handling rating, 1-10.
    pub handling: i64,
    pub car_class: String,
    pub races: i64,
    pub wins: i64,
}

/// Attributes supplied at registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCar {
    pub make: String,
    pub model: String,
    pub year: i64,
    pub horsepower: i64,
    pub weight: f64,
    pub zero_to_sixty: f64,
    pub top_speed: i64,
    pub handling: i64,
}

pub struct Database {
    pool: SqlitePool,
}

const CAR_COLUMNS: &str = "id, make, model, year, horsepower, weight, zero_to_sixty, top_speed, handling, car_class, races, wins";

impl Database {
    pub async fn new(database_url: &str) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;
        let db = Self { pool };
        db.run_migrations().await?;
        Ok(db)
    }

    async fn run_migrations(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS cars (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                make TEXT NOT NULL,
                model TEXT NOT NULL,
                year INTEGER NOT NULL,
                horsepower INTEGER NOT NULL,
                weight REAL NOT NULL,
                zero_to_sixty REAL NOT NULL,
                top_speed INTEGER NOT NULL,
                handling INTEGER NOT NULL,
                car_class TEXT NOT NULL,
                races INTEGER NOT NULL DEFAULT 0,
                wins INTEGER NOT NULL DEFAULT 0,
                UNIQUE(make, model)
            )
        "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    // ── Car CRUD ──────────────────────────────────────────────────────

    /// Validate, classify, and persist a new car with zeroed statistics.
    pub async fn create_car(&self, new: NewCar) -> Result<Car> {
        scoring::validate_attributes(&new)?;
        let class = scoring::classify(new.horsepower, new.weight)?;

        tracing::info!(
            make = %new.make,
            model = %new.model,
            year = new.year,
            horsepower = new.horsepower,
            class = %class,
            "registering car"
        );

        let result = sqlx::query_as::<_, Car>(&format!(
            "INSERT INTO cars (make, model, year, horsepower, weight, zero_to_sixty, top_speed, handling, car_class) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?) RETURNING {CAR_COLUMNS}"
        ))
        .bind(new.make.trim())
        .bind(new.model.trim())
        .bind(new.year)
        .bind(new.horsepower)
        .bind(new.weight)
        .bind(new.zero_to_sixty)
        .bind(new.top_speed)
        .bind(new.handling)
        .bind(class.as_str())
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(car) => {
                metrics::CARS_CREATED_TOTAL.inc();
                Ok(car)
            }
            Err(e) if is_unique_violation(&e) => {
                tracing::warn!(make = %new.make, model = %new.model, "duplicate car");
                Err(Error::DuplicateName {
                    make: new.make.trim().to_string(),
                    model: new.model.trim().to_string(),
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn get_car(&self, id: i64) -> Result<Car> {
        sqlx::query_as::<_, Car>(&format!("SELECT {CAR_COLUMNS} FROM cars WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(Error::NotFound(id))
    }

    pub async fn get_car_by_make_model(&self, make: &str, model: &str) -> Result<Car> {
        sqlx::query_as::<_, Car>(&format!(
            "SELECT {CAR_COLUMNS} FROM cars WHERE make = ? AND model = ?"
        ))
        .bind(make.trim())
        .bind(model.trim())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NameNotFound {
            make: make.trim().to_string(),
            model: model.trim().to_string(),
        })
    }

    pub async fn list_cars(&self) -> Result<Vec<Car>> {
        let rows =
            sqlx::query_as::<_, Car>(&format!("SELECT {CAR_COLUMNS} FROM cars ORDER BY id"))
                .fetch_all(&self.pool)
                .await?;
        Ok(rows)
    }

    pub async fn delete_car(&self, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM cars WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(Error::NotFound(id));
        }
        metrics::CARS_DELETED_TOTAL.inc();
        tracing::info!(car_id = id, "car deleted");
        Ok(())
    }

    // ── Race statistics ───────────────────────────────────────────────

    /// Advance statistics after a race in one transaction: both cars get
    /// `races + 1`, the winner additionally `wins + 1`. If either row is
    /// missing the whole update rolls back.
    pub async fn record_race_result(&self, winner_id: i64, loser_id: i64) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let winner = sqlx::query("UPDATE cars SET races = races + 1, wins = wins + 1 WHERE id = ?")
            .bind(winner_id)
            .execute(&mut *tx)
            .await?;
        if winner.rows_affected() == 0 {
            return Err(Error::NotFound(winner_id));
        }

        let loser = sqlx::query("UPDATE cars SET races = races + 1 WHERE id = ?")
            .bind(loser_id)
            .execute(&mut *tx)
            .await?;
        if loser.rows_affected() == 0 {
            return Err(Error::NotFound(loser_id));
        }

        tx.commit().await?;
        tracing::info!(winner_id, loser_id, "race statistics updated");
        Ok(())
    }

    /// Cars eligible for the leaderboard (at least one race behind them),
    /// in id order; sorting is the leaderboard module's concern.
    pub async fn leaderboard_rows(&self) -> Result<Vec<Car>> {
        let rows = sqlx::query_as::<_, Car>(&format!(
            "SELECT {CAR_COLUMNS} FROM cars WHERE races > 0 ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn miata() -> NewCar {
        NewCar {
            make: "Mazda".to_string(),
            model: "Miata".to_string(),
            year: 2019,
            horsepower: 181,
            weight: 2339.0,
            zero_to_sixty: 5.7,
            top_speed: 135,
            handling: 9,
        }
    }

    fn civic() -> NewCar {
        NewCar {
            make: "Honda".to_string(),
            model: "Civic".to_string(),
            year: 2015,
            horsepower: 158,
            weight: 2762.0,
            zero_to_sixty: 8.2,
            top_speed: 125,
            handling: 6,
        }
    }

    async fn test_db() -> Database {
        Database::new("sqlite::memory:").await.unwrap()
    }

    #[tokio::test]
    async fn test_create_and_get_car() {
        let db = test_db().await;

        let car = db.create_car(miata()).await.unwrap();
        assert_eq!(car.make, "Mazda");
        assert_eq!(car.model, "Miata");
        assert_eq!(car.races, 0);
        assert_eq!(car.wins, 0);
        // 181 hp / 2339 lb = 77.4 per 1000 lb
        assert_eq!(car.car_class, "Economy");

        let fetched = db.get_car(car.id).await.unwrap();
        assert_eq!(fetched.id, car.id);

        let by_name = db.get_car_by_make_model("Mazda", "Miata").await.unwrap();
        assert_eq!(by_name.id, car.id);

        assert!(matches!(db.get_car(999).await, Err(Error::NotFound(999))));
        assert!(matches!(
            db.get_car_by_make_model("No", "Body").await,
            Err(Error::NameNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_duplicate_name_rejected() {
        let db = test_db().await;
        db.create_car(miata()).await.unwrap();
        let result = db.create_car(miata()).await;
        assert!(matches!(result, Err(Error::DuplicateName { .. })));
        assert_eq!(db.list_cars().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_attributes() {
        let db = test_db().await;
        let mut bad = miata();
        bad.handling = 0;
        assert!(matches!(
            db.create_car(bad).await,
            Err(Error::InvalidAttributes(_))
        ));
        assert!(db.list_cars().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_car() {
        let db = test_db().await;
        let car = db.create_car(miata()).await.unwrap();
        db.delete_car(car.id).await.unwrap();
        assert!(matches!(
            db.delete_car(car.id).await,
            Err(Error::NotFound(_))
        ));
        assert!(db.list_cars().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_record_race_result() {
        let db = test_db().await;
        let a = db.create_car(miata()).await.unwrap();
        let b = db.create_car(civic()).await.unwrap();

        db.record_race_result(a.id, b.id).await.unwrap();

        let a = db.get_car(a.id).await.unwrap();
        let b = db.get_car(b.id).await.unwrap();
        assert_eq!((a.races, a.wins), (1, 1));
        assert_eq!((b.races, b.wins), (1, 0));
        assert!(a.wins <= a.races && b.wins <= b.races);
    }

    #[tokio::test]
    async fn test_record_race_result_is_all_or_nothing() {
        let db = test_db().await;
        let a = db.create_car(miata()).await.unwrap();

        // Loser does not exist: winner's row must roll back too
        let result = db.record_race_result(a.id, 999).await;
        assert!(matches!(result, Err(Error::NotFound(999))));

        let a = db.get_car(a.id).await.unwrap();
        assert_eq!((a.races, a.wins), (0, 0));

        // Winner does not exist: nothing is touched either
        let result = db.record_race_result(999, a.id).await;
        assert!(matches!(result, Err(Error::NotFound(999))));
        let a = db.get_car(a.id).await.unwrap();
        assert_eq!((a.races, a.wins), (0, 0));
    }

    #[tokio::test]
    async fn test_leaderboard_rows_filter_unraced() {
        let db = test_db().await;
        let a = db.create_car(miata()).await.unwrap();
        let b = db.create_car(civic()).await.unwrap();
        db.create_car(NewCar {
            make: "Toyota".to_string(),
            model: "Corolla".to_string(),
            ..civic()
        })
        .await
        .unwrap();

        db.record_race_result(a.id, b.id).await.unwrap();

        let rows = db.leaderboard_rows().await.unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|c| c.races > 0));
    }
}
