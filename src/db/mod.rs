// Database access layer (SQLite via sqlx).
//
// Two tables mirror the classic two-sheet ladder layout: a Ranking sheet
// (Name/Rank/Age/Email) and a Matches sheet (Player 1/Player 2/Winner/Sets/
// Time/Comment). Match columns carry player names; the id columns only
// preserve append order. Referential integrity of loaded rows is checked by
// `Ladder::from_parts`, not here, because the backing file can be edited
// out-of-band.

use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

use crate::ladder::{MatchRecord, Player};

pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub async fn new(database_url: &str) -> Result<Self, sqlx::Error> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;
        let db = Self { pool };
        db.run_migrations().await?;
        Ok(db)
    }

    async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS players (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE,
                age INTEGER NOT NULL,
                email TEXT NOT NULL UNIQUE,
                rank INTEGER NOT NULL
            )
        "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS matches (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                player1 TEXT NOT NULL,
                player2 TEXT NOT NULL,
                winner TEXT NOT NULL,
                sets TEXT NOT NULL,
                time TEXT NOT NULL,
                comment TEXT NOT NULL DEFAULT 'None'
            )
        "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// All players, best rank first.
    pub async fn list_players(&self) -> Result<Vec<Player>, sqlx::Error> {
        let rows =
            sqlx::query_as::<_, Player>("SELECT name, age, email, rank FROM players ORDER BY rank")
                .fetch_all(&self.pool)
                .await?;
        Ok(rows)
    }

    /// The match log in append order.
    pub async fn list_matches(&self) -> Result<Vec<MatchRecord>, sqlx::Error> {
        let rows = sqlx::query_as::<_, MatchRecord>(
            "SELECT player1, player2, winner, sets, time, comment FROM matches ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Replace the entire stored state in one transaction. The caller always
    /// hands over the full entity set; there are no partial updates.
    pub async fn replace_all(
        &self,
        players: &[Player],
        matches: &[MatchRecord],
    ) -> Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM players").execute(&mut *tx).await?;
        sqlx::query("DELETE FROM matches").execute(&mut *tx).await?;

        for p in players {
            sqlx::query("INSERT INTO players (name, age, email, rank) VALUES (?, ?, ?, ?)")
                .bind(&p.name)
                .bind(p.age)
                .bind(&p.email)
                .bind(p.rank)
                .execute(&mut *tx)
                .await?;
        }
        for m in matches {
            sqlx::query(
                "INSERT INTO matches (player1, player2, winner, sets, time, comment) VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(&m.player1)
            .bind(&m.player2)
            .bind(&m.winner)
            .bind(&m.sets)
            .bind(&m.time)
            .bind(&m.comment)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_db() -> Database {
        Database::new("sqlite::memory:").await.unwrap()
    }

    fn player(name: &str, rank: i64) -> Player {
        Player {
            name: name.to_string(),
            age: 30,
            email: format!("{name}@club.test"),
            rank,
        }
    }

    fn test_match(player1: &str, player2: &str, time: &str) -> MatchRecord {
        MatchRecord {
            player1: player1.to_string(),
            player2: player2.to_string(),
            winner: player1.to_string(),
            sets: "6-4".to_string(),
            time: time.to_string(),
            comment: "None".to_string(),
        }
    }

    #[tokio::test]
    async fn test_fresh_database_is_empty() {
        let db = test_db().await;
        assert!(db.list_players().await.unwrap().is_empty());
        assert!(db.list_matches().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_replace_all_round_trips() {
        let db = test_db().await;

        let players = vec![player("Ana", 1), player("Ben", 2)];
        let matches = vec![test_match("Ana", "Ben", "2024-03-01 10:00:00")];
        db.replace_all(&players, &matches).await.unwrap();

        let loaded_players = db.list_players().await.unwrap();
        assert_eq!(loaded_players, players);
        let loaded_matches = db.list_matches().await.unwrap();
        assert_eq!(loaded_matches, matches);
    }

    #[tokio::test]
    async fn test_replace_all_overwrites_previous_state() {
        let db = test_db().await;

        db.replace_all(
            &[player("Old", 1)],
            &[test_match("Old", "Old2", "2024-01-01 09:00:00")],
        )
        .await
        .unwrap();

        let players = vec![player("New", 1), player("Newer", 2)];
        db.replace_all(&players, &[]).await.unwrap();

        let loaded = db.list_players().await.unwrap();
        assert_eq!(loaded, players);
        assert!(db.list_matches().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_players_listed_by_rank() {
        let db = test_db().await;

        // Insertion order differs from rank order.
        let players = vec![player("Cara", 3), player("Ana", 1), player("Ben", 2)];
        db.replace_all(&players, &[]).await.unwrap();

        let names: Vec<String> = db
            .list_players()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["Ana", "Ben", "Cara"]);
    }

    #[tokio::test]
    async fn test_matches_listed_in_append_order() {
        let db = test_db().await;

        let players = vec![player("Ana", 1), player("Ben", 2)];
        // Append order deliberately not time order.
        let matches = vec![
            test_match("Ana", "Ben", "2024-03-10 10:00:00"),
            test_match("Ben", "Ana", "2024-03-01 10:00:00"),
        ];
        db.replace_all(&players, &matches).await.unwrap();

        let loaded = db.list_matches().await.unwrap();
        assert_eq!(loaded[0].time, "2024-03-10 10:00:00");
        assert_eq!(loaded[1].time, "2024-03-01 10:00:00");
    }
}
