// Persistence boundary for the ladder aggregate: load the full entity set,
// save it wholesale. The ranking core never touches this; handlers load,
// mutate in memory, then save.

use async_trait::async_trait;
use std::sync::RwLock;

use crate::db::Database;
use crate::error::LadderError;
use crate::ladder::{MatchRecord, Player};

#[async_trait]
pub trait LadderStore: Send + Sync {
    /// Reconstruct the full entity set from the backing store.
    async fn load(&self) -> Result<(Vec<Player>, Vec<MatchRecord>), LadderError>;

    /// Overwrite the backing store with the given entity set.
    async fn save(&self, players: &[Player], matches: &[MatchRecord]) -> Result<(), LadderError>;
}

/// SQLite-backed store; `save` is a single transaction.
pub struct SqliteStore {
    db: Database,
}

impl SqliteStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl LadderStore for SqliteStore {
    async fn load(&self) -> Result<(Vec<Player>, Vec<MatchRecord>), LadderError> {
        let players = self.db.list_players().await?;
        let matches = self.db.list_matches().await?;
        Ok((players, matches))
    }

    async fn save(&self, players: &[Player], matches: &[MatchRecord]) -> Result<(), LadderError> {
        self.db.replace_all(players, matches).await?;
        Ok(())
    }
}

/// In-memory store, used by tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<(Vec<Player>, Vec<MatchRecord>)>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LadderStore for MemoryStore {
    async fn load(&self) -> Result<(Vec<Player>, Vec<MatchRecord>), LadderError> {
        let state = self.state.read().unwrap();
        Ok(state.clone())
    }

    async fn save(&self, players: &[Player], matches: &[MatchRecord]) -> Result<(), LadderError> {
        let mut state = self.state.write().unwrap();
        *state = (players.to_vec(), matches.to_vec());
        Ok(())
    }
}
