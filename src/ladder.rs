// Ladder ranking core: the player set, the match log, and the rank-update
// rule applied after each recorded match. No I/O happens here; callers load
// the aggregate, mutate it, and persist it wholesale.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::LadderError;
use crate::sets::{format_sets, parse_sets};

/// Stored timestamp format. Lexicographic order equals chronological order.
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Player {
    pub name: String,
    pub age: i64,
    pub email: String,
    /// Standing position, 1 = best. Unique per player, not necessarily
    /// contiguous in the backing store.
    pub rank: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct MatchRecord {
    pub player1: String,
    pub player2: String,
    pub winner: String,
    pub sets: String,
    pub time: String,
    pub comment: String,
}

/// Tunables governing how far ranks move after an upset.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LadderRules {
    /// Widest standing gap still settled by a plain rank swap; also the
    /// challenge window the web surface enforces.
    pub min_rank_difference: i64,
    /// Positions the winner climbs on a major upset.
    pub uprank_rank_difference: i64,
    /// Positions the beaten favorite drops on a major upset.
    pub downrank_rank_difference: i64,
}

impl Default for LadderRules {
    fn default() -> Self {
        Self {
            min_rank_difference: 6,
            uprank_rank_difference: 3,
            downrank_rank_difference: 3,
        }
    }
}

/// How a recorded match affected the standings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchOutcome {
    /// The favorite won; ranks hold.
    Defended,
    /// Upset within the swap window; the two players exchanged rank values.
    MinorUpset,
    /// Upset past the swap window; the standing sequence was rebuilt and
    /// every rank renumbered.
    MajorUpset,
}

impl MatchOutcome {
    pub fn label(self) -> &'static str {
        match self {
            MatchOutcome::Defended => "defended",
            MatchOutcome::MinorUpset => "minor_upset",
            MatchOutcome::MajorUpset => "major_upset",
        }
    }
}

/// The aggregate root: players (insertion-ordered), matches (append-ordered),
/// and the rank-change rules.
#[derive(Debug, Clone)]
pub struct Ladder {
    rules: LadderRules,
    players: Vec<Player>,
    matches: Vec<MatchRecord>,
}

impl Ladder {
    pub fn new(rules: LadderRules) -> Self {
        Self {
            rules,
            players: Vec::new(),
            matches: Vec::new(),
        }
    }

    /// Rebuild the aggregate from stored state, rejecting rows that violate
    /// the ladder invariants. The backing store can be edited out-of-band,
    /// so nothing loaded here is trusted.
    pub fn from_parts(
        rules: LadderRules,
        players: Vec<Player>,
        matches: Vec<MatchRecord>,
    ) -> Result<Self, LadderError> {
        for (i, p) in players.iter().enumerate() {
            if p.rank < 1 {
                return Err(LadderError::Integrity(format!(
                    "player {:?} has rank {}, ranks start at 1",
                    p.name, p.rank
                )));
            }
            for q in &players[..i] {
                if q.name == p.name {
                    return Err(LadderError::Integrity(format!(
                        "duplicate player name {:?}",
                        p.name
                    )));
                }
                if q.email == p.email {
                    return Err(LadderError::Integrity(format!(
                        "duplicate player email {:?}",
                        p.email
                    )));
                }
                if q.rank == p.rank {
                    return Err(LadderError::Integrity(format!(
                        "players {:?} and {:?} share rank {}",
                        q.name, p.name, p.rank
                    )));
                }
            }
        }

        for (i, m) in matches.iter().enumerate() {
            let row = i + 1;
            if m.player1 == m.player2 {
                return Err(LadderError::Integrity(format!(
                    "match {row} pairs {:?} with itself",
                    m.player1
                )));
            }
            for name in [&m.player1, &m.player2] {
                if !players.iter().any(|p| &p.name == name) {
                    return Err(LadderError::Integrity(format!(
                        "match {row} references unknown player {name:?}"
                    )));
                }
            }
            if m.winner != m.player1 && m.winner != m.player2 {
                return Err(LadderError::Integrity(format!(
                    "match {row} names winner {:?} who did not play in it",
                    m.winner
                )));
            }
            if NaiveDateTime::parse_from_str(&m.time, TIME_FORMAT).is_err() {
                return Err(LadderError::Integrity(format!(
                    "match {row} has unparseable time {:?}",
                    m.time
                )));
            }
        }

        Ok(Self {
            rules,
            players,
            matches,
        })
    }

    pub fn rules(&self) -> LadderRules {
        self.rules
    }

    /// Player set in insertion order. Use `get_ranking` for standings.
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    /// Match log in append order. Use `recent_matches` for display order.
    pub fn matches(&self) -> &[MatchRecord] {
        &self.matches
    }

    // ── Registration ─────────────────────────────────────────────────

    /// Add a newcomer at the bottom of the standings.
    pub fn register_player(
        &mut self,
        name: &str,
        age: i64,
        email: &str,
    ) -> Result<Player, LadderError> {
        if self.players.iter().any(|p| p.name == name) {
            return Err(LadderError::DuplicatePlayer(name.to_string()));
        }
        if self.players.iter().any(|p| p.email == email) {
            return Err(LadderError::DuplicateEmail(email.to_string()));
        }
        let rank = self.players.iter().map(|p| p.rank).max().unwrap_or(0) + 1;
        let player = Player {
            name: name.to_string(),
            age,
            email: email.to_string(),
            rank,
        };
        self.players.push(player.clone());
        Ok(player)
    }

    // ── Match recording ──────────────────────────────────────────────

    /// Record a finished match and apply the rank-update rule.
    ///
    /// Validates everything before touching any state: on error, neither the
    /// match log nor any rank has changed. The match itself is appended
    /// regardless of outcome; ranks only move on an upset.
    pub fn record_match(
        &mut self,
        player1: &str,
        player2: &str,
        winner: &str,
        sets: &str,
        time: NaiveDateTime,
        comment: Option<&str>,
    ) -> Result<(MatchRecord, MatchOutcome), LadderError> {
        if player1 == player2 {
            return Err(LadderError::SamePlayer);
        }
        let Some(idx1) = self.players.iter().position(|p| p.name == player1) else {
            return Err(LadderError::PlayerNotFound(player1.to_string()));
        };
        let Some(idx2) = self.players.iter().position(|p| p.name == player2) else {
            return Err(LadderError::PlayerNotFound(player2.to_string()));
        };
        if winner != player1 && winner != player2 {
            return Err(LadderError::WinnerNotPlaying(winner.to_string()));
        }
        let sets = format_sets(&parse_sets(sets)?);

        let comment = match comment {
            Some(c) if !c.trim().is_empty() => c.to_string(),
            _ => "None".to_string(),
        };
        let record = MatchRecord {
            player1: player1.to_string(),
            player2: player2.to_string(),
            winner: winner.to_string(),
            sets,
            time: time.format(TIME_FORMAT).to_string(),
            comment,
        };
        self.matches.push(record.clone());

        let outcome = self.apply_rank_update(idx1, idx2, winner == player1);
        Ok((record, outcome))
    }

    /// The rank-update rule. `idx1`/`idx2` index into the player list and are
    /// validated by the caller; `winner_first` says whether the first of the
    /// pair won.
    fn apply_rank_update(&mut self, idx1: usize, idx2: usize, winner_first: bool) -> MatchOutcome {
        // Standing order: player-list indices sorted by rank. The sort is
        // stable, so equal ranks keep insertion order.
        let mut order: Vec<usize> = (0..self.players.len()).collect();
        order.sort_by_key(|&i| self.players[i].rank);

        let mut pos1 = 0;
        let mut pos2 = 0;
        for (pos, &i) in order.iter().enumerate() {
            if i == idx1 {
                pos1 = pos;
            }
            if i == idx2 {
                pos2 = pos;
            }
        }
        let (better_pos, worse_pos) = if pos1 < pos2 {
            (pos1, pos2)
        } else {
            (pos2, pos1)
        };
        let winner_pos = if winner_first { pos1 } else { pos2 };

        // The favorite defended: standings hold.
        if winner_pos == better_pos {
            return MatchOutcome::Defended;
        }

        // Upset. The distance is measured in standing positions, not in the
        // raw rank values (which may have gaps).
        let rank_diff = (worse_pos - better_pos) as i64;
        if rank_diff <= self.rules.min_rank_difference {
            // Minor upset: the two players trade rank values, everyone else
            // stays put.
            let a = order[better_pos];
            let b = order[worse_pos];
            let (rank_a, rank_b) = (self.players[a].rank, self.players[b].rank);
            self.players[a].rank = rank_b;
            self.players[b].rank = rank_a;
            return MatchOutcome::MinorUpset;
        }

        // Major upset: pull the winner up and push the beaten favorite down
        // in the standing sequence, then renumber every rank 1..N.
        let up = self.rules.uprank_rank_difference.max(0) as usize;
        let down = self.rules.downrank_rank_difference.max(0) as usize;

        let winner_slot = order.remove(worse_pos);
        let winner_target = worse_pos.saturating_sub(up);
        order.insert(winner_target, winner_slot);

        // The favorite sat above the winner, so removing the winner left it
        // in place; only a reinsertion at or before it shifted it by one.
        let loser_pos = if winner_target <= better_pos {
            better_pos + 1
        } else {
            better_pos
        };
        let loser_slot = order.remove(loser_pos);
        order.insert((loser_pos + down).min(order.len()), loser_slot);

        for (pos, &slot) in order.iter().enumerate() {
            self.players[slot].rank = (pos + 1) as i64;
        }
        MatchOutcome::MajorUpset
    }

    // ── Queries ──────────────────────────────────────────────────────

    /// Players sorted best rank first. Stable for equal ranks.
    pub fn get_ranking(&self) -> Vec<&Player> {
        let mut ranking: Vec<&Player> = self.players.iter().collect();
        ranking.sort_by_key(|p| p.rank);
        ranking
    }

    /// Exact-name lookup.
    pub fn get_player(&self, name: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.name == name)
    }

    /// Everyone `name` may challenge: all other players within `window` rank
    /// values, in ranking order.
    pub fn eligible_opponents(
        &self,
        name: &str,
        window: i64,
    ) -> Result<Vec<&Player>, LadderError> {
        let anchor = self
            .get_player(name)
            .ok_or_else(|| LadderError::PlayerNotFound(name.to_string()))?
            .rank;
        Ok(self
            .get_ranking()
            .into_iter()
            .filter(|p| p.name != name && (p.rank - anchor).abs() <= window)
            .collect())
    }

    /// Reject a pairing whose rank distance exceeds the challenge window.
    /// The web surface calls this before recording anything.
    pub fn check_challenge(&self, player1: &str, player2: &str) -> Result<(), LadderError> {
        let r1 = self
            .get_player(player1)
            .ok_or_else(|| LadderError::PlayerNotFound(player1.to_string()))?
            .rank;
        let r2 = self
            .get_player(player2)
            .ok_or_else(|| LadderError::PlayerNotFound(player2.to_string()))?
            .rank;
        let distance = (r1 - r2).abs();
        if distance > self.rules.min_rank_difference {
            return Err(LadderError::OutOfReach {
                distance,
                window: self.rules.min_rank_difference,
            });
        }
        Ok(())
    }

    /// The match log, most recent first.
    pub fn recent_matches(&self) -> Vec<&MatchRecord> {
        let mut recent: Vec<&MatchRecord> = self.matches.iter().collect();
        recent.sort_by(|a, b| b.time.cmp(&a.time));
        recent
    }

    /// Matches grouped by calendar month: months most recent first, matches
    /// within a month most recent first.
    pub fn matches_by_month(&self) -> Vec<(String, Vec<&MatchRecord>)> {
        let mut groups: Vec<(String, Vec<&MatchRecord>)> = Vec::new();
        for m in self.recent_matches() {
            let label = month_label(&m.time);
            match groups.last_mut() {
                Some((current, group)) if *current == label => group.push(m),
                _ => groups.push((label, vec![m])),
            }
        }
        groups
    }
}

/// Month heading for a stored match time, e.g. "March 2024". Falls back to
/// the raw string when the time does not parse.
fn month_label(time: &str) -> String {
    NaiveDateTime::parse_from_str(time, TIME_FORMAT)
        .map(|dt| dt.format("%B %Y").to_string())
        .unwrap_or_else(|_| time.to_string())
}
