//! [`SqliteStore`] — the SQLite implementation of [`ScoreStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use hanchan_core::{
  Error as CoreError,
  game::{Game, YakumanEvent, YakumanKind},
  group::{Group, GroupMember, MemberRole, NewGroup},
  participant::{Participant, SessionPlayer, User},
  rules::{RuleConfig, RulesPatch},
  session::{GameSeats, NewSession, Session},
  store::{ScoreStore, SessionQuery},
};

use crate::{
  Result,
  encode::{
    RawGame, RawGroup, RawMember, RawPlayer, RawResult, RawRules, RawSession,
    RawSessionBundle, RawUser, RawYakuman, decode_uuid, encode_date, encode_dt, encode_role,
    encode_rules_json, encode_uuid,
  },
  schema::SCHEMA,
};

/// Outcome of a check made inside a connection call. The outer error is the
/// database; the inner one is a domain refusal such as a missing record.
type Checked<T> = std::result::Result<T, CoreError>;

// ─── Store ───────────────────────────────────────────────────────────────────

/// A hanchan score store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    tracing::info!("schema initialised");
    Ok(())
  }

  /// The session a game belongs to, fully materialised.
  async fn session_of_game(&self, game_id: Uuid) -> Result<Session> {
    let game_id_str = encode_uuid(game_id);

    let session_id: Option<String> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT session_id FROM games WHERE game_id = ?1",
            rusqlite::params![game_id_str],
            |r| r.get(0),
          )
          .optional()?)
      })
      .await?;

    let session_id = session_id.ok_or(CoreError::GameNotFound(game_id))?;
    let session_id = decode_uuid(&session_id)?;
    Ok(
      self
        .get_session(session_id)
        .await?
        .ok_or(CoreError::SessionNotFound(session_id))?,
    )
  }
}

// ─── Row readers ─────────────────────────────────────────────────────────────

fn read_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawUser> {
  Ok(RawUser {
    user_id:      row.get(0)?,
    display_name: row.get(1)?,
    created_at:   row.get(2)?,
  })
}

fn read_member(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawMember> {
  Ok(RawMember {
    group_id:     row.get(0)?,
    user_id:      row.get(1)?,
    guest_name:   row.get(2)?,
    display_name: row.get(3)?,
    role:         row.get(4)?,
    joined_at:    row.get(5)?,
  })
}

fn read_rules(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawRules> {
  Ok(RawRules {
    game_type:    row.get(0)?,
    start_score:  row.get(1)?,
    return_score: row.get(2)?,
    uma:          [row.get(3)?, row.get(4)?, row.get(5)?, row.get(6)?],
    has_oka:      row.get(7)?,
  })
}

fn read_player(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawPlayer> {
  Ok(RawPlayer {
    player_id:    row.get(0)?,
    session_id:   row.get(1)?,
    seat_index:   row.get(2)?,
    user_id:      row.get(3)?,
    guest_name:   row.get(4)?,
    display_name: row.get(5)?,
  })
}

const MEMBER_COLUMNS: &str = "SELECT m.group_id, m.user_id, m.guest_name, u.display_name, m.role, m.joined_at
   FROM group_members m
   LEFT JOIN users u ON u.user_id = m.user_id";

const PLAYER_COLUMNS: &str = "SELECT p.player_id, p.session_id, p.seat_index, p.user_id, p.guest_name, u.display_name
   FROM session_players p
   LEFT JOIN users u ON u.user_id = p.user_id";

const RULES_COLUMNS: &str = "SELECT game_type, start_score, return_score,
          uma_first, uma_second, uma_third, uma_fourth, has_oka
   FROM group_rules";

fn user_exists(conn: &rusqlite::Connection, user_id: &str) -> rusqlite::Result<bool> {
  Ok(
    conn
      .query_row(
        "SELECT 1 FROM users WHERE user_id = ?1",
        rusqlite::params![user_id],
        |_| Ok(true),
      )
      .optional()?
      .unwrap_or(false),
  )
}

/// Read every row belonging to one session. `None` if the session is absent.
fn read_session_bundle(
  conn: &rusqlite::Connection,
  session_id: &str,
) -> rusqlite::Result<Option<RawSessionBundle>> {
  let session = conn
    .query_row(
      "SELECT session_id, group_id, date, created_by, created_at, rules_json
       FROM sessions WHERE session_id = ?1",
      rusqlite::params![session_id],
      |row| {
        Ok(RawSession {
          session_id: row.get(0)?,
          group_id:   row.get(1)?,
          date:       row.get(2)?,
          created_by: row.get(3)?,
          created_at: row.get(4)?,
          rules_json: row.get(5)?,
        })
      },
    )
    .optional()?;

  let Some(session) = session else {
    return Ok(None);
  };

  let group_rules = match &session.group_id {
    Some(group_id) => conn
      .query_row(
        &format!("{RULES_COLUMNS} WHERE group_id = ?1"),
        rusqlite::params![group_id],
        read_rules,
      )
      .optional()?,
    None => None,
  };

  let players = conn
    .prepare(&format!("{PLAYER_COLUMNS} WHERE p.session_id = ?1 ORDER BY p.seat_index"))?
    .query_map(rusqlite::params![session_id], read_player)?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  let games = conn
    .prepare("SELECT game_id, game_number FROM games WHERE session_id = ?1 ORDER BY game_number")?
    .query_map(rusqlite::params![session_id], |row| {
      Ok(RawGame { game_id: row.get(0)?, game_number: row.get(1)? })
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  let results = conn
    .prepare(
      "SELECT r.result_id, r.game_id, r.player_id, r.raw_score, r.rank, r.score
       FROM game_results r
       JOIN games g ON g.game_id = r.game_id
       WHERE g.session_id = ?1
       ORDER BY g.game_number, r.seat",
    )?
    .query_map(rusqlite::params![session_id], |row| {
      Ok(RawResult {
        result_id: row.get(0)?,
        game_id:   row.get(1)?,
        player_id: row.get(2)?,
        raw_score: row.get(3)?,
        rank:      row.get(4)?,
        score:     row.get(5)?,
      })
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  let yakuman = conn
    .prepare(
      "SELECT y.yakuman_id, y.game_id, y.player_id, y.kind
       FROM yakuman y
       JOIN games g ON g.game_id = y.game_id
       WHERE g.session_id = ?1
       ORDER BY y.created_at, y.rowid",
    )?
    .query_map(rusqlite::params![session_id], |row| {
      Ok(RawYakuman {
        yakuman_id: row.get(0)?,
        game_id:    row.get(1)?,
        player_id:  row.get(2)?,
        kind:       row.get(3)?,
      })
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  Ok(Some(RawSessionBundle { session, group_rules, players, games, results, yakuman }))
}

// ─── ScoreStore impl ─────────────────────────────────────────────────────────

impl ScoreStore for SqliteStore {
  type Error = crate::Error;

  // ── Users ─────────────────────────────────────────────────────────────────

  async fn add_user(&self, display_name: String) -> Result<User> {
    let user = User {
      user_id: Uuid::new_v4(),
      display_name,
      created_at: Utc::now(),
    };

    let id_str   = encode_uuid(user.user_id);
    let name_str = user.display_name.clone();
    let at_str   = encode_dt(user.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO users (user_id, display_name, created_at) VALUES (?1, ?2, ?3)",
          rusqlite::params![id_str, name_str, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(user)
  }

  async fn get_user(&self, user_id: Uuid) -> Result<Option<User>> {
    let id_str = encode_uuid(user_id);

    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT user_id, display_name, created_at FROM users WHERE user_id = ?1",
            rusqlite::params![id_str],
            read_user,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawUser::into_user).transpose()
  }

  // ── Groups ────────────────────────────────────────────────────────────────

  async fn create_group(&self, input: NewGroup) -> Result<Group> {
    let group = Group {
      group_id:    Uuid::new_v4(),
      name:        input.name,
      invite_code: input.invite_code,
      created_by:  input.created_by,
      created_at:  Utc::now(),
    };
    let rules = RuleConfig::default();

    let group_id_str = encode_uuid(group.group_id);
    let name_str     = group.name.clone();
    let invite_str   = group.invite_code.clone();
    let creator_str  = encode_uuid(group.created_by);
    let at_str       = encode_dt(group.created_at);
    let creator      = group.created_by;

    let checked: Checked<()> = self
      .conn
      .call(move |conn| {
        if !user_exists(conn, &creator_str)? {
          return Ok(Err(CoreError::UserNotFound(creator)));
        }

        let tx = conn.transaction()?;
        tx.execute(
          "INSERT INTO groups (group_id, name, invite_code, created_by, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![group_id_str, name_str, invite_str, creator_str, at_str],
        )?;
        tx.execute(
          "INSERT INTO group_rules (
             group_id, game_type, start_score, return_score,
             uma_first, uma_second, uma_third, uma_fourth, has_oka, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
          rusqlite::params![
            group_id_str,
            rules.game_type.as_ref(),
            rules.start_score,
            rules.return_score,
            rules.uma[0],
            rules.uma[1],
            rules.uma[2],
            rules.uma[3],
            rules.has_oka,
            at_str,
          ],
        )?;
        tx.execute(
          "INSERT INTO group_members (group_id, user_id, role, joined_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![group_id_str, creator_str, encode_role(MemberRole::Admin), at_str],
        )?;
        tx.commit()?;
        Ok(Ok(()))
      })
      .await?;
    checked?;

    tracing::info!(group_id = %group.group_id, name = %group.name, "group created");
    Ok(group)
  }

  async fn get_group(&self, group_id: Uuid) -> Result<Option<Group>> {
    let id_str = encode_uuid(group_id);

    let raw: Option<RawGroup> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT group_id, name, invite_code, created_by, created_at
             FROM groups WHERE group_id = ?1",
            rusqlite::params![id_str],
            |row| {
              Ok(RawGroup {
                group_id:    row.get(0)?,
                name:        row.get(1)?,
                invite_code: row.get(2)?,
                created_by:  row.get(3)?,
                created_at:  row.get(4)?,
              })
            },
          )
          .optional()?)
      })
      .await?;

    raw.map(RawGroup::into_group).transpose()
  }

  async fn add_member(
    &self,
    group_id:    Uuid,
    participant: Participant,
    role:        MemberRole,
  ) -> Result<GroupMember> {
    let group_id_str = encode_uuid(group_id);
    let user_id      = participant.user_id();
    let user_id_str  = user_id.map(encode_uuid);
    let guest_name   = match &participant {
      Participant::Guest { name } => Some(name.clone()),
      Participant::Registered { .. } => None,
    };
    let role_str     = encode_role(role);
    let at_str       = encode_dt(Utc::now());

    let checked: Checked<RawMember> = self
      .conn
      .call(move |conn| {
        let group_exists = conn
          .query_row(
            "SELECT 1 FROM groups WHERE group_id = ?1",
            rusqlite::params![group_id_str],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        if !group_exists {
          return Ok(Err(CoreError::GroupNotFound(group_id)));
        }

        if let (Some(user), Some(user_str)) = (user_id, &user_id_str) {
          if !user_exists(conn, user_str)? {
            return Ok(Err(CoreError::UserNotFound(user)));
          }
          let already = conn
            .query_row(
              "SELECT 1 FROM group_members WHERE group_id = ?1 AND user_id = ?2",
              rusqlite::params![group_id_str, user_str],
              |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false);
          if already {
            return Ok(Err(CoreError::AlreadyMember { group: group_id, user }));
          }
        }

        // A guest listed twice under the same name is the same identity.
        if let Some(name) = &guest_name {
          let existing = conn
            .query_row(
              &format!("{MEMBER_COLUMNS} WHERE m.group_id = ?1 AND m.guest_name = ?2"),
              rusqlite::params![group_id_str, name],
              read_member,
            )
            .optional()?;
          if let Some(existing) = existing {
            return Ok(Ok(existing));
          }
        }

        conn.execute(
          "INSERT INTO group_members (group_id, user_id, guest_name, role, joined_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![group_id_str, user_id_str, guest_name, role_str, at_str],
        )?;
        let rowid = conn.last_insert_rowid();

        let member = conn.query_row(
          &format!("{MEMBER_COLUMNS} WHERE m.rowid = ?1"),
          rusqlite::params![rowid],
          read_member,
        )?;
        Ok(Ok(member))
      })
      .await?;

    let member = checked?.into_member()?;
    tracing::debug!(%group_id, member = %member.participant.identity_key(), "member added");
    Ok(member)
  }

  async fn list_members(&self, group_id: Uuid) -> Result<Vec<GroupMember>> {
    let id_str = encode_uuid(group_id);

    let checked: Checked<Vec<RawMember>> = self
      .conn
      .call(move |conn| {
        let group_exists = conn
          .query_row(
            "SELECT 1 FROM groups WHERE group_id = ?1",
            rusqlite::params![id_str],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        if !group_exists {
          return Ok(Err(CoreError::GroupNotFound(group_id)));
        }

        let rows = conn
          .prepare(&format!("{MEMBER_COLUMNS} WHERE m.group_id = ?1 ORDER BY m.joined_at, m.rowid"))?
          .query_map(rusqlite::params![id_str], read_member)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(Ok(rows))
      })
      .await?;

    checked?.into_iter().map(RawMember::into_member).collect()
  }

  async fn get_rules(&self, group_id: Uuid) -> Result<Option<RuleConfig>> {
    let id_str = encode_uuid(group_id);

    let raw: Option<RawRules> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("{RULES_COLUMNS} WHERE group_id = ?1"),
            rusqlite::params![id_str],
            read_rules,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawRules::into_rules).transpose()
  }

  async fn update_rules(&self, group_id: Uuid, patch: RulesPatch) -> Result<RuleConfig> {
    let current = self
      .get_rules(group_id)
      .await?
      .ok_or(CoreError::GroupNotFound(group_id))?;

    if patch.is_empty() {
      return Ok(current);
    }
    let rules = patch.apply(&current);

    let id_str = encode_uuid(group_id);
    let at_str = encode_dt(Utc::now());

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE group_rules SET
             game_type = ?2, start_score = ?3, return_score = ?4,
             uma_first = ?5, uma_second = ?6, uma_third = ?7, uma_fourth = ?8,
             has_oka = ?9, updated_at = ?10
           WHERE group_id = ?1",
          rusqlite::params![
            id_str,
            rules.game_type.as_ref(),
            rules.start_score,
            rules.return_score,
            rules.uma[0],
            rules.uma[1],
            rules.uma[2],
            rules.uma[3],
            rules.has_oka,
            at_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    tracing::info!(%group_id, ?rules, "group rules updated");
    Ok(rules)
  }

  // ── Sessions ──────────────────────────────────────────────────────────────

  async fn create_session(&self, input: NewSession) -> Result<Session> {
    let rules_json = match input.group_id {
      Some(group_id) => {
        // Group sessions always read the group's live rules.
        if self.get_rules(group_id).await?.is_none() {
          return Err(CoreError::GroupNotFound(group_id).into());
        }
        None
      }
      None => Some(encode_rules_json(&input.rules.unwrap_or_default())?),
    };

    let session_id     = Uuid::new_v4();
    let session_id_str = encode_uuid(session_id);
    let group_id_str   = input.group_id.map(encode_uuid);
    let date_str       = encode_date(input.date);
    let creator_str    = encode_uuid(input.created_by);
    let at_str         = encode_dt(Utc::now());
    let seats: Vec<(String, Option<Uuid>, Option<String>)> = input
      .players
      .into_iter()
      .map(|p| {
        let user_id = p.user_id();
        let guest = match p {
          Participant::Guest { name } => Some(name),
          Participant::Registered { .. } => None,
        };
        (encode_uuid(Uuid::new_v4()), user_id, guest)
      })
      .collect();

    let checked: Checked<()> = self
      .conn
      .call(move |conn| {
        for (_, user_id, _) in &seats {
          if let Some(user) = user_id {
            if !user_exists(conn, &encode_uuid(*user))? {
              return Ok(Err(CoreError::UserNotFound(*user)));
            }
          }
        }

        let tx = conn.transaction()?;
        tx.execute(
          "INSERT INTO sessions (session_id, group_id, date, created_by, created_at, rules_json)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![session_id_str, group_id_str, date_str, creator_str, at_str, rules_json],
        )?;
        for (seat_index, (player_id, user_id, guest)) in seats.iter().enumerate() {
          tx.execute(
            "INSERT INTO session_players (player_id, session_id, user_id, guest_name, seat_index)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![
              player_id,
              session_id_str,
              user_id.map(encode_uuid),
              guest,
              seat_index as i64,
            ],
          )?;
        }
        tx.commit()?;
        Ok(Ok(()))
      })
      .await?;
    checked?;

    tracing::info!(%session_id, date = %input.date, "session created");
    Ok(
      self
        .get_session(session_id)
        .await?
        .ok_or(CoreError::SessionNotFound(session_id))?,
    )
  }

  async fn get_session(&self, session_id: Uuid) -> Result<Option<Session>> {
    let id_str = encode_uuid(session_id);

    let bundle: Option<RawSessionBundle> = self
      .conn
      .call(move |conn| Ok(read_session_bundle(conn, &id_str)?))
      .await?;

    bundle.map(RawSessionBundle::into_session).transpose()
  }

  async fn list_sessions<'a>(&'a self, query: &'a SessionQuery) -> Result<Vec<Session>> {
    let group_str   = query.group_id.map(encode_uuid);
    let creator_str = query.created_by.map(encode_uuid);
    let player_str  = query.player.map(encode_uuid);
    // SQLite treats a negative LIMIT as unbounded.
    let limit_val   = query.limit.map_or(-1, |l| l as i64);

    let bundles: Vec<RawSessionBundle> = self
      .conn
      .call(move |conn| {
        let ids = conn
          .prepare(
            "SELECT s.session_id
             FROM sessions s
             WHERE (?1 IS NULL OR s.group_id = ?1)
               AND (?2 IS NULL OR s.created_by = ?2)
               AND (?3 IS NULL OR EXISTS (
                     SELECT 1 FROM session_players p
                     WHERE p.session_id = s.session_id AND p.user_id = ?3))
             ORDER BY s.date DESC, s.created_at DESC
             LIMIT ?4",
          )?
          .query_map(
            rusqlite::params![group_str, creator_str, player_str, limit_val],
            |row| row.get::<_, String>(0),
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut bundles = Vec::with_capacity(ids.len());
        for id in &ids {
          if let Some(bundle) = read_session_bundle(conn, id)? {
            bundles.push(bundle);
          }
        }
        Ok(bundles)
      })
      .await?;

    bundles.into_iter().map(RawSessionBundle::into_session).collect()
  }

  async fn delete_session(&self, session_id: Uuid) -> Result<()> {
    let id_str = encode_uuid(session_id);

    let affected = self
      .conn
      .call(move |conn| {
        Ok(conn.execute("DELETE FROM sessions WHERE session_id = ?1", rusqlite::params![id_str])?)
      })
      .await?;

    if affected == 0 {
      return Err(CoreError::SessionNotFound(session_id).into());
    }
    tracing::info!(%session_id, "session deleted");
    Ok(())
  }

  // ── Games ─────────────────────────────────────────────────────────────────

  async fn add_game(&self, session_id: Uuid, seats: GameSeats) -> Result<Game> {
    let session = self
      .get_session(session_id)
      .await?
      .ok_or(CoreError::SessionNotFound(session_id))?;

    let plan = session.plan_seats(&seats)?;
    let game = Game::new(session_id, session.next_game_number(), &plan.player_ids);

    let session_id_str = encode_uuid(session_id);
    let game_id_str    = encode_uuid(game.game_id);
    let number         = i64::from(game.game_number);
    let at_str         = encode_dt(Utc::now());
    let new_players: Vec<(String, Option<String>, i64)> = plan
      .new_players
      .iter()
      .map(|p| {
        (
          encode_uuid(p.player_id),
          Some(p.participant.display_name().to_owned()),
          i64::from(p.seat_index),
        )
      })
      .collect();
    let results: Vec<(String, String)> = game
      .results
      .iter()
      .map(|r| (encode_uuid(r.result_id), encode_uuid(r.player_id)))
      .collect();

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        for (player_id, guest_name, seat_index) in &new_players {
          tx.execute(
            "INSERT INTO session_players (player_id, session_id, guest_name, seat_index)
             VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![player_id, session_id_str, guest_name, seat_index],
          )?;
        }
        tx.execute(
          "INSERT INTO games (game_id, session_id, game_number, created_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![game_id_str, session_id_str, number, at_str],
        )?;
        for (seat, (result_id, player_id)) in results.iter().enumerate() {
          tx.execute(
            "INSERT INTO game_results (result_id, game_id, player_id, seat)
             VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![result_id, game_id_str, player_id, seat as i64],
          )?;
        }
        tx.commit()?;
        Ok(())
      })
      .await?;

    tracing::info!(
      %session_id,
      game_id = %game.game_id,
      game_number = game.game_number,
      new_guests = plan.new_players.len(),
      "game added"
    );
    Ok(game)
  }

  async fn delete_game(&self, game_id: Uuid) -> Result<()> {
    let id_str = encode_uuid(game_id);

    let affected = self
      .conn
      .call(move |conn| {
        Ok(conn.execute("DELETE FROM games WHERE game_id = ?1", rusqlite::params![id_str])?)
      })
      .await?;

    if affected == 0 {
      return Err(CoreError::GameNotFound(game_id).into());
    }
    tracing::info!(%game_id, "game deleted");
    Ok(())
  }

  async fn record_raw_score(
    &self,
    game_id:   Uuid,
    player_id: Uuid,
    raw_score: Option<i64>,
  ) -> Result<Game> {
    let mut session = self.session_of_game(game_id).await?;
    let rules = session.rules;
    let game = session
      .game_mut(game_id)
      .ok_or(CoreError::GameNotFound(game_id))?;
    game.set_raw_score(player_id, raw_score, &rules)?;
    let game = game.clone();

    let rows: Vec<(String, Option<i64>, Option<i64>, i64)> = game
      .results
      .iter()
      .map(|r| (encode_uuid(r.result_id), r.raw_score, r.rank.map(i64::from), r.score))
      .collect();

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        for (result_id, raw, rank, score) in &rows {
          tx.execute(
            "UPDATE game_results SET raw_score = ?2, rank = ?3, score = ?4 WHERE result_id = ?1",
            rusqlite::params![result_id, raw, rank, score],
          )?;
        }
        tx.commit()?;
        Ok(())
      })
      .await?;

    tracing::debug!(
      %game_id,
      %player_id,
      ?raw_score,
      complete = game.is_complete(),
      "raw score recorded"
    );
    Ok(game)
  }

  // ── Yakuman ───────────────────────────────────────────────────────────────

  async fn add_yakuman(
    &self,
    game_id:   Uuid,
    player_id: Uuid,
    kind:      YakumanKind,
  ) -> Result<YakumanEvent> {
    let event = YakumanEvent { yakuman_id: Uuid::new_v4(), game_id, player_id, kind };

    let yakuman_id_str = encode_uuid(event.yakuman_id);
    let game_id_str    = encode_uuid(game_id);
    let player_id_str  = encode_uuid(player_id);
    let kind_str       = kind.as_ref().to_owned();
    let at_str         = encode_dt(Utc::now());

    let checked: Checked<()> = self
      .conn
      .call(move |conn| {
        let game_exists = conn
          .query_row(
            "SELECT 1 FROM games WHERE game_id = ?1",
            rusqlite::params![game_id_str],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        if !game_exists {
          return Ok(Err(CoreError::GameNotFound(game_id)));
        }

        let seated = conn
          .query_row(
            "SELECT 1 FROM game_results WHERE game_id = ?1 AND player_id = ?2",
            rusqlite::params![game_id_str, player_id_str],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        if !seated {
          return Ok(Err(CoreError::PlayerNotSeated { game: game_id, player: player_id }));
        }

        conn.execute(
          "INSERT INTO yakuman (yakuman_id, game_id, player_id, kind, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![yakuman_id_str, game_id_str, player_id_str, kind_str, at_str],
        )?;
        Ok(Ok(()))
      })
      .await?;
    checked?;

    tracing::info!(%game_id, %player_id, %kind, "yakuman recorded");
    Ok(event)
  }

  async fn remove_yakuman(&self, yakuman_id: Uuid) -> Result<()> {
    let id_str = encode_uuid(yakuman_id);

    let affected = self
      .conn
      .call(move |conn| {
        Ok(conn.execute("DELETE FROM yakuman WHERE yakuman_id = ?1", rusqlite::params![id_str])?)
      })
      .await?;

    if affected == 0 {
      return Err(CoreError::YakumanNotFound(yakuman_id).into());
    }
    Ok(())
  }

  // ── Players ───────────────────────────────────────────────────────────────

  async fn rename_guest(&self, player_id: Uuid, name: String) -> Result<SessionPlayer> {
    let id_str = encode_uuid(player_id);

    let checked: Checked<RawPlayer> = self
      .conn
      .call(move |conn| {
        let user_id: Option<Option<String>> = conn
          .query_row(
            "SELECT user_id FROM session_players WHERE player_id = ?1",
            rusqlite::params![id_str],
            |r| r.get(0),
          )
          .optional()?;
        match user_id {
          None => return Ok(Err(CoreError::PlayerNotFound(player_id))),
          Some(Some(_)) => return Ok(Err(CoreError::NotAGuest(player_id))),
          Some(None) => {}
        }

        conn.execute(
          "UPDATE session_players SET guest_name = ?2 WHERE player_id = ?1",
          rusqlite::params![id_str, name],
        )?;
        let player = conn.query_row(
          &format!("{PLAYER_COLUMNS} WHERE p.player_id = ?1"),
          rusqlite::params![id_str],
          read_player,
        )?;
        Ok(Ok(player))
      })
      .await?;

    let player = checked?.into_player()?;
    tracing::debug!(%player_id, name = %player.display_name(), "guest renamed");
    Ok(player)
  }
}
