//! Persistence layer. Runtime queries against Postgres; every read is
//! newest-first and every mutation of an existing record checks ownership
//! before touching it (missing record is `NotFound`, someone else's record is
//! `Forbidden`).

use chrono::NaiveDate;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::models::{FlowLevel, Mood, Note, Period, Symptom, User, UserSettings};

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

// ---- users -----------------------------------------------------------------

pub async fn find_user_by_auth_id(pool: &PgPool, auth_id: &str) -> ApiResult<Option<User>> {
    let row = sqlx::query("SELECT id, email, name, created_at FROM users WHERE auth_id = $1")
        .bind(auth_id)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(map_user))
}

/// Fetch the user for a verified identity, provisioning the row and its
/// default settings on first sight. Concurrent first requests race on the
/// insert; `ON CONFLICT DO NOTHING` plus the re-fetch makes both winners.
pub async fn ensure_user(pool: &PgPool, auth_id: &str, email: &str) -> ApiResult<User> {
    if let Some(user) = find_user_by_auth_id(pool, auth_id).await? {
        return Ok(user);
    }

    sqlx::query(
        "INSERT INTO users (id, auth_id, email) VALUES ($1, $2, $3) \
         ON CONFLICT (auth_id) DO NOTHING",
    )
    .bind(Uuid::new_v4())
    .bind(auth_id)
    .bind(email)
    .execute(pool)
    .await?;

    let user = find_user_by_auth_id(pool, auth_id)
        .await?
        .ok_or_else(|| ApiError::Validation("email already registered to another account".into()))?;

    sqlx::query("INSERT INTO user_settings (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING")
        .bind(user.id)
        .execute(pool)
        .await?;

    Ok(user)
}

pub async fn update_user_name(
    pool: &PgPool,
    user_id: Uuid,
    name: Option<&str>,
) -> ApiResult<User> {
    let row = sqlx::query(
        "UPDATE users SET name = $2 WHERE id = $1 RETURNING id, email, name, created_at",
    )
    .bind(user_id)
    .bind(name)
    .fetch_optional(pool)
    .await?
    .ok_or(ApiError::NotFound("user"))?;
    Ok(map_user(row))
}

// ---- settings --------------------------------------------------------------

/// Idempotent fetch-or-create: the insert is a no-op when a row already
/// exists, so concurrent first accesses both end up reading the same row.
pub async fn fetch_or_create_settings(pool: &PgPool, user_id: Uuid) -> ApiResult<UserSettings> {
    sqlx::query("INSERT INTO user_settings (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING")
        .bind(user_id)
        .execute(pool)
        .await?;

    let row = sqlx::query(
        "SELECT average_cycle_length, average_period_length, reminder_enabled, \
         reminder_days_before FROM user_settings WHERE user_id = $1",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .ok_or(ApiError::NotFound("settings"))?;
    Ok(map_settings(row))
}

/// Fields left `None` keep their stored value.
#[derive(Debug, Default)]
pub struct SettingsPatch {
    pub average_cycle_length: Option<i32>,
    pub average_period_length: Option<i32>,
    pub reminder_enabled: Option<bool>,
    pub reminder_days_before: Option<i32>,
}

pub async fn update_settings(
    pool: &PgPool,
    user_id: Uuid,
    patch: &SettingsPatch,
) -> ApiResult<UserSettings> {
    // A PATCH can arrive before any GET has provisioned the row.
    sqlx::query("INSERT INTO user_settings (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING")
        .bind(user_id)
        .execute(pool)
        .await?;

    let row = sqlx::query(
        "UPDATE user_settings SET \
             average_cycle_length = COALESCE($2, average_cycle_length), \
             average_period_length = COALESCE($3, average_period_length), \
             reminder_enabled = COALESCE($4, reminder_enabled), \
             reminder_days_before = COALESCE($5, reminder_days_before), \
             updated_at = now() \
         WHERE user_id = $1 \
         RETURNING average_cycle_length, average_period_length, reminder_enabled, \
                   reminder_days_before",
    )
    .bind(user_id)
    .bind(patch.average_cycle_length)
    .bind(patch.average_period_length)
    .bind(patch.reminder_enabled)
    .bind(patch.reminder_days_before)
    .fetch_optional(pool)
    .await?
    .ok_or(ApiError::NotFound("settings"))?;
    Ok(map_settings(row))
}

// ---- periods ---------------------------------------------------------------

pub async fn list_periods(
    pool: &PgPool,
    user_id: Uuid,
    limit: Option<i64>,
) -> ApiResult<Vec<Period>> {
    let mut sql = String::from(
        "SELECT id, start_date, end_date, flow_level, created_at FROM periods \
         WHERE user_id = $1 ORDER BY start_date DESC, created_at DESC",
    );
    if limit.is_some() {
        sql.push_str(" LIMIT $2");
    }

    let mut query = sqlx::query(&sql).bind(user_id);
    if let Some(cap) = limit {
        query = query.bind(cap);
    }

    let rows = query.fetch_all(pool).await?;
    Ok(rows.into_iter().map(map_period).collect())
}

pub async fn create_period(
    pool: &PgPool,
    user_id: Uuid,
    start_date: NaiveDate,
    end_date: Option<NaiveDate>,
    flow_level: Option<FlowLevel>,
) -> ApiResult<Period> {
    let row = sqlx::query(
        "INSERT INTO periods (id, user_id, start_date, end_date, flow_level) \
         VALUES ($1, $2, $3, $4, $5) \
         RETURNING id, start_date, end_date, flow_level, created_at",
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(start_date)
    .bind(end_date)
    .bind(flow_level.map(|f| f.as_str()))
    .fetch_one(pool)
    .await?;
    Ok(map_period(row))
}

/// Outer `None` leaves the field unchanged; for the clearable fields the
/// inner `None` writes NULL.
#[derive(Debug, Default)]
pub struct PeriodPatch {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<Option<NaiveDate>>,
    pub flow_level: Option<Option<FlowLevel>>,
}

pub async fn update_period(
    pool: &PgPool,
    user_id: Uuid,
    period_id: Uuid,
    patch: &PeriodPatch,
) -> ApiResult<Period> {
    let existing = sqlx::query(
        "SELECT user_id, start_date, end_date, flow_level FROM periods WHERE id = $1",
    )
    .bind(period_id)
    .fetch_optional(pool)
    .await?
    .ok_or(ApiError::NotFound("period"))?;

    let owner: Uuid = existing.get("user_id");
    if owner != user_id {
        return Err(ApiError::Forbidden);
    }

    let start_date = patch
        .start_date
        .unwrap_or_else(|| existing.get("start_date"));
    let end_date = match patch.end_date {
        Some(value) => value,
        None => existing.get("end_date"),
    };
    let flow_level = match patch.flow_level {
        Some(value) => value,
        None => existing
            .get::<Option<String>, _>("flow_level")
            .as_deref()
            .and_then(FlowLevel::parse),
    };

    if let Some(end) = end_date {
        if end < start_date {
            return Err(ApiError::Validation(
                "endDate must be on or after startDate".into(),
            ));
        }
    }

    let row = sqlx::query(
        "UPDATE periods SET start_date = $2, end_date = $3, flow_level = $4 \
         WHERE id = $1 RETURNING id, start_date, end_date, flow_level, created_at",
    )
    .bind(period_id)
    .bind(start_date)
    .bind(end_date)
    .bind(flow_level.map(|f| f.as_str()))
    .fetch_one(pool)
    .await?;
    Ok(map_period(row))
}

pub async fn delete_period(pool: &PgPool, user_id: Uuid, period_id: Uuid) -> ApiResult<()> {
    check_owner(pool, "periods", "period", period_id, user_id).await?;
    sqlx::query("DELETE FROM periods WHERE id = $1")
        .bind(period_id)
        .execute(pool)
        .await?;
    Ok(())
}

// ---- symptoms --------------------------------------------------------------

pub async fn list_symptoms(
    pool: &PgPool,
    user_id: Uuid,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    limit: Option<i64>,
) -> ApiResult<Vec<Symptom>> {
    let rows = list_dated(pool, ListQuery {
        select: "SELECT id, date, type, severity, created_at FROM symptoms",
        user_id,
        from,
        to,
        limit,
    })
    .await?;
    Ok(rows.into_iter().map(map_symptom).collect())
}

pub async fn create_symptom(
    pool: &PgPool,
    user_id: Uuid,
    date: NaiveDate,
    symptom_type: &str,
    severity: i32,
) -> ApiResult<Symptom> {
    let row = sqlx::query(
        "INSERT INTO symptoms (id, user_id, date, type, severity) \
         VALUES ($1, $2, $3, $4, $5) \
         RETURNING id, date, type, severity, created_at",
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(date)
    .bind(symptom_type)
    .bind(severity)
    .fetch_one(pool)
    .await?;
    Ok(map_symptom(row))
}

pub async fn delete_symptom(pool: &PgPool, user_id: Uuid, symptom_id: Uuid) -> ApiResult<()> {
    check_owner(pool, "symptoms", "symptom", symptom_id, user_id).await?;
    sqlx::query("DELETE FROM symptoms WHERE id = $1")
        .bind(symptom_id)
        .execute(pool)
        .await?;
    Ok(())
}

// ---- moods -----------------------------------------------------------------

pub async fn list_moods(
    pool: &PgPool,
    user_id: Uuid,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    limit: Option<i64>,
) -> ApiResult<Vec<Mood>> {
    let rows = list_dated(pool, ListQuery {
        select: "SELECT id, date, type, created_at FROM moods",
        user_id,
        from,
        to,
        limit,
    })
    .await?;
    Ok(rows.into_iter().map(map_mood).collect())
}

pub async fn create_mood(
    pool: &PgPool,
    user_id: Uuid,
    date: NaiveDate,
    mood_type: &str,
) -> ApiResult<Mood> {
    let row = sqlx::query(
        "INSERT INTO moods (id, user_id, date, type) VALUES ($1, $2, $3, $4) \
         RETURNING id, date, type, created_at",
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(date)
    .bind(mood_type)
    .fetch_one(pool)
    .await?;
    Ok(map_mood(row))
}

pub async fn delete_mood(pool: &PgPool, user_id: Uuid, mood_id: Uuid) -> ApiResult<()> {
    check_owner(pool, "moods", "mood", mood_id, user_id).await?;
    sqlx::query("DELETE FROM moods WHERE id = $1")
        .bind(mood_id)
        .execute(pool)
        .await?;
    Ok(())
}

// ---- notes -----------------------------------------------------------------

pub async fn list_notes(pool: &PgPool, user_id: Uuid, limit: Option<i64>) -> ApiResult<Vec<Note>> {
    let rows = list_dated(pool, ListQuery {
        select: "SELECT id, date, content, created_at FROM notes",
        user_id,
        from: None,
        to: None,
        limit,
    })
    .await?;
    Ok(rows.into_iter().map(map_note).collect())
}

pub async fn create_note(
    pool: &PgPool,
    user_id: Uuid,
    date: NaiveDate,
    content: &str,
) -> ApiResult<Note> {
    let row = sqlx::query(
        "INSERT INTO notes (id, user_id, date, content) VALUES ($1, $2, $3, $4) \
         RETURNING id, date, content, created_at",
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(date)
    .bind(content)
    .fetch_one(pool)
    .await?;
    Ok(map_note(row))
}

pub async fn delete_note(pool: &PgPool, user_id: Uuid, note_id: Uuid) -> ApiResult<()> {
    check_owner(pool, "notes", "note", note_id, user_id).await?;
    sqlx::query("DELETE FROM notes WHERE id = $1")
        .bind(note_id)
        .execute(pool)
        .await?;
    Ok(())
}

// ---- shared ----------------------------------------------------------------

struct ListQuery<'a> {
    select: &'a str,
    user_id: Uuid,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    limit: Option<i64>,
}

/// Builds the common "per-user, newest-first, optional range and cap" read
/// the same way for symptoms, moods and notes.
async fn list_dated(pool: &PgPool, opts: ListQuery<'_>) -> ApiResult<Vec<PgRow>> {
    let mut sql = format!("{} WHERE user_id = $1", opts.select);
    let mut next_param = 2;

    if opts.from.is_some() {
        sql.push_str(&format!(" AND date >= ${next_param}"));
        next_param += 1;
    }
    if opts.to.is_some() {
        sql.push_str(&format!(" AND date <= ${next_param}"));
        next_param += 1;
    }
    sql.push_str(" ORDER BY date DESC, created_at DESC");
    if opts.limit.is_some() {
        sql.push_str(&format!(" LIMIT ${next_param}"));
    }

    let mut query = sqlx::query(&sql).bind(opts.user_id);
    if let Some(from) = opts.from {
        query = query.bind(from);
    }
    if let Some(to) = opts.to {
        query = query.bind(to);
    }
    if let Some(cap) = opts.limit {
        query = query.bind(cap);
    }

    Ok(query.fetch_all(pool).await?)
}

async fn check_owner(
    pool: &PgPool,
    table: &str,
    label: &'static str,
    record_id: Uuid,
    user_id: Uuid,
) -> ApiResult<()> {
    let sql = format!("SELECT user_id FROM {table} WHERE id = $1");
    let row = sqlx::query(&sql)
        .bind(record_id)
        .fetch_optional(pool)
        .await?
        .ok_or(ApiError::NotFound(label))?;
    let owner: Uuid = row.get("user_id");
    if owner != user_id {
        return Err(ApiError::Forbidden);
    }
    Ok(())
}

fn map_user(row: PgRow) -> User {
    User {
        id: row.get("id"),
        email: row.get("email"),
        name: row.get("name"),
        created_at: row.get("created_at"),
    }
}

fn map_settings(row: PgRow) -> UserSettings {
    UserSettings {
        average_cycle_length: row.get("average_cycle_length"),
        average_period_length: row.get("average_period_length"),
        reminder_enabled: row.get("reminder_enabled"),
        reminder_days_before: row.get("reminder_days_before"),
    }
}

fn map_period(row: PgRow) -> Period {
    Period {
        id: row.get("id"),
        start_date: row.get("start_date"),
        end_date: row.get("end_date"),
        flow_level: row
            .get::<Option<String>, _>("flow_level")
            .as_deref()
            .and_then(FlowLevel::parse),
        created_at: row.get("created_at"),
    }
}

fn map_symptom(row: PgRow) -> Symptom {
    Symptom {
        id: row.get("id"),
        date: row.get("date"),
        symptom_type: row.get("type"),
        severity: row.get("severity"),
        created_at: row.get("created_at"),
    }
}

fn map_mood(row: PgRow) -> Mood {
    Mood {
        id: row.get("id"),
        date: row.get("date"),
        mood_type: row.get("type"),
        created_at: row.get("created_at"),
    }
}

fn map_note(row: PgRow) -> Note {
    Note {
        id: row.get("id"),
        date: row.get("date"),
        content: row.get("content"),
        created_at: row.get("created_at"),
    }
}
