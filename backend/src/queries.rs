use sqlx::{PgPool, types::Json};
use time::OffsetDateTime;
use uuid::Uuid;
use poll_shared::models::*;
use crate::store::{NewPoll, PollStore, StoreError};

const POLL_VIEW_SELECT: &str =
    "SELECT p.id, p.question, p.description, p.owner_id, p.created_at,
            COALESCE(
                json_agg(
                    json_build_object('id', o.id, 'text', o.text, 'votes', o.votes)
                    ORDER BY o.ordinal
                ) FILTER (WHERE o.id IS NOT NULL),
                '[]'::json
            ) AS options
     FROM polls p
     LEFT JOIN poll_options o ON o.poll_id = p.id";

#[derive(sqlx::FromRow)]
struct PollViewRow {
    id: Uuid,
    question: String,
    description: Option<String>,
    owner_id: Uuid,
    created_at: OffsetDateTime,
    options: Option<Json<Vec<OptionView>>>,
}

impl From<PollViewRow> for PollView {
    fn from(row: PollViewRow) -> Self {
        let poll = Poll {
            id: row.id,
            question: row.question,
            description: row.description,
            owner_id: row.owner_id,
            created_at: row.created_at,
        };
        PollView::assemble(poll, row.options.map(|Json(options)| options))
    }
}

/// PostgreSQL-backed store. Option vote counts are maintained by the
/// `poll_options_vote_count` trigger shipped in the migrations.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[rocket::async_trait]
impl PollStore for PgStore {
    async fn insert_poll(&self, poll: &NewPoll) -> Result<Poll, StoreError> {
        let created = sqlx::query_as::<_, Poll>(
            "INSERT INTO polls (question, description, owner_id)
             VALUES ($1, $2, $3)
             RETURNING id, question, description, owner_id, created_at",
        )
        .bind(&poll.question)
        .bind(&poll.description)
        .bind(poll.owner_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    async fn delete_poll(&self, poll_id: Uuid) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM polls WHERE id = $1")
            .bind(poll_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn update_poll(&self, poll_id: Uuid, question: &str, description: Option<&str>) -> Result<(), StoreError> {
        sqlx::query("UPDATE polls SET question = $2, description = $3 WHERE id = $1")
            .bind(poll_id)
            .bind(question)
            .bind(description)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn poll_owner(&self, poll_id: Uuid) -> Result<Option<Uuid>, StoreError> {
        let owner = sqlx::query_scalar::<_, Uuid>("SELECT owner_id FROM polls WHERE id = $1")
            .bind(poll_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(owner)
    }

    async fn insert_options(&self, poll_id: Uuid, texts: &[String]) -> Result<Vec<PollOption>, StoreError> {
        let options = sqlx::query_as::<_, PollOption>(
            "INSERT INTO poll_options (poll_id, text)
             SELECT $1, t.text FROM UNNEST($2::text[]) WITH ORDINALITY AS t(text, n) ORDER BY t.n
             RETURNING id, poll_id, text, votes",
        )
        .bind(poll_id)
        .bind(texts)
        .fetch_all(&self.pool)
        .await?;
        Ok(options)
    }

    async fn delete_options(&self, poll_id: Uuid) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM poll_options WHERE poll_id = $1")
            .bind(poll_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn option_ids(&self, poll_id: Uuid) -> Result<Vec<Uuid>, StoreError> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM poll_options WHERE poll_id = $1 ORDER BY ordinal",
        )
        .bind(poll_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }

    async fn update_option_text(&self, option_id: Uuid, text: &str) -> Result<(), StoreError> {
        sqlx::query("UPDATE poll_options SET text = $2 WHERE id = $1")
            .bind(option_id)
            .bind(text)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn find_option(&self, option_id: Uuid) -> Result<Option<PollOption>, StoreError> {
        let option = sqlx::query_as::<_, PollOption>(
            "SELECT id, poll_id, text, votes FROM poll_options WHERE id = $1",
        )
        .bind(option_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(option)
    }

    async fn upsert_vote(&self, poll_id: Uuid, option_id: Uuid, user_id: Uuid) -> Result<Vote, StoreError> {
        let vote = sqlx::query_as::<_, Vote>(
            "INSERT INTO votes (poll_id, option_id, user_id)
             VALUES ($1, $2, $3)
             ON CONFLICT (poll_id, user_id)
             DO UPDATE SET option_id = EXCLUDED.option_id, created_at = NOW()
             RETURNING id, poll_id, option_id, user_id, created_at",
        )
        .bind(poll_id)
        .bind(option_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(vote)
    }

    async fn find_vote(&self, poll_id: Uuid, user_id: Uuid) -> Result<Option<Vote>, StoreError> {
        let vote = sqlx::query_as::<_, Vote>(
            "SELECT id, poll_id, option_id, user_id, created_at
             FROM votes WHERE poll_id = $1 AND user_id = $2",
        )
        .bind(poll_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(vote)
    }

    async fn list_polls(&self, owner_id: Option<Uuid>) -> Result<Vec<PollView>, StoreError> {
        let sql = format!(
            "{POLL_VIEW_SELECT}
             WHERE $1::uuid IS NULL OR p.owner_id = $1
             GROUP BY p.id
             ORDER BY p.created_at DESC"
        );
        let rows = sqlx::query_as::<_, PollViewRow>(&sql)
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(PollView::from).collect())
    }

    async fn get_poll(&self, poll_id: Uuid) -> Result<Option<PollView>, StoreError> {
        let sql = format!("{POLL_VIEW_SELECT} WHERE p.id = $1 GROUP BY p.id");
        let row = sqlx::query_as::<_, PollViewRow>(&sql)
            .bind(poll_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(PollView::from))
    }
}
