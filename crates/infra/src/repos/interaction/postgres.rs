use super::IInteractionRepo;
use nudge_scheduler_domain::{NotificationInteraction, ID};
use sqlx::{postgres::PgRow, PgPool, Row};
use tracing::error;

pub struct PostgresInteractionRepo {
    pool: PgPool,
}

impl PostgresInteractionRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn to_interaction(row: &PgRow) -> Option<NotificationInteraction> {
    let payload: serde_json::Value = row.try_get("payload").ok()?;
    match serde_json::from_value(payload) {
        Ok(interaction) => Some(interaction),
        Err(e) => {
            error!("Corrupt payload in interactions table: {:?}", e);
            None
        }
    }
}

#[async_trait::async_trait]
impl IInteractionRepo for PostgresInteractionRepo {
    async fn insert(&self, interaction: &NotificationInteraction) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO interactions
            (interaction_uid, user_uid, sent_at, payload)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(interaction.id.inner_ref())
        .bind(interaction.user_id.inner_ref())
        .bind(interaction.sent_at)
        .bind(serde_json::to_value(interaction)?)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_by_user(&self, user_id: &ID) -> Vec<NotificationInteraction> {
        sqlx::query(
            r#"
            SELECT payload FROM interactions
            WHERE user_uid = $1
            ORDER BY sent_at ASC
            "#,
        )
        .bind(user_id.inner_ref())
        .fetch_all(&self.pool)
        .await
        .unwrap_or_else(|_| Vec::new())
        .iter()
        .filter_map(to_interaction)
        .collect()
    }
}
