use crate::model::notification::NotificationKind;
use crate::model::role::Role;
use futures_util::future::join_all;
use sqlx::MySqlPool;

/// Who a notice goes to. Resolution to concrete user rows happens at
/// delivery time, off the request path.
#[derive(Debug, Clone)]
pub enum Audience {
    User(u64),
    /// The user account linked to an employee record.
    Employee(u64),
    /// Every active user holding a role, e.g. all of HR.
    Role(Role),
}

#[derive(Debug, Clone)]
pub struct Notice {
    pub kind: NotificationKind,
    pub audience: Audience,
    pub title: String,
    pub body: String,
    pub reference_id: Option<u64>,
}

impl Notice {
    pub fn new(
        kind: NotificationKind,
        audience: Audience,
        title: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Notice {
            kind,
            audience,
            title: title.into(),
            body: body.into(),
            reference_id: None,
        }
    }

    pub fn about(mut self, reference_id: u64) -> Self {
        self.reference_id = Some(reference_id);
        self
    }
}

/// Hands a batch off to the runtime and returns immediately. The caller's
/// write has already committed; nothing that happens in here can fail it.
pub fn dispatch(hr: MySqlPool, notices: Vec<Notice>) {
    if notices.is_empty() {
        return;
    }
    actix_web::rt::spawn(async move {
        deliver_all(&hr, notices).await;
    });
}

/// Delivers every notice, waiting for all of them regardless of individual
/// failures. Failures are logged and swallowed.
pub async fn deliver_all(hr: &MySqlPool, notices: Vec<Notice>) {
    let outcomes = join_all(notices.iter().map(|notice| deliver(hr, notice))).await;
    for (notice, outcome) in notices.iter().zip(outcomes) {
        match outcome {
            Ok(recipients) => {
                tracing::debug!(kind = %notice.kind, recipients = recipients, "notice delivered");
            }
            Err(e) => {
                tracing::warn!(kind = %notice.kind, title = %notice.title, error = %e, "notice delivery failed");
            }
        }
    }
}

async fn deliver(hr: &MySqlPool, notice: &Notice) -> Result<usize, sqlx::Error> {
    let user_ids = resolve_audience(hr, &notice.audience).await?;
    for user_id in &user_ids {
        sqlx::query(
            "INSERT INTO notifications (user_id, kind, title, body, reference_id) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(notice.kind.to_string())
        .bind(&notice.title)
        .bind(&notice.body)
        .bind(notice.reference_id)
        .execute(hr)
        .await?;
    }
    Ok(user_ids.len())
}

async fn resolve_audience(hr: &MySqlPool, audience: &Audience) -> Result<Vec<u64>, sqlx::Error> {
    match audience {
        Audience::User(user_id) => Ok(vec![*user_id]),
        Audience::Employee(employee_id) => {
            sqlx::query_scalar::<_, u64>(
                "SELECT id FROM users WHERE employee_id = ? AND is_active = 1",
            )
            .bind(employee_id)
            .fetch_all(hr)
            .await
        }
        Audience::Role(role) => {
            sqlx::query_scalar::<_, u64>("SELECT id FROM users WHERE role_id = ? AND is_active = 1")
                .bind(role.id())
                .fetch_all(hr)
                .await
        }
    }
}
