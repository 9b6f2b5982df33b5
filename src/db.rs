use chrono::{Duration, NaiveDate, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, QueryBuilder, Row};
use uuid::Uuid;

use crate::error::TrackerError;
use crate::models::{Event, EventFields, EventPatch, EventStatus};

const EVENT_COLUMNS: &str = "id, name, category, source, event_date, registration_deadline, \
     link, notes, status, reminder, certificate_url, brochure_url";

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let now = Utc::now();
    let events = vec![
        (
            Uuid::parse_str("3d7f5d6f-24f7-4e8e-8b4b-3e7e44b4a7b2")?,
            EventFields {
                name: "Rust Systems Hackathon".to_string(),
                category: Some("Hackathon".to_string()),
                source: Some("Devpost".to_string()),
                event_date: Some((now + Duration::days(14)).date_naive()),
                registration_deadline: (now + Duration::hours(20)).to_rfc3339(),
                link: Some("https://devpost.com/hackathons".to_string()),
                notes: Some("Team of three".to_string()),
                status: None,
                reminder: true,
            },
        ),
        (
            Uuid::parse_str("0c22f1f1-9184-4fd4-9b21-28c68a6a89dc")?,
            EventFields {
                name: "Cloud Native Workshop".to_string(),
                category: Some("Workshop".to_string()),
                source: Some("Meetup".to_string()),
                event_date: Some((now + Duration::days(30)).date_naive()),
                registration_deadline: (now + Duration::days(10)).to_rfc3339(),
                link: Some("https://www.meetup.com".to_string()),
                notes: None,
                status: Some(EventStatus::Registered),
                reminder: false,
            },
        ),
        (
            Uuid::parse_str("d5a0a1a2-2a3c-44c2-8f73-60b7897a9dd2")?,
            EventFields {
                name: "Data Engineering Summit".to_string(),
                category: Some("Conference".to_string()),
                source: Some("LinkedIn".to_string()),
                event_date: Some((now - Duration::days(2)).date_naive()),
                registration_deadline: (now - Duration::days(9)).to_rfc3339(),
                link: None,
                notes: Some("Collect certificate from organisers".to_string()),
                status: Some(EventStatus::Attended),
                reminder: false,
            },
        ),
    ];

    for (id, fields) in events {
        insert_event(pool, id, &fields, true).await?;
    }

    Ok(())
}

pub async fn list_events(pool: &PgPool) -> Result<Vec<Event>, TrackerError> {
    let query = format!(
        "SELECT {EVENT_COLUMNS} FROM deadline_tracker.events ORDER BY created_at, id"
    );
    let rows = sqlx::query(&query).fetch_all(pool).await?;
    tracing::debug!(events = rows.len(), "listed events");
    Ok(rows.iter().map(event_from_row).collect())
}

pub async fn fetch_event(pool: &PgPool, id: Uuid) -> anyhow::Result<Event> {
    let query = format!("SELECT {EVENT_COLUMNS} FROM deadline_tracker.events WHERE id = $1");
    let row = sqlx::query(&query)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(TrackerError::EventNotFound(id))?;
    Ok(event_from_row(&row))
}

pub async fn create_event(pool: &PgPool, fields: &EventFields) -> anyhow::Result<Event> {
    let id = Uuid::new_v4();
    insert_event(pool, id, fields, false).await?;
    tracing::info!(event_id = %id, name = %fields.name, "event created");
    fetch_event(pool, id).await
}

pub async fn update_event(pool: &PgPool, id: Uuid, patch: EventPatch) -> anyhow::Result<Event> {
    if patch.is_empty() {
        return fetch_event(pool, id).await;
    }

    let mut builder =
        QueryBuilder::<Postgres>::new("UPDATE deadline_tracker.events SET updated_at = now()");

    if let Some(name) = patch.name {
        builder.push(", name = ").push_bind(name);
    }
    if let Some(category) = patch.category {
        builder.push(", category = ").push_bind(category);
    }
    if let Some(source) = patch.source {
        builder.push(", source = ").push_bind(source);
    }
    if let Some(event_date) = patch.event_date {
        builder.push(", event_date = ").push_bind(event_date);
    }
    if let Some(deadline) = patch.registration_deadline {
        builder.push(", registration_deadline = ").push_bind(deadline);
    }
    if let Some(link) = patch.link {
        builder.push(", link = ").push_bind(link);
    }
    if let Some(notes) = patch.notes {
        builder.push(", notes = ").push_bind(notes);
    }
    if let Some(status) = patch.status {
        builder.push(", status = ").push_bind(String::from(status));
    }
    if let Some(reminder) = patch.reminder {
        builder.push(", reminder = ").push_bind(reminder);
    }
    if let Some(certificate_url) = patch.certificate_url {
        builder.push(", certificate_url = ").push_bind(certificate_url);
    }
    if let Some(brochure_url) = patch.brochure_url {
        builder.push(", brochure_url = ").push_bind(brochure_url);
    }

    builder
        .push(" WHERE id = ")
        .push_bind(id)
        .push(" RETURNING ")
        .push(EVENT_COLUMNS);

    let row = builder
        .build()
        .fetch_optional(pool)
        .await?
        .ok_or(TrackerError::EventNotFound(id))?;

    tracing::info!(event_id = %id, "event updated");
    Ok(event_from_row(&row))
}

pub async fn delete_event(pool: &PgPool, id: Uuid) -> anyhow::Result<()> {
    let result = sqlx::query("DELETE FROM deadline_tracker.events WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(TrackerError::EventNotFound(id).into());
    }

    tracing::info!(event_id = %id, "event deleted");
    Ok(())
}

pub async fn import_csv(pool: &PgPool, csv_path: &std::path::Path) -> anyhow::Result<usize> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        id: Option<Uuid>,
        name: String,
        category: Option<String>,
        source: Option<String>,
        event_date: Option<NaiveDate>,
        registration_deadline: String,
        link: Option<String>,
        notes: Option<String>,
        status: Option<String>,
        reminder: Option<bool>,
    }

    let mut reader = csv::Reader::from_path(csv_path)?;
    let mut inserted = 0usize;

    for result in reader.deserialize::<CsvRow>() {
        let row = result?;
        let fields = EventFields {
            name: row.name,
            category: row.category,
            source: row.source,
            event_date: row.event_date,
            registration_deadline: row.registration_deadline,
            link: row.link,
            notes: row.notes,
            status: row.status.as_deref().and_then(EventStatus::parse),
            reminder: row.reminder.unwrap_or(false),
        };

        if fields.deadline_is_malformed() {
            tracing::warn!(
                name = %fields.name,
                deadline = %fields.registration_deadline,
                "importing event with unparseable deadline"
            );
        }

        let id = row.id.unwrap_or_else(Uuid::new_v4);
        if insert_event(pool, id, &fields, true).await? {
            inserted += 1;
        }
    }

    Ok(inserted)
}

/// Returns whether a row was written. With `skip_existing` an id that is
/// already present is left alone.
async fn insert_event(
    pool: &PgPool,
    id: Uuid,
    fields: &EventFields,
    skip_existing: bool,
) -> Result<bool, TrackerError> {
    let mut query = String::from(
        r#"
        INSERT INTO deadline_tracker.events
        (id, name, category, source, event_date, registration_deadline, link, notes, status, reminder)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        "#,
    );
    if skip_existing {
        query.push_str(" ON CONFLICT (id) DO NOTHING");
    }

    let result = sqlx::query(&query)
        .bind(id)
        .bind(&fields.name)
        .bind(&fields.category)
        .bind(&fields.source)
        .bind(fields.event_date)
        .bind(&fields.registration_deadline)
        .bind(&fields.link)
        .bind(&fields.notes)
        .bind(fields.status.as_ref().map(|status| status.as_str().to_string()))
        .bind(fields.reminder)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

fn event_from_row(row: &PgRow) -> Event {
    let status: Option<String> = row.get("status");
    Event {
        id: row.get("id"),
        name: row.get("name"),
        category: row.get("category"),
        source: row.get("source"),
        event_date: row.get("event_date"),
        registration_deadline: row.get("registration_deadline"),
        link: row.get("link"),
        notes: row.get("notes"),
        status: status.as_deref().and_then(EventStatus::parse),
        reminder: row.get("reminder"),
        certificate_url: row.get("certificate_url"),
        brochure_url: row.get("brochure_url"),
    }
}
