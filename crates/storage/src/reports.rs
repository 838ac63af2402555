// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Report and signal queries.

use sqlx::{PgPool, Row};

use retrace_core::{
    signal_frame_header, Report, ReportId, Signal, SignalId, SignalKind,
};

use crate::error::StorageError;

/// Fetch one report row.
pub async fn fetch_report(pool: &PgPool, report_id: &ReportId) -> Result<Report, StorageError> {
    let row = sqlx::query("SELECT id, COALESCE(description, '') AS description FROM reports WHERE id = $1")
        .bind(report_id.as_str())
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| StorageError::RowMissing(format!("report {}", report_id)))?;

    Ok(Report {
        id: ReportId::new(row.try_get::<String, _>("id")?),
        description: row.try_get("description")?,
    })
}

/// Fetch all signals of a report, in enumeration order.
pub async fn fetch_signals(
    pool: &PgPool,
    report_id: &ReportId,
) -> Result<Vec<Signal>, StorageError> {
    let rows = sqlx::query(
        "SELECT id, report_id, s3_key, kind, COALESCE(meta, '{}'::jsonb) AS meta
         FROM signals WHERE report_id = $1 ORDER BY id",
    )
    .bind(report_id.as_str())
    .fetch_all(pool)
    .await?;

    let mut signals = Vec::with_capacity(rows.len());
    for row in rows {
        let kind_tag: String = row.try_get("kind")?;
        let Some(kind) = SignalKind::parse(&kind_tag) else {
            // Unknown artifact kinds are skipped, not fatal.
            tracing::warn!(kind = %kind_tag, "skipping signal with unknown kind");
            continue;
        };
        signals.push(Signal {
            id: SignalId::new(row.try_get::<String, _>("id")?),
            report_id: ReportId::new(row.try_get::<String, _>("report_id")?),
            kind,
            s3_key: row.try_get("s3_key")?,
            meta: row.try_get("meta")?,
        });
    }
    Ok(signals)
}

/// Append extracted-text frames to the report description, transactionally.
///
/// Frames whose `--- Signal <id> ---` header is already present are dropped
/// before the write, so redelivered ingest messages converge instead of
/// duplicating text. Returns the number of frames actually appended.
pub async fn append_description_frames(
    pool: &PgPool,
    report_id: &ReportId,
    frames: &[(SignalId, String)],
) -> Result<usize, StorageError> {
    let mut tx = pool.begin().await?;

    let row = sqlx::query(
        "SELECT COALESCE(description, '') AS description FROM reports WHERE id = $1 FOR UPDATE",
    )
    .bind(report_id.as_str())
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| StorageError::RowMissing(format!("report {}", report_id)))?;
    let current: String = row.try_get("description")?;

    let fresh: Vec<&(SignalId, String)> = frames
        .iter()
        .filter(|(signal_id, _)| !current.contains(&signal_frame_header(signal_id)))
        .collect();

    if fresh.is_empty() {
        tx.commit().await?;
        return Ok(0);
    }

    let mut appended = String::new();
    for (_, frame) in &fresh {
        appended.push('\n');
        appended.push_str(frame);
    }

    sqlx::query("UPDATE reports SET description = COALESCE(description, '') || $1 WHERE id = $2")
        .bind(&appended)
        .bind(report_id.as_str())
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(fresh.len())
}
