// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Repro, step, run, export and CLI-repro persistence.

use sqlx::{PgPool, Row};

use retrace_core::{
    check_step_order, CliEcosystem, ExportRecord, Repro, ReproId, ReproStatus, RunRecord, Step,
    StepKind,
};

use crate::error::StorageError;

/// Insert a repro with its ordered steps in one transaction.
///
/// Keyed by the caller-minted repro id, so a redelivered synth message
/// re-inserting the same id is a no-op.
pub async fn insert_repro_with_steps(
    pool: &PgPool,
    repro: &Repro,
    steps: &[Step],
) -> Result<(), StorageError> {
    if let Err((expected, found)) = check_step_order(steps) {
        return Err(StorageError::Invalid(format!(
            "step order violated for repro {}: expected {}, found {}",
            repro.id, expected, found
        )));
    }

    let mut tx = pool.begin().await?;

    let inserted = sqlx::query(
        "INSERT INTO repros (
             id, report_id, framework, entry, docker_compose, seed, status,
             title, description, created_at
         ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, NOW())
         ON CONFLICT (id) DO NOTHING",
    )
    .bind(repro.id.as_str())
    .bind(repro.report_id.as_str())
    .bind(&repro.framework)
    .bind(&repro.entry)
    .bind(&repro.docker_compose)
    .bind(&repro.seed)
    .bind(repro.status.to_string())
    .bind(repro.title.as_deref())
    .bind(repro.description.as_deref())
    .execute(&mut *tx)
    .await?;

    if inserted.rows_affected() > 0 {
        for step in steps {
            sqlx::query(
                "INSERT INTO steps (repro_id, order_idx, kind, payload, created_at)
                 VALUES ($1, $2, $3, $4, NOW())",
            )
            .bind(step.repro_id.as_str())
            .bind(step.order_idx as i32)
            .bind(step.kind.to_string())
            .bind(&step.payload)
            .execute(&mut *tx)
            .await?;
        }
    }

    tx.commit().await?;
    Ok(())
}

/// Fetch one repro row.
pub async fn fetch_repro(pool: &PgPool, repro_id: &ReproId) -> Result<Repro, StorageError> {
    let row = sqlx::query(
        "SELECT id, report_id, framework, entry, docker_compose, seed, status,
                title, description
         FROM repros WHERE id = $1",
    )
    .bind(repro_id.as_str())
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| StorageError::RowMissing(format!("repro {}", repro_id)))?;

    let status_tag: String = row.try_get("status")?;
    let status = match status_tag.as_str() {
        "validated" => ReproStatus::Validated,
        "exported" => ReproStatus::Exported,
        _ => ReproStatus::Created,
    };

    Ok(Repro {
        id: ReproId::new(row.try_get::<String, _>("id")?),
        report_id: retrace_core::ReportId::new(row.try_get::<String, _>("report_id")?),
        framework: row.try_get("framework")?,
        entry: row.try_get("entry")?,
        docker_compose: row.try_get("docker_compose")?,
        seed: row.try_get("seed")?,
        status,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
    })
}

/// Fetch a repro's steps in execution order.
pub async fn fetch_steps(pool: &PgPool, repro_id: &ReproId) -> Result<Vec<Step>, StorageError> {
    let rows = sqlx::query(
        "SELECT repro_id, order_idx, kind, payload FROM steps
         WHERE repro_id = $1 ORDER BY order_idx",
    )
    .bind(repro_id.as_str())
    .fetch_all(pool)
    .await?;

    let mut steps = Vec::with_capacity(rows.len());
    for row in rows {
        let kind_tag: String = row.try_get("kind")?;
        let kind = parse_step_kind(&kind_tag)
            .ok_or_else(|| StorageError::Invalid(format!("unknown step kind {}", kind_tag)))?;
        steps.push(Step {
            repro_id: ReproId::new(row.try_get::<String, _>("repro_id")?),
            order_idx: row.try_get::<i32, _>("order_idx")? as u32,
            kind,
            payload: row.try_get("payload")?,
        });
    }
    Ok(steps)
}

fn parse_step_kind(tag: &str) -> Option<StepKind> {
    match tag {
        "navigate" => Some(StepKind::Navigate),
        "input" => Some(StepKind::Input),
        "click" => Some(StepKind::Click),
        "submit" => Some(StepKind::Submit),
        "assert" => Some(StepKind::Assert),
        "api_verify" => Some(StepKind::ApiVerify),
        _ => None,
    }
}

/// Transition a repro's status.
pub async fn update_repro_status(
    pool: &PgPool,
    repro_id: &ReproId,
    status: ReproStatus,
) -> Result<(), StorageError> {
    sqlx::query("UPDATE repros SET status = $1, updated_at = NOW() WHERE id = $2")
        .bind(status.to_string())
        .bind(repro_id.as_str())
        .execute(pool)
        .await?;
    Ok(())
}

/// Record the repro's latest stability score alongside the status row.
pub async fn update_repro_stability(
    pool: &PgPool,
    repro_id: &ReproId,
    stability_score: f64,
) -> Result<(), StorageError> {
    sqlx::query("UPDATE repros SET stability_score = $1 WHERE id = $2")
        .bind(stability_score)
        .bind(repro_id.as_str())
        .execute(pool)
        .await?;
    Ok(())
}

/// Insert one run row, keyed `(repro_id, iteration)`.
///
/// Redelivered validation messages re-insert the same iterations; the
/// conflict target absorbs them.
pub async fn insert_run(pool: &PgPool, run: &RunRecord) -> Result<(), StorageError> {
    sqlx::query(
        "INSERT INTO runs (
             repro_id, iteration, passed, duration_ms, logs_s3, video_s3,
             trace_s3, created_at
         ) VALUES ($1, $2, $3, $4, $5, $6, $7, NOW())
         ON CONFLICT (repro_id, iteration) DO NOTHING",
    )
    .bind(run.repro_id.as_str())
    .bind(run.iteration as i32)
    .bind(run.passed)
    .bind(run.duration_ms as i64)
    .bind(&run.logs)
    .bind(run.video_key.as_deref())
    .bind(run.trace_key.as_deref())
    .execute(pool)
    .await?;
    Ok(())
}

/// Insert one export delivery record.
pub async fn insert_export(pool: &PgPool, export: &ExportRecord) -> Result<(), StorageError> {
    sqlx::query(
        "INSERT INTO exports (id, repro_id, export_type, result, status)
         VALUES ($1, $2, $3, $4, $5)
         ON CONFLICT (id) DO NOTHING",
    )
    .bind(export.id.as_str())
    .bind(export.repro_id.as_str())
    .bind(export.export_type.to_string())
    .bind(&export.result)
    .bind(export.status.to_string())
    .execute(pool)
    .await?;
    Ok(())
}

/// Insert one CLI reproduction record.
///
/// The caller derives `id` from the source repro, so a redelivered build
/// request converges on the existing row.
#[allow(clippy::too_many_arguments)]
pub async fn insert_cli_repro(
    pool: &PgPool,
    id: &str,
    repro_id: &ReproId,
    ecosystem: CliEcosystem,
    test_file: &str,
    build_command: &str,
    dockerfile: &str,
    compose_file: &str,
) -> Result<(), StorageError> {
    sqlx::query(
        "INSERT INTO cli_repros (
             id, repro_id, ecosystem, test_file, build_command, dockerfile,
             compose_file, status
         ) VALUES ($1, $2, $3, $4, $5, $6, $7, 'created')
         ON CONFLICT (id) DO NOTHING",
    )
    .bind(id)
    .bind(repro_id.as_str())
    .bind(ecosystem.to_string())
    .bind(test_file)
    .bind(build_command)
    .bind(dockerfile)
    .bind(compose_file)
    .execute(pool)
    .await?;
    Ok(())
}

/// Fetch the recorded runs of a repro, newest iteration first.
pub async fn fetch_runs(
    pool: &PgPool,
    repro_id: &ReproId,
    limit: i64,
) -> Result<Vec<RunRecord>, StorageError> {
    let rows = sqlx::query(
        "SELECT repro_id, iteration, passed, duration_ms,
                COALESCE(logs_s3, '') AS logs_s3, video_s3, trace_s3
         FROM runs WHERE repro_id = $1 ORDER BY iteration DESC LIMIT $2",
    )
    .bind(repro_id.as_str())
    .bind(limit)
    .fetch_all(pool)
    .await?;

    let mut runs = Vec::with_capacity(rows.len());
    for row in rows {
        runs.push(RunRecord {
            repro_id: ReproId::new(row.try_get::<String, _>("repro_id")?),
            iteration: row.try_get::<i32, _>("iteration")? as u32,
            passed: row.try_get("passed")?,
            duration_ms: row.try_get::<i64, _>("duration_ms")? as u64,
            exit_code: 0,
            logs: row.try_get("logs_s3")?,
            video_key: row.try_get("video_s3")?,
            trace_key: row.try_get("trace_s3")?,
        });
    }
    Ok(runs)
}
