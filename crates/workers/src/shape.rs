// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! DataShape worker: schema-aware fixture generation with a PII gate and a
//! referential-integrity pass.

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

use retrace_core::{ReportId, SignalKind};
use retrace_runtime::{Handler, WorkerContext, WorkerError};
use retrace_signals::har::parse_har_file;
use retrace_storage::{keys, reports};
use retrace_wire::{decode, DataShapeRequest, Subject};

use crate::transforms::{scrub_text, PiiScrub};

/// Field kinds the generator understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    String,
    Email,
    Name,
    Address,
    Phone,
    Date,
    Number,
    Boolean,
    Uuid,
    ForeignKey,
}

/// Inferred schema: field name to kind.
#[derive(Debug, Clone, Serialize)]
pub struct Schema {
    pub name: String,
    pub context: String,
    pub fields: BTreeMap<String, FieldKind>,
}

/// Infer a field's kind from its name.
pub fn infer_field_kind(field_name: &str) -> FieldKind {
    let lower = field_name.to_lowercase();
    let has = |needles: &[&str]| needles.iter().any(|n| lower.contains(n));

    if lower.contains("email") {
        FieldKind::Email
    } else if has(&["name", "firstname", "lastname", "fullname"]) {
        FieldKind::Name
    } else if has(&["phone", "mobile", "tel"]) {
        FieldKind::Phone
    } else if has(&["address", "street", "city", "country", "zip"]) {
        FieldKind::Address
    } else if has(&["date", "time", "timestamp", "created", "updated"]) {
        FieldKind::Date
    } else if has(&["is_", "has_", "active", "enabled", "valid"]) {
        FieldKind::Boolean
    } else if has(&["count", "amount", "price", "quantity", "age"]) {
        FieldKind::Number
    } else if has(&["_id", "id_"]) {
        FieldKind::Uuid
    } else {
        FieldKind::String
    }
}

/// Infer a schema from HAR form fields plus the context's standard fields.
pub fn infer_schema(har_bytes: &[u8], context: &str) -> Schema {
    let mut fields = BTreeMap::new();

    if let Ok(har) = parse_har_file(har_bytes) {
        for entry in &har.log.entries {
            if let Some(post) = &entry.request.post_data {
                for param in &post.params {
                    if !param.name.is_empty() {
                        fields.insert(param.name.clone(), infer_field_kind(&param.name));
                    }
                }
            }
        }
    }

    match context {
        "api" => {
            fields.insert("request_id".into(), FieldKind::Uuid);
            fields.insert("api_key".into(), FieldKind::String);
            fields.insert("endpoint".into(), FieldKind::String);
            fields.insert("response_time".into(), FieldKind::Number);
        }
        _ => {
            fields.insert("user_id".into(), FieldKind::Uuid);
            fields.insert("session_id".into(), FieldKind::String);
            fields.insert("timestamp".into(), FieldKind::Date);
            fields.insert("user_agent".into(), FieldKind::String);
        }
    }

    Schema { name: format!("{}_test_schema", context), context: context.to_string(), fields }
}

/// Generate one record. The rng is seeded per report, so replays shape the
/// same fixtures.
pub fn generate_record(schema: &Schema, rng: &mut StdRng) -> Value {
    let mut record = serde_json::Map::new();
    for (field, kind) in &schema.fields {
        record.insert(field.clone(), generate_value(*kind, rng));
    }
    Value::Object(record)
}

fn generate_value(kind: FieldKind, rng: &mut StdRng) -> Value {
    match kind {
        FieldKind::Email => json!(format!("user{}@example.com", rng.gen_range(1..10_000))),
        FieldKind::Name => {
            const FIRST: [&str; 4] = ["Ada", "Grace", "Alan", "Edsger"];
            const LAST: [&str; 4] = ["Lovelace", "Hopper", "Turing", "Dijkstra"];
            json!(format!(
                "{} {}",
                FIRST[rng.gen_range(0..FIRST.len())],
                LAST[rng.gen_range(0..LAST.len())]
            ))
        }
        FieldKind::Address => json!(format!(
            "{} Main Street, Springfield {:05}",
            rng.gen_range(1..999),
            rng.gen_range(10_000..99_999)
        )),
        FieldKind::Phone => json!(format!(
            "+1-555-{:03}-{:04}",
            rng.gen_range(100..999),
            rng.gen_range(1000..9999)
        )),
        FieldKind::Date => {
            let offset_secs = rng.gen_range(0..30 * 24 * 3600);
            let base = chrono::DateTime::from_timestamp(1_700_000_000, 0).unwrap_or_default();
            json!((base + chrono::Duration::seconds(offset_secs)).to_rfc3339())
        }
        FieldKind::Number => json!(rng.gen_range(0..1000)),
        FieldKind::Boolean => json!(rng.gen_bool(0.5)),
        FieldKind::Uuid | FieldKind::ForeignKey => {
            let bytes: [u8; 16] = rng.gen();
            json!(uuid::Builder::from_random_bytes(bytes).into_uuid().to_string())
        }
        FieldKind::String => json!(format!("value-{:06x}", rng.gen_range(0..0xff_ffff))),
    }
}

/// One referential-integrity violation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FkViolation {
    pub table: String,
    pub record_index: usize,
    pub field: String,
    pub value: String,
    pub referenced_table: String,
}

/// Flag foreign-key fields (`<singular>_id`) whose referenced table lacks the
/// referenced id.
pub fn check_referential_integrity(
    fixtures: &BTreeMap<String, Vec<Value>>,
) -> Vec<FkViolation> {
    let mut violations = Vec::new();

    for (table, records) in fixtures {
        for (index, record) in records.iter().enumerate() {
            let Value::Object(fields) = record else {
                continue;
            };
            for (field, value) in fields {
                let Some(referenced_table) = referenced_table_of(field) else {
                    continue;
                };
                if referenced_table == *table {
                    continue;
                }
                let Some(referenced) = fixtures.get(&referenced_table) else {
                    // Nothing to check against; the reference is external.
                    continue;
                };
                let Some(value_str) = value.as_str() else {
                    continue;
                };
                let found = referenced.iter().any(|r| {
                    r.get("id").and_then(Value::as_str) == Some(value_str)
                });
                if !found {
                    violations.push(FkViolation {
                        table: table.clone(),
                        record_index: index,
                        field: field.clone(),
                        value: value_str.to_string(),
                        referenced_table,
                    });
                }
            }
        }
    }

    violations
}

/// `user_id` references table `users`; non-fk fields return `None`.
fn referenced_table_of(field: &str) -> Option<String> {
    let singular = field.strip_suffix("_id")?;
    if singular.is_empty() {
        return None;
    }
    Some(format!("{}s", singular))
}

/// Walk a JSON value scrubbing every string leaf.
pub fn scrub_value(analyzer: &dyn PiiScrub, value: &Value, threshold: f64) -> (Value, usize) {
    match value {
        Value::String(text) => {
            let (scrubbed, applied) = scrub_text(analyzer, text, threshold);
            (Value::String(scrubbed), applied.len())
        }
        Value::Array(items) => {
            let mut scrubbed_count = 0;
            let scrubbed: Vec<Value> = items
                .iter()
                .map(|item| {
                    let (v, n) = scrub_value(analyzer, item, threshold);
                    scrubbed_count += n;
                    v
                })
                .collect();
            (Value::Array(scrubbed), scrubbed_count)
        }
        Value::Object(fields) => {
            let mut scrubbed_count = 0;
            let scrubbed: serde_json::Map<String, Value> = fields
                .iter()
                .map(|(k, v)| {
                    let (v, n) = scrub_value(analyzer, v, threshold);
                    scrubbed_count += n;
                    (k.clone(), v)
                })
                .collect();
            (Value::Object(scrubbed), scrubbed_count)
        }
        other => (other.clone(), 0),
    }
}

/// Stable per-report seed so redelivered messages shape identical fixtures.
pub fn report_seed(report_id: &ReportId) -> u64 {
    report_id.as_str().bytes().fold(0xcbf2_9ce4_8422_2325u64, |hash, b| {
        (hash ^ b as u64).wrapping_mul(0x0000_0100_0000_01b3)
    })
}

/// PII gate knobs.
#[derive(Debug, Clone, Copy)]
pub struct ShapeOptions {
    pub pii_confidence_threshold: f64,
    pub max_records_per_table: u32,
}

impl ShapeOptions {
    pub fn load() -> Self {
        Self {
            pii_confidence_threshold: env_parse("PII_CONFIDENCE_THRESHOLD", 0.5),
            max_records_per_table: env_parse("MAX_RECORDS_PER_TABLE", 100),
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

pub struct DataShapeHandler {
    ctx: Arc<WorkerContext>,
    analyzer: Arc<dyn PiiScrub>,
    options: ShapeOptions,
}

impl DataShapeHandler {
    pub fn new(ctx: Arc<WorkerContext>, analyzer: Arc<dyn PiiScrub>, options: ShapeOptions) -> Self {
        Self { ctx, analyzer, options }
    }
}

#[async_trait]
impl Handler for DataShapeHandler {
    fn role(&self) -> &'static str {
        "shape"
    }

    fn subject(&self) -> Subject {
        Subject::DataShape
    }

    async fn handle(&self, payload: &[u8]) -> Result<(), WorkerError> {
        let request: DataShapeRequest = decode(payload)?;
        let report_id = request.report_id;
        let record_count = request.options.record_count.min(self.options.max_records_per_table);

        let signals = reports::fetch_signals(&self.ctx.db, &report_id).await?;
        let mut har_bytes = Vec::new();
        for signal in &signals {
            if signal.kind == SignalKind::Har {
                match self.ctx.objects.get_bytes(&signal.s3_key).await {
                    Ok(bytes) => {
                        har_bytes = bytes;
                        break;
                    }
                    Err(retrace_storage::StorageError::ObjectMissing(key)) => {
                        warn!(key, "HAR artifact missing, shaping from context defaults");
                    }
                    Err(err) => return Err(err.into()),
                }
            }
        }

        let schema = infer_schema(&har_bytes, &request.options.context);

        let mut rng = StdRng::seed_from_u64(report_seed(&report_id));
        let mut records = Vec::with_capacity(record_count as usize);
        let mut scrubbed_total = 0usize;
        for _ in 0..record_count {
            let record = generate_record(&schema, &mut rng);
            let (scrubbed, n) = scrub_value(
                self.analyzer.as_ref(),
                &record,
                self.options.pii_confidence_threshold,
            );
            scrubbed_total += n;
            records.push(scrubbed);
        }

        let mut fixtures = BTreeMap::new();
        fixtures.insert("test_data".to_string(), records);
        let violations = check_referential_integrity(&fixtures);

        let shaped = json!({
            "schema": schema,
            "fixtures": fixtures,
            "integrity_report": {
                "is_valid": violations.is_empty(),
                "violations": violations,
            },
            "pii_report": {
                "scrubbed_count": scrubbed_total,
                "confidence_threshold": self.options.pii_confidence_threshold,
            },
        });

        let key = keys::shaped_data_key(&report_id);
        let body = serde_json::to_vec_pretty(&shaped)
            .map_err(|err| WorkerError::Internal(err.to_string()))?;
        self.ctx.objects.put_bytes(&key, body).await?;

        info!(
            report_id = %report_id,
            records = record_count,
            scrubbed = scrubbed_total,
            violations = shaped["integrity_report"]["violations"].as_array().map(Vec::len).unwrap_or(0),
            "shaped data written"
        );
        Ok(())
    }
}

#[cfg(test)]
#[path = "shape_tests.rs"]
mod tests;
