use chrono::{DateTime, Utc};
use serde_json::Value;

use super::validity::{evaluate, rejection};
use crate::error::{AppError, Result};
use crate::models::{JsonMap, License};

/// Check submitted usage against the license's limits and return the new
/// `current_usage` map. Nothing is returned (and nothing should be written)
/// unless every metric passes.
///
/// Metrics without a configured limit are unconstrained and not recorded.
/// Values replace the previous reading; they do not accumulate.
pub fn check_and_record(
    license: &License,
    submitted: &JsonMap,
    now: DateTime<Utc>,
) -> Result<JsonMap> {
    if let Some(err) = rejection(license, evaluate(license, now)) {
        return Err(err);
    }

    let mut metrics: Vec<&String> = submitted.keys().collect();
    metrics.sort();

    let mut updated = license.current_usage.clone();
    for metric in metrics {
        let Some(limit) = license.usage_limits.get(metric) else {
            continue;
        };
        let value = &submitted[metric];
        let over = match (as_integer(value), as_integer(limit)) {
            (Some(amount), Some(ceiling)) => amount > ceiling,
            _ => {
                let amount = value
                    .as_f64()
                    .ok_or_else(|| AppError::InvalidUsageValue(metric.clone()))?;
                let ceiling = limit.as_f64().ok_or_else(|| {
                    AppError::InvalidInput(format!("Usage limit for {} is not numeric", metric))
                })?;
                amount > ceiling
            }
        };
        if over {
            return Err(AppError::UsageLimitExceeded(metric.clone()));
        }
        updated.insert(metric.clone(), value.clone());
    }

    Ok(updated)
}

/// Integers compare exactly; `f64` would round anything past 2^53.
fn as_integer(value: &Value) -> Option<i128> {
    value
        .as_i64()
        .map(i128::from)
        .or_else(|| value.as_u64().map(i128::from))
}
