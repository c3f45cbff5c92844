//! Range expansion of stored series with exceptions applied.

use kalends_core::config::RecurrenceConfig;
use kalends_core::types::{SeriesId, TimeRange};
use kalends_recur::generator;
use kalends_recur::model::Occurrence;
use kalends_store::store::SeriesStore;

use crate::error::{ServiceError, ServiceResult};

/// ## Summary
/// Expands one stored series over `range`, with change-exceptions overlaid
/// and delete-exceptions removed.
///
/// ## Errors
/// Returns an error if the series does not exist or expansion fails.
pub fn expand_series<S: SeriesStore>(
    store: &S,
    id: SeriesId,
    range: TimeRange,
    cfg: &RecurrenceConfig,
) -> ServiceResult<Vec<Occurrence>> {
    let record = store.get(id)?;
    let occurrences = generator::expand(&record.master, range, cfg)?;
    Ok(record.exceptions.apply(occurrences))
}

/// ## Summary
/// Projects a single occurrence of a stored series by position, with any
/// change-exception for that position applied.
///
/// ## Errors
/// Returns [`ServiceError::NotFound`] when the position is past the end of
/// the series or covered by a delete-exception.
pub fn occurrence_at<S: SeriesStore>(
    store: &S,
    id: SeriesId,
    position: u32,
    cfg: &RecurrenceConfig,
) -> ServiceResult<Occurrence> {
    let record = store.get(id)?;
    if record.exceptions.is_deleted(position) {
        return Err(ServiceError::NotFound(format!(
            "occurrence {position} of series {id} is deleted"
        )));
    }
    let mut occurrence = generator::occurrence_at(&record.master, position, cfg)?
        .ok_or_else(|| {
            ServiceError::NotFound(format!("series {id} has no occurrence at position {position}"))
        })?;
    if let Some(change) = record.exceptions.change_at(position) {
        change.apply(&mut occurrence);
    }
    Ok(occurrence)
}

/// ## Summary
/// Expands every stored series overlapping `range` in one pass, sorted by
/// start instant.
///
/// ## Errors
/// Returns an error if the snapshot or any expansion fails.
pub fn expand_overlapping<S: SeriesStore>(
    store: &S,
    range: TimeRange,
    cfg: &RecurrenceConfig,
) -> ServiceResult<Vec<Occurrence>> {
    let snapshot = store.snapshot_overlapping(range)?;
    let mut all = Vec::new();
    for record in snapshot {
        let occurrences = generator::expand(&record.master, range, cfg)?;
        all.extend(record.exceptions.apply(occurrences));
    }
    all.sort_by_key(|occurrence| occurrence.start_utc);
    tracing::debug!(occurrences = all.len(), "expanded range");
    Ok(all)
}
