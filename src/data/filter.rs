use std::cmp::Ordering;

use anyhow::bail;

use super::model::{normalize_city, NurseDataset, NurseRecord};

/// Return the nurses working in `city`, best score first.
///
/// Matching is exact on the normalised key (no substring or fuzzy match).
/// The sort is stable: nurses with equal scores keep their dataset order.
/// NaN scores sort after every numeric score.
///
/// Fails when the city has a row that could not be typed at load time.
pub fn nurses_in_city(dataset: &NurseDataset, city: &str) -> anyhow::Result<Vec<NurseRecord>> {
    let key = normalize_city(city);

    if let Some(bad) = dataset.rejected.iter().find(|r| r.city_key == key) {
        bail!("row {} for city {city:?} is unusable: {}", bad.row, bad.reason);
    }

    let mut matches: Vec<&NurseRecord> = dataset
        .entries
        .iter()
        .filter(|entry| entry.city_key == key)
        .map(|entry| &entry.record)
        .collect();

    matches.sort_by(|a, b| score_descending(a.score, b.score));
    Ok(matches.into_iter().cloned().collect())
}

fn score_descending(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (false, false) => b.total_cmp(&a),
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
    }
}
