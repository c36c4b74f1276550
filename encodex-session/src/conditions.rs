use crate::error::SessionError;
use encodex_core::TrialDescriptor;
use rand::Rng;
use rand::seq::SliceRandom;
use std::path::Path;

/// Reads every `Image`/`Degredation` row of the condition list.
pub fn load_conditions(path: impl AsRef<Path>) -> Result<Vec<TrialDescriptor>, SessionError> {
    let path = path.as_ref();
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)?;
    let rows = rdr
        .deserialize()
        .collect::<Result<Vec<TrialDescriptor>, _>>()?;
    if rows.is_empty() {
        return Err(SessionError::EmptyConditions {
            path: path.to_path_buf(),
        });
    }
    log::info!("Loaded {} conditions from {}", rows.len(), path.display());
    Ok(rows)
}

/// Seed for the trial shuffle: the configured one, or a fresh draw.
pub fn resolve_seed(configured: Option<u64>) -> u64 {
    configured.unwrap_or_else(|| rand::rng().random())
}

/// Shuffles the full list and keeps the first `count` rows (`None` keeps all).
pub fn select_trials<R: Rng + ?Sized>(
    conditions: &[TrialDescriptor],
    count: Option<usize>,
    rng: &mut R,
) -> Result<Vec<TrialDescriptor>, SessionError> {
    let available = conditions.len();
    let requested = count.unwrap_or(available);
    if requested > available {
        return Err(SessionError::TooFewConditions {
            requested,
            available,
        });
    }
    let mut order = conditions.to_vec();
    order.shuffle(rng);
    order.truncate(requested);
    Ok(order)
}
