mod loader;
mod models;

pub use loader::FileRoster;
pub use models::*;

use parking_lot::RwLock;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// How long a loaded roster is served before the file is read again.
pub const DEFAULT_ROSTER_TTL: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, thiserror::Error)]
pub enum RosterError {
    #[error("failed to read roster file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse roster spreadsheet: {0}")]
    Spreadsheet(#[from] calamine::Error),
    #[error("failed to parse roster csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("roster workbook contains no sheets")]
    NoSheets,
}

/// Somewhere a full roster can be read from.
pub trait RosterSource: Send + Sync {
    fn load(&self) -> Result<Vec<Participant>, RosterError>;

    /// Human-readable origin, used in logs.
    fn describe(&self) -> String {
        "roster".to_string()
    }
}

struct CachedRoster {
    participants: Arc<[Participant]>,
    loaded_at: Instant,
}

/// Time-expiring in-memory copy of the roster.
///
/// The lock guards only the swap of the cached entry; the source is read with
/// no lock held, so concurrent callers that all see an expired entry each do
/// their own read and the last one to finish wins. Reads are idempotent, so
/// this costs at most a few duplicate disk reads.
pub struct RosterCache {
    source: Box<dyn RosterSource>,
    ttl: Duration,
    entry: RwLock<Option<CachedRoster>>,
}

impl RosterCache {
    pub fn new(source: impl RosterSource + 'static, ttl: Duration) -> Self {
        Self {
            source: Box::new(source),
            ttl,
            entry: RwLock::new(None),
        }
    }

    /// Current roster, reloading from the source if nothing is cached or the
    /// cached copy has outlived the TTL.
    pub fn participants(&self) -> Result<Arc<[Participant]>, RosterError> {
        if let Some(cached) = self.entry.read().as_ref() {
            if cached.loaded_at.elapsed() < self.ttl {
                debug!("Using cached participants data");
                return Ok(Arc::clone(&cached.participants));
            }
        }
        self.refresh()
    }

    /// Unconditionally reload the roster and replace the cached entry.
    pub fn refresh(&self) -> Result<Arc<[Participant]>, RosterError> {
        info!(source = %self.source.describe(), "Loading participants roster");

        let participants: Arc<[Participant]> = self.source.load()?.into();
        info!(count = participants.len(), "Roster loaded");

        *self.entry.write() = Some(CachedRoster {
            participants: Arc::clone(&participants),
            loaded_at: Instant::now(),
        });
        Ok(participants)
    }

    /// Drop the cached entry; the next [`participants`](Self::participants)
    /// call reads the source again.
    pub fn invalidate(&self) {
        self.entry.write().take();
    }

    pub fn is_loaded(&self) -> bool {
        self.entry.read().is_some()
    }
}
