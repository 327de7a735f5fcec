//! Lifecycle event reporting.
//!
//! The publisher reports observable state changes through a sink injected
//! at construction instead of mutating any process-wide logger. [`LogSink`]
//! forwards to the `log` facade for the common case; embedders and tests
//! can capture events with their own sink.

use chrono::prelude::*;
use log::info;

/// State changes a publisher reports while tracking a dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A publisher bound itself to a dataset at this starting watermark.
    Watching {
        id: String,
        modified: DateTime<Utc>,
    },
    /// An update observed no new version.
    Unchanged { id: String },
    /// An update observed a strictly newer version.
    Updated {
        id: String,
        modified: DateTime<Utc>,
    },
    /// A snapshot was handed to the store.
    SnapshotStored {
        id: String,
        snapshot: String,
        content_id: String,
    },
}

pub trait EventSink {
    fn emit(&self, event: Event);
}

/// Forwards events to the `log` facade.
pub struct LogSink;

impl EventSink for LogSink {
    fn emit(&self, event: Event) {
        match event {
            Event::Watching { id, modified } => {
                info!("Dataset {}", id);
                info!("Last modified {}", modified.format("%Y-%m-%d %H:%M:%S"));
            }
            Event::Unchanged { id } => info!("Dataset {} remains the same.", id),
            Event::Updated { id, modified } => {
                info!("Dataset {} updated, modified {}", id, modified)
            }
            Event::SnapshotStored {
                id,
                snapshot,
                content_id,
            } => info!("Stored snapshot {} of {} as {}", snapshot, id, content_id),
        }
    }
}
