//! Tracker error types.

use thiserror::Error;

use crate::{ListenerId, SectionPos};

/// Programming errors detected by the tracking engine.
///
/// Every check runs before the engine mutates anything, so an error leaves
/// the engine exactly as it was.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrackerError {
    /// A listener was subscribed while already holding a subscription.
    #[error(
        "adding entity listener a second time: {listener} ({description})\n wants to listen at: {} with cube radius: {radius}\n but was already listening at chunk sections: {}",
        display_center(.center),
        display_sections(.sections)
    )]
    AlreadyListening {
        listener: ListenerId,
        description: String,
        center: Option<SectionPos>,
        radius: u32,
        sections: Vec<SectionPos>,
    },

    /// A listener without a subscription was unsubscribed or moved.
    #[error("entity listener not tracked: {listener}")]
    NotListening { listener: ListenerId },

    /// No listener is registered under this id.
    #[error("unknown entity listener: {listener}")]
    UnknownListener { listener: ListenerId },

    /// A listener was moved from a center it is not subscribed at.
    #[error("entity listener {listener} moved from {from} but is subscribed at {}", display_center(.actual))]
    CenterMismatch {
        listener: ListenerId,
        from: SectionPos,
        actual: Option<SectionPos>,
    },

    /// A section the listener should occupy does not list it.
    #[error("expected there to be a listener list for {listener} at section {section} but there was none")]
    MissingFromSection {
        listener: ListenerId,
        section: SectionPos,
    },

    /// A section the listener should not occupy already lists it.
    #[error("listener {listener} already present at section {section}")]
    UnexpectedInSection {
        listener: ListenerId,
        section: SectionPos,
    },

    /// A section with neither entities nor listeners was left in the registry.
    #[error("empty section {section} was not pruned")]
    EmptySection { section: SectionPos },
}

/// Result type for tracker operations.
pub type TrackerResult<T> = Result<T, TrackerError>;

#[allow(clippy::ref_option)]
fn display_center(center: &Option<SectionPos>) -> String {
    center.map_or_else(|| "explicit sections".to_owned(), |c| c.to_string())
}

fn display_sections(sections: &[SectionPos]) -> String {
    if sections.is_empty() {
        return "none".to_owned();
    }

    sections
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
