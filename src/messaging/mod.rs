/// Messaging module
///
/// Two delivery paths with different guarantees:
///
/// ```text
/// serial worker ──┐
///                 ├─ SourceEvent (mpsc, ordered, lossless) ─> consumer thread
/// camera worker ──┘                                               │
///                                                                 │ publishes
///                                                                 ▼
///                                                            ┌──────────┐
///                                            Event bus ────> │ overlay, │
///                                            (broadcast)     │ audio,   │
///                                                            │ log ...  │
///                                                            └──────────┘
/// ```
///
/// The mpsc half is a plain unbounded crossbeam channel: per-producer order
/// is preserved and nothing is dropped. The broadcast half fans events out to
/// presentation subscribers without ever blocking the consumer thread.
pub mod bus;
pub mod events;

pub use bus::{EventBus, SubscriberId};
pub use events::{ConnectionStatus, Event, SourceEvent, SourceKind};
