//! Board State Store, Move Reconciler and the drag/drop contract.

pub mod drag;
pub mod reconciler;
pub mod state;
pub mod store;

pub use drag::{DragEvent, DragOutcome};
pub use reconciler::{MovePlan, PendingMove};
pub use state::{BoardState, Column};
pub use store::{BoardStore, LoadOutcome, OpenedBoard};
