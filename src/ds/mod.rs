pub mod circular_queue;
pub mod recency_list;
pub mod slot_arena;

pub use circular_queue::{CircularQueue, QueueFull};
pub use recency_list::{Cursor, RecencyIter, RecencyList};
pub use slot_arena::{SlotArena, SlotId};
