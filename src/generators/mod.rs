mod clock;
mod ids;

pub use clock::{Clock, ManualClock, SystemClock};
pub use ids::{IdGenerator, RandomIdGenerator, SequentialIdGenerator};
