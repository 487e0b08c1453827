//! Change feed mechanics: events, envelopes and a pub/sub bus.
//!
//! The engine never keeps an ambient copy of the store. Consumers that need fresh
//! data subscribe here and receive one envelope per committed write.

pub mod bus;
pub mod envelope;
pub mod event;
pub mod in_memory_bus;

pub use bus::{EventBus, Subscription};
pub use envelope::EventEnvelope;
pub use event::Event;
pub use in_memory_bus::InMemoryEventBus;
