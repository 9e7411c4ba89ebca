pub mod memory;
pub mod outbox;
pub mod resources;

pub use memory::InMemoryRecordStore;
pub use outbox::MailOutbox;
pub use resources::{InMemoryResources, Location};
