pub mod codec;
pub mod config;
pub mod dispatcher;
pub mod envelope;
pub mod http_client;
pub mod notification;
pub mod render;
pub mod session;

pub use dispatcher::{Dispatcher, FetchOutcome};
pub use envelope::EnvelopeError;
pub use notification::{NotificationSlot, NotificationStore, Outcome};
pub use render::FeatureTag;
