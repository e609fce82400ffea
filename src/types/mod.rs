mod models;

pub use models::{PushSubscription, Token};
