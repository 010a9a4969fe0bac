pub mod admin;
pub mod event;
pub mod pass;

pub use admin::Admin;
pub use event::Event;
pub use pass::{Pass, PassResponse, PaymentMethod};
