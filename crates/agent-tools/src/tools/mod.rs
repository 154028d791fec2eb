//! Built-in tool implementations.

mod send_sms;

pub use send_sms::SendSms;
