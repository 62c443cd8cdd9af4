//! LINE Messaging API surface: the webhook event schema, the
//! `x-line-signature` check and the outbound reply/push client.

pub mod client;
pub mod signature;
pub mod webhook;

pub use client::{
    LineClient, MessagingApi, OutboundMessage, PushMessageRequest, ReplyMessageRequest,
};
pub use webhook::{CallbackRequest, Event, MessageContent, MessageEvent};
