// Messaging - Canaux lock-free entre contrôle, audio et UI

pub mod channels;
pub mod command;
pub mod notification;
