pub mod auth;
pub mod fcm;
pub mod firestore;
pub mod health;
