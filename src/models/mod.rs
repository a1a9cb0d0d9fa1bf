// src/models/mod.rs

pub mod account;
pub mod attempt;
pub mod post;
pub mod question;
pub mod ticket;
