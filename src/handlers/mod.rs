// src/handlers/mod.rs

pub mod account;
pub mod admin;
pub mod auth;
pub mod community;
pub mod contact;
pub mod quiz;
pub mod results;
