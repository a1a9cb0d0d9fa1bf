// src/utils/mod.rs

pub mod asset;
pub mod hash;
pub mod html;
pub mod jwt;
pub mod pagination;
