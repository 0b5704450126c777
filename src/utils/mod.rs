// src/utils/mod.rs

pub mod converter;
pub mod html;
pub mod mail;
