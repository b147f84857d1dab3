// Knoux Core Library
// Copyright (c) 2026 Xing_The_Creator | SYNOID

pub mod ai_api;
pub mod config;
pub mod engine;
pub mod error;
pub mod health;
pub mod models;
pub mod project_api;
pub mod server;
pub mod state;
