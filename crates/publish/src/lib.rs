//! Publish client: pushes the master workbook into a GitHub repository.
//!
//! This crate owns the contents API wire contract: look up the current blob
//! sha on a branch, then create or replace the file in one commit.
//!
//! Blocking, single request per step. No retries.

mod auth;
mod client;

pub use auth::{auth_file_path, delete_auth, load_auth, resolve_token, save_auth, PublishCredentials};
pub use client::{
    hash_bytes, PublishClient, PublishError, PublishResult, PublishTarget, DEFAULT_API_BASE,
};
