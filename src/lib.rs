//! Main crate for the `dns01-providers` plugins.
//!
//! Each binary in this crate is a DNS-01 challenge plugin for an ACME client:
//! it is started once per operation, reads its parameters from the environment and its
//! credentials as JSON from stdin, then creates or deletes a single TXT record.
//!
//! The following modules might be of interest if you want to add a new provider:
//! - [`plugin`] implements the invocation protocol (environment, stdin, exit codes)
//! - [`provider`]s talk to DNS services such as Cloudflare and change the actual records
//! - [`cli`] holds the environment/flag parsing shared by all binaries

#![allow(clippy::uninlined_format_args)]

pub mod cli;
pub mod config;
pub mod plugin;
pub mod provider;
