//! # tfa
//!
//! A coordinate-addressed artifact fetcher.
//!
//! Files opt in by carrying `@tfamanaged` on their first line and declaring
//! `groupId`, `artefactId`, and `version` in a leading block comment. For
//! each such file `tfa` computes its place in a local repository, copies the
//! cached artifact over it when present, and fetches it otherwise. A separate
//! export flow looks explicit coordinates up on a metadata endpoint, records
//! a sidecar descriptor, and downloads the payload.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌──────────┐   ┌────────────┐   ┌──────────────┐
//! │   scan   │──▶│  header  │──▶│ repository │──▶│  substitute  │
//! │ (walk)   │   │ (parse)  │   │  (paths)   │   │ cache/fetch  │
//! └──────────┘   └──────────┘   └────────────┘   └──────┬───────┘
//!                                                       ▼
//! ┌──────────┐   ┌──────────┐   ┌────────────┐   ┌──────────────┐
//! │  export  │──▶│ metadata │   │ descriptor │   │   download   │
//! │          │──▶│  (XML)   │   │ (sidecar)  │   │  (HTTP/TLS)  │
//! └──────────┘   └──────────┘   └────────────┘   └──────────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`error`] | Error kinds |
//! | [`header`] | Management marker and header parsing |
//! | [`repository`] | Repository path layout and bootstrap |
//! | [`substitute`] | Per-file resolve-or-fetch |
//! | [`metadata`] | Remote metadata lookup |
//! | [`download`] | Artifact download |
//! | [`descriptor`] | Write-once sidecar descriptors |
//! | [`export`] | Export by coordinates |
//! | [`scan`] | Directory walk |
//! | [`report`] | Status lines |
//! | [`list`] | Listing recorded exports |

pub mod config;
pub mod descriptor;
pub mod download;
pub mod error;
pub mod export;
pub mod header;
pub mod list;
pub mod metadata;
pub mod models;
pub mod report;
pub mod repository;
pub mod scan;
pub mod substitute;
