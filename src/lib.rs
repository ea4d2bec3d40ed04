//! # Legislación PBA
//!
//! Natural-language search over the legal-norm dataset of the Province of
//! Buenos Aires.
//!
//! A request such as `"leyes vigentes sobre adopción desde 2010"` is parsed
//! into a structured intent, run against a corpus of tabular records and
//! answered with a ranked result set or a comparison of two norms. The
//! query logic lives in [`legislacion_core`]; this crate adds data
//! acquisition, configuration, a session, the `lpba` CLI and an HTTP API.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌─────────────┐   ┌──────────────────┐
//! │  Providers   │──▶│   Session   │──▶│ legislacion-core │
//! │  CKAN / CSV  │   │ corpus+set  │   │ intent → rank    │
//! └──────────────┘   └──────┬──────┘   └──────────────────┘
//!                           │
//!                 ┌─────────┴─────────┐
//!                 ▼                   ▼
//!            ┌──────────┐       ┌──────────┐
//!            │   CLI    │       │   HTTP   │
//!            │  (lpba)  │       │  (axum)  │
//!            └──────────┘       └──────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`provider`] | CKAN and CSV corpus providers |
//! | [`session`] | Lazy corpus load and working set |
//! | [`search`] | CLI search, compare and ask commands |
//! | [`sources`] | CLI fetch and column listing |
//! | [`server`] | JSON HTTP API |

pub mod config;
pub mod provider;
pub mod search;
pub mod server;
pub mod session;
pub mod sources;

pub use legislacion_core;
