//! HTTP API.
//!
//! - `track`: the OTO tracking webhook under `/plugins/oto/`
//! - `events`: signed host events under `/events/`

pub mod events;
pub mod extractors;
pub mod track;
