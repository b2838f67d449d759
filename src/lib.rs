//! labcharts - physics lab measurement analysis and static chart generation.
//!
//! Each lab turns its recorded readings into PNG charts under
//! `<output_root>/<lab dir>/graficas/` plus a text [`report::Report`].

pub mod charts;
pub mod config;
pub mod data;
pub mod labs;
pub mod pdf;
pub mod physics;
pub mod report;
pub mod stats;
