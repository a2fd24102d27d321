//! World population choropleth.
//!
//! Loads a TopoJSON world and a population table, joins them by country
//! name, colours each country by a threshold scale and renders the result as
//! SVG. `serve` adds hover details and pan/zoom driven from the page.

pub mod config;
pub mod data;
pub mod enrich;
pub mod interaction;
pub mod pipeline;
pub mod population;
pub mod projection;
pub mod render;
pub mod scale;
pub mod server;
pub mod topology;
pub mod types;
pub mod viewport;
