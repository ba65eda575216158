pub mod aggregator;
pub mod app;
pub mod bucket;
pub mod chart;
pub mod cli;
pub mod config;
pub mod event;
pub mod export;
pub mod handler;
pub mod help;
pub mod ingest;
pub mod live;
pub mod notification;
pub mod recent;
pub mod tui;
pub mod ui;
pub mod updater;
pub mod viewport;
