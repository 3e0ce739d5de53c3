#![allow(clippy::new_without_default)]

pub mod action;
pub mod actor;
pub mod config;
pub mod error;
pub mod provider;
pub mod registry;
pub mod slot;
pub mod title;
pub mod util;
pub mod view;

pub use crate::{
    config::{SlotConfig, SourceKind, ViewOptions},
    error::Error,
    registry::{SlotKey, SlotRegistry},
    slot::{RefreshSlot, SlotPhase, Snapshot},
    title::TitleList,
    view::{DisplayResult, ViewHandle},
};
