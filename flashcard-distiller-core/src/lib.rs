#![doc = "flashcard-distiller-core: core logic library for flashcard-distiller."]

//! This crate contains the note-selection rules, mirrored artifact placement,
//! response sanitation and the distillation pipeline itself.
//! The HTTP provider client and CLI glue live in the `flashcard-distiller` crate.
//!
//! # Usage
//! Build a [`distill::Distiller`] from a [`config::SettingsHandle`], a
//! [`store::ContentStore`] and a [`generation::GenerationService`], then call
//! [`distill::Distiller::run_for_active`] or [`distill::Distiller::distill`].

pub mod config;
pub mod distill;
pub mod generation;
pub mod placement;
pub mod sanitize;
pub mod store;
