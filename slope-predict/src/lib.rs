//! Condition prediction over assembled course features.
//!
//! A [`classifier::Classifier`] scores ordered feature rows against the four
//! surface conditions; [`classifier::predict_all`] turns a course feature map
//! into the prediction map persisted for presentation.

pub mod cache;
pub mod classifier;
pub mod command;
pub mod condition;
