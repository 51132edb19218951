pub mod abort;
pub mod cache;
pub mod catalog;
pub mod config;
pub mod elements;
pub mod fetch;
pub mod geometry;
pub mod outcome;
pub mod predict;
pub mod services;
pub mod solar;
pub mod visibility;
pub mod weather;
pub mod web;
