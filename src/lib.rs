//! QnA Escalation - turn pipeline for a question-answering bot
//!
//! This crate answers user questions from a QnA backend, tracks feedback
//! on those answers, and hands the conversation to human agents when the
//! user asks for one or keeps asking to rephrase.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
