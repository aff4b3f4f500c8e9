//! Rendering Adapters
//!
//! Implementation of the CardRenderer port using Adaptive Card templates.
//!
//! ## Usage
//!
//! ```ignore
//! use adapters::rendering::TemplateCardRenderer;
//!
//! let renderer = TemplateCardRenderer::new();
//! let payload = renderer.render("transcript", &report.to_value()?)?;
//! ```

mod expander;
mod html;
mod template_card_renderer;

pub use template_card_renderer::TemplateCardRenderer;
