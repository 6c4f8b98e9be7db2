//! Pipeline stages for PDF translation.
//!
//! Each submodule implements one step; the browser-facing pieces sit behind
//! the [`session::TranslationSession`] trait so the sequencing and
//! convergence logic can be tested without a browser.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ extract ──▶ normalize ──▶ run ──────────────▶ compose
//! (URL/path) (pdfium)   (cleanup)     │ session           │ render (pdfium)
//!                                     │ stability         │ docx   (docx-rs)
//! ```
//!
//! 1. [`input`]     canonicalise the user-supplied path or URL to a local file
//! 2. [`extract`]   read each page's text layer (blocking, pdfium)
//! 3. [`normalize`] undo typesetting line breaks and strip boilerplate
//! 4. [`run`]       feed pages one at a time through a single session,
//!    containing per-page failures
//! 5. [`stability`] decide when the displayed translation has converged
//! 6. [`session`]   the translation UI, driven through headless_chrome
//! 7. [`compose`]   interleave page images ([`render`]) and translations into
//!    a `.docx` ([`docx`])

pub mod compose;
pub mod docx;
pub mod extract;
pub mod input;
pub mod normalize;
pub mod render;
pub mod run;
pub mod session;
pub mod stability;
