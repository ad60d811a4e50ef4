/*!
 * Translation layer: the rate-limited service client and the content
 * walker that applies it across an item's field structure.
 */

pub mod client;
pub mod walker;

pub use client::{TranslationClient, TranslationOutcome, TranslationStats};
pub use walker::ContentWalker;
