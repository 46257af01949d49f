//! Client for the xAI live-search API and the normalisation pipeline that
//! turns its chat-completion envelopes into displayable digest lines.
//!
//! The `grok` module mirrors the provider boundary: `client` issues the
//! requests (with the two-tier degradation policy), `types` holds the wire
//! structs, and `extract` performs the defensive second-stage decode of the
//! JSON the model embeds in its message content.

pub mod grok;
