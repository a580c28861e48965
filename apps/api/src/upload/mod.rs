// Upload API: image intake, analysis pipeline, and stored-file retrieval.
// Persistence lives in crate::storage; this module only wires HTTP to it.

pub mod handlers;
