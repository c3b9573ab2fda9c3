//! Ranking and pruning of template-match offsets.
//!
//! `topk` keeps the best offsets in reading-order tie-break; `nms` removes
//! overlapping duplicates for multi-match searches.

pub(crate) mod nms;
pub(crate) mod topk;
