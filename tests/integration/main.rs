//! Integration tests: the full load → cycle → persist pipeline against
//! flat files in the temp dir and a deterministic in-memory market.

mod mock_market;
mod pipeline;
