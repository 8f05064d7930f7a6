pub mod score_ctx;
pub mod score_flow;

pub use score_ctx::DocumentCtx;
pub use score_flow::ScoreFlow;
