// Wait time in seconds between driver ticks
pub const DEFAULT_LOOP_INTERVAL: u64 = 60;

// Ceiling on simultaneously requested span proofs
pub const DEFAULT_MAX_CONCURRENT_SPAN_REQUESTS: u64 = 10;

// Seconds before an unanswered proof request is failed out and retried
pub const DEFAULT_PROOF_TIMEOUT: u64 = 4 * 60 * 60;

// Widest L2 range a single span proof request may cover
pub const DEFAULT_MAX_BLOCK_RANGE_PER_SPAN_PROOF: u64 = 600;

// Span batches starting further than this past a requested range abort the
// derivation pass
pub const DEFAULT_MAX_SPAN_BATCH_DEVIATION: u64 = 1_000_000;

/// Driver tuning knobs, resolved from CLI args.
#[derive(Debug, Clone)]
pub struct ProposerConfig {
    pub loop_interval: u64,
    pub max_concurrent_span_requests: u64,
    pub proof_timeout: u64,
    pub max_block_range_per_span_proof: u64,
}

impl Default for ProposerConfig {
    fn default() -> Self {
        Self {
            loop_interval: DEFAULT_LOOP_INTERVAL,
            max_concurrent_span_requests: DEFAULT_MAX_CONCURRENT_SPAN_REQUESTS,
            proof_timeout: DEFAULT_PROOF_TIMEOUT,
            max_block_range_per_span_proof: DEFAULT_MAX_BLOCK_RANGE_PER_SPAN_PROOF,
        }
    }
}
