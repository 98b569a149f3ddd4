use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Document loading and splitting
    pub chunking: ChunkingConfig,
    /// Hybrid ranking
    pub ranking: RankingConfig,
    /// Reuse the last built index when the repository snapshot is unchanged
    pub reuse_index: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Target chunk length in characters
    pub chunk_size: usize,
    /// Characters shared between consecutive chunks of one document
    pub chunk_overlap: usize,
    /// Files larger than this are skipped
    pub max_file_bytes: u64,
    /// Notebook cell outputs are cut to this many characters
    pub notebook_output_chars: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingConfig {
    /// Chunks returned per question
    pub top_k: usize,
    pub lexical_weight: f32,
    pub vector_weight: f32,
    /// Min-max normalize each signal before fusing. Changes ranking
    /// outcomes compared to the plain weighted sum.
    pub normalize: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            chunking: ChunkingConfig::default(),
            ranking: RankingConfig::default(),
            reuse_index: true,
        }
    }
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 3000,
            chunk_overlap: 200,
            max_file_bytes: 1_048_576,
            notebook_output_chars: 20,
        }
    }
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            top_k: 5,
            lexical_weight: 0.5,
            vector_weight: 0.5,
            normalize: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(v) = env_parse("REPO_QA_CHUNK_SIZE") {
            config.chunking.chunk_size = v;
        }
        if let Some(v) = env_parse("REPO_QA_CHUNK_OVERLAP") {
            config.chunking.chunk_overlap = v;
        }
        if let Some(v) = env_parse("REPO_QA_MAX_FILE_BYTES") {
            config.chunking.max_file_bytes = v;
        }
        if let Some(v) = env_parse("REPO_QA_NOTEBOOK_OUTPUT_CHARS") {
            config.chunking.notebook_output_chars = v;
        }
        if let Some(v) = env_parse("REPO_QA_TOP_K") {
            config.ranking.top_k = v;
        }
        if let Some(v) = env_parse("REPO_QA_LEXICAL_WEIGHT") {
            config.ranking.lexical_weight = v;
        }
        if let Some(v) = env_parse("REPO_QA_VECTOR_WEIGHT") {
            config.ranking.vector_weight = v;
        }
        if let Some(v) = env_parse("REPO_QA_NORMALIZE_SCORES") {
            config.ranking.normalize = v;
        }
        if let Some(v) = env_parse("REPO_QA_REUSE_INDEX") {
            config.reuse_index = v;
        }

        config.sanitized()
    }

    /// Clamp values that would make the pipeline degenerate.
    pub fn sanitized(mut self) -> Self {
        self.chunking.chunk_size = self.chunking.chunk_size.max(1);
        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            self.chunking.chunk_overlap = self.chunking.chunk_size - 1;
        }
        self.ranking.top_k = self.ranking.top_k.max(1);

        let defaults = RankingConfig::default();
        if !valid_weight(self.ranking.lexical_weight) {
            tracing::warn!(
                "Ignoring lexical weight {}, using {}",
                self.ranking.lexical_weight,
                defaults.lexical_weight
            );
            self.ranking.lexical_weight = defaults.lexical_weight;
        }
        if !valid_weight(self.ranking.vector_weight) {
            tracing::warn!(
                "Ignoring vector weight {}, using {}",
                self.ranking.vector_weight,
                defaults.vector_weight
            );
            self.ranking.vector_weight = defaults.vector_weight;
        }
        self
    }
}

/// Finite and not negative.
fn valid_weight(weight: f32) -> bool {
    weight.is_finite() && weight >= 0.0
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_literal_ranking() {
        let config = Config::default();
        assert_eq!(config.chunking.chunk_size, 3000);
        assert_eq!(config.chunking.chunk_overlap, 200);
        assert_eq!(config.ranking.top_k, 5);
        assert_eq!(config.ranking.lexical_weight, 0.5);
        assert_eq!(config.ranking.vector_weight, 0.5);
        assert!(!config.ranking.normalize);
    }

    #[test]
    fn test_sanitized_clamps_overlap_and_top_k() {
        let mut config = Config::default();
        config.chunking.chunk_size = 100;
        config.chunking.chunk_overlap = 400;
        config.ranking.top_k = 0;
        let config = config.sanitized();
        assert_eq!(config.chunking.chunk_overlap, 99);
        assert_eq!(config.ranking.top_k, 1);
    }

    #[test]
    fn test_sanitized_rejects_non_finite_weights() {
        let mut config = Config::default();
        config.ranking.lexical_weight = f32::NAN;
        config.ranking.vector_weight = f32::INFINITY;
        let config = config.sanitized();
        assert_eq!(config.ranking.lexical_weight, 0.5);
        assert_eq!(config.ranking.vector_weight, 0.5);

        let mut config = Config::default();
        config.ranking.lexical_weight = -1.0;
        config.ranking.vector_weight = 0.8;
        let config = config.sanitized();
        assert_eq!(config.ranking.lexical_weight, 0.5);
        assert_eq!(config.ranking.vector_weight, 0.8);
    }

    #[test]
    fn test_nan_weight_text_parses_but_is_sanitized() {
        assert!("NaN".parse::<f32>().unwrap().is_nan());
        let mut config = Config::default();
        config.ranking.lexical_weight = "NaN".parse().unwrap();
        assert_eq!(config.sanitized().ranking.lexical_weight, 0.5);
    }
}
