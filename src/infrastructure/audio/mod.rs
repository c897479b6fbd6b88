mod pcm_normalizer;

pub use pcm_normalizer::SymphoniaNormalizer;
